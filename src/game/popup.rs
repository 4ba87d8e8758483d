//! Transient on-screen notices

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Frames an achievement popup stays up
pub const POPUP_FRAMES: u32 = 180;
/// Frames the foul banner stays up
pub const FOUL_BANNER_FRAMES: u32 = 30;

/// A popup as handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Popup {
    pub text: String,
    /// Frames this popup has been displayed
    pub shown_frames: u32,
}

/// FIFO of achievement popups; only the head is displayed
#[derive(Debug, Clone, Default)]
pub struct PopupQueue {
    queue: VecDeque<Popup>,
}

impl PopupQueue {
    pub fn push(&mut self, text: impl Into<String>) {
        self.queue.push_back(Popup {
            text: text.into(),
            shown_frames: 0,
        });
    }

    pub fn current(&self) -> Option<&Popup> {
        self.queue.front()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Age the head popup by one frame and drop it once expired
    pub fn advance(&mut self) {
        if let Some(head) = self.queue.front_mut() {
            head.shown_frames += 1;
            if head.shown_frames > POPUP_FRAMES {
                self.queue.pop_front();
            }
        }
    }
}

/// Countdown for the "FOUL" banner
#[derive(Debug, Clone, Copy, Default)]
pub struct FoulBanner {
    remaining: u32,
}

impl FoulBanner {
    pub fn show(&mut self) {
        self.remaining = FOUL_BANNER_FRAMES;
    }

    pub fn is_visible(&self) -> bool {
        self.remaining > 0
    }

    pub fn advance(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popups_display_one_at_a_time() {
        let mut popups = PopupQueue::default();
        popups.push("First Potter!");
        popups.push("Combo Shot!");

        for _ in 0..POPUP_FRAMES {
            popups.advance();
        }
        assert_eq!(popups.current().map(|p| p.text.as_str()), Some("First Potter!"));

        popups.advance();
        assert_eq!(popups.len(), 1);
        let head = popups.current().unwrap();
        assert_eq!(head.text, "Combo Shot!");
        assert_eq!(head.shown_frames, 0);
    }

    #[test]
    fn foul_banner_expires() {
        let mut banner = FoulBanner::default();
        assert!(!banner.is_visible());
        banner.show();
        for _ in 0..FOUL_BANNER_FRAMES - 1 {
            banner.advance();
        }
        assert!(banner.is_visible());
        banner.advance();
        assert!(!banner.is_visible());
    }
}
