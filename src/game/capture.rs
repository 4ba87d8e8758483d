//! Pocket capture, fouls and cue respawn placement

use glam::Vec2;

use super::ball::{Ball, CUE_FOUL_SENTINEL, POTTED_SENTINEL};
use super::table::Table;

/// Seconds added to the elapsed timer for pocketing the cue
pub const FOUL_TIME_PENALTY: f32 = 10.0;
/// Extra gap required between a respawned cue and any other ball
pub const SPAWN_CLEARANCE: f32 = 2.0;
pub const MAX_SPAWN_ATTEMPTS: u32 = 50;

/// A ball that dropped this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Object ball potted
    Potted {
        ball_id: u8,
        pocket_id: u8,
        ball_label: String,
    },
    /// Cue ball potted
    Foul { pocket_id: u8 },
}

/// Outcome of the respawn search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSearch {
    pub position: Vec2,
    /// Shifts applied before a clear spot was found, or the cap
    pub attempts: u32,
}

impl SpawnSearch {
    /// True if the search hit the attempt cap; the position may overlap
    pub fn exhausted(&self) -> bool {
        self.attempts >= MAX_SPAWN_ATTEMPTS
    }
}

/// Capture and foul detection
pub struct CaptureDetector;

impl CaptureDetector {
    /// Retire every active ball inside a pocket. Object balls are checked
    /// in index order before the cue. Already potted balls are skipped, so
    /// each ball is reported at most once.
    pub fn detect(balls: &mut [Ball], table: &Table) -> Vec<Capture> {
        let mut captures = Vec::new();

        for ball in balls.iter_mut().filter(|b| !b.is_cue() && b.is_active()) {
            if let Some(pocket) = table.capturing_pocket(ball.position, ball.radius) {
                let pocket_id = pocket.id;
                ball.retire(POTTED_SENTINEL);
                captures.push(Capture::Potted {
                    ball_id: ball.id,
                    pocket_id,
                    ball_label: ball.label(),
                });
            }
        }

        if let Some(cue) = balls.iter_mut().find(|b| b.is_cue() && b.is_active()) {
            if let Some(pocket) = table.capturing_pocket(cue.position, cue.radius) {
                let pocket_id = pocket.id;
                cue.retire(CUE_FOUL_SENTINEL);
                captures.push(Capture::Foul { pocket_id });
            }
        }

        captures
    }

    /// Walk the spawn point along +x until it clears every active ball by
    /// `SPAWN_CLEARANCE`, giving up after `MAX_SPAWN_ATTEMPTS` shifts.
    /// The last candidate is returned either way.
    pub fn safe_spawn(target: Vec2, cue_radius: f32, others: &[Ball]) -> SpawnSearch {
        let step = cue_radius * 2.0 + 5.0;
        let mut position = target;
        let mut attempts = 0;

        while attempts < MAX_SPAWN_ATTEMPTS {
            let blocked = others.iter().filter(|b| b.is_active()).any(|b| {
                position.distance(b.position) < cue_radius + b.radius + SPAWN_CLEARANCE
            });
            if !blocked {
                break;
            }
            position.x += step;
            attempts += 1;
        }

        SpawnSearch { position, attempts }
    }
}
