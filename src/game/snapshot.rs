//! Snapshot building for the renderer

use crate::ui::protocol::{BallSnapshot, FrameSnapshot, ServerMsg};

use super::session::Session;

/// Builds frame snapshots at a fixed frame interval
pub struct SnapshotBuilder {
    /// Frames since last snapshot
    frames_since_snapshot: u32,
    /// Snapshot interval in frames
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        let snapshot_interval = snapshot_interval.max(1);
        Self {
            // First frame always goes out
            frames_since_snapshot: snapshot_interval - 1,
            snapshot_interval,
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.frames_since_snapshot += 1;
        if self.frames_since_snapshot >= self.snapshot_interval {
            self.frames_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.frames_since_snapshot = self.snapshot_interval;
    }

    /// Build a snapshot message
    pub fn build(&self, session: &Session) -> ServerMsg {
        let balls = session
            .balls
            .iter()
            .map(|b| BallSnapshot {
                id: b.id,
                x: b.position.x,
                y: b.position.y,
                rotation: b.rotation,
                is_moving: b.is_moving,
                is_potted: b.is_potted,
                color: b.color,
            })
            .collect();

        ServerMsg::Frame(FrameSnapshot {
            frame: session.frame,
            phase: session.state.phase,
            remaining: session.remaining(),
            shots: session.state.shots,
            fouls: session.state.fouls,
            aim_guide: session.difficulty.aim_guide(),
            balls,
            popup: session.popups.current().cloned(),
            show_foul: session.foul_banner.is_visible(),
            collided: session.collided_this_frame,
            potted: session.potted_this_frame,
        })
    }
}
