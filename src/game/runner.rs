//! Session frame loop

use std::future::Future;

use glam::Vec2;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::store::{PersistenceHandle, PersistenceJob, PersistenceOutcome};
use crate::ui::protocol::{ClientMsg, ServerMsg};
use crate::util::time::{frame_duration, FrameClock};

use super::session::{FrameInput, FrameReport, Session};
use super::snapshot::SnapshotBuilder;

/// Why the frame loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerExit {
    /// Renderer asked to leave
    Quit,
    /// Every input sender was dropped
    InputClosed,
    /// Shutdown future resolved
    Shutdown,
}

/// Channels for talking to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub input_tx: mpsc::Sender<ClientMsg>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
}

/// Owns a session and drives it at the frame rate
pub struct SessionRunner {
    session: Session,
    input_rx: mpsc::Receiver<ClientMsg>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
    persistence: PersistenceHandle,
    outcome_rx: mpsc::UnboundedReceiver<PersistenceOutcome>,
    clock: FrameClock,
}

/// Inputs gathered between two frames
#[derive(Debug, Default)]
struct PendingInput {
    pressed: bool,
    release: Option<Vec2>,
    quit: bool,
    closed: bool,
}

impl SessionRunner {
    pub fn new(
        session: Session,
        persistence: PersistenceHandle,
        outcome_rx: mpsc::UnboundedReceiver<PersistenceOutcome>,
        snapshot_interval: u32,
    ) -> (Self, SessionHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);

        let handle = SessionHandle {
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
        };

        let runner = Self {
            session,
            input_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval),
            persistence,
            outcome_rx,
            clock: FrameClock::new(),
        };

        (runner, handle)
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the frame loop until quit, input close, or `shutdown` resolves
    pub async fn run<F>(mut self, shutdown: F) -> RunnerExit
    where
        F: Future<Output = ()>,
    {
        info!(
            player_id = self.session.player_id,
            difficulty = ?self.session.difficulty,
            "Session started"
        );

        let mut frame_interval = interval(frame_duration());
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let exit = loop {
            tokio::select! {
                _ = frame_interval.tick() => {}
                _ = &mut shutdown => break RunnerExit::Shutdown,
            }

            let pending = self.collect_inputs();
            if pending.quit {
                break RunnerExit::Quit;
            }

            let dt = self.clock.tick();
            let input = FrameInput {
                dt,
                aim_pressed: pending.pressed,
                aim_released: pending.release.is_some(),
                release_point: pending.release.unwrap_or(Vec2::ZERO),
            };

            let report = self.session.step(&input);
            self.dispatch(report);
            self.drain_outcomes();

            if self.snapshot_builder.should_send() {
                let _ = self.snapshot_tx.send(self.snapshot_builder.build(&self.session));
            }

            if pending.closed {
                break RunnerExit::InputClosed;
            }
        };

        info!(
            player_id = self.session.player_id,
            exit = ?exit,
            frames = self.session.frame,
            "Session loop stopped"
        );
        exit
    }

    /// Drain everything the renderer sent since the last frame
    fn collect_inputs(&mut self) -> PendingInput {
        let mut pending = PendingInput::default();

        loop {
            match self.input_rx.try_recv() {
                Ok(ClientMsg::Press) => pending.pressed = true,
                Ok(ClientMsg::Release { x, y }) if x.is_finite() && y.is_finite() => {
                    pending.release = Some(Vec2::new(x, y))
                }
                Ok(ClientMsg::Release { x, y }) => {
                    debug!(x, y, "Ignoring non-finite release point");
                }
                Ok(ClientMsg::Quit) => {
                    pending.quit = true;
                    break;
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    pending.closed = true;
                    break;
                }
            }
        }

        pending
    }

    /// Hand frame results to the persistence worker
    fn dispatch(&mut self, report: FrameReport) {
        for achievement in report.granted {
            self.persistence.enqueue(PersistenceJob::GrantAchievement {
                player_id: self.session.player_id,
                achievement,
            });
        }

        if let Some(summary) = report.finished {
            let _ = self.snapshot_tx.send(ServerMsg::GameOver {
                ending: summary.outcome.into(),
                score: summary.score,
                shots: summary.shots,
                fouls: summary.fouls,
                elapsed: summary.elapsed,
            });
            self.snapshot_builder.force_next();
            self.persistence.enqueue(PersistenceJob::FinalizeSession(summary));
        }
    }

    /// Apply whatever the persistence worker has finished
    fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            match outcome {
                PersistenceOutcome::Granted { achievement } => {
                    debug!(achievement = achievement.id(), "Achievement stored");
                }
                PersistenceOutcome::SessionSaved { session_id } => {
                    debug!(session_id = ?session_id, "Session stored");
                }
                PersistenceOutcome::AchievementsEarned { earned } => {
                    for achievement in earned {
                        info!(id = achievement.id, name = %achievement.name, "Achievement earned");
                        self.session.push_popup(achievement.name);
                    }
                }
                PersistenceOutcome::Failed { step, message } => {
                    warn!(step, message = %message, "Persistence step failed");
                    let _ = self.snapshot_tx.send(ServerMsg::Notice {
                        message: format!("{}: {}", step, message),
                    });
                }
            }
        }
    }
}
