//! Background persistence worker
//! The frame loop enqueues jobs and never waits on the network; results come
//! back on an outcome channel that the loop drains between frames.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::game::events::PlayerId;
use crate::game::scoring::Achievement;
use crate::game::session::SessionSummary;

use super::client::PersistenceClient;
use super::protocol::{EarnedAchievement, SessionId};

/// Pending jobs the worker will hold before rejecting new ones
pub const JOB_QUEUE_CAPACITY: usize = 32;

/// Work handed to the persistence worker
#[derive(Debug, Clone)]
pub enum PersistenceJob {
    GrantAchievement {
        player_id: PlayerId,
        achievement: Achievement,
    },

    /// Save the session, its events, then run the end-of-session achievement check
    FinalizeSession(SessionSummary),
}

impl PersistenceJob {
    fn name(&self) -> &'static str {
        match self {
            PersistenceJob::GrantAchievement { .. } => "grant_achievement",
            PersistenceJob::FinalizeSession(_) => "finalize_session",
        }
    }
}

/// Result reported back to the frame loop
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceOutcome {
    Granted {
        achievement: Achievement,
    },

    SessionSaved {
        session_id: Option<SessionId>,
    },

    /// Achievements awarded by the service at session end
    AchievementsEarned {
        earned: Vec<EarnedAchievement>,
    },

    Failed {
        step: &'static str,
        message: String,
    },
}

/// Cheap handle for enqueueing jobs
#[derive(Clone, Debug)]
pub struct PersistenceHandle {
    job_tx: mpsc::Sender<PersistenceJob>,
}

impl PersistenceHandle {
    /// Queue a job without waiting. Returns false if it was dropped.
    pub fn enqueue(&self, job: PersistenceJob) -> bool {
        match self.job_tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(job = job.name(), "Persistence queue full, dropping job");
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(job = job.name(), "Persistence worker gone, dropping job");
                false
            }
        }
    }
}

/// Runs persistence jobs one at a time, in submission order
pub struct PersistenceWorker {
    client: PersistenceClient,
    job_rx: mpsc::Receiver<PersistenceJob>,
    outcome_tx: mpsc::UnboundedSender<PersistenceOutcome>,
}

impl PersistenceWorker {
    pub fn new(
        client: PersistenceClient,
    ) -> (
        Self,
        PersistenceHandle,
        mpsc::UnboundedReceiver<PersistenceOutcome>,
    ) {
        let (job_tx, job_rx) = mpsc::channel(JOB_QUEUE_CAPACITY);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let worker = Self {
            client,
            job_rx,
            outcome_tx,
        };
        (worker, PersistenceHandle { job_tx }, outcome_rx)
    }

    /// Create the worker and spawn it on the runtime
    pub fn spawn(
        client: PersistenceClient,
    ) -> (
        PersistenceHandle,
        mpsc::UnboundedReceiver<PersistenceOutcome>,
        JoinHandle<()>,
    ) {
        let (worker, handle, outcome_rx) = Self::new(client);
        let task = tokio::spawn(worker.run());
        (handle, outcome_rx, task)
    }

    /// Process jobs until every handle is dropped and the queue is drained
    pub async fn run(mut self) {
        info!(addr = self.client.addr(), "Persistence worker started");

        while let Some(job) = self.job_rx.recv().await {
            for outcome in self.process(job).await {
                // Receiver gone means the frame loop has exited; keep draining
                let _ = self.outcome_tx.send(outcome);
            }
        }

        info!("Persistence worker stopped");
    }

    async fn process(&self, job: PersistenceJob) -> Vec<PersistenceOutcome> {
        match job {
            PersistenceJob::GrantAchievement {
                player_id,
                achievement,
            } => match self.client.grant_achievement(player_id, achievement).await {
                Ok(()) => vec![PersistenceOutcome::Granted { achievement }],
                Err(e) => vec![PersistenceOutcome::Failed {
                    step: "GRANT_ACHIEVEMENT",
                    message: e.reply_message(),
                }],
            },
            PersistenceJob::FinalizeSession(summary) => self.finalize(&summary).await,
        }
    }

    async fn finalize(&self, summary: &SessionSummary) -> Vec<PersistenceOutcome> {
        let mut outcomes = Vec::new();

        match self.client.save_session(summary).await {
            Ok(session_id) => {
                info!(
                    player_id = summary.player_id,
                    session_id = ?session_id,
                    score = summary.score,
                    "Session saved"
                );
                outcomes.push(PersistenceOutcome::SessionSaved { session_id });

                // Events are only stored against a known session
                if let Some(session_id) = session_id {
                    if let Err(e) = self.client.save_events(session_id, &summary.events).await {
                        outcomes.push(PersistenceOutcome::Failed {
                            step: "SAVE_EVENTS",
                            message: e.reply_message(),
                        });
                    }
                }
            }
            Err(e) => outcomes.push(PersistenceOutcome::Failed {
                step: "SAVE_SESSION",
                message: e.reply_message(),
            }),
        }

        // Runs even if the save failed
        match self.client.check_achievements(summary).await {
            Ok(earned) if earned.is_empty() => {}
            Ok(earned) => outcomes.push(PersistenceOutcome::AchievementsEarned { earned }),
            Err(e) => outcomes.push(PersistenceOutcome::Failed {
                step: "CHECK_ACHIEVEMENTS",
                message: e.reply_message(),
            }),
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::{GameEvent, GameEventKind};
    use crate::game::session::GameOutcome;
    use crate::game::table::Difficulty;
    use crate::store::client::SERVER_OFFLINE;
    use crate::store::codec::{read_frame, write_json};
    use crate::store::protocol::Response;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    /// Fake persistence service answering each command by name
    async fn fake_service(reply: fn(&str) -> Response) -> (String, Arc<Mutex<Vec<Value>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_frame(&mut socket).await.unwrap();
                let request: Value = serde_json::from_slice(&request).unwrap();
                let command = request["command"].as_str().unwrap_or_default().to_string();
                log.lock().await.push(request);
                write_json(&mut socket, &reply(&command)).await.unwrap();
            }
        });

        (addr, seen)
    }

    fn summary() -> SessionSummary {
        SessionSummary {
            player_id: 3,
            difficulty: Difficulty::Easy,
            outcome: GameOutcome::TimeUp,
            score: 0.0,
            did_win: false,
            elapsed: 500.0,
            shots: 4,
            fouls: 0,
            events: vec![
                GameEvent::new(3, GameEventKind::Shot),
                GameEvent::new(3, GameEventKind::Foul),
            ],
        }
    }

    async fn collect(
        outcome_rx: &mut mpsc::UnboundedReceiver<PersistenceOutcome>,
        count: usize,
    ) -> Vec<PersistenceOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..count {
            let outcome = tokio::time::timeout(Duration::from_secs(5), outcome_rx.recv())
                .await
                .unwrap()
                .unwrap();
            outcomes.push(outcome);
        }
        outcomes
    }

    #[tokio::test]
    async fn finalize_saves_session_events_then_checks() {
        let (addr, seen) = fake_service(|command| match command {
            "SAVE_SESSION" => Response {
                session_id: Some(41),
                ..Response::success()
            },
            "CHECK_ACHIEVEMENTS" => Response {
                data: Some(json!([{"AchievementID": 5, "Name": "Marathon"}])),
                ..Response::success()
            },
            _ => Response::success(),
        })
        .await;

        let client = PersistenceClient::with_addr(addr, Duration::from_secs(2));
        let (handle, mut outcome_rx, _task) = PersistenceWorker::spawn(client);
        assert!(handle.enqueue(PersistenceJob::FinalizeSession(summary())));

        let outcomes = collect(&mut outcome_rx, 2).await;
        assert_eq!(
            outcomes,
            vec![
                PersistenceOutcome::SessionSaved {
                    session_id: Some(41)
                },
                PersistenceOutcome::AchievementsEarned {
                    earned: vec![EarnedAchievement {
                        id: 5,
                        name: "Marathon".to_string()
                    }]
                },
            ]
        );

        let seen = seen.lock().await;
        let commands: Vec<&str> = seen.iter().filter_map(|r| r["command"].as_str()).collect();
        assert_eq!(commands, ["SAVE_SESSION", "SAVE_EVENTS", "CHECK_ACHIEVEMENTS"]);
        assert_eq!(seen[1]["payload"]["session_id"], json!(41));
        assert_eq!(seen[1]["payload"]["events"][1], json!([3, null, "Cue Ball", "FOUL"]));
    }

    #[tokio::test]
    async fn events_skipped_without_session_id() {
        let (addr, seen) = fake_service(|_| Response::success()).await;

        let client = PersistenceClient::with_addr(addr, Duration::from_secs(2));
        let (handle, mut outcome_rx, task) = PersistenceWorker::spawn(client);
        handle.enqueue(PersistenceJob::FinalizeSession(summary()));
        drop(handle);

        let outcomes = collect(&mut outcome_rx, 1).await;
        assert_eq!(outcomes, vec![PersistenceOutcome::SessionSaved { session_id: None }]);

        // Dropping the last handle lets the worker drain and exit
        tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();

        let commands: Vec<String> = seen
            .lock()
            .await
            .iter()
            .filter_map(|r| r["command"].as_str().map(str::to_string))
            .collect();
        assert_eq!(commands, ["SAVE_SESSION", "CHECK_ACHIEVEMENTS"]);
    }

    #[tokio::test]
    async fn offline_service_reports_failures() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = PersistenceClient::with_addr(addr, Duration::from_secs(2));
        let (handle, mut outcome_rx, _task) = PersistenceWorker::spawn(client);
        handle.enqueue(PersistenceJob::GrantAchievement {
            player_id: 3,
            achievement: Achievement::FirstPot,
        });
        handle.enqueue(PersistenceJob::FinalizeSession(summary()));

        let outcomes = collect(&mut outcome_rx, 3).await;
        let offline = |step| PersistenceOutcome::Failed {
            step,
            message: SERVER_OFFLINE.to_string(),
        };
        assert_eq!(
            outcomes,
            vec![
                offline("GRANT_ACHIEVEMENT"),
                offline("SAVE_SESSION"),
                offline("CHECK_ACHIEVEMENTS"),
            ]
        );
    }

    #[tokio::test]
    async fn full_queue_drops_jobs() {
        let client = PersistenceClient::with_addr("127.0.0.1:9", Duration::from_millis(10));
        // Worker never runs, so the queue only fills
        let (_worker, handle, _outcome_rx) = PersistenceWorker::new(client);

        let job = PersistenceJob::GrantAchievement {
            player_id: 1,
            achievement: Achievement::Combo,
        };
        for _ in 0..JOB_QUEUE_CAPACITY {
            assert!(handle.enqueue(job.clone()));
        }
        assert!(!handle.enqueue(job));
    }
}
