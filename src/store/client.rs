//! Persistence service client: one TCP connection per request

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::config::Config;
use crate::game::events::{GameEvent, PlayerId};
use crate::game::scoring::Achievement;
use crate::game::session::SessionSummary;

use super::codec::{read_json, write_json};
use super::protocol::{achievement_ids, Command, EarnedAchievement, Response, SessionId};

/// Reply message used whenever the service cannot be reached in time
pub const SERVER_OFFLINE: &str = "Server Offline";
/// Reply message used when the service answers with something unparseable
pub const MALFORMED_RESPONSE: &str = "Malformed response";

/// Client for the persistence service
#[derive(Clone, Debug)]
pub struct PersistenceClient {
    addr: String,
    timeout: Duration,
}

impl PersistenceClient {
    pub fn new(config: &Config) -> Self {
        Self::with_addr(config.persistence_addr.to_string(), config.persistence_timeout)
    }

    pub fn with_addr(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send one command and wait for its reply, bounded by the client timeout
    pub async fn try_call(&self, command: &Command) -> Result<Response, PersistenceError> {
        let exchange = async {
            let mut stream = TcpStream::connect(&self.addr)
                .await
                .map_err(PersistenceError::Connect)?;
            write_json(&mut stream, command).await?;
            read_json::<_, Response>(&mut stream).await
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| PersistenceError::Timeout(self.timeout))?
    }

    /// Send one command. Transport and decode failures come back as an
    /// error-status response rather than an `Err`.
    pub async fn call(&self, command: &Command) -> Response {
        match self.try_call(command).await {
            Ok(response) => {
                debug!(
                    command = command.name(),
                    status = ?response.status,
                    "Persistence reply"
                );
                response
            }
            Err(e) => {
                warn!(command = command.name(), addr = %self.addr, error = %e, "Persistence call failed");
                Response::error(e.reply_message())
            }
        }
    }

    async fn call_ok(&self, command: Command) -> Result<Response, PersistenceError> {
        let response = self.call(&command).await;
        if response.is_success() {
            Ok(response)
        } else {
            Err(PersistenceError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| format!("{} failed", command.name())),
            ))
        }
    }

    /// Store a finished session; returns the session id if the service assigned one
    pub async fn save_session(
        &self,
        summary: &SessionSummary,
    ) -> Result<Option<SessionId>, PersistenceError> {
        let response = self
            .call_ok(Command::SaveSession {
                pid: summary.player_id,
                diff: summary.difficulty.id(),
                score: summary.score,
                win: summary.did_win,
            })
            .await?;
        Ok(response.session_id)
    }

    pub async fn save_events(
        &self,
        session_id: SessionId,
        events: &[GameEvent],
    ) -> Result<(), PersistenceError> {
        self.call_ok(Command::SaveEvents {
            session_id,
            events: events.to_vec(),
        })
        .await
        .map(|_| ())
    }

    pub async fn grant_achievement(
        &self,
        player_id: PlayerId,
        achievement: Achievement,
    ) -> Result<(), PersistenceError> {
        self.call_ok(Command::GrantAchievement {
            player_id,
            achievement_id: achievement.id(),
        })
        .await
        .map(|_| ())
    }

    /// Ids of achievements the player already holds
    pub async fn get_achievements(&self, player_id: PlayerId) -> Result<Vec<u32>, PersistenceError> {
        let response = self.call_ok(Command::GetAchievements { player_id }).await?;
        Ok(response.data.as_ref().map(achievement_ids).unwrap_or_default())
    }

    /// Ask the service which end-of-session achievements were newly earned
    pub async fn check_achievements(
        &self,
        summary: &SessionSummary,
    ) -> Result<Vec<EarnedAchievement>, PersistenceError> {
        let response = self
            .call_ok(Command::CheckAchievements {
                pid: summary.player_id,
                diff: summary.difficulty.id(),
                timer: summary.elapsed,
                shots: summary.shots,
                fouls: summary.fouls,
                win: summary.did_win,
            })
            .await?;

        match response.data {
            Some(data) => serde_json::from_value(data).map_err(PersistenceError::Decode),
            None => Ok(Vec::new()),
        }
    }
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Connect failed: {0}")]
    Connect(std::io::Error),

    #[error("No reply within {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode request: {0}")]
    Encode(serde_json::Error),

    #[error("Failed to decode reply: {0}")]
    Decode(serde_json::Error),

    #[error("Frame of {0} bytes exceeds limit")]
    FrameTooLarge(usize),

    #[error("Rejected: {0}")]
    Rejected(String),
}

impl PersistenceError {
    /// Message placed in the error response returned by [`PersistenceClient::call`]
    pub fn reply_message(&self) -> String {
        match self {
            PersistenceError::Connect(_) | PersistenceError::Timeout(_) => SERVER_OFFLINE.to_string(),
            PersistenceError::Decode(_) => MALFORMED_RESPONSE.to_string(),
            other => other.to_string(),
        }
    }
}
