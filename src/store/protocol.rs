//! Persistence service request/response types
//! Requests are `{"command": ..., "payload": {...}}`, responses carry a status

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game::events::{GameEvent, PlayerId};

/// Session id assigned by the persistence service
pub type SessionId = i64;

/// Commands the engine sends to the persistence service
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "command",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum Command {
    /// Store the session result; replies with `session_id`
    SaveSession {
        pid: PlayerId,
        diff: u8,
        score: f32,
        win: bool,
    },

    /// Store the event log of a saved session
    SaveEvents {
        session_id: SessionId,
        events: Vec<GameEvent>,
    },

    GrantAchievement {
        player_id: PlayerId,
        achievement_id: u32,
    },

    /// Replies with the ids the player already holds
    GetAchievements { player_id: PlayerId },

    /// Let the service award end-of-session achievements; replies with the
    /// newly earned ones
    CheckAchievements {
        pid: PlayerId,
        diff: u8,
        timer: f32,
        shots: u32,
        fouls: u32,
        win: bool,
    },
}

impl Command {
    /// Wire name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::SaveSession { .. } => "SAVE_SESSION",
            Command::SaveEvents { .. } => "SAVE_EVENTS",
            Command::GrantAchievement { .. } => "GRANT_ACHIEVEMENT",
            Command::GetAchievements { .. } => "GET_ACHIEVEMENTS",
            Command::CheckAchievements { .. } => "CHECK_ACHIEVEMENTS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Reply from the persistence service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl Response {
    #[cfg(test)]
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            message: None,
            data: None,
            session_id: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            data: None,
            session_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Achievement row returned by `CHECK_ACHIEVEMENTS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedAchievement {
    #[serde(rename = "AchievementID")]
    pub id: u32,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Achievement ids from a `GET_ACHIEVEMENTS` reply. The service may send
/// bare ids or single-column rows (`[[8], [7]]`); anything else is skipped.
pub fn achievement_ids(data: &Value) -> Vec<u32> {
    let Some(rows) = data.as_array() else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| match row {
            Value::Array(cols) => cols.first().and_then(Value::as_u64),
            other => other.as_u64(),
        })
        .filter_map(|id| u32::try_from(id).ok())
        .collect()
}
