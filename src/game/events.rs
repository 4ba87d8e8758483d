//! Domain events logged during a session and persisted at its end

use serde::{Deserialize, Serialize, Serializer};

/// Player id as issued by the account service
pub type PlayerId = i64;

/// Event type column of the persisted log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Shot,
    Potted,
    Foul,
    Combo,
}

/// What happened, with only the fields that kind carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEventKind {
    /// Cue released
    Shot,
    /// Object ball captured
    Potted { pocket_id: u8, ball_label: String },
    /// Cue ball captured
    Foul,
    /// Two or more balls captured by one shot
    Combo { balls: u32 },
}

/// One entry of the session event log, in frame order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEvent {
    pub player_id: PlayerId,
    pub kind: GameEventKind,
}

/// Wire row: `[playerId, pocketId|null, ballLabel|null, eventType]`
pub type EventRow = (PlayerId, Option<u8>, Option<String>, EventType);

impl GameEvent {
    pub fn new(player_id: PlayerId, kind: GameEventKind) -> Self {
        Self { player_id, kind }
    }

    pub fn event_type(&self) -> EventType {
        match self.kind {
            GameEventKind::Shot => EventType::Shot,
            GameEventKind::Potted { .. } => EventType::Potted,
            GameEventKind::Foul => EventType::Foul,
            GameEventKind::Combo { .. } => EventType::Combo,
        }
    }

    pub fn pocket_id(&self) -> Option<u8> {
        match self.kind {
            GameEventKind::Potted { pocket_id, .. } => Some(pocket_id),
            _ => None,
        }
    }

    pub fn ball_label(&self) -> Option<String> {
        match &self.kind {
            GameEventKind::Shot => None,
            GameEventKind::Potted { ball_label, .. } => Some(ball_label.clone()),
            GameEventKind::Foul => Some("Cue Ball".to_string()),
            GameEventKind::Combo { balls } => Some(combo_label(*balls)),
        }
    }

    pub fn to_row(&self) -> EventRow {
        (
            self.player_id,
            self.pocket_id(),
            self.ball_label(),
            self.event_type(),
        )
    }
}

impl Serialize for GameEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_row().serialize(serializer)
    }
}

pub fn combo_label(balls: u32) -> String {
    format!("{} Ball Combo", balls)
}
