//! UI protocol message definitions
//! These are the wire types exchanged with the renderer, one JSON object per line

use serde::{Deserialize, Serialize};

use crate::game::ball::Rgb;
use crate::game::popup::Popup;
use crate::game::session::{GameOutcome, ShotPhase};
use crate::game::table::AimGuide;

/// Messages sent from the renderer to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Mouse button pressed: start aiming
    Press,

    /// Mouse button released at a table position: shoot
    Release {
        x: f32,
        y: f32,
    },

    /// Leave the session
    Quit,
}

/// Messages sent from the engine to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Table state for one frame
    Frame(FrameSnapshot),

    /// Session has ended
    GameOver {
        ending: Ending,
        score: f32,
        shots: u32,
        fouls: u32,
        elapsed: f32,
    },

    /// Non-fatal problem worth showing (persistence failures etc.)
    Notice {
        message: String,
    },
}

/// How a session ended, as shown on the game-over screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    Won,
    TimeUp,
    EarlyMoneyBall,
}

impl From<GameOutcome> for Ending {
    fn from(outcome: GameOutcome) -> Self {
        match outcome {
            GameOutcome::Won { .. } => Ending::Won,
            GameOutcome::TimeUp => Ending::TimeUp,
            GameOutcome::EarlyMoneyBall => Ending::EarlyMoneyBall,
        }
    }
}

/// Everything the renderer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub phase: ShotPhase,
    /// Seconds left on the countdown
    pub remaining: f32,
    pub shots: u32,
    pub fouls: u32,
    pub aim_guide: AimGuide,
    pub balls: Vec<BallSnapshot>,
    /// Head of the achievement popup queue
    pub popup: Option<Popup>,
    pub show_foul: bool,
    /// Play the collision sound
    pub collided: bool,
    /// Play the pocket sound
    pub potted: bool,
}

/// Ball state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub id: u8,
    /// Position X
    pub x: f32,
    /// Position Y
    pub y: f32,
    /// Visual spin in degrees
    pub rotation: f32,
    pub is_moving: bool,
    pub is_potted: bool,
    pub color: Rgb,
}
