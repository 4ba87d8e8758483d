//! Table geometry: play rectangle, pockets and difficulty tuning

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Virtual viewport the table is laid out in
pub const VIEWPORT_WIDTH: f32 = 1200.0;
pub const VIEWPORT_HEIGHT: f32 = 650.0;
pub const RAIL_THICKNESS: f32 = 50.0;

pub const BASE_POCKET_RADIUS: f32 = 30.0;
/// Rail reflection is suppressed inside this distance of any pocket center.
/// Independent of the capture radius.
pub const NEAR_POCKET_DISTANCE: f32 = 50.0;
/// Side pockets sit slightly outside the rail line
const SIDE_POCKET_SHIFT: f32 = 5.0;

/// Difficulty level selected before a session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// How much aiming help the renderer draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AimGuide {
    /// Aim line plus ghost ball
    Full,
    /// Aim line only
    Line,
    None,
}

impl Difficulty {
    /// Persistence id (`DifficultyLevel` table)
    pub fn id(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    /// Accepts either the numeric id or the level name
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "easy" => Some(Difficulty::Easy),
            "2" | "medium" => Some(Difficulty::Medium),
            "3" | "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Session countdown in seconds
    pub fn time_limit(self) -> f32 {
        match self {
            Difficulty::Easy => 500.0,
            Difficulty::Medium => 400.0,
            Difficulty::Hard => 300.0,
        }
    }

    /// Score multiplier for a won session
    pub fn score_factor(self) -> f32 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.35,
            Difficulty::Hard => 1.75,
        }
    }

    /// Listed pocket radius adjustment for this level
    pub fn pocket_radius_delta(self) -> f32 {
        match self {
            Difficulty::Easy => 5.0,
            Difficulty::Medium => 0.0,
            Difficulty::Hard => -5.0,
        }
    }

    /// Effective capture radius. Only the easy table gets its adjustment;
    /// medium and hard play on the base radius.
    pub fn pocket_radius(self) -> f32 {
        match self {
            Difficulty::Easy => BASE_POCKET_RADIUS + self.pocket_radius_delta(),
            Difficulty::Medium | Difficulty::Hard => BASE_POCKET_RADIUS,
        }
    }

    pub fn aim_guide(self) -> AimGuide {
        match self {
            Difficulty::Easy => AimGuide::Full,
            Difficulty::Medium => AimGuide::Line,
            Difficulty::Hard => AimGuide::None,
        }
    }
}

/// A pocket on the table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    /// 1-based pocket id as stored in event logs
    pub id: u8,
    pub center: Vec2,
    pub radius: f32,
}

/// Play rectangle (inside the rails) and pockets
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub pockets: Vec<Pocket>,
}

impl Table {
    /// Standard table for the default viewport
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_viewport(VIEWPORT_WIDTH, VIEWPORT_HEIGHT, difficulty)
    }

    pub fn with_viewport(width: f32, height: f32, difficulty: Difficulty) -> Self {
        // The HUD takes the left quarter of the viewport
        let left = width / 4.0 + RAIL_THICKNESS;
        let right = width - RAIL_THICKNESS;
        let top = RAIL_THICKNESS;
        let bottom = height - RAIL_THICKNESS;
        let mid_x = left + (right - left) / 2.0;
        let radius = difficulty.pocket_radius();

        let centers = [
            Vec2::new(left, top),
            Vec2::new(mid_x, top - SIDE_POCKET_SHIFT),
            Vec2::new(right, top),
            Vec2::new(left, bottom),
            Vec2::new(mid_x, bottom + SIDE_POCKET_SHIFT),
            Vec2::new(right, bottom),
        ];

        let pockets = centers
            .iter()
            .enumerate()
            .map(|(idx, &center)| Pocket {
                id: idx as u8 + 1,
                center,
                radius,
            })
            .collect();

        Self {
            left,
            right,
            top,
            bottom,
            pockets,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Anchor the object-ball rack is laid out around
    pub fn rack_anchor(&self) -> Vec2 {
        Vec2::new(
            self.left + self.width() * 0.75,
            self.top + self.height() / 2.0,
        )
    }

    /// Where the cue ball starts and respawns after a foul
    pub fn cue_spawn(&self) -> Vec2 {
        Vec2::new(
            self.left + self.width() * 0.25,
            self.top + self.height() / 2.0,
        )
    }

    /// True if the ball center is close enough to a pocket that rails
    /// should not bounce it
    pub fn is_near_pocket(&self, position: Vec2, _radius: f32) -> bool {
        self.pockets
            .iter()
            .any(|p| position.distance(p.center) < NEAR_POCKET_DISTANCE)
    }

    /// First pocket whose capture circle overlaps the ball
    pub fn capturing_pocket(&self, position: Vec2, radius: f32) -> Option<&Pocket> {
        self.pockets
            .iter()
            .find(|p| position.distance(p.center) < p.radius + radius)
    }
}
