//! Ball entities and the initial rack

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::table::Table;

pub const BALL_RADIUS: f32 = 20.0;
pub const CUE_BALL_ID: u8 = 0;
/// Capturing this ball ends the session
pub const MONEY_BALL_ID: u8 = 9;
pub const OBJECT_BALL_COUNT: usize = 9;

/// Where object balls are parked once potted
pub const POTTED_SENTINEL: Vec2 = Vec2::new(-5000.0, -5000.0);
/// Where the cue waits while a foul is being recovered
pub const CUE_FOUL_SENTINEL: Vec2 = Vec2::new(-1000.0, -1000.0);

const RACK_SPACING: f32 = 1.1;

/// Offsets from the rack anchor for balls 1..=9, before spacing.
const RACK_OFFSETS: [(f32, f32); OBJECT_BALL_COUNT] = [
    (-60.0, 0.0),
    (-20.0, 75.0),
    (20.0, 0.0),
    (-40.0, -37.0),
    (0.0, -37.0),
    (-20.0, -75.0),
    (-40.0, 37.0),
    (0.0, 37.0),
    (-20.0, 0.0),
];

/// Render color (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

const BALL_COLORS: [Rgb; OBJECT_BALL_COUNT + 1] = [
    Rgb(255, 255, 255), // cue
    Rgb(255, 255, 0),
    Rgb(0, 0, 255),
    Rgb(255, 0, 0),
    Rgb(128, 0, 128),
    Rgb(255, 165, 0),
    Rgb(0, 100, 0),
    Rgb(139, 69, 19),
    Rgb(0, 0, 0),
    Rgb(255, 192, 203),
];

/// A ball on (or parked off) the table
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub id: u8,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Visual spin angle in degrees
    pub rotation: f32,
    pub is_moving: bool,
    pub is_potted: bool,
    pub color: Rgb,
}

impl Ball {
    pub fn new(id: u8, position: Vec2) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            radius: BALL_RADIUS,
            rotation: 0.0,
            is_moving: false,
            is_potted: false,
            color: BALL_COLORS
                .get(id as usize)
                .copied()
                .unwrap_or(Rgb(255, 255, 255)),
        }
    }

    pub fn is_cue(&self) -> bool {
        self.id == CUE_BALL_ID
    }

    /// On the table and taking part in physics
    pub fn is_active(&self) -> bool {
        !self.is_potted
    }

    /// Name used in event logs
    pub fn label(&self) -> String {
        ball_label(self.id)
    }

    /// Park the ball off-table and stop it
    pub fn retire(&mut self, sentinel: Vec2) {
        self.is_potted = true;
        self.position = sentinel;
        self.velocity = Vec2::ZERO;
        self.is_moving = false;
    }

    /// Put a retired ball back at rest on the table
    pub fn place(&mut self, position: Vec2) {
        self.is_potted = false;
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.is_moving = false;
    }
}

pub fn ball_label(id: u8) -> String {
    if id == CUE_BALL_ID {
        "Cue Ball".to_string()
    } else {
        format!("Ball#{}", id)
    }
}

/// Cue ball at index 0 followed by balls 1..=9 in id order
pub fn rack(table: &Table) -> Vec<Ball> {
    let anchor = table.rack_anchor();
    let mut balls = Vec::with_capacity(OBJECT_BALL_COUNT + 1);
    balls.push(Ball::new(CUE_BALL_ID, table.cue_spawn()));

    for (idx, (dx, dy)) in RACK_OFFSETS.iter().enumerate() {
        let offset = Vec2::new(*dx, *dy) * RACK_SPACING;
        balls.push(Ball::new(idx as u8 + 1, anchor + offset));
    }

    balls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::table::Difficulty;

    #[test]
    fn rack_has_one_cue_and_nine_object_balls() {
        let table = Table::new(Difficulty::Medium);
        let balls = rack(&table);
        assert_eq!(balls.len(), 10);
        assert_eq!(balls.iter().filter(|b| b.is_cue()).count(), 1);
        for (idx, ball) in balls.iter().enumerate() {
            assert_eq!(ball.id as usize, idx);
            assert!(!ball.is_potted);
            assert_eq!(ball.radius, BALL_RADIUS);
        }
        assert_eq!(balls[0].position, table.cue_spawn());
    }

    #[test]
    fn rack_does_not_overlap_itself() {
        let table = Table::new(Difficulty::Medium);
        let balls = rack(&table);
        for i in 0..balls.len() {
            for j in (i + 1)..balls.len() {
                let dist = balls[i].position.distance(balls[j].position);
                assert!(
                    dist >= balls[i].radius + balls[j].radius,
                    "balls {} and {} overlap at rack time",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn labels_follow_log_format() {
        assert_eq!(ball_label(0), "Cue Ball");
        assert_eq!(ball_label(9), "Ball#9");
    }

    #[test]
    fn retire_parks_and_stops() {
        let mut ball = Ball::new(4, Vec2::new(500.0, 300.0));
        ball.velocity = Vec2::new(10.0, 0.0);
        ball.is_moving = true;
        ball.retire(POTTED_SENTINEL);
        assert!(ball.is_potted);
        assert_eq!(ball.position, POTTED_SENTINEL);
        assert_eq!(ball.velocity, Vec2::ZERO);
        assert!(!ball.is_moving);
    }
}
