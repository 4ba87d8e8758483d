//! Final score, combo detection and session achievements

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::events::{GameEvent, GameEventKind, PlayerId};
use super::table::Difficulty;

/// Balls a single shot must capture to count as a combo
pub const COMBO_MIN_BALLS: u32 = 2;

/// Achievements the frame loop can award on its own. Everything else is
/// decided by the collaborator at session end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Achievement {
    FirstPot,
    Combo,
}

impl Achievement {
    /// `Achievement` table id
    pub fn id(self) -> u32 {
        match self {
            Achievement::FirstPot => 8,
            Achievement::Combo => 7,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstPot => "First Potter!",
            Achievement::Combo => "Combo Shot!",
        }
    }
}

/// Achievements the player already holds, so each is granted at most once
#[derive(Debug, Clone, Default)]
pub struct AchievementTracker {
    earned: HashSet<u32>,
}

impl AchievementTracker {
    pub fn new(earned: impl IntoIterator<Item = u32>) -> Self {
        Self {
            earned: earned.into_iter().collect(),
        }
    }

    #[cfg(test)]
    pub fn has(&self, achievement: Achievement) -> bool {
        self.earned.contains(&achievement.id())
    }

    /// Record the achievement; true only the first time
    pub fn grant(&mut self, achievement: Achievement) -> bool {
        self.earned.insert(achievement.id())
    }
}

/// Score for a won session, floored at zero. Lost sessions score zero.
pub fn final_score(difficulty: Difficulty, elapsed: f32, shots: u32) -> f32 {
    let limit = difficulty.time_limit();
    let time_bonus = (limit - elapsed) / limit * 200.0;
    let raw = (time_bonus - shots as f32 + 100.0) * difficulty.score_factor();
    raw.max(0.0)
}

/// What settling a shot produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettleOutcome {
    pub combo: Option<GameEvent>,
    pub granted: Vec<Achievement>,
}

/// Evaluate a shot once every ball has stopped. `potted` is the number of
/// balls that shot captured.
pub fn settle_shot(
    player_id: PlayerId,
    potted: u32,
    tracker: &mut AchievementTracker,
) -> SettleOutcome {
    let mut outcome = SettleOutcome::default();
    if potted == 0 {
        return outcome;
    }

    if tracker.grant(Achievement::FirstPot) {
        outcome.granted.push(Achievement::FirstPot);
    }

    if potted >= COMBO_MIN_BALLS {
        outcome.combo = Some(GameEvent::new(
            player_id,
            GameEventKind::Combo { balls: potted },
        ));
        if tracker.grant(Achievement::Combo) {
            outcome.granted.push(Achievement::Combo);
        }
    }

    outcome
}
