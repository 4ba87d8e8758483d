//! Shot lifecycle and session outcome
//!
//! A [`Session`] is stepped once per frame with the UI's input and the frame
//! delta. Each step runs, in order: foul recovery, aim input, motion, rails,
//! ball contacts, pocket captures, the elapsed timer, shot settling and the
//! money-ball check. Everything is synchronous; the step never blocks.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ball::{rack, Ball, MONEY_BALL_ID};
use super::capture::{Capture, CaptureDetector, SpawnSearch, FOUL_TIME_PENALTY};
use super::events::{GameEvent, GameEventKind, PlayerId};
use super::physics::PhysicsSystem;
use super::popup::{FoulBanner, PopupQueue};
use super::scoring::{final_score, settle_shot, Achievement, AchievementTracker};
use super::table::{Difficulty, Table};

/// Cue speed per unit of drag distance
pub const POWER_CONSTANT: f32 = 2.5;

/// Where the shot lifecycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotPhase {
    /// Waiting for the player to start aiming
    Idle,
    /// Drag in progress
    Aiming,
    /// Cue released, balls may be moving
    InFlight,
    /// Cue pocketed, waiting for the table to stop before respawning it
    FoulRecovery,
    GameOver,
}

/// How the session ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameOutcome {
    Won { score: f32 },
    TimeUp,
    /// Money ball dropped before the rest of the rack
    EarlyMoneyBall,
}

impl GameOutcome {
    pub fn score(&self) -> f32 {
        match self {
            GameOutcome::Won { score } => *score,
            GameOutcome::TimeUp | GameOutcome::EarlyMoneyBall => 0.0,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, GameOutcome::Won { .. })
    }
}

/// Counters and flags for the running session
#[derive(Debug, Clone, PartialEq)]
pub struct ShotState {
    pub phase: ShotPhase,
    /// Seconds consumed, including foul penalties
    pub elapsed: f32,
    pub shots: u32,
    pub fouls: u32,
    pub potted_this_shot: u32,
    pub total_potted: u32,
    pub did_win: bool,
    pub game_over: bool,
    pub score: f32,
    pub outcome: Option<GameOutcome>,
}

impl Default for ShotState {
    fn default() -> Self {
        Self {
            phase: ShotPhase::Idle,
            elapsed: 0.0,
            shots: 0,
            fouls: 0,
            potted_this_shot: 0,
            total_potted: 0,
            did_win: false,
            game_over: false,
            score: 0.0,
            outcome: None,
        }
    }
}

/// Input for a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Seconds since the previous frame
    pub dt: f32,
    pub aim_pressed: bool,
    pub aim_released: bool,
    /// Pointer position at release, in table coordinates
    pub release_point: Vec2,
}

impl FrameInput {
    pub fn idle(dt: f32) -> Self {
        Self {
            dt,
            aim_pressed: false,
            aim_released: false,
            release_point: Vec2::ZERO,
        }
    }

    #[cfg(test)]
    pub fn press(dt: f32) -> Self {
        Self {
            aim_pressed: true,
            ..Self::idle(dt)
        }
    }

    #[cfg(test)]
    pub fn release(dt: f32, point: Vec2) -> Self {
        Self {
            aim_released: true,
            release_point: point,
            ..Self::idle(dt)
        }
    }
}

/// Everything handed to the persistence collaborator when a session ends
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub player_id: PlayerId,
    pub difficulty: Difficulty,
    pub outcome: GameOutcome,
    pub score: f32,
    pub did_win: bool,
    pub elapsed: f32,
    pub shots: u32,
    pub fouls: u32,
    pub events: Vec<GameEvent>,
}

/// What one frame produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Events appended to the log this frame
    pub events: Vec<GameEvent>,
    /// Achievements earned this frame, to be granted by the collaborator
    pub granted: Vec<Achievement>,
    /// Set on the frame the session ends
    pub finished: Option<SessionSummary>,
    /// A ball touched a rail or another ball this frame
    pub collided: bool,
    /// A ball, the cue included, dropped into a pocket this frame
    pub potted: bool,
}

/// A single-player session on one table
pub struct Session {
    pub player_id: PlayerId,
    pub difficulty: Difficulty,
    pub table: Table,
    /// Cue at index 0, then balls 1..=9
    pub balls: Vec<Ball>,
    pub state: ShotState,
    pub events: Vec<GameEvent>,
    pub achievements: AchievementTracker,
    pub popups: PopupQueue,
    pub foul_banner: FoulBanner,
    pub frame: u64,
    /// Result of the most recent cue respawn
    pub last_spawn: Option<SpawnSearch>,
    /// Sound cues from the latest frame
    pub collided_this_frame: bool,
    pub potted_this_frame: bool,
}

impl Session {
    pub fn new(player_id: PlayerId, difficulty: Difficulty, achievements: AchievementTracker) -> Self {
        let table = Table::new(difficulty);
        let balls = rack(&table);

        info!(player_id, ?difficulty, "Session created");

        Self {
            player_id,
            difficulty,
            table,
            balls,
            state: ShotState::default(),
            events: Vec::new(),
            achievements,
            popups: PopupQueue::default(),
            foul_banner: FoulBanner::default(),
            frame: 0,
            last_spawn: None,
            collided_this_frame: false,
            potted_this_frame: false,
        }
    }

    pub fn cue(&self) -> &Ball {
        &self.balls[0]
    }

    pub fn object_balls(&self) -> &[Ball] {
        &self.balls[1..]
    }

    /// Seconds left on the countdown
    pub fn remaining(&self) -> f32 {
        (self.difficulty.time_limit() - self.state.elapsed).max(0.0)
    }

    /// Every ball on the table is at rest. A pocketed cue counts as at rest.
    pub fn all_stopped(&self) -> bool {
        self.balls.iter().all(|b| !b.is_moving)
    }

    /// Queue a notice for the renderer (collaborator results, etc.)
    pub fn push_popup(&mut self, text: impl Into<String>) {
        self.popups.push(text);
    }

    /// Advance the session by one frame
    pub fn step(&mut self, input: &FrameInput) -> FrameReport {
        self.frame += 1;
        self.popups.advance();
        self.foul_banner.advance();
        self.collided_this_frame = false;
        self.potted_this_frame = false;

        let mut report = FrameReport::default();
        if self.state.phase == ShotPhase::GameOver {
            return report;
        }

        self.recover_from_foul();
        self.handle_input(input, &mut report);
        self.simulate(input.dt, &mut report);

        let mut outcome = self.advance_timer(input.dt);
        self.settle(&mut report);

        if outcome.is_none() {
            outcome = self.check_money_ball();
        }

        if let Some(outcome) = outcome {
            report.finished = Some(self.finish(outcome));
        }

        report
    }

    fn recover_from_foul(&mut self) {
        if self.state.phase != ShotPhase::FoulRecovery {
            return;
        }
        if self.object_balls().iter().any(|b| b.is_moving) {
            return;
        }

        let search = CaptureDetector::safe_spawn(
            self.table.cue_spawn(),
            self.cue().radius,
            self.object_balls(),
        );
        self.balls[0].place(search.position);
        self.last_spawn = Some(search);
        self.state.phase = ShotPhase::Idle;

        debug!(
            x = search.position.x,
            y = search.position.y,
            attempts = search.attempts,
            exhausted = search.exhausted(),
            "Cue respawned"
        );
    }

    fn handle_input(&mut self, input: &FrameInput, report: &mut FrameReport) {
        if input.aim_pressed && self.state.phase == ShotPhase::Idle && !self.cue().is_moving {
            self.state.phase = ShotPhase::Aiming;
            self.state.potted_this_shot = 0;
        }

        if input.aim_released && self.state.phase == ShotPhase::Aiming {
            let cue = &mut self.balls[0];
            cue.velocity = (cue.position - input.release_point) * POWER_CONSTANT;
            cue.is_moving = true;

            self.state.shots += 1;
            self.state.phase = ShotPhase::InFlight;
            self.log(GameEventKind::Shot, report);

            debug!(
                shot = self.state.shots,
                vx = self.balls[0].velocity.x,
                vy = self.balls[0].velocity.y,
                "Shot released"
            );
        }
    }

    fn simulate(&mut self, dt: f32, report: &mut FrameReport) {
        let mut rail_hit = false;
        for ball in self.balls.iter_mut() {
            PhysicsSystem::integrate(ball, dt, &self.table);
            rail_hit |= PhysicsSystem::bounce_rails(ball, &self.table);
        }

        let contacts = PhysicsSystem::resolve_ball_contacts(&mut self.balls);
        report.collided = rail_hit || contacts > 0;

        for capture in CaptureDetector::detect(&mut self.balls, &self.table) {
            report.potted = true;
            match capture {
                Capture::Potted {
                    ball_id,
                    pocket_id,
                    ball_label,
                } => {
                    self.state.potted_this_shot += 1;
                    self.state.total_potted += 1;
                    debug!(ball = ball_id, pocket = pocket_id, "Ball potted");
                    self.log(
                        GameEventKind::Potted {
                            pocket_id,
                            ball_label,
                        },
                        report,
                    );
                }
                Capture::Foul { pocket_id } => {
                    self.state.phase = ShotPhase::FoulRecovery;
                    self.state.elapsed += FOUL_TIME_PENALTY;
                    self.state.fouls += 1;
                    self.foul_banner.show();
                    info!(
                        player_id = self.player_id,
                        pocket = pocket_id,
                        fouls = self.state.fouls,
                        "Foul: cue ball pocketed"
                    );
                    self.log(GameEventKind::Foul, report);
                }
            }
        }

        self.collided_this_frame = report.collided;
        self.potted_this_frame = report.potted;
    }

    /// The countdown only runs once the first shot is taken
    fn advance_timer(&mut self, dt: f32) -> Option<GameOutcome> {
        if self.state.shots > 0 {
            self.state.elapsed += dt;
        }

        if self.state.elapsed >= self.difficulty.time_limit() {
            Some(GameOutcome::TimeUp)
        } else {
            None
        }
    }

    fn settle(&mut self, report: &mut FrameReport) {
        if !self.all_stopped() {
            return;
        }

        if self.state.shots > 0 && self.state.potted_this_shot > 0 {
            let outcome = settle_shot(
                self.player_id,
                self.state.potted_this_shot,
                &mut self.achievements,
            );
            if let Some(combo) = outcome.combo {
                debug!(balls = self.state.potted_this_shot, "Combo shot");
                self.events.push(combo.clone());
                report.events.push(combo);
            }
            for achievement in outcome.granted {
                self.popups.push(achievement.title());
                report.granted.push(achievement);
            }
            self.state.potted_this_shot = 0;
        }

        if self.state.phase == ShotPhase::InFlight {
            self.state.phase = ShotPhase::Idle;
        }
    }

    fn check_money_ball(&self) -> Option<GameOutcome> {
        let money_potted = self
            .object_balls()
            .iter()
            .any(|b| b.id == MONEY_BALL_ID && b.is_potted);
        if !money_potted {
            return None;
        }

        let rest_cleared = self
            .object_balls()
            .iter()
            .filter(|b| b.id != MONEY_BALL_ID)
            .all(|b| b.is_potted);

        if rest_cleared {
            Some(GameOutcome::Won {
                score: final_score(self.difficulty, self.state.elapsed, self.state.shots),
            })
        } else {
            Some(GameOutcome::EarlyMoneyBall)
        }
    }

    fn finish(&mut self, outcome: GameOutcome) -> SessionSummary {
        self.state.phase = ShotPhase::GameOver;
        self.state.game_over = true;
        self.state.did_win = outcome.is_win();
        self.state.score = outcome.score();
        self.state.outcome = Some(outcome);

        info!(
            player_id = self.player_id,
            ?outcome,
            elapsed = self.state.elapsed,
            shots = self.state.shots,
            fouls = self.state.fouls,
            "Session over"
        );

        SessionSummary {
            player_id: self.player_id,
            difficulty: self.difficulty,
            outcome,
            score: self.state.score,
            did_win: self.state.did_win,
            elapsed: self.state.elapsed,
            shots: self.state.shots,
            fouls: self.state.fouls,
            events: self.events.clone(),
        }
    }

    fn log(&mut self, kind: GameEventKind, report: &mut FrameReport) {
        let event = GameEvent::new(self.player_id, kind);
        self.events.push(event.clone());
        report.events.push(event);
    }
}
