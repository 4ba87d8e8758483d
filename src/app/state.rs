//! Engine context shared by the session loop and its helpers

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::game::scoring::AchievementTracker;
use crate::game::session::Session;
use crate::store::PersistenceClient;

/// Shared engine context
#[derive(Clone)]
pub struct EngineContext {
    pub config: Arc<Config>,
    pub persistence: PersistenceClient,
}

impl EngineContext {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let persistence = PersistenceClient::new(&config);

        Self {
            config,
            persistence,
        }
    }

    /// Achievements the player already holds. An unreachable service means
    /// starting from an empty set, so they may be awarded again this session.
    pub async fn load_achievements(&self) -> AchievementTracker {
        match self.persistence.get_achievements(self.config.player_id).await {
            Ok(ids) => {
                info!(player_id = self.config.player_id, count = ids.len(), "Loaded achievements");
                AchievementTracker::new(ids)
            }
            Err(e) => {
                warn!(player_id = self.config.player_id, error = %e, "Could not load achievements");
                AchievementTracker::default()
            }
        }
    }

    /// Fresh session for the configured player and difficulty
    pub async fn new_session(&self) -> Session {
        let achievements = self.load_achievements().await;
        Session::new(self.config.player_id, self.config.difficulty, achievements)
    }
}
