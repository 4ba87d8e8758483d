//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::game::events::PlayerId;
use crate::game::table::Difficulty;

const DEFAULT_PERSISTENCE_ADDR: &str = "127.0.0.1:65432";
const DEFAULT_PERSISTENCE_TIMEOUT_MS: u64 = 3000;

/// Engine configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Persistence service address
    pub persistence_addr: SocketAddr,
    /// Per-call timeout for persistence requests
    pub persistence_timeout: Duration,

    /// Authenticated player; login happens outside the engine
    pub player_id: PlayerId,
    pub difficulty: Difficulty,

    /// Frames between renderer snapshots
    pub snapshot_interval: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let persistence_addr = lookup("PERSISTENCE_ADDR")
            .unwrap_or_else(|| DEFAULT_PERSISTENCE_ADDR.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddress)?;

        let persistence_timeout = match lookup("PERSISTENCE_TIMEOUT_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::Invalid {
                    var: "PERSISTENCE_TIMEOUT_MS",
                    value,
                })?,
            None => DEFAULT_PERSISTENCE_TIMEOUT_MS,
        };

        let player_id = {
            let value = lookup("PLAYER_ID").ok_or(ConfigError::Missing("PLAYER_ID"))?;
            value.trim().parse::<PlayerId>().map_err(|_| ConfigError::Invalid {
                var: "PLAYER_ID",
                value,
            })?
        };

        let difficulty = match lookup("DIFFICULTY") {
            Some(value) => Difficulty::parse(&value).ok_or(ConfigError::Invalid {
                var: "DIFFICULTY",
                value,
            })?,
            None => Difficulty::Easy,
        };

        let snapshot_interval = match lookup("SNAPSHOT_INTERVAL") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    var: "SNAPSHOT_INTERVAL",
                    value,
                })?,
            None => 1,
        };

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            persistence_addr,
            persistence_timeout: Duration::from_millis(persistence_timeout),
            player_id,
            difficulty,
            snapshot_interval,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid persistence address format")]
    InvalidAddress,
}
