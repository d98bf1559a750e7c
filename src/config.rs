use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::ai::Difficulty;
use crate::ai::search::SearchLimits;
use crate::board::{DEFAULT_SIZE, MAX_SIZE, MIN_SIZE};
use crate::error::ConfigError;

/// Game and engine settings, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub username: String,
    pub difficulty: Difficulty,
    pub board_size: usize,
    /// Soft time budget for the iterative-deepening search.
    pub think_time_secs: f64,
    pub minimax_depth: u8,
    pub start_depth: u8,
    pub max_depth: u8,
    /// Consecutive malformed lines tolerated before a forfeit.
    pub resend_limit: u8,
    /// Socket read deadline when the remote side is a computer.
    pub ai_read_timeout_secs: u64,
    /// Socket read deadline when the remote side is a person.
    pub human_read_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            username: "Player".to_string(),
            difficulty: Difficulty::default(),
            board_size: DEFAULT_SIZE,
            think_time_secs: 4.95,
            minimax_depth: 4,
            start_depth: 3,
            max_depth: 25,
            resend_limit: 2,
            ai_read_timeout_secs: 5,
            human_read_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.board_size) || self.board_size % 2 != 0 {
            return Err(ConfigError::Validation(format!(
                "board_size must be even and in {MIN_SIZE}..={MAX_SIZE}"
            )));
        }
        if !self.think_time_secs.is_finite() || self.think_time_secs <= 0.0 {
            return Err(ConfigError::Validation(
                "think_time_secs must be > 0".into(),
            ));
        }
        if self.minimax_depth == 0 {
            return Err(ConfigError::Validation(
                "minimax_depth must be > 0".into(),
            ));
        }
        if self.start_depth == 0 || self.start_depth > self.max_depth {
            return Err(ConfigError::Validation(
                "start_depth must be in 1..=max_depth".into(),
            ));
        }
        Ok(())
    }

    pub fn think_time(&self) -> Duration {
        Duration::from_secs_f64(self.think_time_secs)
    }

    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            minimax_depth: self.minimax_depth,
            start_depth: self.start_depth,
            max_depth: self.max_depth,
            think_time: Some(self.think_time()),
        }
    }

    /// Read deadline for the remote side's replies.
    pub fn read_timeout(&self, remote_is_ai: bool) -> Duration {
        Duration::from_secs(if remote_is_ai {
            self.ai_read_timeout_secs
        } else {
            self.human_read_timeout_secs
        })
    }
}
