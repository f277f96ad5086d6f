//! error.rs — Error types for the simulator
//!
//! Three tiers:
//! - `SimError`: fatal, stops the tick loop (non-finite physics state)
//! - `ConfigError`: bad config file or override, config left untouched
//! - `CommandError`: manual-command rejection, returned as `{code, message}`

use serde::Serialize;
use thiserror::Error;

use crate::boat::BoatState;

#[derive(Debug, Error)]
pub enum SimError {
    /// NaN or Infinity in position, velocity, acceleration or heading.
    #[error("non-finite {quantity} after tick {iteration} (boat: {boat:?})")]
    NonFinite {
        quantity: &'static str,
        iteration: u64,
        boat: Box<BoatState>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable codes for manual-command rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    InvalidThrottle,
    InvalidDirection,
    NoAnchor,
    InvalidPosition,
    InvalidConfig,
    SimulationStopped,
}

/// Structured rejection of a manual command. Never stops the simulation.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{code:?}: {message}")]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        Self::new(CommandErrorCode::InvalidConfig, e.to_string())
    }
}
