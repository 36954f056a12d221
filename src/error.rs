//! Error types shared across the crate

use thiserror::Error;

use crate::state::TimerPhase;

/// A command that the timer engine refused to apply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The command is not legal from the current phase (or its guard failed)
    #[error("cannot {command} while {state}")]
    InvalidTransition {
        command: &'static str,
        state: TimerPhase,
    },
}

/// Failures of the key-value store backing the timer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stored value for key '{key}' is not valid JSON: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Rejected timer configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("break ratio must be at least 1, got {0}")]
    InvalidBreakRatio(u32),

    #[error("tick interval must be at least {min} ms, got {got}")]
    InvalidTickInterval { got: u64, min: u64 },
}

/// Errors surfaced by the application state to the HTTP layer
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to lock {0}")]
    Poisoned(&'static str),
}
