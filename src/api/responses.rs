//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::TimerConfig,
    state::{SessionStatistics, ThemePreference, TimerSnapshot},
    utils::format_duration,
};

/// Response for every timer command endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub snapshot: TimerSnapshot,
}

impl CommandResponse {
    pub fn new(status: &str, message: String, snapshot: TimerSnapshot) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            snapshot,
        }
    }

    /// The command was applied
    pub fn ok(message: String, snapshot: TimerSnapshot) -> Self {
        Self::new("ok", message, snapshot)
    }

    /// The command is not legal right now; `snapshot` is the unchanged state
    pub fn rejected(message: String, snapshot: TimerSnapshot) -> Self {
        Self::new("rejected", message, snapshot)
    }
}

/// Full status: timer, statistics, config, and server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub snapshot: TimerSnapshot,
    pub statistics: SessionStatistics,
    pub summary: StatisticsSummary,
    pub config: TimerConfig,
    pub theme: ThemePreference,
    /// `current_display_seconds` rendered for display
    pub display: String,
    /// Label of the primary (toggle) action
    pub action: String,
    pub paused: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Statistics rendered for people
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub total_work: String,
    pub total_break: String,
    pub average_work: String,
}

impl From<&SessionStatistics> for StatisticsSummary {
    fn from(stats: &SessionStatistics) -> Self {
        Self {
            total_work: format_duration(stats.total_work_seconds),
            total_break: format_duration(stats.total_break_seconds),
            average_work: format_duration(stats.average_work_seconds()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: ThemePreference,
}

/// Error body for requests that are malformed rather than illegal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
