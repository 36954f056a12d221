//! Flowmodoro - A focus timer service
//!
//! Work for as long as focus lasts, stop to earn a break proportional to the
//! work (one fifth by default), then rest while the break counts down. This
//! library provides the timer engine, its statistics and persistence, and the
//! HTTP surface used to drive it.

pub mod api;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Cli, ConfigUpdate, LayeredConfig, TimerConfig};
pub use engine::{break_seconds, Outcome, SubscriptionId, TimerEngine, TimerEvent};
pub use error::{ConfigError, StateError, StoreError, TimerError};
pub use state::{AppState, SessionStatistics, ThemePreference, TimerPhase, TimerSnapshot};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use utils::signals::shutdown_signal;
