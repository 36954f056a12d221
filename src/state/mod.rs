//! State management module
//!
//! Timer snapshot, session statistics, theme preference, and the shared
//! application state that owns the timer engine.

pub mod app_state;
pub mod statistics;
pub mod theme;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use statistics::SessionStatistics;
pub use theme::ThemePreference;
pub use timer_state::{TimerPhase, TimerSnapshot};
