//! Utility functions module
//!
//! Display formatting and process signal handling.

pub mod format;
pub mod signals;

// Re-export main functions
pub use format::{action_label, format_display, format_duration, format_time, TimeFormat};
pub use signals::shutdown_signal;
