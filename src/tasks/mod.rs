//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod notifier;
pub mod ticker;

// Re-export main functions
pub use notifier::{announcement, notify_task};
pub use ticker::{tick_task, TickerHandle};
