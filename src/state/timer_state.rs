//! Timer snapshot structure

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the flowmodoro cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Working,
    Breaking,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Breaking => "breaking",
        }
    }
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally visible timer state at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerPhase,
    /// Length of the last completed (or currently running) work session
    pub work_seconds: u64,
    /// Break earned by the last completed work session
    pub break_seconds: u64,
    /// Elapsed work while working, remaining break while breaking,
    /// frozen otherwise
    pub current_display_seconds: u64,
    pub is_running: bool,
    /// Milliseconds since the epoch at which the running segment began
    pub start_timestamp: Option<u64>,
    /// Elapsed milliseconds carried over from segments before the last pause
    #[serde(default)]
    pub accumulated_ms: u64,
}

impl TimerSnapshot {
    /// The all-zero idle snapshot
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.state == TimerPhase::Idle
    }

    /// An idle snapshot holding an earned, not yet started break
    pub fn break_available(&self) -> bool {
        self.is_idle() && self.break_seconds > 0
    }

    /// A work session or break that is on hold
    pub fn is_paused(&self) -> bool {
        !self.is_idle() && !self.is_running
    }

    /// Milliseconds of work or break so far, pauses excluded
    ///
    /// `None` when idle. A running segment adds the time since
    /// `start_timestamp` to what earlier segments accumulated.
    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        match (self.is_running, self.start_timestamp) {
            (true, Some(start)) => Some(
                self.accumulated_ms
                    .saturating_add(now_ms.saturating_sub(start)),
            ),
            (false, None) if self.is_paused() => Some(self.accumulated_ms),
            _ => None,
        }
    }

    /// [`elapsed_ms`](Self::elapsed_ms) floored to whole seconds
    pub fn elapsed_seconds(&self, now_ms: u64) -> Option<u64> {
        self.elapsed_ms(now_ms).map(|ms| ms / 1000)
    }

    /// Check the field combinations a restored snapshot must satisfy
    pub fn is_consistent(&self) -> bool {
        // A start timestamp exists exactly while running
        let anchored = self.is_running == self.start_timestamp.is_some();
        match self.state {
            TimerPhase::Idle => !self.is_running && anchored && self.accumulated_ms == 0,
            TimerPhase::Working => anchored,
            TimerPhase::Breaking => anchored && self.break_seconds > 0,
        }
    }
}
