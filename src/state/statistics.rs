//! Session statistics accumulated from timer events

use serde::{Deserialize, Serialize};

use crate::engine::TimerEvent;

/// Cumulative counters across work and break sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    pub completed_work_sessions: u64,
    pub completed_break_sessions: u64,
    pub total_work_seconds: u64,
    pub total_break_seconds: u64,
    /// Incremented on every work start, completed or not
    pub current_session_count: u64,
}

impl SessionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one engine event into the counters
    pub fn record(&mut self, event: &TimerEvent) {
        match *event {
            TimerEvent::WorkStarted => {
                self.current_session_count = self.current_session_count.saturating_add(1);
            }
            TimerEvent::WorkCompleted { work_seconds, .. } => {
                self.completed_work_sessions = self.completed_work_sessions.saturating_add(1);
                self.total_work_seconds = self.total_work_seconds.saturating_add(work_seconds);
            }
            TimerEvent::BreakCompleted {
                elapsed_seconds, ..
            } => {
                self.completed_break_sessions = self.completed_break_sessions.saturating_add(1);
                self.total_break_seconds = self.total_break_seconds.saturating_add(elapsed_seconds);
            }
            TimerEvent::BreakStarted { .. }
            | TimerEvent::Paused { .. }
            | TimerEvent::Resumed { .. }
            | TimerEvent::Reset => {}
        }
    }

    /// Average completed work session length in whole seconds
    pub fn average_work_seconds(&self) -> u64 {
        self.total_work_seconds
            .checked_div(self.completed_work_sessions)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_work_cycle() {
        let mut stats = SessionStatistics::new();

        stats.record(&TimerEvent::WorkStarted);
        stats.record(&TimerEvent::WorkCompleted {
            work_seconds: 300,
            break_seconds: 60,
        });

        assert_eq!(stats.current_session_count, 1);
        assert_eq!(stats.completed_work_sessions, 1);
        assert_eq!(stats.total_work_seconds, 300);
        assert_eq!(stats.completed_break_sessions, 0);
    }

    #[test]
    fn test_record_break_and_ignored_events() {
        let mut stats = SessionStatistics::new();

        stats.record(&TimerEvent::BreakStarted { break_seconds: 20 });
        stats.record(&TimerEvent::Reset);
        assert_eq!(stats, SessionStatistics::default());

        stats.record(&TimerEvent::BreakCompleted {
            elapsed_seconds: 20,
            auto: true,
        });
        assert_eq!(stats.completed_break_sessions, 1);
        assert_eq!(stats.total_break_seconds, 20);
    }

    #[test]
    fn test_counters_saturate() {
        let mut stats = SessionStatistics {
            total_work_seconds: u64::MAX - 1,
            ..SessionStatistics::default()
        };

        stats.record(&TimerEvent::WorkCompleted {
            work_seconds: 10,
            break_seconds: 2,
        });
        assert_eq!(stats.total_work_seconds, u64::MAX);
    }

    #[test]
    fn test_average_work_seconds() {
        let mut stats = SessionStatistics::new();
        assert_eq!(stats.average_work_seconds(), 0);

        for work_seconds in [100, 200] {
            stats.record(&TimerEvent::WorkCompleted {
                work_seconds,
                break_seconds: work_seconds / 5,
            });
        }
        assert_eq!(stats.average_work_seconds(), 150);
    }
}
