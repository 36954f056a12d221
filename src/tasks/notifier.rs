//! Timer event notifications

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{engine::TimerEvent, utils::format_duration};

/// Message worth surfacing to the user for `event`, if any
pub fn announcement(event: &TimerEvent) -> Option<String> {
    match *event {
        TimerEvent::BreakCompleted {
            elapsed_seconds,
            auto: true,
        } => Some(format!(
            "Break over after {}, time to get back to work",
            format_duration(elapsed_seconds)
        )),
        TimerEvent::WorkCompleted {
            work_seconds,
            break_seconds,
        } if break_seconds > 0 => Some(format!(
            "Worked {}, earned a {} break",
            format_duration(work_seconds),
            format_duration(break_seconds)
        )),
        _ => None,
    }
}

/// Log an announcement for every notable timer event until the channel closes
pub async fn notify_task(mut events: broadcast::Receiver<TimerEvent>) {
    info!("Starting event notifier");

    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(message) = announcement(&event) {
                    info!("{}", message);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Notifier fell behind, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => {
                debug!("Event channel closed, stopping notifier");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TimerPhase;

    #[test]
    fn test_auto_completed_break_is_announced() {
        let message = announcement(&TimerEvent::BreakCompleted {
            elapsed_seconds: 300,
            auto: true,
        });
        assert_eq!(
            message.as_deref(),
            Some("Break over after 5 minutes, time to get back to work")
        );
    }

    #[test]
    fn test_quiet_events() {
        let quiet = [
            TimerEvent::WorkStarted,
            TimerEvent::BreakCompleted {
                elapsed_seconds: 4,
                auto: false,
            },
            TimerEvent::WorkCompleted {
                work_seconds: 3,
                break_seconds: 0,
            },
            TimerEvent::Paused {
                phase: TimerPhase::Working,
                elapsed_seconds: 9,
            },
            TimerEvent::Reset,
        ];
        for event in quiet {
            assert!(announcement(&event).is_none(), "{:?}", event);
        }

        let earned = announcement(&TimerEvent::WorkCompleted {
            work_seconds: 125,
            break_seconds: 25,
        });
        assert_eq!(earned.as_deref(), Some("Worked 2m 5s, earned a 25 seconds break"));
    }

    #[tokio::test]
    async fn test_notifier_stops_when_channel_closes() {
        let (tx, rx) = broadcast::channel(4);
        let handle = tokio::spawn(notify_task(rx));

        tx.send(TimerEvent::BreakCompleted {
            elapsed_seconds: 20,
            auto: true,
        })
        .unwrap();
        drop(tx);

        handle.await.unwrap();
    }
}
