//! Flowmodoro timer engine
//!
//! Owns the timer snapshot and session statistics, applies commands, and
//! derives elapsed and remaining time from the stored start timestamp so that
//! missed ticks (a suspended process, a slow scheduler) never skew the result.

use std::{fmt, sync::Arc};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    config::{ConfigUpdate, LayeredConfig, TimerConfig},
    error::{ConfigError, TimerError},
    state::{SessionStatistics, TimerPhase, TimerSnapshot},
    storage::{self, KeyValueStore, TIMER_CONFIG_KEY, TIMER_DATA_KEY, TIMER_STATS_KEY},
};

/// Break earned by `work_seconds` of work
///
/// `floor(work / ratio)`, raised to `minimum` when smaller. A ratio of zero is
/// treated as one.
pub fn break_seconds(work_seconds: u64, ratio: u32, minimum: u64) -> u64 {
    (work_seconds / u64::from(ratio.max(1))).max(minimum)
}

/// Something that happened to the timer as the result of a command or tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimerEvent {
    WorkStarted,
    #[serde(rename_all = "camelCase")]
    WorkCompleted { work_seconds: u64, break_seconds: u64 },
    #[serde(rename_all = "camelCase")]
    BreakStarted { break_seconds: u64 },
    /// `auto` is set when the countdown ran out rather than being stopped
    #[serde(rename_all = "camelCase")]
    BreakCompleted { elapsed_seconds: u64, auto: bool },
    #[serde(rename_all = "camelCase")]
    Paused { phase: TimerPhase, elapsed_seconds: u64 },
    Resumed { phase: TimerPhase },
    Reset,
}

/// Result of a state-changing command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub snapshot: TimerSnapshot,
    pub events: Vec<TimerEvent>,
}

/// Handle returned by [`TimerEngine::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&TimerSnapshot) + Send>;

pub struct TimerEngine {
    config: LayeredConfig,
    snapshot: TimerSnapshot,
    stats: SessionStatistics,
    clock: Arc<dyn Clock>,
    store: Arc<dyn KeyValueStore>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("config", &self.config)
            .field("snapshot", &self.snapshot)
            .field("stats", &self.stats)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl TimerEngine {
    /// Build an engine, restoring snapshot and statistics from `store` when
    /// persistence is enabled
    ///
    /// A snapshot restored mid-segment is brought up to date immediately, so a
    /// break that expired while the process was down completes here.
    pub fn new(
        config: impl Into<LayeredConfig>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let config: LayeredConfig = config.into();
        let (snapshot, stats) = if config.effective().persist {
            (
                Self::restore_snapshot(store.as_ref()),
                storage::load_record(store.as_ref(), TIMER_STATS_KEY).unwrap_or_default(),
            )
        } else {
            (TimerSnapshot::new(), SessionStatistics::new())
        };

        let mut engine = Self {
            config,
            snapshot,
            stats,
            clock,
            store,
            subscribers: Vec::new(),
            next_subscription: 0,
        };

        if engine.snapshot.is_running {
            info!(
                "Resuming {} session started at {:?}",
                engine.snapshot.state, engine.snapshot.start_timestamp
            );
            engine.tick();
        }
        engine
    }

    fn restore_snapshot(store: &dyn KeyValueStore) -> TimerSnapshot {
        match storage::load_record::<TimerSnapshot>(store, TIMER_DATA_KEY) {
            Some(snapshot) if snapshot.is_consistent() => snapshot,
            Some(snapshot) => {
                warn!("Discarding inconsistent stored snapshot: {:?}", snapshot);
                TimerSnapshot::new()
            }
            None => TimerSnapshot::new(),
        }
    }

    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.snapshot
    }

    pub fn statistics(&self) -> &SessionStatistics {
        &self.stats
    }

    /// The config in effect, command-line overrides included
    pub fn config(&self) -> TimerConfig {
        self.config.effective()
    }

    fn persist(&self) -> bool {
        self.config.effective().persist
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Register a callback invoked synchronously with every new snapshot
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&TimerSnapshot) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Idle → Working
    pub fn start_work(&mut self) -> Result<Outcome, TimerError> {
        self.guard("start work", self.snapshot.is_idle())?;

        let now = self.now_ms();
        self.snapshot = TimerSnapshot {
            state: TimerPhase::Working,
            work_seconds: 0,
            break_seconds: 0,
            current_display_seconds: 0,
            is_running: true,
            start_timestamp: Some(now),
            accumulated_ms: 0,
        };
        info!("Work session started");
        Ok(self.commit(vec![TimerEvent::WorkStarted]))
    }

    /// Working → Idle, crystallizing the earned break
    pub fn stop_work(&mut self) -> Result<Outcome, TimerError> {
        let elapsed = match self.snapshot.state {
            TimerPhase::Working => self.snapshot.elapsed_seconds(self.now_ms()),
            _ => None,
        };
        let Some(work_seconds) = elapsed else {
            return Err(self.rejected("stop work"));
        };

        let config = self.config();
        let earned = break_seconds(
            work_seconds,
            config.break_ratio,
            config.minimum_break_seconds,
        );
        self.snapshot = TimerSnapshot {
            state: TimerPhase::Idle,
            work_seconds,
            break_seconds: earned,
            current_display_seconds: work_seconds,
            is_running: false,
            start_timestamp: None,
            accumulated_ms: 0,
        };
        info!("Work session stopped after {}s, earned {}s break", work_seconds, earned);
        Ok(self.commit(vec![TimerEvent::WorkCompleted {
            work_seconds,
            break_seconds: earned,
        }]))
    }

    /// Idle → Breaking; requires an earned break
    pub fn start_break(&mut self) -> Result<Outcome, TimerError> {
        self.guard("start break", self.snapshot.break_available())?;

        let now = self.now_ms();
        let break_seconds = self.snapshot.break_seconds;
        self.snapshot.state = TimerPhase::Breaking;
        self.snapshot.is_running = true;
        self.snapshot.start_timestamp = Some(now);
        self.snapshot.accumulated_ms = 0;
        self.snapshot.current_display_seconds = break_seconds;
        info!("Break started: {}s", break_seconds);
        Ok(self.commit(vec![TimerEvent::BreakStarted { break_seconds }]))
    }

    /// Breaking → Idle, ending the break early
    pub fn stop_break(&mut self) -> Result<Outcome, TimerError> {
        self.guard("stop break", self.snapshot.state == TimerPhase::Breaking)?;
        Ok(self.finish_break(false))
    }

    /// Put a running work session or break on hold
    ///
    /// The elapsed time so far is banked in `accumulated_ms`; a break that has
    /// already run out completes instead of pausing.
    pub fn pause(&mut self) -> Result<Outcome, TimerError> {
        let elapsed_ms = if self.snapshot.is_running {
            self.snapshot.elapsed_ms(self.now_ms())
        } else {
            None
        };
        let Some(elapsed_ms) = elapsed_ms else {
            return Err(self.rejected("pause"));
        };

        let phase = self.snapshot.state;
        let elapsed = elapsed_ms / 1000;
        if phase == TimerPhase::Breaking && elapsed >= self.snapshot.break_seconds {
            return Ok(self.finish_break(true));
        }

        self.snapshot.is_running = false;
        self.snapshot.start_timestamp = None;
        self.snapshot.accumulated_ms = elapsed_ms;
        self.refresh_display(elapsed);
        info!("Paused {} after {}s", phase, elapsed);
        Ok(self.commit(vec![TimerEvent::Paused {
            phase,
            elapsed_seconds: elapsed,
        }]))
    }

    /// Continue a paused work session or break from where it stopped
    pub fn resume(&mut self) -> Result<Outcome, TimerError> {
        self.guard("resume", self.snapshot.is_paused())?;

        let phase = self.snapshot.state;
        self.snapshot.is_running = true;
        self.snapshot.start_timestamp = Some(self.now_ms());
        info!("Resumed {}", phase);
        Ok(self.commit(vec![TimerEvent::Resumed { phase }]))
    }

    /// Any → zero Idle; statistics are left alone
    pub fn reset(&mut self) -> Outcome {
        self.snapshot = TimerSnapshot::new();
        info!("Timer reset");
        self.commit(vec![TimerEvent::Reset])
    }

    /// Context-sensitive primary action
    pub fn toggle(&mut self) -> Outcome {
        let result = match self.snapshot.state {
            TimerPhase::Working => self.stop_work(),
            TimerPhase::Breaking => self.stop_break(),
            TimerPhase::Idle if self.snapshot.break_available() => self.start_break(),
            TimerPhase::Idle => self.start_work(),
        };
        // Each branch satisfies its own guard; only an inconsistent snapshot
        // can fail here
        result.unwrap_or_else(|e| {
            warn!("Toggle fell through ({}), resetting", e);
            self.reset()
        })
    }

    /// Recompute the display from the clock; `None` if nothing changed
    ///
    /// Auto-completes a break whose countdown has reached zero.
    pub fn tick(&mut self) -> Option<Outcome> {
        if !self.snapshot.is_running {
            return None;
        }
        let elapsed = self.snapshot.elapsed_seconds(self.now_ms())?;

        match self.snapshot.state {
            TimerPhase::Working => {
                if self.snapshot.current_display_seconds == elapsed
                    && self.snapshot.work_seconds == elapsed
                {
                    return None;
                }
                self.snapshot.work_seconds = elapsed;
                self.snapshot.current_display_seconds = elapsed;
                Some(self.commit(Vec::new()))
            }
            TimerPhase::Breaking => {
                let remaining = self.snapshot.break_seconds.saturating_sub(elapsed);
                if remaining == 0 {
                    debug!("Break countdown reached zero");
                    return Some(self.finish_break(true));
                }
                if self.snapshot.current_display_seconds == remaining {
                    return None;
                }
                self.snapshot.current_display_seconds = remaining;
                Some(self.commit(Vec::new()))
            }
            TimerPhase::Idle => None,
        }
    }

    /// Apply a partial config change and persist the stored layer
    ///
    /// A break already earned keeps its length; the new ratio applies from
    /// the next stopped work session. Command-line overrides are never
    /// written to the store.
    pub fn update_config(&mut self, update: &ConfigUpdate) -> Result<TimerConfig, ConfigError> {
        let effective = self.config.update(update)?;
        info!("Timer config updated: {:?}", effective);
        if effective.persist {
            self.write(TIMER_CONFIG_KEY, &self.config.stored());
        }
        Ok(effective)
    }

    /// Zero the statistics counters
    pub fn clear_statistics(&mut self) -> SessionStatistics {
        self.stats = SessionStatistics::new();
        info!("Session statistics cleared");
        if self.persist() {
            self.write(TIMER_STATS_KEY, &self.stats);
        }
        self.stats
    }

    fn finish_break(&mut self, auto: bool) -> Outcome {
        let elapsed = self
            .snapshot
            .elapsed_seconds(self.now_ms())
            .unwrap_or(0)
            .min(self.snapshot.break_seconds);

        self.snapshot = TimerSnapshot {
            state: TimerPhase::Idle,
            work_seconds: self.snapshot.work_seconds,
            break_seconds: 0,
            current_display_seconds: 0,
            is_running: false,
            start_timestamp: None,
            accumulated_ms: 0,
        };
        if auto {
            info!("Break completed after {}s", elapsed);
        } else {
            info!("Break stopped after {}s", elapsed);
        }
        self.commit(vec![TimerEvent::BreakCompleted {
            elapsed_seconds: elapsed,
            auto,
        }])
    }

    /// Display value for `elapsed` seconds into the current segment
    fn refresh_display(&mut self, elapsed: u64) {
        match self.snapshot.state {
            TimerPhase::Working => {
                self.snapshot.work_seconds = elapsed;
                self.snapshot.current_display_seconds = elapsed;
            }
            TimerPhase::Breaking => {
                self.snapshot.current_display_seconds =
                    self.snapshot.break_seconds.saturating_sub(elapsed);
            }
            TimerPhase::Idle => {}
        }
    }

    fn guard(&self, command: &'static str, allowed: bool) -> Result<(), TimerError> {
        if allowed {
            Ok(())
        } else {
            Err(self.rejected(command))
        }
    }

    fn rejected(&self, command: &'static str) -> TimerError {
        debug!("Rejected '{}' while {}", command, self.snapshot.state);
        TimerError::InvalidTransition {
            command,
            state: self.snapshot.state,
        }
    }

    /// Fold events into statistics, persist, and notify subscribers
    fn commit(&mut self, events: Vec<TimerEvent>) -> Outcome {
        let mut stats_changed = false;
        for event in &events {
            let before = self.stats;
            self.stats.record(event);
            stats_changed |= self.stats != before;
        }

        if self.persist() {
            self.write(TIMER_DATA_KEY, &self.snapshot);
            if stats_changed {
                self.write(TIMER_STATS_KEY, &self.stats);
            }
        }

        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.snapshot);
        }

        Outcome {
            snapshot: self.snapshot.clone(),
            events,
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = storage::save_record(self.store.as_ref(), key, value, self.now_ms()) {
            warn!("Failed to persist {}: {}", key, e);
        }
    }
}
