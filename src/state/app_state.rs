//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{SessionStatistics, ThemePreference, TimerSnapshot};
use crate::{
    clock::Clock,
    config::{ConfigUpdate, LayeredConfig, TimerConfig},
    engine::{Outcome, TimerEngine, TimerEvent},
    error::{StateError, TimerError},
    services::MetricsClient,
    storage::{self, KeyValueStore, THEME_KEY},
};

/// Shared application state: one timer engine plus the channels that fan its
/// changes out to the tick task and HTTP handlers
pub struct AppState {
    engine: Mutex<TimerEngine>,
    store: Arc<dyn KeyValueStore>,
    theme: Mutex<ThemePreference>,
    /// Latest snapshot, fed by an engine subscription
    snapshot_rx: watch::Receiver<TimerSnapshot>,
    /// Engine events (work/break completions, pauses, resets)
    event_tx: broadcast::Sender<TimerEvent>,
    pub metrics: MetricsClient,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Build the engine (restoring persisted state) and wire its notifications
    pub fn new(
        config: impl Into<LayeredConfig>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
        metrics: MetricsClient,
        port: u16,
        host: String,
    ) -> Self {
        let mut engine = TimerEngine::new(config, clock, Arc::clone(&store));
        let persist = engine.config().persist;

        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot().clone());
        engine.subscribe(move |snapshot| {
            snapshot_tx.send_replace(snapshot.clone());
        });
        let (event_tx, _) = broadcast::channel(100);

        let theme = if persist {
            storage::load_record(store.as_ref(), THEME_KEY).unwrap_or_default()
        } else {
            ThemePreference::default()
        };

        Self {
            engine: Mutex::new(engine),
            store,
            theme: Mutex::new(theme),
            snapshot_rx,
            event_tx,
            metrics,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, TimerEngine>, StateError> {
        self.engine.lock().map_err(|_| StateError::Poisoned("timer engine"))
    }

    /// Run a command against the engine and publish what it produced
    pub fn apply<F>(&self, action: &str, command: F) -> Result<TimerSnapshot, StateError>
    where
        F: FnOnce(&mut TimerEngine) -> Result<Outcome, TimerError>,
    {
        let outcome = {
            let mut engine = self.lock_engine()?;
            command(&mut *engine)?
        };

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
        self.publish(&outcome.events);
        Ok(outcome.snapshot)
    }

    fn publish(&self, events: &[TimerEvent]) {
        for event in events {
            // No receivers is the normal case when nobody is listening
            if let Err(e) = self.event_tx.send(*event) {
                debug!("No listeners for timer event: {}", e);
            }
        }
    }

    pub fn start_work(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("start-work", TimerEngine::start_work)
    }

    pub fn stop_work(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("stop-work", TimerEngine::stop_work)
    }

    pub fn start_break(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("start-break", TimerEngine::start_break)
    }

    pub fn stop_break(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("stop-break", TimerEngine::stop_break)
    }

    pub fn pause(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("pause", TimerEngine::pause)
    }

    pub fn resume(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("resume", TimerEngine::resume)
    }

    pub fn reset(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("reset", |engine| Ok(engine.reset()))
    }

    pub fn toggle(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("toggle", |engine| Ok(engine.toggle()))
    }

    /// Recompute the running segment; called by the tick task
    pub fn tick(&self) {
        let outcome = match self.lock_engine() {
            Ok(mut engine) => engine.tick(),
            Err(e) => {
                warn!("Skipping tick: {}", e);
                return;
            }
        };
        if let Some(outcome) = outcome {
            self.publish(&outcome.events);
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that wakes on every snapshot change
    pub fn subscribe_snapshots(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    pub fn statistics(&self) -> Result<SessionStatistics, StateError> {
        Ok(*self.lock_engine()?.statistics())
    }

    pub fn clear_statistics(&self) -> Result<SessionStatistics, StateError> {
        let stats = self.lock_engine()?.clear_statistics();
        self.record_action("clear-stats");
        Ok(stats)
    }

    pub fn config(&self) -> Result<TimerConfig, StateError> {
        Ok(self.lock_engine()?.config())
    }

    pub fn update_config(&self, update: &ConfigUpdate) -> Result<TimerConfig, StateError> {
        let config = self.lock_engine()?.update_config(update)?;
        self.record_action("update-config");
        Ok(config)
    }

    /// Period of the display refresh
    pub fn tick_interval(&self) -> Duration {
        let ms = self
            .config()
            .map(|config| config.tick_interval_ms)
            .unwrap_or_else(|_| TimerConfig::default().tick_interval_ms);
        Duration::from_millis(ms)
    }

    pub fn theme(&self) -> Result<ThemePreference, StateError> {
        self.theme
            .lock()
            .map(|theme| *theme)
            .map_err(|_| StateError::Poisoned("theme"))
    }

    pub fn set_theme(&self, theme: ThemePreference) -> Result<ThemePreference, StateError> {
        let (persist, now_ms) = {
            let engine = self.lock_engine()?;
            (engine.config().persist, engine.now_ms())
        };

        *self.theme.lock().map_err(|_| StateError::Poisoned("theme"))? = theme;
        info!("Theme set to {}", theme);

        if persist {
            if let Err(e) = storage::save_record(self.store.as_ref(), THEME_KEY, &theme, now_ms) {
                warn!("Failed to persist theme: {}", e);
            }
        }
        self.record_action("set-theme");
        Ok(theme)
    }

    /// Swap between light and dark and store the result
    pub fn toggle_theme(&self) -> Result<ThemePreference, StateError> {
        let next = self.theme()?.toggled();
        self.set_theme(next)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|last| last.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        state::TimerPhase,
        storage::MemoryStore,
    };

    fn app_state() -> (AppState, ManualClock, Arc<MemoryStore>) {
        let clock = ManualClock::new(0);
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            TimerConfig::default(),
            Arc::new(clock.clone()),
            store.clone(),
            MetricsClient::disabled(),
            0,
            "127.0.0.1".to_string(),
        );
        (state, clock, store)
    }

    #[test]
    fn test_commands_update_watch_channel() {
        let (state, clock, _) = app_state();
        let mut rx = state.subscribe_snapshots();

        state.start_work().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, TimerPhase::Working);

        clock.advance_secs(3);
        state.tick();
        assert_eq!(state.snapshot().current_display_seconds, 3);
    }

    #[test]
    fn test_rejected_command_publishes_nothing() {
        let (state, _, _) = app_state();
        let rx = state.subscribe_snapshots();
        let mut events = state.subscribe_events();

        let err = state.stop_work().unwrap_err();
        assert!(matches!(err, StateError::Timer(TimerError::InvalidTransition { .. })));
        assert!(!rx.has_changed().unwrap());
        assert!(events.try_recv().is_err());
        assert_eq!(state.get_last_action(), (None, None));
    }

    #[test]
    fn test_events_are_broadcast() {
        let (state, clock, _) = app_state();
        let mut events = state.subscribe_events();

        state.toggle().unwrap();
        clock.advance_secs(100);
        state.toggle().unwrap();

        assert_eq!(events.try_recv().unwrap(), TimerEvent::WorkStarted);
        assert_eq!(
            events.try_recv().unwrap(),
            TimerEvent::WorkCompleted {
                work_seconds: 100,
                break_seconds: 20
            }
        );
        assert_eq!(state.get_last_action().0.as_deref(), Some("toggle"));
    }

    #[test]
    fn test_auto_completed_break_is_broadcast_from_tick() {
        let (state, clock, _) = app_state();
        state.start_work().unwrap();
        clock.advance_secs(10);
        state.stop_work().unwrap();
        state.start_break().unwrap();

        let mut events = state.subscribe_events();
        clock.advance_secs(2);
        state.tick();

        assert_eq!(
            events.try_recv().unwrap(),
            TimerEvent::BreakCompleted {
                elapsed_seconds: 2,
                auto: true
            }
        );
        assert_eq!(state.statistics().unwrap().completed_break_sessions, 1);
    }

    #[test]
    fn test_theme_persists() {
        let (state, clock, store) = app_state();
        assert_eq!(state.theme().unwrap(), ThemePreference::System);

        state.set_theme(ThemePreference::Dark).unwrap();

        let reloaded = AppState::new(
            TimerConfig::default(),
            Arc::new(clock),
            store,
            MetricsClient::disabled(),
            0,
            "127.0.0.1".to_string(),
        );
        assert_eq!(reloaded.theme().unwrap(), ThemePreference::Dark);
    }

    #[test]
    fn test_pause_stops_the_running_flag() {
        let (state, clock, _) = app_state();
        let mut rx = state.subscribe_snapshots();
        state.start_work().unwrap();
        clock.advance_secs(12);

        let paused = state.pause().unwrap();
        assert!(paused.is_paused());
        assert!(!rx.borrow_and_update().is_running);
        assert_eq!(state.get_last_action().0.as_deref(), Some("pause"));

        clock.advance_secs(60);
        assert!(state.resume().unwrap().is_running);
        assert!(matches!(
            state.resume(),
            Err(StateError::Timer(TimerError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn test_toggle_theme() {
        let (state, _, _) = app_state();
        assert_eq!(state.toggle_theme().unwrap(), ThemePreference::Light);
        assert_eq!(state.toggle_theme().unwrap(), ThemePreference::Dark);
        assert_eq!(state.theme().unwrap(), ThemePreference::Dark);
    }

    #[test]
    fn test_tick_interval_follows_config() {
        let (state, _, _) = app_state();
        assert_eq!(state.tick_interval(), Duration::from_secs(1));

        state
            .update_config(&ConfigUpdate {
                tick_interval_ms: Some(100),
                ..ConfigUpdate::default()
            })
            .unwrap();
        assert_eq!(state.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_uptime_format() {
        let (state, _, _) = app_state();
        assert!(state.get_uptime().ends_with('s'));
    }
}
