use std::sync::Arc;

use flowmodoro::{
    FileStore, KeyValueStore, ManualClock, SessionStatistics, TimerConfig, TimerEngine,
    TimerError, TimerPhase, TimerSnapshot,
};
use tempfile::TempDir;

fn open_engine(dir: &TempDir, clock: &ManualClock) -> TimerEngine {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    TimerEngine::new(TimerConfig::default(), Arc::new(clock.clone()), store)
}

#[test]
fn test_full_cycle_survives_restarts() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_700_000_000_000);

    let mut engine = open_engine(&dir, &clock);
    engine.start_work().unwrap();
    drop(engine);

    // Process restarted mid-session
    clock.advance_secs(100);
    let mut engine = open_engine(&dir, &clock);
    assert_eq!(engine.snapshot().state, TimerPhase::Working);
    let stopped = engine.stop_work().unwrap().snapshot;
    assert_eq!(stopped.work_seconds, 100);
    assert_eq!(stopped.break_seconds, 20);

    engine.start_break().unwrap();
    drop(engine);

    // Break ran out while nothing was running
    clock.advance_secs(60);
    let engine = open_engine(&dir, &clock);
    assert_eq!(engine.snapshot().state, TimerPhase::Idle);
    assert_eq!(engine.snapshot().work_seconds, 100);

    let expected = SessionStatistics {
        completed_work_sessions: 1,
        completed_break_sessions: 1,
        total_work_seconds: 100,
        total_break_seconds: 20,
        current_session_count: 1,
    };
    assert_eq!(*engine.statistics(), expected);
}

#[test]
fn test_corrupt_files_fall_back_to_fresh_state() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(0);

    let store = FileStore::open(dir.path()).unwrap();
    std::fs::write(store.path_for("flowmodoro-timer-data"), "{\"state\": ").unwrap();
    std::fs::write(store.path_for("flowmodoro-timer-stats"), "[]").unwrap();

    let mut engine = open_engine(&dir, &clock);
    assert_eq!(*engine.snapshot(), TimerSnapshot::new());
    assert_eq!(*engine.statistics(), SessionStatistics::new());

    // The engine keeps working and overwrites the corrupt payload
    engine.start_work().unwrap();
    let engine = open_engine(&dir, &clock);
    assert_eq!(engine.snapshot().state, TimerPhase::Working);
}

#[test]
fn test_guarded_commands_leave_disk_untouched() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(0);
    let mut engine = open_engine(&dir, &clock);

    assert!(matches!(
        engine.start_break(),
        Err(TimerError::InvalidTransition {
            state: TimerPhase::Idle,
            ..
        })
    ));
    let store = FileStore::open(dir.path()).unwrap();
    assert!(!store.path_for("flowmodoro-timer-data").exists());
}
