//! Display tick background task

use std::sync::Arc;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::state::AppState;

/// Background task that drives engine recomputation while a segment runs
///
/// Sleeps on the snapshot channel while the timer is idle. While running it
/// owns exactly one interval; the interval is dropped as soon as the timer
/// stops, so a new segment can never end up with two tick sources.
pub async fn tick_task(state: Arc<AppState>) {
    info!("Starting tick task");

    let mut snapshots = state.subscribe_snapshots();

    loop {
        let running = snapshots.borrow_and_update().is_running;
        if !running {
            if snapshots.changed().await.is_err() {
                debug!("Snapshot channel closed, stopping tick task");
                return;
            }
            continue;
        }

        let period = state.tick_interval();
        debug!("Ticking every {:?}", period);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    state.tick();
                }

                changed = snapshots.changed() => {
                    if changed.is_err() {
                        debug!("Snapshot channel closed, stopping tick task");
                        return;
                    }
                    if !snapshots.borrow_and_update().is_running {
                        debug!("Timer stopped, pausing ticks");
                        break;
                    }
                    if state.tick_interval() != period {
                        debug!("Tick interval changed, restarting ticker");
                        break;
                    }
                }
            }
        }
    }
}

/// Owner of the running tick task; aborts it when shut down or dropped
#[derive(Debug)]
pub struct TickerHandle {
    handle: Option<JoinHandle<()>>,
}

impl TickerHandle {
    /// Spawn [`tick_task`] on the current runtime
    pub fn spawn(state: Arc<AppState>) -> Self {
        Self {
            handle: Some(tokio::spawn(tick_task(state))),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Tick task stopped");
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
