//! Flowmodoro - A focus timer service
//!
//! This is the main entry point for the flowmodoro server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use flowmodoro::{
    api::create_router,
    clock::SystemClock,
    config::{Cli, TimerConfig},
    services::MetricsClient,
    state::AppState,
    storage::{FileStore, KeyValueStore, MemoryStore},
    tasks::{notify_task, TickerHandle},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("flowmodoro={},tower_http=info", cli.log_level()))
        .init();

    info!("Starting flowmodoro server v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn KeyValueStore> = if cli.no_persist {
        info!("Persistence disabled, state lives in memory");
        Arc::new(MemoryStore::new())
    } else {
        let dir = cli.data_dir();
        info!("Persisting state in {}", dir.display());
        Arc::new(FileStore::open(dir)?)
    };

    let layered = cli.timer_config(TimerConfig::load(store.as_ref()))?;
    let config = layered.effective();
    info!(
        "Configuration: host={}, port={}, break_ratio={}, tick={}ms, min_break={}s",
        cli.host, cli.port, config.break_ratio, config.tick_interval_ms, config.minimum_break_seconds
    );

    let metrics = MetricsClient::new(cli.metrics_base_url.as_deref());
    if let Some(endpoint) = metrics.endpoint() {
        info!("Tracking page visits at {}", endpoint);
    }

    // Create application state; this restores any persisted timer
    let state = Arc::new(AppState::new(
        layered,
        Arc::new(SystemClock),
        store,
        metrics,
        cli.port,
        cli.host.clone(),
    ));

    // Start the display tick background task
    let mut ticker = TickerHandle::spawn(Arc::clone(&state));
    let notifier = tokio::spawn(notify_task(state.subscribe_events()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = cli.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /            - Timer view");
    info!("  POST /toggle      - Start/stop work or break");
    info!("  POST /work/start  - Start a work session");
    info!("  POST /work/stop   - Stop work and earn a break");
    info!("  POST /break/start - Start the earned break");
    info!("  POST /break/stop  - End the break early");
    info!("  POST /pause       - Put the running session on hold");
    info!("  POST /resume      - Continue a paused session");
    info!("  POST /reset       - Reset the timer");
    info!("  GET  /status      - Timer, statistics and config");
    info!("  GET  /stats       - Session statistics (DELETE clears)");
    info!("  GET  /config      - Timer config (PUT updates)");
    info!("  GET  /theme       - Theme preference (PUT updates)");
    info!("  POST /theme/toggle - Swap light and dark");
    info!("  GET  /health      - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    ticker.shutdown();
    notifier.abort();
    info!("Server shutdown complete");
    Ok(())
}
