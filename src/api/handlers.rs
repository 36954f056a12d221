//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::{header::HOST, HeaderMap, StatusCode, Uri},
    response::Json,
};
use tracing::{debug, error, info, warn};

use crate::{
    config::{ConfigUpdate, TimerConfig},
    error::StateError,
    state::{AppState, SessionStatistics, TimerSnapshot},
    utils::{action_label, format_display, format_time, TimeFormat},
};
use super::responses::{
    CommandResponse, ErrorResponse, HealthResponse, StatisticsSummary, StatusResponse, ThemeBody,
};

type CommandResult = Result<Json<CommandResponse>, (StatusCode, Json<CommandResponse>)>;
type ErrorReply = (StatusCode, Json<ErrorResponse>);

/// Map the outcome of a timer command onto a response
fn command_reply(
    state: &AppState,
    result: Result<TimerSnapshot, StateError>,
    message: impl FnOnce(&TimerSnapshot) -> String,
) -> CommandResult {
    match result {
        Ok(snapshot) => {
            let message = message(&snapshot);
            info!("{}", message);
            Ok(Json(CommandResponse::ok(message, snapshot)))
        }
        Err(StateError::Timer(e)) => {
            warn!("Rejected timer command: {}", e);
            Err((
                StatusCode::CONFLICT,
                Json(CommandResponse::rejected(e.to_string(), state.snapshot())),
            ))
        }
        Err(e) => {
            error!("Timer command failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CommandResponse::new("error", e.to_string(), state.snapshot())),
            ))
        }
    }
}

fn internal_error(context: &str, e: StateError) -> ErrorReply {
    error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(e.to_string())),
    )
}

/// Handle POST /toggle - Context-sensitive primary action
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_reply(&state, state.toggle(), |snapshot| {
        format!("Toggled, timer is now {}", snapshot.state)
    })
}

/// Handle POST /work/start - Begin a work session
pub async fn start_work_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_reply(&state, state.start_work(), |_| "Work session started".to_string())
}

/// Handle POST /work/stop - End the work session and earn a break
pub async fn stop_work_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_reply(&state, state.stop_work(), |snapshot| {
        format!(
            "Work session stopped after {}s, {}s break earned",
            snapshot.work_seconds, snapshot.break_seconds
        )
    })
}

/// Handle POST /break/start - Begin the earned break
pub async fn start_break_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_reply(&state, state.start_break(), |snapshot| {
        format!("Break started: {}s", snapshot.break_seconds)
    })
}

/// Handle POST /break/stop - End the break early
pub async fn stop_break_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_reply(&state, state.stop_break(), |_| "Break stopped".to_string())
}

/// Handle POST /pause - Put the running work session or break on hold
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_reply(&state, state.pause(), |snapshot| {
        format!("Paused {} at {}", snapshot.state, format_display(snapshot))
    })
}

/// Handle POST /resume - Continue a paused work session or break
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_reply(&state, state.resume(), |snapshot| {
        format!("Resumed {}", snapshot.state)
    })
}

/// Handle POST /reset - Return the timer to zero
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> CommandResult {
    command_reply(&state, state.reset(), |_| "Timer reset".to_string())
}

/// Handle GET / - Plain-text timer view; records a page visit
pub async fn index_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> String {
    if state.metrics.is_enabled() {
        let site = headers
            .get(HOST)
            .and_then(|host| host.to_str().ok())
            .unwrap_or(state.host.as_str())
            .to_string();
        let page = uri.path().to_string();
        let metrics = state.metrics.clone();
        tokio::spawn(async move {
            metrics.track_page_visit(&site, &page).await;
        });
    } else {
        debug!("Metrics disabled, page visit not tracked");
    }

    let snapshot = state.snapshot();
    let state_line = if snapshot.is_paused() {
        format!("{} (paused)", snapshot.state)
    } else {
        snapshot.state.to_string()
    };
    let worked = match state.statistics() {
        Ok(stats) => format_time(stats.total_work_seconds, TimeFormat::HoursMinutesSeconds),
        Err(e) => {
            warn!("Statistics unavailable for timer view: {}", e);
            "--:--:--".to_string()
        }
    };
    format!(
        "Flowmodoro\n\nstate:  {}\ntime:   {}\naction: {}\nworked: {}\n",
        state_line,
        format_display(&snapshot),
        action_label(&snapshot),
        worked,
    )
}

/// Handle GET /status - Return timer status with statistics and config
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ErrorReply> {
    let statistics = state
        .statistics()
        .map_err(|e| internal_error("Failed to get statistics", e))?;
    let config = state
        .config()
        .map_err(|e| internal_error("Failed to get config", e))?;
    let theme = state
        .theme()
        .map_err(|e| internal_error("Failed to get theme", e))?;

    let snapshot = state.snapshot();
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        display: format_display(&snapshot),
        action: action_label(&snapshot).to_string(),
        paused: snapshot.is_paused(),
        snapshot,
        summary: StatisticsSummary::from(&statistics),
        statistics,
        config,
        theme,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /stats - Return session statistics
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionStatistics>, ErrorReply> {
    state
        .statistics()
        .map(Json)
        .map_err(|e| internal_error("Failed to get statistics", e))
}

/// Handle DELETE /stats - Zero the statistics counters
pub async fn clear_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionStatistics>, ErrorReply> {
    state
        .clear_statistics()
        .map(Json)
        .map_err(|e| internal_error("Failed to clear statistics", e))
}

/// Handle GET /config - Return the timer config
pub async fn config_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimerConfig>, ErrorReply> {
    state
        .config()
        .map(Json)
        .map_err(|e| internal_error("Failed to get config", e))
}

/// Handle PUT /config - Apply a partial config update
pub async fn update_config_handler(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<TimerConfig>, ErrorReply> {
    match state.update_config(&update) {
        Ok(config) => Ok(Json(config)),
        Err(StateError::Config(e)) => {
            warn!("Rejected config update: {}", e);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
        Err(e) => Err(internal_error("Failed to update config", e)),
    }
}

/// Handle GET /theme - Return the stored theme preference
pub async fn theme_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ThemeBody>, ErrorReply> {
    state
        .theme()
        .map(|theme| Json(ThemeBody { theme }))
        .map_err(|e| internal_error("Failed to get theme", e))
}

/// Handle PUT /theme - Store a theme preference
pub async fn set_theme_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ThemeBody>,
) -> Result<Json<ThemeBody>, ErrorReply> {
    state
        .set_theme(body.theme)
        .map(|theme| Json(ThemeBody { theme }))
        .map_err(|e| internal_error("Failed to set theme", e))
}

/// Handle POST /theme/toggle - Swap between light and dark
pub async fn toggle_theme_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ThemeBody>, ErrorReply> {
    state
        .toggle_theme()
        .map(|theme| Json(ThemeBody { theme }))
        .map_err(|e| internal_error("Failed to toggle theme", e))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
