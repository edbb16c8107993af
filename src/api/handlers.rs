//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::Utc;
use tracing::info;

use crate::{
    error::AppError,
    presentation::presets::{
        extended_options, quick_options, CUSTOM_MAX_MINUTES, CUSTOM_MIN_MINUTES,
    },
    services::NewTask,
    state::{
        task_state::{Frequency, HomeSize, PetsChoice},
        AppState,
    },
};
use super::responses::{
    AddTaskRequest, ChoiceOption, CustomDurationRequest, DashboardResponse, HealthResponse,
    OptionsResponse, PlanQuery, PlanResponse, PresetRequest, StatusResponse, TaskResponse,
    TimerResponse, VERSION,
};

/// Header carrying the opaque identifier of the signed-in user
pub const USER_HEADER: &str = "x-user-id";

fn user_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Handle GET /plan - Generate the cleaning plan for a selection
pub async fn plan_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PlanQuery>,
) -> Result<Json<PlanResponse>, AppError> {
    let summary = state.plan(
        user_id(&headers),
        query.home_size.as_deref(),
        query.has_pets.as_deref(),
        query.filter,
    )?;
    Ok(Json(PlanResponse {
        filter: query.filter,
        tasks: summary.plan,
        stats: summary.stats,
    }))
}

/// Handle POST /tasks - Add a task for the signed-in user
pub async fn add_task_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AddTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    let task = state.add_task(
        user_id(&headers),
        NewTask {
            task_name: request.task_name,
            frequency: request.frequency.unwrap_or(Frequency::Daily),
        },
    )?;
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse::new("created", "Task added successfully!".to_string(), task)),
    ))
}

/// Handle POST /tasks/:id/toggle - Flip a task's completion
pub async fn toggle_task_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = state.toggle_task(user_id(&headers), id)?;
    let (status, message) = if task.is_completed {
        ("completed", "Task completed! 🎉")
    } else {
        ("active", "Task marked as not completed.")
    };
    Ok(Json(TaskResponse::new(status, message.to_string(), task)))
}

/// Handle DELETE /tasks/:id - Delete a task
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = state.delete_task(user_id(&headers), id)?;
    Ok(Json(TaskResponse::new(
        "deleted",
        "Task deleted successfully!".to_string(),
        task,
    )))
}

/// Handle POST /tasks/:id/timer - Show the task's timer
pub async fn open_timer_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TimerResponse>, AppError> {
    let view = state.open_timer(user_id(&headers), id)?;
    Ok(Json(TimerResponse::new("Timer ready", view)))
}

/// Handle GET /tasks/:id/timer - Current timer view
pub async fn timer_view_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TimerResponse>, AppError> {
    let view = state.timer_view(user_id(&headers), id)?;
    Ok(Json(TimerResponse::new("Timer state", view)))
}

/// Handle DELETE /tasks/:id/timer - Hide the task's timer
pub async fn close_timer_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    state.close_timer(user_id(&headers), id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /tasks/:id/timer/start - Start or resume
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TimerResponse>, AppError> {
    let view = state.with_timer(user_id(&headers), id, |timer| {
        timer.start()?;
        Ok(())
    })?;
    info!("Timer for task {} started", id);
    Ok(Json(TimerResponse::new("Timer started", view)))
}

/// Handle POST /tasks/:id/timer/pause - Pause
pub async fn pause_timer_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TimerResponse>, AppError> {
    let view = state.with_timer(user_id(&headers), id, |timer| {
        timer.pause();
        Ok(())
    })?;
    Ok(Json(TimerResponse::new("Timer paused", view)))
}

/// Handle POST /tasks/:id/timer/reset - Reset to the configured duration
pub async fn reset_timer_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TimerResponse>, AppError> {
    let view = state.with_timer(user_id(&headers), id, |timer| {
        timer.reset();
        Ok(())
    })?;
    Ok(Json(TimerResponse::new("Timer reset", view)))
}

/// Handle POST /tasks/:id/timer/settings - Open or close the settings panel
pub async fn settings_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TimerResponse>, AppError> {
    let view = state.with_timer(user_id(&headers), id, |timer| {
        timer.toggle_settings();
        Ok(())
    })?;
    let message = if view.settings_open {
        "Settings opened"
    } else {
        "Settings closed"
    };
    Ok(Json(TimerResponse::new(message, view)))
}

/// Handle POST /tasks/:id/timer/preset - Apply a preset duration
pub async fn preset_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(request): Json<PresetRequest>,
) -> Result<Json<TimerResponse>, AppError> {
    let view = state.with_timer(user_id(&headers), id, |timer| {
        timer
            .apply_preset(request.minutes)
            .map(|_| ())
            .ok_or_else(|| AppError::DurationRejected(format!("{} minutes", request.minutes)))
    })?;
    Ok(Json(TimerResponse::new(
        format!("Timer set to {} minutes", request.minutes),
        view,
    )))
}

/// Handle POST /tasks/:id/timer/custom - Apply a free-form duration
pub async fn custom_duration_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(request): Json<CustomDurationRequest>,
) -> Result<Json<TimerResponse>, AppError> {
    let view = state.with_timer(user_id(&headers), id, |timer| {
        timer
            .apply_custom(&request.input)
            .map(|_| ())
            .ok_or_else(|| AppError::DurationRejected(format!("{:?}", request.input)))
    })?;
    Ok(Json(TimerResponse::new(
        format!("Timer set to {}", view.clock),
        view,
    )))
}

/// Handle GET /dashboard - Progress of the signed-in user
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, AppError> {
    let dashboard = state.dashboard(user_id(&headers))?;
    Ok(Json(DashboardResponse {
        timestamp: Utc::now(),
        dashboard,
    }))
}

/// Handle GET /options - Selection and duration choices
pub async fn options_handler() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        home_sizes: HomeSize::ALL.iter().map(|size| size.as_str()).collect(),
        pet_choices: [PetsChoice::Yes, PetsChoice::No]
            .iter()
            .map(|choice| ChoiceOption {
                value: choice.as_str(),
                label: choice.label(),
            })
            .collect(),
        frequencies: [Frequency::Daily, Frequency::Weekly, Frequency::Monthly]
            .iter()
            .map(|frequency| frequency.as_str())
            .collect(),
        quick_presets: quick_options(),
        extended_presets: extended_options(),
        custom_min_minutes: CUSTOM_MIN_MINUTES,
        custom_max_minutes: CUSTOM_MAX_MINUTES,
    })
}

/// Handle GET /status - Return current server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        open_timers: state.open_timer_count(),
        version: VERSION.to_string(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
