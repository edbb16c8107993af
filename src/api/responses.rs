//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{AppError, StoreError, TimerError},
    presentation::{PresetOption, TimerView},
    state::{
        task_state::{Frequency, Plan, PlanStats, TaskFilter},
        Dashboard, Task,
    },
};

/// Service version reported by health and status
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response for task changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub task: Task,
}

impl TaskResponse {
    pub fn new(status: &str, message: String, task: Task) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            task,
        }
    }
}

/// Response for timer operations
#[derive(Debug, Clone, Serialize)]
pub struct TimerResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerView,
}

impl TimerResponse {
    pub fn new(message: impl Into<String>, timer: TimerView) -> Self {
        Self {
            status: timer.status_label.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// Generated plan with completion figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub filter: TaskFilter,
    pub tasks: Plan,
    pub stats: PlanStats,
}

/// Progress dashboard of the signed-in user
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub dashboard: Dashboard,
}

/// Choices offered by the selection screen and the timer settings panel
#[derive(Debug, Clone, Serialize)]
pub struct OptionsResponse {
    pub home_sizes: Vec<&'static str>,
    pub pet_choices: Vec<ChoiceOption>,
    pub frequencies: Vec<&'static str>,
    pub quick_presets: Vec<PresetOption>,
    pub extended_presets: Vec<PresetOption>,
    pub custom_min_minutes: u32,
    pub custom_max_minutes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Server status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub open_timers: usize,
    pub version: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: VERSION.to_string(),
        }
    }
}

/// Error body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanQuery {
    pub home_size: Option<String>,
    pub has_pets: Option<String>,
    #[serde(default)]
    pub filter: TaskFilter,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddTaskRequest {
    pub task_name: String,
    pub frequency: Option<Frequency>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresetRequest {
    pub minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomDurationRequest {
    pub input: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Plan(_) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::BlankName) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            AppError::Timer(TimerError::NoRuntime) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::TimerNotOpen(_) => StatusCode::NOT_FOUND,
            AppError::TaskCompleted(_) => StatusCode::CONFLICT,
            AppError::DurationRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}
