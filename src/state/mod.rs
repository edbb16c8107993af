//! State management module
//! 
//! This module contains the timer engine, task records, the progress
//! dashboard and the shared application state.

pub mod app_state;
pub mod dashboard;
pub mod task_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use dashboard::Dashboard;
pub use task_state::{Frequency, Task, TaskFilter};
pub use timer_state::{TimerConfig, TimerEngine, TimerSnapshot, TimerStatus};
