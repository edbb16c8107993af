//! Cleaning Plan - A cleaning plan server with per-task countdown timers
//! 
//! This library generates recurring cleaning plans from home attributes and
//! drives one countdown timer per displayed task, with audio cues at the
//! ten second mark and on completion.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod presentation;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
