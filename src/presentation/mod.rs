//! Timer presentation module
//! 
//! Turns timer engine state into what a task timer widget shows: the gauge,
//! the countdown, duration pickers and audio cues.

pub mod gauge;
pub mod presets;
pub mod task_timer;

// Re-export main types
pub use gauge::{Gauge, Urgency};
pub use presets::{default_duration_for, format_clock, CustomDuration, PresetOption};
pub use task_timer::{PrimaryAction, TaskCompleteCallback, TaskTimer, TimerView};
