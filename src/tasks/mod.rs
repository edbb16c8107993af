//! Background tasks module
//! 
//! This module contains the tokio tasks that drive timer ticks.

pub mod tick_driver;

// Re-export main types
pub use tick_driver::{TimerHandle, TICK_PERIOD};
