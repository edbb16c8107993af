//! Circular progress gauge and colour bands

use serde::Serialize;

use crate::state::timer_state::{TimerSnapshot, TimerStatus};

/// Outer size of the rendered ring, in pixels
pub const GAUGE_SIZE: f64 = 140.0;
pub const GAUGE_STROKE: f64 = 10.0;

/// Geometry of a stroked ring whose visible arc follows progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gauge {
    pub size: f64,
    pub stroke_width: f64,
    pub radius: f64,
    pub circumference: f64,
    pub dash_offset: f64,
}

impl Gauge {
    pub fn new(size: f64, stroke_width: f64, progress_percent: f64) -> Self {
        let radius = (size - stroke_width) / 2.0;
        let circumference = radius * 2.0 * std::f64::consts::PI;
        let progress = progress_percent.clamp(0.0, 100.0);
        Self {
            size,
            stroke_width,
            radius,
            circumference,
            dash_offset: circumference - progress / 100.0 * circumference,
        }
    }

    pub fn for_progress(progress_percent: f64) -> Self {
        Self::new(GAUGE_SIZE, GAUGE_STROKE, progress_percent)
    }
}

/// Colour band of the countdown text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Completed,
    Critical,
    Warning,
    Normal,
}

impl Urgency {
    pub fn for_snapshot(snapshot: &TimerSnapshot) -> Self {
        if snapshot.is_completed {
            Urgency::Completed
        } else if snapshot.remaining_seconds <= 60 {
            Urgency::Critical
        } else if snapshot.remaining_seconds <= 300 {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

pub fn status_label(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Completed => "Completed!",
        TimerStatus::Running => "In Progress...",
        TimerStatus::Paused => "Paused",
        TimerStatus::Idle => "Ready to Start",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(remaining_seconds: u64, is_completed: bool) -> TimerSnapshot {
        TimerSnapshot {
            remaining_seconds,
            is_running: !is_completed,
            is_paused: false,
            is_completed,
            progress_percent: 0.0,
        }
    }

    #[test]
    fn test_gauge_offsets() {
        let empty = Gauge::for_progress(0.0);
        assert_eq!(empty.radius, 65.0);
        assert!((empty.dash_offset - empty.circumference).abs() < 1e-9);

        let half = Gauge::for_progress(50.0);
        assert!((half.dash_offset - half.circumference / 2.0).abs() < 1e-9);

        let full = Gauge::for_progress(140.0);
        assert!(full.dash_offset.abs() < 1e-9);
    }

    #[test]
    fn test_urgency_bands() {
        assert_eq!(Urgency::for_snapshot(&snapshot(0, true)), Urgency::Completed);
        assert_eq!(Urgency::for_snapshot(&snapshot(60, false)), Urgency::Critical);
        assert_eq!(Urgency::for_snapshot(&snapshot(61, false)), Urgency::Warning);
        assert_eq!(Urgency::for_snapshot(&snapshot(300, false)), Urgency::Warning);
        assert_eq!(Urgency::for_snapshot(&snapshot(301, false)), Urgency::Normal);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(TimerStatus::Idle), "Ready to Start");
        assert_eq!(status_label(TimerStatus::Running), "In Progress...");
        assert_eq!(status_label(TimerStatus::Paused), "Paused");
        assert_eq!(status_label(TimerStatus::Completed), "Completed!");
    }
}
