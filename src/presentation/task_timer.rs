//! Per-task timer presentation
//!
//! A [`TaskTimer`] owns exactly one [`TimerHandle`] for as long as the task's
//! timer is shown. It picks the starting duration, runs the settings panel,
//! plays the audio cues and reports completion back to the task's owner.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::TimerError,
    services::audio::{play_cue, Cue, ToneSink},
    state::timer_state::{TimerConfig, TimerSnapshot, TimerStatus},
    tasks::TimerHandle,
};
use super::{
    gauge::{status_label, Gauge, Urgency},
    presets::{default_duration_for, format_clock, is_preset, minutes_to_seconds, CustomDuration},
};

/// Remaining seconds at which the warning blip plays
pub const WARNING_AT_SECONDS: u64 = 10;

/// Invoked when the timer of a not yet completed task runs out
pub type TaskCompleteCallback = Arc<dyn Fn() + Send + Sync>;

/// Flags shared with the engine callbacks
#[derive(Debug, Default)]
struct PanelState {
    settings_open: AtomicBool,
    task_completed: AtomicBool,
}

/// What the primary button does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    Start,
    Resume,
    Pause,
}

/// Everything needed to draw one task timer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerView {
    pub task_name: String,
    pub status: TimerStatus,
    pub status_label: &'static str,
    pub clock: String,
    pub progress_rounded: u32,
    pub gauge: Gauge,
    pub urgency: Urgency,
    pub primary_action: PrimaryAction,
    pub start_enabled: bool,
    pub settings_open: bool,
    pub default_minutes: u64,
    pub completion_message: Option<&'static str>,
    pub timer: TimerSnapshot,
}

pub struct TaskTimer {
    task_name: String,
    default_seconds: u64,
    custom_seconds: Option<u64>,
    handle: TimerHandle,
    panel: Arc<PanelState>,
}

impl TaskTimer {
    /// Mount a timer for `task_name`, starting from its default duration
    pub fn mount(
        task_name: impl Into<String>,
        task_completed: bool,
        on_task_complete: Option<TaskCompleteCallback>,
        sink: Arc<dyn ToneSink>,
    ) -> Result<Self, TimerError> {
        let task_name = task_name.into();
        let default_seconds = default_duration_for(&task_name);
        let panel = Arc::new(PanelState {
            settings_open: AtomicBool::new(false),
            task_completed: AtomicBool::new(task_completed),
        });

        let tick_sink = Arc::clone(&sink);
        let complete_panel = Arc::clone(&panel);
        let config = TimerConfig::new(default_seconds)
            .on_tick(move |remaining| {
                if remaining == WARNING_AT_SECONDS {
                    play_cue(tick_sink.as_ref(), &Cue::warning_blip());
                }
            })
            .on_complete(move || {
                play_cue(sink.as_ref(), &Cue::completion_chime());
                if !complete_panel.task_completed.swap(true, Ordering::SeqCst) {
                    if let Some(callback) = &on_task_complete {
                        callback();
                    }
                }
                complete_panel.settings_open.store(false, Ordering::SeqCst);
            });

        let handle = TimerHandle::new(config)?;
        info!("Mounted timer for '{}' ({}s default)", task_name, default_seconds);

        Ok(Self {
            task_name,
            default_seconds,
            custom_seconds: None,
            handle,
            panel,
        })
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    /// Duration the timer starts from: the applied custom value, or the
    /// task's default
    pub fn initial_seconds(&self) -> u64 {
        self.custom_seconds.unwrap_or(self.default_seconds)
    }

    pub fn start(&mut self) -> Result<TimerSnapshot, TimerError> {
        self.handle.start()
    }

    pub fn pause(&mut self) -> TimerSnapshot {
        self.handle.pause()
    }

    pub fn reset(&mut self) -> TimerSnapshot {
        self.handle.reset()
    }

    /// Open or close the settings panel, returning the new state
    pub fn toggle_settings(&self) -> bool {
        !self.panel.settings_open.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn settings_open(&self) -> bool {
        self.panel.settings_open.load(Ordering::SeqCst)
    }

    /// Apply one of the offered presets. Unknown values are refused.
    pub fn apply_preset(&mut self, minutes: u32) -> Option<TimerSnapshot> {
        if !is_preset(minutes) {
            debug!("Preset of {} minutes refused", minutes);
            return None;
        }
        Some(self.apply_seconds(minutes_to_seconds(minutes)))
    }

    /// Apply free-form input. Input the panel would not accept is refused.
    pub fn apply_custom(&mut self, input: &str) -> Option<TimerSnapshot> {
        match CustomDuration::parse(input) {
            Some(duration) => Some(self.apply_seconds(duration.seconds())),
            None => {
                debug!("Custom duration {:?} refused", input);
                None
            }
        }
    }

    /// Follow a renamed task. The default duration is recomputed and taken
    /// over while the timer is idle and no custom duration was applied.
    pub fn set_task_name(&mut self, task_name: impl Into<String>) -> TimerSnapshot {
        self.task_name = task_name.into();
        self.default_seconds = default_duration_for(&self.task_name);
        self.handle.reconfigure(self.initial_seconds())
    }

    /// Keep the owner's completion flag in sync
    pub fn set_task_completed(&self, completed: bool) {
        self.panel.task_completed.store(completed, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.handle.snapshot()
    }

    pub fn view(&self) -> TimerView {
        let timer = self.handle.snapshot();
        let status = timer.status();

        TimerView {
            task_name: self.task_name.clone(),
            status,
            status_label: status_label(status),
            clock: format_clock(timer.remaining_seconds),
            progress_rounded: timer.progress_percent.round() as u32,
            gauge: Gauge::for_progress(timer.progress_percent),
            urgency: Urgency::for_snapshot(&timer),
            primary_action: match status {
                TimerStatus::Running => PrimaryAction::Pause,
                TimerStatus::Paused => PrimaryAction::Resume,
                TimerStatus::Idle | TimerStatus::Completed => PrimaryAction::Start,
            },
            start_enabled: !timer.is_completed && timer.remaining_seconds > 0,
            settings_open: self.settings_open(),
            default_minutes: (self.default_seconds as f64 / 60.0).round() as u64,
            completion_message: timer
                .is_completed
                .then_some("Great job! Task completed 🎉"),
            timer,
        }
    }

    fn apply_seconds(&mut self, seconds: u64) -> TimerSnapshot {
        self.custom_seconds = Some(seconds);
        let snapshot = self.handle.set_time(seconds);
        self.panel.settings_open.store(false, Ordering::SeqCst);
        snapshot
    }
}

impl std::fmt::Debug for TaskTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTimer")
            .field("task_name", &self.task_name)
            .field("default_seconds", &self.default_seconds)
            .field("custom_seconds", &self.custom_seconds)
            .field("handle", &self.handle)
            .finish()
    }
}
