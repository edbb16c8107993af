//! Countdown timer engine
//!
//! A pure, single-owner state machine. It knows nothing about wall clocks:
//! the tick driver calls [`TimerEngine::tick`] once per period and arms or
//! disarms its wake-up based on what the controls return.

use serde::{Deserialize, Serialize};

/// Observer invoked after each non-final tick with the remaining seconds
pub type TickCallback = Box<dyn FnMut(u64) + Send>;

/// Observer invoked once when a run reaches zero
pub type CompleteCallback = Box<dyn FnMut() + Send>;

/// Run state of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Configuration supplied by the owner when the engine is created
pub struct TimerConfig {
    pub initial_seconds: u64,
    pub on_tick: Option<TickCallback>,
    pub on_complete: Option<CompleteCallback>,
    pub auto_start: bool,
}

impl TimerConfig {
    /// Create a configuration with no callbacks that waits for `start`
    pub fn new(initial_seconds: u64) -> Self {
        Self {
            initial_seconds,
            on_tick: None,
            on_complete: None,
            auto_start: false,
        }
    }

    pub fn on_tick(mut self, callback: impl FnMut(u64) + Send + 'static) -> Self {
        self.on_tick = Some(Box::new(callback));
        self
    }

    pub fn on_complete(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }
}

impl std::fmt::Debug for TimerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerConfig")
            .field("initial_seconds", &self.initial_seconds)
            .field("on_tick", &self.on_tick.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("auto_start", &self.auto_start)
            .finish()
    }
}

/// Read-only view of the engine, published to watchers after every change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub is_paused: bool,
    pub is_completed: bool,
    pub progress_percent: f64,
}

impl TimerSnapshot {
    pub fn status(&self) -> TimerStatus {
        if self.is_completed {
            TimerStatus::Completed
        } else if self.is_running {
            TimerStatus::Running
        } else if self.is_paused {
            TimerStatus::Paused
        } else {
            TimerStatus::Idle
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The engine was not running; nothing changed
    Ignored,
    /// One second elapsed, the run continues
    Ticked(u64),
    /// The run reached zero on this tick
    Completed,
}

/// Countdown state machine
pub struct TimerEngine {
    remaining: u64,
    original: u64,
    status: TimerStatus,
    on_tick: Option<TickCallback>,
    on_complete: Option<CompleteCallback>,
}

impl TimerEngine {
    pub fn new(config: TimerConfig) -> Self {
        let mut engine = Self {
            remaining: config.initial_seconds,
            original: config.initial_seconds,
            status: TimerStatus::Idle,
            on_tick: config.on_tick,
            on_complete: config.on_complete,
        };
        if config.auto_start {
            engine.start();
        }
        engine
    }

    /// Move to `Running`. Returns true when the tick source has to be armed.
    ///
    /// A completed or empty timer stays where it is; callers reset or
    /// retarget it first.
    pub fn start(&mut self) -> bool {
        if !self.can_start() {
            return false;
        }
        self.status = TimerStatus::Running;
        true
    }

    /// Whether `start` would begin a run
    pub fn can_start(&self) -> bool {
        matches!(self.status, TimerStatus::Idle | TimerStatus::Paused) && self.remaining > 0
    }

    /// Suspend a running countdown, keeping the remaining time
    pub fn pause(&mut self) {
        if self.status == TimerStatus::Running {
            self.status = TimerStatus::Paused;
        }
    }

    /// Restore the last configured duration
    pub fn reset(&mut self) {
        self.remaining = self.original;
        self.status = TimerStatus::Idle;
    }

    /// Retarget to a new duration, which also becomes the progress baseline
    pub fn set_time(&mut self, seconds: u64) {
        self.original = seconds;
        self.reset();
    }

    /// Apply a new initial duration from the owner's configuration.
    ///
    /// Only an idle timer follows it; returns whether it was applied.
    pub fn reconfigure(&mut self, initial_seconds: u64) -> bool {
        if self.status != TimerStatus::Idle {
            return false;
        }
        self.set_time(initial_seconds);
        true
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != TimerStatus::Running {
            return TickOutcome::Ignored;
        }

        if self.remaining <= 1 {
            self.remaining = 0;
            self.status = TimerStatus::Completed;
            if let Some(on_complete) = self.on_complete.as_mut() {
                on_complete();
            }
            return TickOutcome::Completed;
        }

        self.remaining -= 1;
        if let Some(on_tick) = self.on_tick.as_mut() {
            on_tick(self.remaining);
        }
        TickOutcome::Ticked(self.remaining)
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining
    }

    pub fn original_seconds(&self) -> u64 {
        self.original
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Share of the original duration already elapsed, in percent
    pub fn progress(&self) -> f64 {
        if self.original == 0 {
            return 0.0;
        }
        let elapsed = self.original.saturating_sub(self.remaining) as f64;
        (elapsed / self.original as f64 * 100.0).clamp(0.0, 100.0)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            remaining_seconds: self.remaining,
            is_running: self.status == TimerStatus::Running,
            is_paused: self.status == TimerStatus::Paused,
            is_completed: self.status == TimerStatus::Completed,
            progress_percent: self.progress(),
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("remaining", &self.remaining)
            .field("original", &self.original)
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_engine(seconds: u64) -> (TimerEngine, Arc<Mutex<Vec<u64>>>, Arc<Mutex<u32>>) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(0));
        let tick_log = Arc::clone(&ticks);
        let complete_log = Arc::clone(&completions);
        let engine = TimerEngine::new(
            TimerConfig::new(seconds)
                .on_tick(move |remaining| tick_log.lock().unwrap().push(remaining))
                .on_complete(move || *complete_log.lock().unwrap() += 1),
        );
        (engine, ticks, completions)
    }

    #[test]
    fn test_fresh_engine_is_idle_at_full_duration() {
        for seconds in [1, 5, 60, 1500, 28_800] {
            let engine = TimerEngine::new(TimerConfig::new(seconds));
            let snapshot = engine.snapshot();
            assert_eq!(snapshot.remaining_seconds, seconds);
            assert!(!snapshot.is_running);
            assert!(!snapshot.is_paused);
            assert!(!snapshot.is_completed);
            assert_eq!(snapshot.progress_percent, 0.0);
            assert_eq!(snapshot.status(), TimerStatus::Idle);
        }
    }

    #[test]
    fn test_five_second_run_fires_ticks_then_completes_once() {
        let (mut engine, ticks, completions) = recording_engine(5);
        assert!(engine.start());

        let outcomes: Vec<TickOutcome> = (0..5).map(|_| engine.tick()).collect();
        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Ticked(4),
                TickOutcome::Ticked(3),
                TickOutcome::Ticked(2),
                TickOutcome::Ticked(1),
                TickOutcome::Completed,
            ]
        );
        assert_eq!(*ticks.lock().unwrap(), vec![4, 3, 2, 1]);
        assert_eq!(*completions.lock().unwrap(), 1);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.remaining_seconds, 0);
        assert!(snapshot.is_completed);
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.progress_percent, 100.0);

        // Further ticks are ignored and never re-fire completion
        assert_eq!(engine.tick(), TickOutcome::Ignored);
        assert_eq!(*completions.lock().unwrap(), 1);
    }

    #[test]
    fn test_completed_timer_does_not_restart() {
        let (mut engine, _, _) = recording_engine(1);
        engine.start();
        assert_eq!(engine.tick(), TickOutcome::Completed);
        assert!(!engine.start());
        assert_eq!(engine.status(), TimerStatus::Completed);

        engine.reset();
        assert_eq!(engine.remaining_seconds(), 1);
        assert!(engine.start());
    }

    #[test]
    fn test_pause_then_start_resumes_from_same_value() {
        let (mut engine, ticks, _) = recording_engine(10);
        engine.start();
        engine.tick();
        engine.tick();
        engine.pause();
        assert_eq!(engine.status(), TimerStatus::Paused);

        // Paused engines ignore ticks
        assert_eq!(engine.tick(), TickOutcome::Ignored);
        assert_eq!(engine.remaining_seconds(), 8);

        assert!(engine.start());
        assert_eq!(engine.tick(), TickOutcome::Ticked(7));
        assert_eq!(*ticks.lock().unwrap(), vec![9, 8, 7]);
    }

    #[test]
    fn test_pause_is_idempotent_outside_running() {
        let mut engine = TimerEngine::new(TimerConfig::new(30));
        engine.pause();
        engine.pause();
        assert_eq!(engine.status(), TimerStatus::Idle);

        engine.start();
        engine.pause();
        engine.pause();
        let snapshot = engine.snapshot();
        assert!(snapshot.is_paused);
        assert!(!snapshot.is_running);
    }

    #[test]
    fn test_reset_restores_last_configured_duration() {
        let mut engine = TimerEngine::new(TimerConfig::new(30));
        engine.start();
        engine.tick();
        engine.reset();
        assert_eq!(engine.snapshot().remaining_seconds, 30);

        engine.set_time(12);
        engine.start();
        engine.tick();
        engine.pause();
        engine.reset();
        assert_eq!(engine.remaining_seconds(), 12);
        assert_eq!(engine.status(), TimerStatus::Idle);
    }

    #[test]
    fn test_set_time_resets_progress_baseline() {
        let mut engine = TimerEngine::new(TimerConfig::new(4));
        engine.start();
        engine.tick();
        engine.tick();
        assert_eq!(engine.progress(), 50.0);

        engine.set_time(100);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.progress_percent, 0.0);
        assert_eq!(snapshot.remaining_seconds, 100);
        assert_eq!(engine.original_seconds(), 100);
        assert!(!snapshot.is_running);
    }

    #[test]
    fn test_progress_is_monotonic_and_bounded() {
        let mut engine = TimerEngine::new(TimerConfig::new(7));
        engine.start();
        let mut last = engine.progress();
        while engine.tick() != TickOutcome::Ignored {
            let progress = engine.progress();
            assert!(progress >= last);
            assert!((0.0..=100.0).contains(&progress));
            last = progress;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn test_zero_duration_is_already_expired() {
        let (mut engine, ticks, completions) = recording_engine(0);
        assert!(!engine.start());
        assert_eq!(engine.tick(), TickOutcome::Ignored);
        assert_eq!(engine.progress(), 0.0);
        assert!(ticks.lock().unwrap().is_empty());
        assert_eq!(*completions.lock().unwrap(), 0);
    }

    #[test]
    fn test_auto_start_begins_running() {
        let engine = TimerEngine::new(TimerConfig::new(3).auto_start(true));
        assert!(engine.is_running());

        let empty = TimerEngine::new(TimerConfig::new(0).auto_start(true));
        assert!(!empty.is_running());
    }

    #[test]
    fn test_reconfigure_only_applies_when_idle() {
        let mut engine = TimerEngine::new(TimerConfig::new(60));
        assert!(engine.reconfigure(90));
        assert_eq!(engine.remaining_seconds(), 90);

        engine.start();
        assert!(!engine.reconfigure(30));
        engine.pause();
        assert!(!engine.reconfigure(30));
        assert_eq!(engine.original_seconds(), 90);
    }
}
