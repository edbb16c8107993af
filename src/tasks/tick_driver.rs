//! Tick driver for a countdown timer
//!
//! Each armed run owns one tokio task that wakes once per period and
//! advances the engine. Every control that stops a run aborts that task and
//! bumps the run generation before returning, so a tick that already woke up
//! finds a stale generation and leaves the engine alone.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    error::TimerError,
    state::timer_state::{TickOutcome, TimerConfig, TimerEngine, TimerSnapshot},
};

/// Default tick cadence
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Shared {
    engine: TimerEngine,
    generation: u64,
}

/// Owner handle for a running countdown.
///
/// Dropping the handle cancels any pending tick.
#[derive(Debug)]
pub struct TimerHandle {
    shared: Arc<Mutex<Shared>>,
    snapshot_tx: Arc<watch::Sender<TimerSnapshot>>,
    ticker: Option<JoinHandle<()>>,
    period: Duration,
}

impl TimerHandle {
    /// Create a handle ticking once per second
    pub fn new(config: TimerConfig) -> Result<Self, TimerError> {
        Self::with_period(config, TICK_PERIOD)
    }

    /// Create a handle with a custom tick period
    pub fn with_period(config: TimerConfig, period: Duration) -> Result<Self, TimerError> {
        let engine = TimerEngine::new(config);
        let auto_started = engine.is_running();
        let (snapshot_tx, _) = watch::channel(engine.snapshot());

        let mut handle = Self {
            shared: Arc::new(Mutex::new(Shared {
                engine,
                generation: 0,
            })),
            snapshot_tx: Arc::new(snapshot_tx),
            ticker: None,
            period,
        };

        if auto_started {
            let runtime = current_runtime()?;
            let shared_arc = Arc::clone(&handle.shared);
            let mut shared = lock(&shared_arc);
            handle.arm(&runtime, &mut shared);
        }
        Ok(handle)
    }

    /// Begin or resume the countdown
    pub fn start(&mut self) -> Result<TimerSnapshot, TimerError> {
        let shared_arc = Arc::clone(&self.shared);
        let mut shared = lock(&shared_arc);

        if !shared.engine.is_running() {
            if !shared.engine.can_start() {
                debug!(
                    "Start ignored, timer is {:?} with {}s remaining",
                    shared.engine.status(),
                    shared.engine.remaining_seconds()
                );
                return Ok(self.publish(&shared));
            }
            let runtime = current_runtime()?;
            shared.engine.start();
            self.arm(&runtime, &mut shared);
        }
        Ok(self.publish(&shared))
    }

    /// Suspend the countdown, keeping the remaining time
    pub fn pause(&mut self) -> TimerSnapshot {
        let shared_arc = Arc::clone(&self.shared);
        let mut shared = lock(&shared_arc);
        self.disarm(&mut shared);
        shared.engine.pause();
        self.publish(&shared)
    }

    /// Restore the last configured duration and stop
    pub fn reset(&mut self) -> TimerSnapshot {
        let shared_arc = Arc::clone(&self.shared);
        let mut shared = lock(&shared_arc);
        self.disarm(&mut shared);
        shared.engine.reset();
        self.publish(&shared)
    }

    /// Retarget to a new duration and stop
    pub fn set_time(&mut self, seconds: u64) -> TimerSnapshot {
        let shared_arc = Arc::clone(&self.shared);
        let mut shared = lock(&shared_arc);
        self.disarm(&mut shared);
        shared.engine.set_time(seconds);
        info!("Timer retargeted to {}s", seconds);
        self.publish(&shared)
    }

    /// Follow a changed initial duration while idle
    pub fn reconfigure(&mut self, initial_seconds: u64) -> TimerSnapshot {
        let shared_arc = Arc::clone(&self.shared);
        let mut shared = lock(&shared_arc);
        if shared.engine.reconfigure(initial_seconds) {
            debug!("Timer reconfigured to {}s", initial_seconds);
        }
        self.publish(&shared)
    }

    /// Current engine state
    pub fn snapshot(&self) -> TimerSnapshot {
        lock(&self.shared).engine.snapshot()
    }

    /// Watch the snapshots published after every change and tick
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Whether a tick registration is currently pending
    pub fn is_armed(&self) -> bool {
        self.ticker.as_ref().is_some_and(|ticker| !ticker.is_finished())
    }

    fn arm(&mut self, runtime: &tokio::runtime::Handle, shared: &mut Shared) {
        self.disarm(shared);

        let generation = shared.generation;
        let ticker = runtime.spawn(run_ticker(
            Arc::clone(&self.shared),
            Arc::clone(&self.snapshot_tx),
            generation,
            self.period,
        ));
        self.ticker = Some(ticker);
        debug!("Tick source armed (generation {})", generation);
    }

    fn disarm(&mut self, shared: &mut Shared) {
        shared.generation = shared.generation.wrapping_add(1);
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            debug!("Tick source cancelled");
        }
    }

    fn publish(&self, shared: &Shared) -> TimerSnapshot {
        let snapshot = shared.engine.snapshot();
        self.snapshot_tx.send_replace(snapshot);
        snapshot
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        let shared_arc = Arc::clone(&self.shared);
        let mut shared = lock(&shared_arc);
        self.disarm(&mut shared);
    }
}

fn current_runtime() -> Result<tokio::runtime::Handle, TimerError> {
    tokio::runtime::Handle::try_current().map_err(|_| TimerError::NoRuntime)
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tick loop for one armed run
async fn run_ticker(
    shared: Arc<Mutex<Shared>>,
    snapshot_tx: Arc<watch::Sender<TimerSnapshot>>,
    generation: u64,
    period: Duration,
) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let outcome = {
            let mut shared = lock(&shared);
            if shared.generation != generation {
                debug!("Stale tick for generation {} dropped", generation);
                return;
            }
            let outcome = shared.engine.tick();
            snapshot_tx.send_replace(shared.engine.snapshot());
            outcome
        };

        match outcome {
            TickOutcome::Ticked(remaining) => debug!("Timer tick, {}s remaining", remaining),
            TickOutcome::Completed => {
                info!("Timer completed");
                return;
            }
            TickOutcome::Ignored => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::{advance, sleep};

    fn counting_config(seconds: u64) -> (TimerConfig, Arc<Mutex<Vec<u64>>>, Arc<AtomicU32>) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(AtomicU32::new(0));
        let tick_log = Arc::clone(&ticks);
        let complete_count = Arc::clone(&completions);
        let config = TimerConfig::new(seconds)
            .on_tick(move |remaining| tick_log.lock().unwrap().push(remaining))
            .on_complete(move || {
                complete_count.fetch_add(1, Ordering::SeqCst);
            });
        (config, ticks, completions)
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_counts_down_to_completion() {
        let (config, ticks, completions) = counting_config(5);
        let mut handle = TimerHandle::new(config).unwrap();
        handle.start().unwrap();

        sleep(Duration::from_millis(5_500)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![4, 3, 2, 1]);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.remaining_seconds, 0);
        assert!(snapshot.is_completed);
        assert!(!snapshot.is_running);

        sleep(Duration::from_secs(3)).await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(!handle.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_cancels_pending_ticks() {
        let (config, ticks, _) = counting_config(10);
        let mut handle = TimerHandle::new(config).unwrap();
        handle.start().unwrap();

        sleep(Duration::from_millis(2_500)).await;
        let paused = handle.pause();
        assert_eq!(paused.remaining_seconds, 8);
        assert!(paused.is_paused);
        assert!(!handle.is_armed());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.snapshot().remaining_seconds, 8);

        handle.start().unwrap();
        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(handle.snapshot().remaining_seconds, 7);
        assert_eq!(*ticks.lock().unwrap(), vec![9, 8, 7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_and_set_time_stop_the_run() {
        let (config, _, completions) = counting_config(3);
        let mut handle = TimerHandle::new(config).unwrap();
        handle.start().unwrap();
        sleep(Duration::from_millis(1_500)).await;

        let reset = handle.reset();
        assert_eq!(reset.remaining_seconds, 3);
        assert!(!reset.is_running);

        handle.start().unwrap();
        sleep(Duration::from_millis(1_500)).await;
        let retargeted = handle.set_time(60);
        assert_eq!(retargeted.remaining_seconds, 60);
        assert_eq!(retargeted.progress_percent, 0.0);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.snapshot().remaining_seconds, 60);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_ticks() {
        let (config, ticks, completions) = counting_config(2);
        let mut handle = TimerHandle::new(config).unwrap();
        handle.start().unwrap();
        drop(handle);

        advance(Duration::from_secs(5)).await;
        sleep(Duration::from_millis(10)).await;
        assert!(ticks.lock().unwrap().is_empty());
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_single_cadence() {
        let (config, ticks, _) = counting_config(10);
        let mut handle = TimerHandle::new(config).unwrap();
        handle.start().unwrap();
        sleep(Duration::from_millis(500)).await;
        handle.start().unwrap();

        sleep(Duration::from_millis(2_600)).await;
        assert_eq!(*ticks.lock().unwrap(), vec![9, 8, 7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_each_tick() {
        let mut handle = TimerHandle::new(TimerConfig::new(3)).unwrap();
        let mut rx = handle.subscribe();
        handle.start().unwrap();
        assert!(rx.borrow_and_update().is_running);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().remaining_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_start_arms_immediately() {
        let handle = TimerHandle::new(TimerConfig::new(4).auto_start(true)).unwrap();
        assert!(handle.is_armed());
        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(handle.snapshot().remaining_seconds, 3);
    }

    #[test]
    fn test_arming_without_runtime_fails() {
        let mut handle = TimerHandle::new(TimerConfig::new(4)).unwrap();
        assert!(matches!(handle.start(), Err(TimerError::NoRuntime)));
        let snapshot = handle.snapshot();
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.remaining_seconds, 4);
    }
}
