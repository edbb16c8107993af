//! Main application state management

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Instant,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, StoreError},
    presentation::{TaskCompleteCallback, TaskTimer, TimerView},
    services::{NewTask, TaskStore, ToneSink},
};
use super::{
    dashboard::Dashboard,
    task_state::{Plan, PlanStats, Selection, Task, TaskFilter},
};

type TimerMap = Mutex<HashMap<u64, TaskTimer>>;

/// A generated plan ready to be shown
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub plan: Plan,
    pub stats: PlanStats,
}

/// Main application state: the task store and the timers currently shown
pub struct AppState {
    /// Task storage collaborator
    pub store: Arc<dyn TaskStore>,
    /// Audio output shared by every timer
    pub sink: Arc<dyn ToneSink>,
    /// Mounted timers, one per task
    timers: Arc<TimerMap>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TaskStore>,
        sink: Arc<dyn ToneSink>,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            store,
            sink,
            timers: Arc::new(Mutex::new(HashMap::new())),
            start_time: Instant::now(),
            port,
            host,
        }
    }

    /// Generate the plan for a selection. Stats cover the whole plan, the
    /// filter only narrows the listed tasks.
    pub fn plan(
        &self,
        user_id: Option<&str>,
        home_size: Option<&str>,
        has_pets: Option<&str>,
        filter: TaskFilter,
    ) -> Result<PlanSummary, AppError> {
        let selection = Selection::from_parts(home_size, has_pets)?;
        let plan = Plan::build(&self.store.list_visible(user_id), &selection);
        let stats = plan.stats();
        Ok(PlanSummary {
            plan: plan.filtered(filter),
            stats,
        })
    }

    pub fn add_task(&self, user_id: Option<&str>, task: NewTask) -> Result<Task, AppError> {
        Ok(self.store.insert(task, user_id)?)
    }

    /// Flip a task's completion. A completed task's timer is unmounted.
    pub fn toggle_task(&self, user_id: Option<&str>, id: u64) -> Result<Task, AppError> {
        let mut timers = self.lock_timers();
        let task = self.store.toggle(id, user_id)?;
        if task.is_completed {
            if timers.remove(&id).is_some() {
                info!("Timer for task {} unmounted, task completed", id);
            }
        } else if let Some(timer) = timers.get(&id) {
            timer.set_task_completed(false);
        }
        Ok(task)
    }

    /// Delete a task, unmounting its timer first
    pub fn delete_task(&self, user_id: Option<&str>, id: u64) -> Result<Task, AppError> {
        self.store.get(id, user_id)?;
        if self.lock_timers().remove(&id).is_some() {
            info!("Timer for task {} unmounted with its task", id);
        }
        Ok(self.store.delete(id, user_id)?)
    }

    /// Show the timer of a task that is not completed yet
    pub fn open_timer(&self, user_id: Option<&str>, id: u64) -> Result<TimerView, AppError> {
        let task = self.store.get(id, user_id)?;
        if task.is_completed {
            return Err(AppError::TaskCompleted(id));
        }

        let mut timers = self.lock_timers();
        if let Some(timer) = timers.get(&id) {
            return Ok(timer.view());
        }

        let timer = TaskTimer::mount(
            task.task_name,
            task.is_completed,
            Some(self.completion_callback(id)),
            Arc::clone(&self.sink),
        )?;
        let view = timer.view();
        timers.insert(id, timer);
        Ok(view)
    }

    /// Hide a task's timer; its pending ticks are cancelled
    pub fn close_timer(&self, user_id: Option<&str>, id: u64) -> Result<(), AppError> {
        self.store.get(id, user_id)?;
        match self.lock_timers().remove(&id) {
            Some(_) => {
                info!("Timer for task {} unmounted", id);
                Ok(())
            }
            None => Err(AppError::TimerNotOpen(id)),
        }
    }

    pub fn timer_view(&self, user_id: Option<&str>, id: u64) -> Result<TimerView, AppError> {
        self.with_timer(user_id, id, |_| Ok(()))
    }

    /// Run `action` against a mounted timer and return its refreshed view
    pub fn with_timer<F>(
        &self,
        user_id: Option<&str>,
        id: u64,
        action: F,
    ) -> Result<TimerView, AppError>
    where
        F: FnOnce(&mut TaskTimer) -> Result<(), AppError>,
    {
        self.store.get(id, user_id)?;
        let mut timers = self.lock_timers();
        let timer = timers.get_mut(&id).ok_or(AppError::TimerNotOpen(id))?;
        action(timer)?;
        Ok(timer.view())
    }

    /// Progress figures over the tasks the user owns
    pub fn dashboard(&self, user_id: Option<&str>) -> Result<Dashboard, AppError> {
        let user_id = user_id.ok_or(StoreError::Unauthenticated)?;
        let owned: Vec<Task> = self
            .store
            .list_visible(Some(user_id))
            .into_iter()
            .filter(|task| task.user_id.as_deref() == Some(user_id))
            .collect();
        debug!("Dashboard for {} over {} tasks", user_id, owned.len());
        Ok(Dashboard::build(&owned, Utc::now()))
    }

    pub fn open_timer_count(&self) -> usize {
        self.lock_timers().len()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Marks the task completed and unmounts its timer. The callback runs on
    /// the timer's own tick, so the unmount is handed to a separate task.
    fn completion_callback(&self, id: u64) -> TaskCompleteCallback {
        let store = Arc::clone(&self.store);
        let timers = Arc::downgrade(&self.timers);
        Arc::new(move || {
            match store.set_completed(id, true) {
                Ok(task) => info!("Timer finished, task {} ({}) completed", id, task.task_name),
                Err(StoreError::NotFound(_)) => {
                    warn!("Timer finished for task {} which no longer exists", id)
                }
                Err(e) => warn!("Failed to complete task {}: {}", id, e),
            }

            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let timers = Weak::clone(&timers);
                    runtime.spawn(async move {
                        if let Some(timers) = timers.upgrade() {
                            unmount_finished(&timers, id);
                        }
                    });
                }
                Err(_) => warn!("Timer for task {} finished outside a runtime, left mounted", id),
            }
        })
    }

    fn lock_timers(&self) -> MutexGuard<'_, HashMap<u64, TaskTimer>> {
        lock_map(&self.timers)
    }
}

fn lock_map(timers: &TimerMap) -> MutexGuard<'_, HashMap<u64, TaskTimer>> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Unmount the timer of task `id` if it is still the one that finished
fn unmount_finished(timers: &TimerMap, id: u64) {
    let mut timers = lock_map(timers);
    if timers.get(&id).is_some_and(|timer| timer.snapshot().is_completed) {
        timers.remove(&id);
        info!("Finished timer for task {} unmounted", id);
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("open_timers", &self.open_timer_count())
            .field("start_time", &self.start_time)
            .field("port", &self.port)
            .field("host", &self.host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    use crate::{
        services::{InMemoryTaskStore, SilentSink},
        state::task_state::Frequency,
    };

    fn app() -> AppState {
        AppState::new(
            Arc::new(InMemoryTaskStore::with_catalog()),
            Arc::new(SilentSink),
            20554,
            "127.0.0.1".to_string(),
        )
    }

    #[test]
    fn test_plan_requires_selection() {
        let state = app();
        let err = state.plan(None, Some("Small"), None, TaskFilter::All).unwrap_err();
        assert_eq!(err.to_string(), "Please make both selections.");
    }

    #[test]
    fn test_plan_includes_own_tasks() {
        let state = app();
        let plan_for = |user| {
            state
                .plan(Some(user), Some("Small"), Some("No"), TaskFilter::All)
                .unwrap()
        };
        let before = plan_for("alice");
        state
            .add_task(
                Some("alice"),
                NewTask {
                    task_name: "Descale kettle".to_string(),
                    frequency: Frequency::Monthly,
                },
            )
            .unwrap();
        let after = plan_for("alice");
        assert_eq!(after.stats.total, before.stats.total + 1);
        assert_eq!(
            after.plan.monthly.last().map(|t| t.task_name.as_str()),
            Some("Descale kettle")
        );

        let other = plan_for("bob");
        assert_eq!(other.stats.total, before.stats.total);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_timer_completes_task_and_unmounts() {
        let state = app();
        state.open_timer(None, 1).unwrap();
        state
            .with_timer(None, 1, |timer| {
                timer
                    .apply_custom("1")
                    .ok_or_else(|| AppError::DurationRejected("1".to_string()))?;
                timer.start()?;
                Ok(())
            })
            .unwrap();

        sleep(Duration::from_secs(59)).await;
        assert_eq!(state.open_timer_count(), 1);

        sleep(Duration::from_secs(2)).await;
        assert!(state.store.get(1, None).unwrap().is_completed);
        assert_eq!(state.open_timer_count(), 0);
        assert!(matches!(state.timer_view(None, 1), Err(AppError::TimerNotOpen(1))));

        // A completed task cannot mount a new timer
        assert!(matches!(state.open_timer(None, 1), Err(AppError::TaskCompleted(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completing_task_unmounts_running_timer() {
        let state = app();
        state.open_timer(None, 1).unwrap();
        state.with_timer(None, 1, |timer| Ok(timer.start().map(|_| ())?)).unwrap();
        sleep(Duration::from_millis(3_500)).await;

        let task = state.toggle_task(None, 1).unwrap();
        assert!(task.is_completed);
        assert_eq!(state.open_timer_count(), 0);

        // Nothing keeps ticking for the unmounted timer
        sleep(Duration::from_secs(5)).await;
        assert_eq!(state.open_timer_count(), 0);
        assert!(state.store.get(1, None).unwrap().is_completed);

        // Back to active, the task can show a fresh timer
        assert!(!state.toggle_task(None, 1).unwrap().is_completed);
        let view = state.open_timer(None, 1).unwrap();
        assert_eq!(view.clock, "25:00");
        assert_eq!(state.open_timer_count(), 1);
    }

    #[test]
    fn test_unmount_after_finish_leaves_unfinished_timer() {
        let state = app();
        state.open_timer(None, 2).unwrap();
        unmount_finished(&state.timers, 2);
        assert_eq!(state.open_timer_count(), 1);
    }

    #[test]
    fn test_dashboard_needs_user_and_covers_owned_tasks() {
        let state = app();
        assert!(matches!(
            state.dashboard(None),
            Err(AppError::Store(StoreError::Unauthenticated))
        ));

        let empty = state.dashboard(Some("alice")).unwrap();
        assert_eq!(empty.today.total, 0);
        assert_eq!(empty.streak_days, 0);

        let task = state
            .add_task(
                Some("alice"),
                NewTask {
                    task_name: "Wipe kitchen shelves".to_string(),
                    frequency: Frequency::Weekly,
                },
            )
            .unwrap();
        state.toggle_task(Some("alice"), task.id).unwrap();
        state.toggle_task(None, 1).unwrap();

        let dashboard = state.dashboard(Some("alice")).unwrap();
        assert_eq!(dashboard.today.completed, 1);
        assert_eq!(dashboard.today.total, 1);
        assert_eq!(dashboard.streak_days, 1);
        assert_eq!(dashboard.recent_activity.len(), 1);
        assert_eq!(dashboard.recent_activity[0].task_name, "Wipe kitchen shelves");
        assert!(dashboard.badges[0].earned);

        assert_eq!(state.dashboard(Some("bob")).unwrap().today.total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_unmounts_timer() {
        let state = app();
        state.open_timer(None, 2).unwrap();
        state.with_timer(None, 2, |timer| Ok(timer.start().map(|_| ())?)).unwrap();
        assert_eq!(state.open_timer_count(), 1);

        state.delete_task(None, 2).unwrap();
        assert_eq!(state.open_timer_count(), 0);
        assert!(matches!(
            state.timer_view(None, 2),
            Err(AppError::Store(StoreError::NotFound(2)))
        ));
    }

    #[test]
    fn test_timer_controls_need_mounted_timer() {
        let state = app();
        assert!(matches!(state.timer_view(None, 3), Err(AppError::TimerNotOpen(3))));
        assert!(matches!(state.close_timer(None, 3), Err(AppError::TimerNotOpen(3))));
    }

    #[test]
    fn test_open_timer_is_idempotent() {
        let state = app();
        let first = state.open_timer(None, 1).unwrap();
        let second = state.open_timer(None, 1).unwrap();
        assert_eq!(first, second);
        assert_eq!(state.open_timer_count(), 1);
    }
}
