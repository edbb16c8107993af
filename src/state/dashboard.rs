//! Per-user progress dashboard
//!
//! Every figure is derived from the user's own task records. Calendar days
//! are UTC days and weeks start on Sunday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::task_state::{PlanStats, Task};

/// Days looked back when counting the streak
pub const STREAK_WINDOW_DAYS: u32 = 30;
/// Completed tasks listed as recent activity
pub const RECENT_ACTIVITY_LIMIT: usize = 5;
/// Completed kitchen tasks needed for the Kitchen Master badge
pub const KITCHEN_MASTER_TASKS: usize = 50;
/// Streak length needed for the Week Warrior badge
pub const WEEK_WARRIOR_DAYS: u32 = 7;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub id: u8,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub earned: bool,
}

/// A recently completed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub task_name: String,
    pub completed_at: DateTime<Utc>,
    pub completed: String,
}

/// Completion for one day of the current week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayProgress {
    pub day: &'static str,
    pub date: NaiveDate,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub today: PlanStats,
    pub week: PlanStats,
    pub month: PlanStats,
    pub streak_days: u32,
    pub badges: Vec<Badge>,
    pub recent_activity: Vec<Activity>,
    pub weekly_progress: Vec<DayProgress>,
}

impl Dashboard {
    /// Build the dashboard over `tasks` as seen at `now`
    pub fn build(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let week_start = today - days(today.weekday().num_days_from_sunday());
        let month_start = today - days(today.day0());

        let created_since = |start: NaiveDate| {
            PlanStats::over(
                tasks
                    .iter()
                    .filter(move |task| task.created_at.date_naive() >= start),
            )
        };
        let month = created_since(month_start);
        let streak_days = streak(tasks, today);

        Self {
            today: created_since(today),
            week: created_since(week_start),
            month,
            streak_days,
            badges: badges(tasks, streak_days, &month),
            recent_activity: recent_activity(tasks, now),
            weekly_progress: weekly_progress(tasks, week_start),
        }
    }
}

/// Consecutive days, ending today, on which at least one task was completed
pub fn streak(tasks: &[Task], today: NaiveDate) -> u32 {
    let completed_on = |day: NaiveDate| {
        tasks
            .iter()
            .any(|task| task.is_completed && task.updated_at.date_naive() == day)
    };

    (0..STREAK_WINDOW_DAYS)
        .take_while(|&offset| completed_on(today - days(offset)))
        .count() as u32
}

fn days(count: u32) -> Duration {
    Duration::days(i64::from(count))
}

fn badges(tasks: &[Task], streak_days: u32, month: &PlanStats) -> Vec<Badge> {
    let kitchen_tasks = tasks
        .iter()
        .filter(|task| task.is_completed && task.task_name.to_lowercase().contains("kitchen"))
        .count();

    vec![
        Badge {
            id: 1,
            title: "Clean Starter",
            description: "Completed your first task",
            icon: "🌟",
            earned: tasks.iter().any(|task| task.is_completed),
        },
        Badge {
            id: 2,
            title: "Week Warrior",
            description: "7 days cleaning streak",
            icon: "🔥",
            earned: streak_days >= WEEK_WARRIOR_DAYS,
        },
        Badge {
            id: 3,
            title: "Kitchen Master",
            description: "Completed 50 kitchen tasks",
            icon: "🍽️",
            earned: kitchen_tasks >= KITCHEN_MASTER_TASKS,
        },
        Badge {
            id: 4,
            title: "Monthly Hero",
            description: "100% monthly completion",
            icon: "🏆",
            earned: month.total > 0 && month.completed == month.total,
        },
    ]
}

fn recent_activity(tasks: &[Task], now: DateTime<Utc>) -> Vec<Activity> {
    let mut completed: Vec<&Task> = tasks.iter().filter(|task| task.is_completed).collect();
    completed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    completed
        .into_iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|task| Activity {
            task_name: task.task_name.clone(),
            completed_at: task.updated_at,
            completed: time_ago(task.updated_at, now),
        })
        .collect()
}

fn weekly_progress(tasks: &[Task], week_start: NaiveDate) -> Vec<DayProgress> {
    WEEKDAYS
        .iter()
        .zip(0i64..)
        .map(|(&day, offset)| {
            let date = week_start + Duration::days(offset);
            let stats = PlanStats::over(
                tasks.iter().filter(|task| task.created_at.date_naive() == date),
            );
            DayProgress {
                day,
                date,
                completed: stats.completed,
                total: stats.total,
            }
        })
        .collect()
}

/// Relative label for a past instant; older than two days shows the date
pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds().max(0);
    match seconds {
        0..=59 => format!("{} seconds ago", seconds),
        60..=3_599 => format!("{} minutes ago", seconds / 60),
        3_600..=86_399 => format!("{} hours ago", seconds / 3_600),
        86_400..=172_799 => "Yesterday".to_string(),
        _ => at.format("%Y-%m-%d").to_string(),
    }
}
