//! Cleaning tasks and plan generation

use std::{fmt, str::FromStr};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Wildcard used by catalog tasks that apply to every selection
pub const ANY: &str = "All";

/// A cleaning task as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    /// Last time the task was created or changed its completion
    pub updated_at: DateTime<Utc>,
    pub task_name: String,
    pub is_completed: bool,
    pub frequency: String,
    pub home_size: String,
    pub has_pets: String,
    pub user_id: Option<String>,
}

impl Task {
    /// Whether `user_id` may see this task: shared tasks are visible to
    /// everyone, owned tasks only to their owner
    pub fn visible_to(&self, user_id: Option<&str>) -> bool {
        match &self.user_id {
            None => true,
            Some(owner) => user_id == Some(owner.as_str()),
        }
    }

    pub fn matches(&self, selection: &Selection) -> bool {
        (self.home_size == ANY || self.home_size == selection.home_size.as_str())
            && (self.has_pets == ANY || self.has_pets == selection.has_pets.as_str())
    }
}

/// How often a task recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
        }
    }

    /// Case-insensitive lookup of a stored frequency
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HomeSize {
    Small,
    Medium,
    Large,
}

impl HomeSize {
    pub const ALL: [HomeSize; 3] = [HomeSize::Small, HomeSize::Medium, HomeSize::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            HomeSize::Small => "Small",
            HomeSize::Medium => "Medium",
            HomeSize::Large => "Large",
        }
    }
}

impl FromStr for HomeSize {
    type Err = PlanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        HomeSize::ALL
            .into_iter()
            .find(|size| size.as_str() == value)
            .ok_or_else(|| PlanError::UnknownHomeSize(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PetsChoice {
    Yes,
    No,
}

impl PetsChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            PetsChoice::Yes => "Yes",
            PetsChoice::No => "No",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PetsChoice::Yes => "Yes, I do",
            PetsChoice::No => "No pets",
        }
    }
}

impl FromStr for PetsChoice {
    type Err = PlanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Yes" => Ok(PetsChoice::Yes),
            "No" => Ok(PetsChoice::No),
            other => Err(PlanError::UnknownPetsChoice(other.to_string())),
        }
    }
}

/// Home attributes picked by the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub home_size: HomeSize,
    pub has_pets: PetsChoice,
}

impl Selection {
    /// Both attributes are required
    pub fn from_parts(home_size: Option<&str>, has_pets: Option<&str>) -> Result<Self, PlanError> {
        let (Some(home_size), Some(has_pets)) = (
            home_size.filter(|v| !v.is_empty()),
            has_pets.filter(|v| !v.is_empty()),
        ) else {
            return Err(PlanError::IncompleteSelection);
        };

        Ok(Self {
            home_size: home_size.parse()?,
            has_pets: has_pets.parse()?,
        })
    }
}

/// Which tasks of a plan to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Active,
}

impl TaskFilter {
    pub fn accepts(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Completed => task.is_completed,
            TaskFilter::Active => !task.is_completed,
        }
    }
}

/// Completion figures for a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

impl PlanStats {
    /// Percentage is rounded to the nearest integer, 0 for no tasks
    pub fn from_counts(completed: usize, total: usize) -> Self {
        let percentage = if total > 0 {
            (completed as f64 / total as f64 * 100.0).round() as u32
        } else {
            0
        };
        Self {
            completed,
            total,
            percentage,
        }
    }

    /// Figures over every task in `tasks`
    pub fn over<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let (completed, total) = tasks.into_iter().fold((0, 0), |(done, all), task| {
            (done + usize::from(task.is_completed), all + 1)
        });
        Self::from_counts(completed, total)
    }
}

/// Tasks matching a selection, grouped by frequency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub daily: Vec<Task>,
    pub weekly: Vec<Task>,
    pub monthly: Vec<Task>,
}

impl Plan {
    /// Group the tasks matching `selection`. Tasks with an unknown
    /// frequency are left out.
    pub fn build(tasks: &[Task], selection: &Selection) -> Self {
        let mut matching: Vec<&Task> =
            tasks.iter().filter(|task| task.matches(selection)).collect();
        matching.sort_by_key(|task| task.id);

        let mut plan = Plan::default();
        for task in matching {
            match Frequency::parse(&task.frequency) {
                Some(Frequency::Daily) => plan.daily.push(task.clone()),
                Some(Frequency::Weekly) => plan.weekly.push(task.clone()),
                Some(Frequency::Monthly) => plan.monthly.push(task.clone()),
                None => {}
            }
        }
        plan
    }

    pub fn filtered(&self, filter: TaskFilter) -> Self {
        let keep = |tasks: &[Task]| -> Vec<Task> {
            tasks.iter().filter(|task| filter.accepts(task)).cloned().collect()
        };
        Self {
            daily: keep(&self.daily),
            weekly: keep(&self.weekly),
            monthly: keep(&self.monthly),
        }
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.daily.iter().chain(&self.weekly).chain(&self.monthly)
    }

    pub fn stats(&self) -> PlanStats {
        PlanStats::over(self.tasks())
    }
}
