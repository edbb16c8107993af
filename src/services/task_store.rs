//! Task storage
//!
//! The store is an in-process contract. The bundled implementation keeps
//! everything in memory and starts from a shared catalog of cleaning tasks.

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};
use chrono::Utc;
use tracing::{debug, info};

use crate::{
    error::StoreError,
    state::task_state::{Frequency, Task, ANY},
};

/// A task added by a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub task_name: String,
    pub frequency: Frequency,
}

/// Storage for cleaning tasks, keyed by id and scoped by an opaque user id
pub trait TaskStore: Send + Sync {
    /// Shared tasks plus the ones owned by `user_id`, ordered by id
    fn list_visible(&self, user_id: Option<&str>) -> Vec<Task>;

    fn get(&self, id: u64, user_id: Option<&str>) -> Result<Task, StoreError>;

    /// Add a task owned by `user_id`; anonymous visitors cannot add tasks
    fn insert(&self, task: NewTask, user_id: Option<&str>) -> Result<Task, StoreError>;

    fn set_completed(&self, id: u64, completed: bool) -> Result<Task, StoreError>;

    fn toggle(&self, id: u64, user_id: Option<&str>) -> Result<Task, StoreError>;

    fn delete(&self, id: u64, user_id: Option<&str>) -> Result<Task, StoreError>;
}

/// Catalog rows: name, frequency, home size, pets
const CATALOG: [(&str, Frequency, &str, &str); 14] = [
    ("Wipe kitchen counters", Frequency::Daily, ANY, ANY),
    ("Wash the dishes", Frequency::Daily, ANY, ANY),
    ("Make the bed in the bedroom", Frequency::Daily, ANY, ANY),
    ("Sweep pet hair from floors", Frequency::Daily, ANY, "Yes"),
    ("Tidy the living room", Frequency::Daily, "Large", ANY),
    ("Clean the bathroom sink and toilet", Frequency::Weekly, ANY, ANY),
    ("Vacuum all rooms", Frequency::Weekly, ANY, ANY),
    ("Mop the kitchen floor", Frequency::Weekly, ANY, ANY),
    ("Wash pet bedding", Frequency::Weekly, ANY, "Yes"),
    ("Dust shelves and surfaces", Frequency::Weekly, "Medium", ANY),
    ("Dust shelves and surfaces", Frequency::Weekly, "Large", ANY),
    ("Clean inside the fridge", Frequency::Monthly, ANY, ANY),
    ("Organize closets", Frequency::Monthly, ANY, ANY),
    ("Wash windows", Frequency::Monthly, "Large", ANY),
];

#[derive(Debug, Default)]
struct Inner {
    tasks: BTreeMap<u64, Task>,
    next_id: u64,
}

/// Task store held in memory
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    inner: Mutex<Inner>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the shared cleaning catalog
    pub fn with_catalog() -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            let seeded_at = Utc::now();
            for (name, frequency, home_size, has_pets) in CATALOG {
                inner.push(Task {
                    id: 0,
                    created_at: seeded_at,
                    updated_at: seeded_at,
                    task_name: name.to_string(),
                    is_completed: false,
                    frequency: frequency.to_string(),
                    home_size: home_size.to_string(),
                    has_pets: has_pets.to_string(),
                    user_id: None,
                });
            }
            info!("Task store seeded with {} catalog tasks", inner.tasks.len());
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn push(&mut self, mut task: Task) -> Task {
        self.next_id += 1;
        task.id = self.next_id;
        self.tasks.insert(task.id, task.clone());
        task
    }

    fn visible_mut(&mut self, id: u64, user_id: Option<&str>) -> Result<&mut Task, StoreError> {
        self.tasks
            .get_mut(&id)
            .filter(|task| task.visible_to(user_id))
            .ok_or(StoreError::NotFound(id))
    }
}

impl TaskStore for InMemoryTaskStore {
    fn list_visible(&self, user_id: Option<&str>) -> Vec<Task> {
        self.lock()
            .tasks
            .values()
            .filter(|task| task.visible_to(user_id))
            .cloned()
            .collect()
    }

    fn get(&self, id: u64, user_id: Option<&str>) -> Result<Task, StoreError> {
        self.lock().visible_mut(id, user_id).map(|task| task.clone())
    }

    fn insert(&self, task: NewTask, user_id: Option<&str>) -> Result<Task, StoreError> {
        let task_name = task.task_name.trim();
        if task_name.is_empty() {
            return Err(StoreError::BlankName);
        }
        let user_id = user_id.ok_or(StoreError::Unauthenticated)?;

        let now = Utc::now();
        let created = self.lock().push(Task {
            id: 0,
            created_at: now,
            updated_at: now,
            task_name: task_name.to_string(),
            is_completed: false,
            frequency: task.frequency.to_string(),
            home_size: ANY.to_string(),
            has_pets: ANY.to_string(),
            user_id: Some(user_id.to_string()),
        });
        info!("Task {} added: {}", created.id, created.task_name);
        Ok(created)
    }

    fn set_completed(&self, id: u64, completed: bool) -> Result<Task, StoreError> {
        let mut inner = self.lock();
        let task = inner.tasks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        task.is_completed = completed;
        task.updated_at = Utc::now();
        debug!("Task {} completion set to {}", id, completed);
        Ok(task.clone())
    }

    fn toggle(&self, id: u64, user_id: Option<&str>) -> Result<Task, StoreError> {
        let mut inner = self.lock();
        let task = inner.visible_mut(id, user_id)?;
        task.is_completed = !task.is_completed;
        task.updated_at = Utc::now();
        info!(
            "Task {} marked {}",
            id,
            if task.is_completed { "completed" } else { "not completed" }
        );
        Ok(task.clone())
    }

    fn delete(&self, id: u64, user_id: Option<&str>) -> Result<Task, StoreError> {
        let mut inner = self.lock();
        inner.visible_mut(id, user_id)?;
        let removed = inner.tasks.remove(&id).ok_or(StoreError::NotFound(id))?;
        info!("Task {} deleted", id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(name: &str) -> NewTask {
        NewTask {
            task_name: name.to_string(),
            frequency: Frequency::Weekly,
        }
    }

    #[test]
    fn test_catalog_is_shared_and_ordered() {
        let store = InMemoryTaskStore::with_catalog();
        let tasks = store.list_visible(None);
        assert_eq!(tasks.len(), CATALOG.len());
        assert!(tasks.windows(2).all(|pair| pair[0].id < pair[1].id));
        assert!(tasks.iter().all(|task| task.user_id.is_none() && !task.is_completed));
    }

    #[test]
    fn test_insert_requires_user_and_name() {
        let store = InMemoryTaskStore::new();
        assert_eq!(store.insert(new_task("Dust"), None), Err(StoreError::Unauthenticated));
        assert_eq!(store.insert(new_task("   "), Some("alice")), Err(StoreError::BlankName));
        // A blank name is refused before the visitor is asked to sign in
        assert_eq!(store.insert(new_task(""), None), Err(StoreError::BlankName));
        assert!(store.list_visible(Some("alice")).is_empty());

        let task = store.insert(new_task("  Dust blinds "), Some("alice")).unwrap();
        assert_eq!(task.task_name, "Dust blinds");
        assert_eq!(task.frequency, "Weekly");
        assert_eq!(task.home_size, ANY);
        assert_eq!(task.has_pets, ANY);
        assert_eq!(task.user_id.as_deref(), Some("alice"));
    }

    #[test]
    fn test_owned_tasks_are_private() {
        let store = InMemoryTaskStore::with_catalog();
        let task = store.insert(new_task("Water plants"), Some("alice")).unwrap();

        assert_eq!(store.list_visible(Some("alice")).len(), CATALOG.len() + 1);
        assert_eq!(store.list_visible(Some("bob")).len(), CATALOG.len());
        assert_eq!(store.get(task.id, Some("bob")), Err(StoreError::NotFound(task.id)));
        assert_eq!(store.toggle(task.id, None), Err(StoreError::NotFound(task.id)));
        assert_eq!(store.delete(task.id, Some("bob")), Err(StoreError::NotFound(task.id)));
        assert!(store.get(task.id, Some("alice")).is_ok());
    }

    #[test]
    fn test_toggle_set_completed_and_delete() {
        let store = InMemoryTaskStore::with_catalog();
        let seeded = store.get(1, None).unwrap();
        assert_eq!(seeded.updated_at, seeded.created_at);

        let toggled = store.toggle(1, None).unwrap();
        assert!(toggled.is_completed);
        assert!(toggled.updated_at >= seeded.updated_at);
        assert!(!store.toggle(1, None).unwrap().is_completed);

        assert!(store.set_completed(2, true).unwrap().is_completed);
        assert!(store.set_completed(2, true).unwrap().is_completed);
        assert_eq!(store.set_completed(999, true), Err(StoreError::NotFound(999)));

        assert_eq!(store.delete(2, None).unwrap().id, 2);
        assert_eq!(store.get(2, None), Err(StoreError::NotFound(2)));
    }
}
