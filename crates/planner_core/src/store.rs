use crate::calendar::parse_date_key;
use crate::clock;
use crate::error::AppError;
use crate::model::{Task, TaskChanges};
use crate::storage::kv::{KeyValueStore, items_key};

/// Result of loading an identity's collection. A missing or unreadable
/// payload degrades to an empty store; the decode failure stays visible
/// here instead of being swallowed.
#[derive(Debug)]
pub struct TaskStoreLoad {
    pub store: TaskStore,
    pub error: Option<AppError>,
}

/// The mutable task collection owned by one signed-in identity. Every
/// mutation re-serializes the whole collection back to the key-value store;
/// a failed write leaves the in-memory state authoritative for the session
/// and is readable via `last_save_error`.
#[derive(Debug)]
pub struct TaskStore {
    username: Option<String>,
    tasks: Vec<Task>,
    last_save_error: Option<AppError>,
}

impl TaskStore {
    pub fn load(kv: &dyn KeyValueStore, username: Option<&str>) -> TaskStoreLoad {
        let key = items_key(username);
        let (tasks, error) = match kv.get(&key) {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<Task>>(&payload) {
                Ok(tasks) => (tasks, None),
                Err(err) => (Vec::new(), Some(AppError::invalid_data(err.to_string()))),
            },
            Ok(None) => (Vec::new(), None),
            Err(err) => (Vec::new(), Some(err)),
        };

        TaskStoreLoad {
            store: TaskStore {
                username: username.map(str::to_string),
                tasks,
                last_save_error: None,
            },
            error,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn last_save_error(&self) -> Option<&AppError> {
        self.last_save_error.as_ref()
    }

    /// Create a task at the head of the collection. The title must survive
    /// trimming and the date must be a real calendar key; times are stored
    /// as given.
    pub fn add(
        &mut self,
        kv: &dyn KeyValueStore,
        title: &str,
        date: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<Task, AppError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }
        if parse_date_key(date).is_none() {
            return Err(AppError::invalid_input("date must be YYYY-MM-DD"));
        }

        let task = Task {
            id: clock::fresh_id(),
            title: trimmed.to_string(),
            date: date.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            created_at: clock::utc_timestamp(),
            completed_at: None,
        };

        self.tasks.insert(0, task.clone());
        self.persist(kv);
        Ok(task)
    }

    /// Flip a task between open and completed. `None` when the id is
    /// unknown.
    pub fn toggle_complete(&mut self, kv: &dyn KeyValueStore, id: &str) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.completed_at = match task.completed_at {
            Some(_) => None,
            None => Some(clock::utc_timestamp()),
        };
        let updated = task.clone();
        self.persist(kv);
        Some(updated)
    }

    pub fn remove(&mut self, kv: &dyn KeyValueStore, id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        let removed = self.tasks.remove(index);
        self.persist(kv);
        Some(removed)
    }

    /// Merge partial field changes into an existing task. Never touches
    /// `id`, `created_at` or `completed_at`.
    pub fn update(
        &mut self,
        kv: &dyn KeyValueStore,
        id: &str,
        changes: TaskChanges,
    ) -> Result<Option<Task>, AppError> {
        if let Some(title) = changes.title.as_deref()
            && title.trim().is_empty()
        {
            return Err(AppError::invalid_input("title is required"));
        }
        if let Some(date) = changes.date.as_deref()
            && parse_date_key(date).is_none()
        {
            return Err(AppError::invalid_input("date must be YYYY-MM-DD"));
        }

        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            task.title = title.trim().to_string();
        }
        if let Some(date) = changes.date {
            task.date = date;
        }
        if let Some(start_time) = changes.start_time {
            task.start_time = start_time;
        }
        if let Some(end_time) = changes.end_time {
            task.end_time = end_time;
        }

        let updated = task.clone();
        self.persist(kv);
        Ok(Some(updated))
    }

    fn persist(&mut self, kv: &dyn KeyValueStore) {
        let key = items_key(self.username.as_deref());
        self.last_save_error = match serde_json::to_string(&self.tasks) {
            Ok(payload) => kv.set(&key, &payload).err(),
            Err(err) => Some(AppError::invalid_data(err.to_string())),
        };
    }
}
