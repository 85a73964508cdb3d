use serde::{Deserialize, Serialize};

/// One task record, stored per identity in the key-value store. The wire
/// shape keeps the camelCase field names earlier releases persisted; the
/// legacy single `time` field loads into `start_time` and is never written
/// back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    /// Calendar day the task belongs to, as a `YYYY-MM-DD` key.
    pub date: String,
    #[serde(default, alias = "time")]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Time used for ordering within a day: start, else end.
    pub fn schedule_time(&self) -> &str {
        if self.start_time.is_empty() {
            &self.end_time
        } else {
            &self.start_time
        }
    }
}

/// Partial field changes for an edit. `id`, `created_at` and `completed_at`
/// are deliberately absent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Task;

    #[test]
    fn serializes_with_camel_case_field_names() {
        let task = Task {
            id: "task-1".to_string(),
            title: "demo".to_string(),
            date: "2024-01-01".to_string(),
            start_time: "09:00".to_string(),
            end_time: String::new(),
            created_at: "2024-01-01T08:00:00Z".to_string(),
            completed_at: None,
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["startTime"], "09:00");
        assert_eq!(value["endTime"], "");
        assert_eq!(value["createdAt"], "2024-01-01T08:00:00Z");
        assert!(value["completedAt"].is_null());
        assert!(value.get("time").is_none());
        assert!(value.get("start_time").is_none());
    }

    #[test]
    fn legacy_time_field_loads_as_start_time() {
        let payload = r#"{
            "id": "task-1",
            "title": "demo",
            "date": "2024-01-01",
            "time": "14:00",
            "createdAt": "2024-01-01T08:00:00Z",
            "completedAt": null
        }"#;

        let task: Task = serde_json::from_str(payload).unwrap();
        assert_eq!(task.start_time, "14:00");
        assert_eq!(task.end_time, "");

        let rewritten = serde_json::to_value(&task).unwrap();
        assert_eq!(rewritten["startTime"], "14:00");
        assert!(rewritten.get("time").is_none());
    }

    #[test]
    fn schedule_time_prefers_start_over_end() {
        let mut task = Task {
            id: "task-1".to_string(),
            title: "demo".to_string(),
            date: "2024-01-01".to_string(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            created_at: "2024-01-01T08:00:00Z".to_string(),
            completed_at: None,
        };

        assert_eq!(task.schedule_time(), "09:00");
        task.start_time.clear();
        assert_eq!(task.schedule_time(), "10:00");
        task.end_time.clear();
        assert_eq!(task.schedule_time(), "");
    }
}
