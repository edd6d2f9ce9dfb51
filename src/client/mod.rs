//! Backend client surface
//!
//! The store talks to the annotation backend exclusively through the
//! [`Client`] trait. The trait only promises that every call eventually
//! resolves with a result or a failure; transport, authentication, retries
//! and timeouts are owned by the implementation, not by this crate.
//!
//! Entities returned by the client are plain value snapshots. They are stored
//! inside slices and replaced wholesale on updates; nothing in this crate
//! mutates an entity in place.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

#[cfg(debug_assertions)]
mod testing;

#[cfg(debug_assertions)]
pub use testing::*;

pub type TaskId = u64;
pub type JobId = u64;
pub type ModelId = u64;

/// One page of a list endpoint, with the total server-side count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: usize,
}

/// An annotation task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Number of frames in the task
    pub size: u64,
}

/// A segment of a task assigned for annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub task: TaskId,
    pub stage: String,
    pub state: String,
    pub assignee: Option<String>,
}

/// An inference model registered with the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    pub provider: String,
}

/// Quality analytics settings for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    pub task: TaskId,
    pub iou_threshold: f64,
    pub low_overlap_threshold: f64,
    pub compare_attributes: bool,
}

/// Query filters for the task list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskQuery {
    pub page: usize,
    pub page_size: usize,
    pub search: Option<String>,
}

impl Default for TaskQuery {
    fn default() -> Self {
        TaskQuery {
            page: 1,
            page_size: 10,
            search: None,
        }
    }
}

/// Query filters for the job list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobQuery {
    /// Restrict the listing to jobs of one task
    pub task: Option<TaskId>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for JobQuery {
    fn default() -> Self {
        JobQuery {
            task: None,
            page: 1,
            page_size: 10,
        }
    }
}

/// Request body for creating a new task
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub labels: Vec<String>,
}

/// Staged changes for one job, submitted as a whole
///
/// Fields left as `None` keep their server-side value. Callers build the
/// update from an immutable job snapshot and submit it through
/// [update_job](`crate::store::Store::update_job`); the job entity itself is
/// never mutated in place.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    pub state: Option<String>,
    pub assignee: Option<String>,
}

/// An opaque file payload forwarded to the backend untouched
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub name: String,
    pub data: Vec<u8>,
}

// Keep blob contents out of debug output
impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Resource-oriented surface of the wrapped backend client
///
/// Every method performs exactly one request and resolves with the result or
/// the transport/HTTP error, captured verbatim as a
/// [RequestError](`crate::errors::RequestError`).
#[async_trait]
pub trait Client: Send + Sync + 'static {
    async fn tasks(&self, query: &TaskQuery) -> Result<Page<Task>, RequestError>;

    /// Preview image reference for one task
    async fn task_preview(&self, id: TaskId) -> Result<String, RequestError>;

    async fn create_task(&self, spec: &TaskSpec, files: &[Upload]) -> Result<Task, RequestError>;

    async fn delete_task(&self, id: TaskId) -> Result<(), RequestError>;

    async fn jobs(&self, query: &JobQuery) -> Result<Page<Job>, RequestError>;

    async fn update_job(&self, id: JobId, update: &JobUpdate) -> Result<Job, RequestError>;

    async fn models(&self) -> Result<Vec<Model>, RequestError>;

    async fn quality_settings(&self, task: TaskId) -> Result<QualitySettings, RequestError>;

    async fn save_quality_settings(
        &self,
        settings: &QualitySettings,
    ) -> Result<QualitySettings, RequestError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn it_deserializes_entities_from_wire_shapes() {
        let task: Task =
            serde_json::from_value(json!({"id": 1, "name": "highway", "size": 1200})).unwrap();
        assert_eq!(
            task,
            Task {
                id: 1,
                name: "highway".to_string(),
                size: 1200,
            }
        );

        let page: Page<Task> = serde_json::from_value(json!({
            "items": [{"id": 1, "name": "highway", "size": 1200}],
            "count": 42,
        }))
        .unwrap();
        assert_eq!(page.count, 42);
        assert_eq!(page.items, vec![task]);
    }

    #[test]
    fn it_hides_upload_contents_from_debug_output() {
        let upload = Upload {
            name: "frames.zip".to_string(),
            data: vec![0; 1024],
        };
        let rendered = format!("{upload:?}");
        assert!(rendered.contains("frames.zip"));
        assert!(rendered.contains("len: 1024"));
        assert!(!rendered.contains("[0"));
    }
}
