//! Scripted test double for the backend client
//!
//! Only available on debug builds. Tests script per-endpoint responses ahead
//! of time and the mock replays them in order, recording every call. Gated
//! responses allow deterministic interleaving of concurrent operations
//! without relying on timers.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{
    Client, Job, JobId, JobQuery, JobUpdate, Model, Page, QualitySettings, Task, TaskId, TaskQuery,
    TaskSpec, Upload,
};
use crate::errors::RequestError;

/// A scripted response, optionally held back behind a gate
struct Scripted<T> {
    result: Result<T, RequestError>,
    gate: Option<Arc<Notify>>,
}

impl<T> Scripted<T> {
    fn ready(result: Result<T, RequestError>) -> Self {
        Scripted { result, gate: None }
    }

    async fn resolve(self) -> Result<T, RequestError> {
        if let Some(gate) = self.gate {
            gate.notified().await;
        }
        self.result
    }
}

/// Handle releasing one gated mock response
///
/// Opening before the request arrives is fine; the permit is stored and the
/// response resolves immediately once requested.
pub struct Gate(Arc<Notify>);

impl Gate {
    pub fn open(&self) {
        self.0.notify_one();
    }
}

#[derive(Default)]
struct Script {
    tasks: VecDeque<Scripted<Page<Task>>>,
    previews: HashMap<TaskId, Result<String, RequestError>>,
    created_tasks: VecDeque<Scripted<Task>>,
    deleted_tasks: VecDeque<Scripted<()>>,
    jobs: VecDeque<Scripted<Page<Job>>>,
    job_updates: VecDeque<Scripted<Job>>,
    models: VecDeque<Scripted<Vec<Model>>>,
    quality: VecDeque<Scripted<QualitySettings>>,
    saved_quality: VecDeque<Scripted<QualitySettings>>,
    calls: Vec<&'static str>,
}

/// In-memory [`Client`] replaying scripted responses
///
/// Unscripted list/command endpoints reject with a descriptive error so a
/// missing expectation fails the test visibly. Unscripted previews resolve to
/// an empty string, the same default the fetch operation substitutes for a
/// failed preview.
#[cfg_attr(docsrs, doc(cfg(debug_assertions)))]
#[derive(Default, Clone)]
pub struct MockClient {
    inner: Arc<Mutex<Script>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.inner.lock().expect("mock client lock poisoned")
    }

    pub fn on_tasks(&self, result: Result<Page<Task>, RequestError>) {
        self.lock().tasks.push_back(Scripted::ready(result));
    }

    /// Script a task list response held back until the returned gate opens
    pub fn on_tasks_gated(&self, result: Result<Page<Task>, RequestError>) -> Gate {
        let notify = Arc::new(Notify::new());
        self.lock().tasks.push_back(Scripted {
            result,
            gate: Some(Arc::clone(&notify)),
        });
        Gate(notify)
    }

    pub fn on_preview(&self, id: TaskId, result: Result<String, RequestError>) {
        self.lock().previews.insert(id, result);
    }

    pub fn on_create_task(&self, result: Result<Task, RequestError>) {
        self.lock().created_tasks.push_back(Scripted::ready(result));
    }

    pub fn on_delete_task(&self, result: Result<(), RequestError>) {
        self.lock().deleted_tasks.push_back(Scripted::ready(result));
    }

    pub fn on_jobs(&self, result: Result<Page<Job>, RequestError>) {
        self.lock().jobs.push_back(Scripted::ready(result));
    }

    pub fn on_update_job(&self, result: Result<Job, RequestError>) {
        self.lock().job_updates.push_back(Scripted::ready(result));
    }

    pub fn on_models(&self, result: Result<Vec<Model>, RequestError>) {
        self.lock().models.push_back(Scripted::ready(result));
    }

    pub fn on_quality_settings(&self, result: Result<QualitySettings, RequestError>) {
        self.lock().quality.push_back(Scripted::ready(result));
    }

    pub fn on_save_quality_settings(&self, result: Result<QualitySettings, RequestError>) {
        self.lock().saved_quality.push_back(Scripted::ready(result));
    }

    /// Names of the endpoints called so far, in call order
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    async fn replay<T>(&self, endpoint: &'static str, next: Option<Scripted<T>>) -> Result<T, RequestError> {
        match next {
            Some(scripted) => scripted.resolve().await,
            None => Err(RequestError::msg(format!(
                "no scripted response for {endpoint}"
            ))),
        }
    }
}

#[async_trait]
impl Client for MockClient {
    async fn tasks(&self, _query: &TaskQuery) -> Result<Page<Task>, RequestError> {
        let next = {
            let mut script = self.lock();
            script.calls.push("tasks");
            script.tasks.pop_front()
        };
        self.replay("tasks", next).await
    }

    async fn task_preview(&self, id: TaskId) -> Result<String, RequestError> {
        let mut script = self.lock();
        script.calls.push("task_preview");
        script
            .previews
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn create_task(&self, _spec: &TaskSpec, _files: &[Upload]) -> Result<Task, RequestError> {
        let next = {
            let mut script = self.lock();
            script.calls.push("create_task");
            script.created_tasks.pop_front()
        };
        self.replay("create_task", next).await
    }

    async fn delete_task(&self, _id: TaskId) -> Result<(), RequestError> {
        let next = {
            let mut script = self.lock();
            script.calls.push("delete_task");
            script.deleted_tasks.pop_front()
        };
        self.replay("delete_task", next).await
    }

    async fn jobs(&self, _query: &JobQuery) -> Result<Page<Job>, RequestError> {
        let next = {
            let mut script = self.lock();
            script.calls.push("jobs");
            script.jobs.pop_front()
        };
        self.replay("jobs", next).await
    }

    async fn update_job(&self, _id: JobId, _update: &JobUpdate) -> Result<Job, RequestError> {
        let next = {
            let mut script = self.lock();
            script.calls.push("update_job");
            script.job_updates.pop_front()
        };
        self.replay("update_job", next).await
    }

    async fn models(&self) -> Result<Vec<Model>, RequestError> {
        let next = {
            let mut script = self.lock();
            script.calls.push("models");
            script.models.pop_front()
        };
        self.replay("models", next).await
    }

    async fn quality_settings(&self, _task: TaskId) -> Result<QualitySettings, RequestError> {
        let next = {
            let mut script = self.lock();
            script.calls.push("quality_settings");
            script.quality.pop_front()
        };
        self.replay("quality_settings", next).await
    }

    async fn save_quality_settings(
        &self,
        _settings: &QualitySettings,
    ) -> Result<QualitySettings, RequestError> {
        let next = {
            let mut script = self.lock();
            script.calls.push("save_quality_settings");
            script.saved_quality.pop_front()
        };
        self.replay("save_quality_settings", next).await
    }
}
