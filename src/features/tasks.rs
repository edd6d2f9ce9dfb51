//! Task list slice: paginated listing, creation and deletion
//!
//! The list fetch fans out one preview request per task. A failed preview
//! degrades to an empty string instead of failing the whole page; a stale
//! page response (superseded by a newer fetch) is discarded by the reducer.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::{debug, trace, warn};

use crate::action::{Action, RequestId};
use crate::client::{Client, Task, TaskId, TaskQuery, TaskSpec, Upload};
use crate::errors::RequestError;
use crate::slice::{RequestStatus, Slice};
use crate::store::Store;

/// One task of the current page together with its preview image reference
#[derive(Debug, Clone, PartialEq)]
pub struct TaskItem {
    pub task: Task,
    /// Preview image reference, empty when the preview fetch failed
    pub preview: String,
}

/// State of the task list screen
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TasksState {
    /// Lifecycle of the list fetch family
    pub status: RequestStatus,
    /// Lifecycle of the task creation family
    pub creating: RequestStatus,
    /// Tasks of the most recently settled page
    pub current: Vec<TaskItem>,
    /// Total server-side count for the last query
    pub count: usize,
    /// Echo of the query the current page was fetched with
    pub query: TaskQuery,
    /// Tasks with an in-flight delete command
    pub deleting: HashMap<TaskId, bool>,
}

#[derive(Debug, Clone)]
pub enum TasksAction {
    FetchStarted {
        request: RequestId,
    },
    FetchSuccess {
        request: RequestId,
        items: Vec<TaskItem>,
        count: usize,
        query: TaskQuery,
    },
    FetchFailed {
        request: RequestId,
        error: RequestError,
    },
    CreateStarted {
        request: RequestId,
    },
    CreateSuccess {
        request: RequestId,
        task: Task,
    },
    CreateFailed {
        request: RequestId,
        error: RequestError,
    },
    DeleteStarted {
        id: TaskId,
    },
    DeleteSuccess {
        id: TaskId,
    },
    DeleteFailed {
        id: TaskId,
        error: RequestError,
    },
}

impl TasksAction {
    pub fn label(&self) -> &'static str {
        match self {
            TasksAction::FetchStarted { .. } => "tasks/fetch_started",
            TasksAction::FetchSuccess { .. } => "tasks/fetch_success",
            TasksAction::FetchFailed { .. } => "tasks/fetch_failed",
            TasksAction::CreateStarted { .. } => "tasks/create_started",
            TasksAction::CreateSuccess { .. } => "tasks/create_success",
            TasksAction::CreateFailed { .. } => "tasks/create_failed",
            TasksAction::DeleteStarted { .. } => "tasks/delete_started",
            TasksAction::DeleteSuccess { .. } => "tasks/delete_success",
            TasksAction::DeleteFailed { .. } => "tasks/delete_failed",
        }
    }
}

impl Slice for TasksState {
    fn reduce(mut self, action: &Action) -> Self {
        let action = match action {
            Action::Tasks(action) => action,
            Action::LogoutSuccess => return Self::default(),
            _ => return self,
        };

        match action {
            TasksAction::FetchStarted { request } => {
                self.status = self.status.start(*request);
                self
            }
            TasksAction::FetchSuccess {
                request,
                items,
                count,
                query,
            } => {
                if !self.status.is_current(*request) {
                    trace!(request = %request, "discarding stale task page");
                    return self;
                }
                self.status = self.status.succeed();
                self.current = items.clone();
                self.count = *count;
                self.query = query.clone();
                self
            }
            TasksAction::FetchFailed { request, error } => {
                if !self.status.is_current(*request) {
                    trace!(request = %request, "discarding stale task page failure");
                    return self;
                }
                // prior data stays in place, stale-but-present is
                // preferred over an empty screen
                self.status = self.status.fail(error.clone());
                self
            }
            TasksAction::CreateStarted { request } => {
                self.creating = self.creating.start(*request);
                self
            }
            TasksAction::CreateSuccess { request, .. } => {
                if !self.creating.is_current(*request) {
                    return self;
                }
                // the list is not touched here, the view re-fetches the
                // page it is interested in
                self.creating = self.creating.succeed();
                self
            }
            TasksAction::CreateFailed { request, error } => {
                if !self.creating.is_current(*request) {
                    return self;
                }
                self.creating = self.creating.fail(error.clone());
                self
            }
            TasksAction::DeleteStarted { id } => {
                self.deleting.insert(*id, true);
                self
            }
            TasksAction::DeleteSuccess { id } => {
                self.deleting.remove(id);
                let before = self.current.len();
                self.current.retain(|item| item.task.id != *id);
                if self.current.len() < before {
                    self.count = self.count.saturating_sub(1);
                }
                self
            }
            TasksAction::DeleteFailed { id, .. } => {
                // the error travels in the action for the notification
                // layer, the slice only drops the in-flight flag
                self.deleting.remove(id);
                self
            }
        }
    }
}

impl<C: Client> Store<C> {
    /// Fetch one page of tasks together with their previews
    ///
    /// Returns the issued request token. If a newer fetch is issued before
    /// this one settles, the response of this one is discarded by the
    /// reducer.
    pub async fn fetch_tasks(&self, query: TaskQuery) -> RequestId {
        let request = self.begin_request();
        debug!(request = %request, page = query.page, "fetching tasks");
        self.dispatch(TasksAction::FetchStarted { request });

        match self.client().tasks(&query).await {
            Ok(page) => {
                // one preview per task; a failed preview degrades to an
                // empty reference and never fails the page
                let previews = join_all(page.items.iter().map(|task| {
                    let client = self.client();
                    async move {
                        match client.task_preview(task.id).await {
                            Ok(preview) => preview,
                            Err(err) => {
                                warn!(task = task.id, "failed to fetch task preview: {err}");
                                String::new()
                            }
                        }
                    }
                }))
                .await;

                let items = page
                    .items
                    .into_iter()
                    .zip(previews)
                    .map(|(task, preview)| TaskItem { task, preview })
                    .collect();

                self.dispatch(TasksAction::FetchSuccess {
                    request,
                    items,
                    count: page.count,
                    query,
                });
            }
            Err(error) => {
                warn!(request = %request, "tasks fetch failed: {error}");
                self.dispatch(TasksAction::FetchFailed { request, error });
            }
        }

        request
    }

    /// Create a task from a spec and a set of opaque file payloads
    ///
    /// Files are forwarded to the backend untouched; nothing is parsed
    /// locally.
    pub async fn create_task(&self, spec: TaskSpec, files: Vec<Upload>) -> RequestId {
        let request = self.begin_request();
        debug!(request = %request, name = %spec.name, "creating task");
        self.dispatch(TasksAction::CreateStarted { request });

        match self.client().create_task(&spec, &files).await {
            Ok(task) => self.dispatch(TasksAction::CreateSuccess { request, task }),
            Err(error) => {
                warn!(request = %request, "task creation failed: {error}");
                self.dispatch(TasksAction::CreateFailed { request, error });
            }
        }

        request
    }

    /// Delete one task
    pub async fn delete_task(&self, id: TaskId) {
        self.dispatch(TasksAction::DeleteStarted { id });

        match self.client().delete_task(id).await {
            Ok(()) => self.dispatch(TasksAction::DeleteSuccess { id }),
            Err(error) => {
                warn!(task = id, "task deletion failed: {error}");
                self.dispatch(TasksAction::DeleteFailed { id, error });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::{prelude::*, EnvFilter};

    use super::*;
    use crate::client::{MockClient, Page};
    use crate::features::models::ModelsAction;

    fn init() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(false)
                    .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE),
            )
            .with(EnvFilter::from_default_env())
            .try_init()
            .unwrap_or(());
    }

    fn task(id: u64, name: &str) -> Task {
        Task {
            id,
            name: name.to_string(),
            size: 1,
        }
    }

    fn page(items: Vec<Task>, count: usize) -> Page<Task> {
        Page { items, count }
    }

    #[test]
    fn it_ignores_actions_for_other_slices() {
        let state = TasksState::default().reduce(&Action::Tasks(TasksAction::FetchStarted {
            request: RequestId(1),
        }));

        let reduced = state.clone().reduce(&Action::Models(ModelsAction::FetchStarted {
            request: RequestId(2),
        }));
        assert_eq!(reduced, state);
    }

    #[test]
    fn it_reduces_idempotently() {
        let success = Action::Tasks(TasksAction::FetchSuccess {
            request: RequestId(1),
            items: vec![TaskItem {
                task: task(1, "one"),
                preview: String::new(),
            }],
            count: 1,
            query: TaskQuery::default(),
        });

        let state = TasksState::default().reduce(&Action::Tasks(TasksAction::FetchStarted {
            request: RequestId(1),
        }));
        let once = state.reduce(&success);
        let twice = once.clone().reduce(&success);
        assert_eq!(once, twice);

        let delete = Action::Tasks(TasksAction::DeleteSuccess { id: 1 });
        let once = twice.reduce(&delete);
        let twice = once.clone().reduce(&delete);
        assert_eq!(once, twice);
        assert_eq!(twice.count, 0);
    }

    #[test]
    fn it_resets_on_logout() {
        let state = TasksState {
            count: 10,
            ..Default::default()
        };
        assert_eq!(state.reduce(&Action::LogoutSuccess), TasksState::default());
    }

    #[tokio::test]
    async fn test_fetch_tasks_success() {
        init();
        let mock = MockClient::new();
        mock.on_tasks(Ok(page(vec![task(1, "one"), task(2, "two")], 2)));
        mock.on_preview(1, Ok("img-1".to_string()));
        mock.on_preview(2, Ok("img-2".to_string()));

        let store = Store::new(mock);
        store.fetch_tasks(TaskQuery::default()).await;

        let state = store.state().tasks;
        assert!(state.status.initialized);
        assert!(!state.status.fetching);
        assert_eq!(state.count, 2);
        assert_eq!(
            state.current,
            vec![
                TaskItem {
                    task: task(1, "one"),
                    preview: "img-1".to_string(),
                },
                TaskItem {
                    task: task(2, "two"),
                    preview: "img-2".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_tasks_failure_keeps_prior_data() {
        init();
        let mock = MockClient::new();
        mock.on_tasks(Ok(page(vec![task(1, "one")], 1)));
        mock.on_tasks(Err(RequestError::msg("network down")));

        let store = Store::new(mock);
        store.fetch_tasks(TaskQuery::default()).await;
        let before = store.state().tasks.current.clone();

        store.fetch_tasks(TaskQuery::default()).await;
        let state = store.state().tasks;
        assert!(!state.status.fetching);
        assert!(state.status.initialized);
        assert_eq!(state.status.error.unwrap().to_string(), "network down");
        // prior data untouched
        assert_eq!(state.current, before);
    }

    #[tokio::test]
    async fn test_failed_preview_degrades_to_default() {
        init();
        let mock = MockClient::new();
        mock.on_tasks(Ok(page(vec![task(1, "one"), task(2, "two")], 2)));
        mock.on_preview(1, Ok("img-1".to_string()));
        mock.on_preview(2, Err(RequestError::msg("preview missing")));

        let store = Store::new(mock);
        store.fetch_tasks(TaskQuery::default()).await;

        let state = store.state().tasks;
        // the batch still succeeds, only the failed element defaults
        assert!(state.status.initialized);
        assert_eq!(state.status.error, None);
        assert_eq!(state.current[0].preview, "img-1");
        assert_eq!(state.current[1].preview, "");
    }

    #[tokio::test]
    async fn test_stale_fetch_response_is_discarded() {
        init();
        let mock = MockClient::new();
        let gate = mock.on_tasks_gated(Ok(page(vec![task(1, "stale")], 1)));
        mock.on_tasks(Ok(page(vec![task(2, "fresh")], 1)));

        let store = Store::new(mock);
        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_tasks(TaskQuery::default()).await })
        };
        // let the first fetch dispatch its started action and park on
        // the gate
        tokio::task::yield_now().await;

        let second = store.fetch_tasks(TaskQuery::default()).await;

        // release the superseded response after the newer one settled
        gate.open();
        first.await.unwrap();

        let state = store.state().tasks;
        assert!(state.status.is_current(second));
        assert_eq!(state.status.error, None);
        assert_eq!(state.current[0].task.id, 2);
    }

    #[tokio::test]
    async fn test_create_task_forwards_files_opaquely() {
        init();
        let mock = MockClient::new();
        mock.on_create_task(Ok(task(7, "fresh")));

        let store = Store::new(mock.clone());
        store
            .create_task(
                TaskSpec {
                    name: "fresh".to_string(),
                    labels: vec!["car".to_string()],
                },
                vec![Upload {
                    name: "frames.zip".to_string(),
                    data: vec![1, 2, 3],
                }],
            )
            .await;

        let state = store.state().tasks;
        assert!(state.creating.initialized);
        assert_eq!(state.creating.error, None);
        assert_eq!(mock.calls(), vec!["create_task"]);
    }

    #[tokio::test]
    async fn test_delete_task_removes_the_entry() {
        init();
        let mock = MockClient::new();
        mock.on_tasks(Ok(page(vec![task(1, "one"), task(2, "two")], 2)));
        mock.on_delete_task(Ok(()));

        let store = Store::new(mock);
        store.fetch_tasks(TaskQuery::default()).await;
        store.delete_task(1).await;

        let state = store.state().tasks;
        assert_eq!(state.count, 1);
        assert_eq!(state.current.len(), 1);
        assert_eq!(state.current[0].task.id, 2);
        assert!(state.deleting.is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_the_entry() {
        init();
        let mock = MockClient::new();
        mock.on_tasks(Ok(page(vec![task(1, "one")], 1)));
        mock.on_delete_task(Err(RequestError::msg("forbidden")));

        let store = Store::new(mock);
        store.fetch_tasks(TaskQuery::default()).await;
        store.delete_task(1).await;

        let state = store.state().tasks;
        assert_eq!(state.count, 1);
        assert_eq!(state.current.len(), 1);
        assert!(state.deleting.is_empty());
    }
}
