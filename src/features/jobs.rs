//! Job list slice: listing and staged job updates
//!
//! Job changes are submitted as a staged [JobUpdate](`crate::client::JobUpdate`)
//! value built from an immutable snapshot; on success the slice replaces the
//! whole job snapshot, so two views can never hold divergent copies of the
//! same conceptual entity.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::action::{Action, RequestId};
use crate::client::{Client, Job, JobId, JobQuery, JobUpdate};
use crate::errors::RequestError;
use crate::slice::{RequestStatus, Slice};
use crate::store::Store;

/// State of the job list screen
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JobsState {
    pub status: RequestStatus,
    pub current: Vec<Job>,
    pub count: usize,
    pub query: JobQuery,
    /// Jobs with an in-flight update command
    pub updating: HashMap<JobId, bool>,
}

#[derive(Debug, Clone)]
pub enum JobsAction {
    FetchStarted {
        request: RequestId,
    },
    FetchSuccess {
        request: RequestId,
        jobs: Vec<Job>,
        count: usize,
        query: JobQuery,
    },
    FetchFailed {
        request: RequestId,
        error: RequestError,
    },
    UpdateStarted {
        id: JobId,
    },
    UpdateSuccess {
        id: JobId,
        job: Job,
    },
    UpdateFailed {
        id: JobId,
        error: RequestError,
    },
}

impl JobsAction {
    pub fn label(&self) -> &'static str {
        match self {
            JobsAction::FetchStarted { .. } => "jobs/fetch_started",
            JobsAction::FetchSuccess { .. } => "jobs/fetch_success",
            JobsAction::FetchFailed { .. } => "jobs/fetch_failed",
            JobsAction::UpdateStarted { .. } => "jobs/update_started",
            JobsAction::UpdateSuccess { .. } => "jobs/update_success",
            JobsAction::UpdateFailed { .. } => "jobs/update_failed",
        }
    }
}

impl Slice for JobsState {
    fn reduce(mut self, action: &Action) -> Self {
        let action = match action {
            Action::Jobs(action) => action,
            Action::LogoutSuccess => return Self::default(),
            _ => return self,
        };

        match action {
            JobsAction::FetchStarted { request } => {
                self.status = self.status.start(*request);
                self
            }
            JobsAction::FetchSuccess {
                request,
                jobs,
                count,
                query,
            } => {
                if !self.status.is_current(*request) {
                    trace!(request = %request, "discarding stale job page");
                    return self;
                }
                self.status = self.status.succeed();
                self.current = jobs.clone();
                self.count = *count;
                self.query = query.clone();
                self
            }
            JobsAction::FetchFailed { request, error } => {
                if !self.status.is_current(*request) {
                    trace!(request = %request, "discarding stale job page failure");
                    return self;
                }
                self.status = self.status.fail(error.clone());
                self
            }
            JobsAction::UpdateStarted { id } => {
                self.updating.insert(*id, true);
                self
            }
            JobsAction::UpdateSuccess { id, job } => {
                self.updating.remove(id);
                // replace the snapshot wholesale
                self.current = self
                    .current
                    .into_iter()
                    .map(|current| if current.id == *id { job.clone() } else { current })
                    .collect();
                self
            }
            JobsAction::UpdateFailed { id, .. } => {
                self.updating.remove(id);
                self
            }
        }
    }
}

impl<C: Client> Store<C> {
    /// Fetch one page of jobs
    pub async fn fetch_jobs(&self, query: JobQuery) -> RequestId {
        let request = self.begin_request();
        debug!(request = %request, task = ?query.task, "fetching jobs");
        self.dispatch(JobsAction::FetchStarted { request });

        match self.client().jobs(&query).await {
            Ok(page) => self.dispatch(JobsAction::FetchSuccess {
                request,
                jobs: page.items,
                count: page.count,
                query,
            }),
            Err(error) => {
                warn!(request = %request, "jobs fetch failed: {error}");
                self.dispatch(JobsAction::FetchFailed { request, error });
            }
        }

        request
    }

    /// Submit staged changes for one job
    pub async fn update_job(&self, id: JobId, update: JobUpdate) {
        self.dispatch(JobsAction::UpdateStarted { id });

        match self.client().update_job(id, &update).await {
            Ok(job) => self.dispatch(JobsAction::UpdateSuccess { id, job }),
            Err(error) => {
                warn!(job = id, "job update failed: {error}");
                self.dispatch(JobsAction::UpdateFailed { id, error });
            }
        }
    }
}
