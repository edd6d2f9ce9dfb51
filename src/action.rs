//! Action descriptors dispatched through the [Store](`crate::store::Store`)
//!
//! Every state transition in the client is described by one [`Action`]: an
//! immutable, typed record created fresh per dispatch and discarded after the
//! reducers consume it. Each feature slice declares its own closed action
//! enum, so reducer matches are checked for exhaustiveness by the compiler
//! instead of silently defaulting on unknown string types.

use std::fmt;

use crate::features::jobs::JobsAction;
use crate::features::models::ModelsAction;
use crate::features::quality::QualityAction;
use crate::features::tasks::TasksAction;

/// Monotonic token identifying one request cycle within a slice
///
/// Issued by the store when an async operation begins and echoed in the
/// terminal descriptor of the same operation. Reducers compare the echoed
/// token against the latest one they recorded and discard responses for
/// superseded requests, giving "latest request wins" semantics even though
/// responses may resolve out of order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Top-level action descriptor composing every feature slice
#[derive(Debug, Clone)]
pub enum Action {
    Tasks(TasksAction),
    Jobs(JobsAction),
    Models(ModelsAction),
    Quality(QualityAction),
    /// Session teardown. Every slice resets to its default value
    LogoutSuccess,
}

impl Action {
    /// Static label for structured logging of dispatches
    pub fn label(&self) -> &'static str {
        match self {
            Action::Tasks(action) => action.label(),
            Action::Jobs(action) => action.label(),
            Action::Models(action) => action.label(),
            Action::Quality(action) => action.label(),
            Action::LogoutSuccess => "logout/success",
        }
    }
}

impl From<TasksAction> for Action {
    fn from(action: TasksAction) -> Self {
        Action::Tasks(action)
    }
}

impl From<JobsAction> for Action {
    fn from(action: JobsAction) -> Self {
        Action::Jobs(action)
    }
}

impl From<ModelsAction> for Action {
    fn from(action: ModelsAction) -> Self {
        Action::Models(action)
    }
}

impl From<QualityAction> for Action {
    fn from(action: QualityAction) -> Self {
        Action::Quality(action)
    }
}
