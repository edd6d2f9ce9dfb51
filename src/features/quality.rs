//! Quality analytics settings slice
//!
//! Settings are kept as an immutable snapshot. Edits are staged by the
//! caller on a draft copy and submitted whole through
//! [save_quality_settings](`crate::store::Store::save_quality_settings`);
//! only a successful save replaces the stored snapshot.

use tracing::{debug, trace, warn};

use crate::action::{Action, RequestId};
use crate::client::{Client, QualitySettings, TaskId};
use crate::errors::RequestError;
use crate::slice::{RequestStatus, Slice};
use crate::store::Store;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct QualityState {
    /// Lifecycle of the settings fetch family
    pub status: RequestStatus,
    /// Lifecycle of the save family
    pub saving: RequestStatus,
    /// Last settled settings snapshot
    pub settings: Option<QualitySettings>,
}

#[derive(Debug, Clone)]
pub enum QualityAction {
    FetchStarted {
        request: RequestId,
    },
    FetchSuccess {
        request: RequestId,
        settings: QualitySettings,
    },
    FetchFailed {
        request: RequestId,
        error: RequestError,
    },
    SaveStarted {
        request: RequestId,
    },
    SaveSuccess {
        request: RequestId,
        settings: QualitySettings,
    },
    SaveFailed {
        request: RequestId,
        error: RequestError,
    },
}

impl QualityAction {
    pub fn label(&self) -> &'static str {
        match self {
            QualityAction::FetchStarted { .. } => "quality/fetch_started",
            QualityAction::FetchSuccess { .. } => "quality/fetch_success",
            QualityAction::FetchFailed { .. } => "quality/fetch_failed",
            QualityAction::SaveStarted { .. } => "quality/save_started",
            QualityAction::SaveSuccess { .. } => "quality/save_success",
            QualityAction::SaveFailed { .. } => "quality/save_failed",
        }
    }
}

impl Slice for QualityState {
    fn reduce(mut self, action: &Action) -> Self {
        let action = match action {
            Action::Quality(action) => action,
            Action::LogoutSuccess => return Self::default(),
            _ => return self,
        };

        match action {
            QualityAction::FetchStarted { request } => {
                self.status = self.status.start(*request);
                self
            }
            QualityAction::FetchSuccess { request, settings } => {
                if !self.status.is_current(*request) {
                    trace!(request = %request, "discarding stale quality settings");
                    return self;
                }
                self.status = self.status.succeed();
                self.settings = Some(settings.clone());
                self
            }
            QualityAction::FetchFailed { request, error } => {
                if !self.status.is_current(*request) {
                    trace!(request = %request, "discarding stale quality settings failure");
                    return self;
                }
                self.status = self.status.fail(error.clone());
                self
            }
            QualityAction::SaveStarted { request } => {
                self.saving = self.saving.start(*request);
                self
            }
            QualityAction::SaveSuccess { request, settings } => {
                if !self.saving.is_current(*request) {
                    return self;
                }
                self.saving = self.saving.succeed();
                // only a settled save replaces the snapshot
                self.settings = Some(settings.clone());
                self
            }
            QualityAction::SaveFailed { request, error } => {
                if !self.saving.is_current(*request) {
                    return self;
                }
                self.saving = self.saving.fail(error.clone());
                self
            }
        }
    }
}

impl<C: Client> Store<C> {
    /// Fetch the quality settings of one task
    pub async fn fetch_quality_settings(&self, task: TaskId) -> RequestId {
        let request = self.begin_request();
        debug!(request = %request, task, "fetching quality settings");
        self.dispatch(QualityAction::FetchStarted { request });

        match self.client().quality_settings(task).await {
            Ok(settings) => self.dispatch(QualityAction::FetchSuccess { request, settings }),
            Err(error) => {
                warn!(request = %request, "quality settings fetch failed: {error}");
                self.dispatch(QualityAction::FetchFailed { request, error });
            }
        }

        request
    }

    /// Submit a staged settings draft
    ///
    /// The draft is a value snapshot; the stored settings only change once
    /// the backend acknowledges the save.
    pub async fn save_quality_settings(&self, draft: QualitySettings) -> RequestId {
        let request = self.begin_request();
        debug!(request = %request, task = draft.task, "saving quality settings");
        self.dispatch(QualityAction::SaveStarted { request });

        match self.client().save_quality_settings(&draft).await {
            Ok(settings) => self.dispatch(QualityAction::SaveSuccess { request, settings }),
            Err(error) => {
                warn!(request = %request, "quality settings save failed: {error}");
                self.dispatch(QualityAction::SaveFailed { request, error });
            }
        }

        request
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::client::MockClient;

    fn settings(iou: f64) -> QualitySettings {
        QualitySettings {
            task: 1,
            iou_threshold: iou,
            low_overlap_threshold: 0.8,
            compare_attributes: true,
        }
    }

    #[tokio::test]
    async fn test_fetch_and_save_settings() {
        let mock = MockClient::new();
        mock.on_quality_settings(Ok(settings(0.5)));
        mock.on_save_quality_settings(Ok(settings(0.7)));

        let store = Store::new(mock);
        store.fetch_quality_settings(1).await;
        assert_eq!(store.state().quality.settings, Some(settings(0.5)));

        // stage a draft from the snapshot and submit it whole
        let draft = QualitySettings {
            iou_threshold: 0.7,
            ..store.state().quality.settings.unwrap()
        };
        store.save_quality_settings(draft).await;

        let state = store.state().quality;
        assert!(state.saving.initialized);
        assert_eq!(state.settings, Some(settings(0.7)));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_the_prior_snapshot() {
        let mock = MockClient::new();
        mock.on_quality_settings(Ok(settings(0.5)));
        mock.on_save_quality_settings(Err(RequestError::msg("bad threshold")));

        let store = Store::new(mock);
        store.fetch_quality_settings(1).await;
        store.save_quality_settings(settings(99.0)).await;

        let state = store.state().quality;
        assert_eq!(
            state.saving.error.unwrap().to_string(),
            "bad threshold"
        );
        // the rejected draft never reaches the snapshot
        assert_eq!(state.settings, Some(settings(0.5)));
    }

    #[test]
    fn it_reduces_idempotently() {
        let success = Action::Quality(QualityAction::FetchSuccess {
            request: RequestId(1),
            settings: settings(0.5),
        });

        let state = QualityState::default().reduce(&Action::Quality(QualityAction::FetchStarted {
            request: RequestId(1),
        }));
        let once = state.reduce(&success);
        let twice = once.clone().reduce(&success);
        assert_eq!(once, twice);
    }
}
