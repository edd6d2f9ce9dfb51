//! Model list slice

use tracing::{debug, trace, warn};

use crate::action::{Action, RequestId};
use crate::client::{Client, Model};
use crate::errors::RequestError;
use crate::slice::{RequestStatus, Slice};
use crate::store::Store;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ModelsState {
    pub status: RequestStatus,
    pub current: Vec<Model>,
}

#[derive(Debug, Clone)]
pub enum ModelsAction {
    FetchStarted {
        request: RequestId,
    },
    FetchSuccess {
        request: RequestId,
        models: Vec<Model>,
    },
    FetchFailed {
        request: RequestId,
        error: RequestError,
    },
}

impl ModelsAction {
    pub fn label(&self) -> &'static str {
        match self {
            ModelsAction::FetchStarted { .. } => "models/fetch_started",
            ModelsAction::FetchSuccess { .. } => "models/fetch_success",
            ModelsAction::FetchFailed { .. } => "models/fetch_failed",
        }
    }
}

impl Slice for ModelsState {
    fn reduce(mut self, action: &Action) -> Self {
        let action = match action {
            Action::Models(action) => action,
            Action::LogoutSuccess => return Self::default(),
            _ => return self,
        };

        match action {
            ModelsAction::FetchStarted { request } => {
                self.status = self.status.start(*request);
                self
            }
            ModelsAction::FetchSuccess { request, models } => {
                if !self.status.is_current(*request) {
                    trace!(request = %request, "discarding stale model list");
                    return self;
                }
                self.status = self.status.succeed();
                self.current = models.clone();
                self
            }
            ModelsAction::FetchFailed { request, error } => {
                if !self.status.is_current(*request) {
                    trace!(request = %request, "discarding stale model list failure");
                    return self;
                }
                self.status = self.status.fail(error.clone());
                self
            }
        }
    }
}

impl<C: Client> Store<C> {
    /// Fetch the list of registered models
    pub async fn fetch_models(&self) -> RequestId {
        let request = self.begin_request();
        debug!(request = %request, "fetching models");
        self.dispatch(ModelsAction::FetchStarted { request });

        match self.client().models().await {
            Ok(models) => self.dispatch(ModelsAction::FetchSuccess { request, models }),
            Err(error) => {
                warn!(request = %request, "models fetch failed: {error}");
                self.dispatch(ModelsAction::FetchFailed { request, error });
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

    fn model(id: u64, name: &str) -> Model {
        Model {
            id,
            name: name.to_string(),
            provider: "builtin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_models_success() {
        let mock = MockClient::new();
        mock.on_models(Ok(vec![model(1, "yolo"), model(2, "sam")]));

        let store = Store::new(mock);
        store.fetch_models().await;

        let state = store.state().models;
        assert!(state.status.initialized);
        assert_eq!(state.current, vec![model(1, "yolo"), model(2, "sam")]);
    }

    #[tokio::test]
    async fn test_fetch_models_failure() {
        let mock = MockClient::new();
        mock.on_models(Ok(vec![model(1, "yolo")]));
        mock.on_models(Err(RequestError::msg("network down")));

        let store = Store::new(mock);
        store.fetch_models().await;
        store.fetch_models().await;

        let state = store.state().models;
        assert_eq!(state.status.error.unwrap().to_string(), "network down");
        // prior data untouched
        assert_eq!(state.current, vec![model(1, "yolo")]);
    }

    #[test]
    fn it_resets_on_logout() {
        let state = ModelsState {
            current: vec![model(1, "yolo")],
            ..Default::default()
        };
        assert_eq!(state.reduce(&Action::LogoutSuccess), ModelsState::default());
    }
}
