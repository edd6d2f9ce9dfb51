//! Feature slice contracts
//!
//! A slice is the portion of the [CombinedState](`crate::store::CombinedState`)
//! owned by one feature. Slices are folded by pure reducers and only ever
//! read by consumers; all mutation funnels through
//! [Store::dispatch](`crate::store::Store::dispatch`).

use crate::action::{Action, RequestId};
use crate::errors::RequestError;

/// A reducer-owned portion of the combined state
pub trait Slice: Default + Clone + Send + Sync + 'static {
    /// Fold one action descriptor into the next slice state
    ///
    /// Must be a pure function of `(self, action)`: no I/O, no dispatching,
    /// total over all inputs. Actions addressed to other slices return the
    /// input unchanged.
    fn reduce(self, action: &Action) -> Self;
}

/// Request lifecycle flags shared by every slice
///
/// Tracks one request family (e.g. the list fetch) through its
/// started/settled cycle. `fetching` and `initialized` are never
/// simultaneously true: a started request clears `initialized` and a settled
/// one restores it, regardless of outcome.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RequestStatus {
    /// A request for this family is in flight
    pub fetching: bool,
    /// At least one request for this family has settled
    pub initialized: bool,
    /// Error of the last failed request, cleared on the next start
    pub error: Option<RequestError>,
    /// Latest issued request token for this family
    pub request: RequestId,
}

impl RequestStatus {
    /// Record a newly issued request, clearing any prior error
    pub fn start(self, request: RequestId) -> Self {
        RequestStatus {
            fetching: true,
            initialized: false,
            error: None,
            request,
        }
    }

    /// Settle the current request successfully
    pub fn succeed(self) -> Self {
        RequestStatus {
            fetching: false,
            initialized: true,
            error: None,
            ..self
        }
    }

    /// Settle the current request with the collaborator error, verbatim
    pub fn fail(self, error: RequestError) -> Self {
        RequestStatus {
            fetching: false,
            initialized: true,
            error: Some(error),
            ..self
        }
    }

    /// Whether `request` is the latest token issued for this family
    ///
    /// Responses carrying a superseded token must be discarded by the
    /// reducer rather than applied over newer state.
    pub fn is_current(&self, request: RequestId) -> bool {
        self.request == request
    }
}
