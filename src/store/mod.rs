//! Process-wide store composing every feature slice
//!
//! The store is the single shared mutable resource of the client. All
//! mutation funnels through [`Store::dispatch`], a synchronous fold of one
//! action descriptor into the combined state; views and tests observe the
//! result through [`Store::state`], [`Store::follow`] and
//! [`Store::subscribe`].

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::{Stream, StreamExt};
use tracing::trace;

use crate::action::{Action, RequestId};
use crate::features::jobs::JobsState;
use crate::features::models::ModelsState;
use crate::features::quality::QualityState;
use crate::features::tasks::TasksState;
use crate::slice::Slice;

/// Combined client state, one field per feature slice
///
/// Slice keys are disjoint by construction: each reducer folds only its own
/// field and no slice can reach another slice's subtree.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CombinedState {
    pub tasks: TasksState,
    pub jobs: JobsState,
    pub models: ModelsState,
    pub quality: QualityState,
}

impl CombinedState {
    fn reduce(self, action: &Action) -> Self {
        CombinedState {
            tasks: self.tasks.reduce(action),
            jobs: self.jobs.reduce(action),
            models: self.models.reduce(action),
            quality: self.quality.reduce(action),
        }
    }
}

/// Store tuning options
#[derive(Clone)]
pub struct Opts {
    /// Buffered capacity of the action event channel used by
    /// [`Store::subscribe`]. Defaults to 64
    events_capacity: usize,
}

impl Opts {
    pub fn events_capacity(self, events_capacity: usize) -> Self {
        let mut opts = self;
        opts.events_capacity = events_capacity;
        opts
    }
}

impl Default for Opts {
    fn default() -> Self {
        Opts {
            events_capacity: 64,
        }
    }
}

/// Single state container for the whole client
///
/// Created once at startup over the wrapped backend client `C` and cloned
/// into every view or task that needs it; clones share the same state.
///
/// Async operations are methods defined per feature module (e.g.
/// [fetch_tasks](`Store::fetch_tasks`)). Each one dispatches a started
/// descriptor, awaits the backend call, and dispatches the terminal success
/// or failure descriptor; errors never escape the operation. Dropping an
/// operation future cancels it without dispatching a terminal descriptor.
///
/// ```rust
/// use ostinato::client::{MockClient, Page, Task, TaskQuery};
/// use ostinato::store::Store;
///
/// # tokio_test::block_on(async {
/// let mock = MockClient::new();
/// mock.on_tasks(Ok(Page {
///     items: vec![Task { id: 1, name: "highway".to_string(), size: 1200 }],
///     count: 1,
/// }));
///
/// let store = Store::new(mock);
/// store.fetch_tasks(TaskQuery::default()).await;
///
/// let state = store.state();
/// assert!(state.tasks.status.initialized);
/// assert_eq!(state.tasks.count, 1);
/// # })
/// ```
pub struct Store<C> {
    client: Arc<C>,
    state_tx: watch::Sender<CombinedState>,
    events_tx: broadcast::Sender<Action>,
    next_request: Arc<AtomicU64>,
}

// Manual impl, C itself does not need to be Clone
impl<C> Clone for Store<C> {
    fn clone(&self) -> Self {
        Store {
            client: Arc::clone(&self.client),
            state_tx: self.state_tx.clone(),
            events_tx: self.events_tx.clone(),
            next_request: Arc::clone(&self.next_request),
        }
    }
}

impl<C> Store<C> {
    /// Create a store with default options over the given backend client
    pub fn new(client: C) -> Self {
        Self::with_opts(client, Opts::default())
    }

    pub fn with_opts(client: C, opts: Opts) -> Self {
        let (state_tx, _) = watch::channel(CombinedState::default());
        let (events_tx, _) = broadcast::channel(opts.events_capacity);
        Store {
            client: Arc::new(client),
            state_tx,
            events_tx,
            next_request: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The wrapped backend client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Snapshot of the current combined state
    pub fn state(&self) -> CombinedState {
        self.state_tx.borrow().clone()
    }

    /// Fold one action into the state and notify observers
    ///
    /// The fold runs synchronously, serialized by the state channel; two
    /// concurrent dispatches are applied one after the other, never
    /// interleaved. Reducers are pure value folds with no store handle, so a
    /// dispatch cannot re-enter itself.
    pub fn dispatch(&self, action: impl Into<Action>) {
        let action = action.into();
        trace!(action = action.label(), "dispatch");
        self.state_tx.send_modify(|state| {
            *state = std::mem::take(state).reduce(&action);
        });
        // best effort, ignore the error when nobody subscribed
        let _ = self.events_tx.send(action);
    }

    /// Returns a stream of state snapshots after each accepted dispatch
    ///
    /// The stream is best effort: a slow reader observes the latest state,
    /// not every intermediate one. It ends when the last store clone is
    /// dropped.
    pub fn follow(&self) -> impl Stream<Item = CombinedState> {
        let rx = self.state_tx.subscribe();
        StoreStream::new(WatchStream::from_changes(rx))
    }

    /// Returns a stream of the action descriptors accepted by the store
    ///
    /// Unlike [follow](`Store::follow`) every dispatched action is delivered,
    /// up to the configured channel capacity; a reader lagging further behind
    /// skips ahead to the oldest retained action.
    pub fn subscribe(&self) -> impl Stream<Item = Action> {
        let rx = self.events_tx.subscribe();
        StoreStream::new(BroadcastStream::new(rx).filter_map(|res| res.ok()))
    }

    /// Reset every slice to its default value
    ///
    /// Dispatches the logout teardown descriptor, the process-wide reset
    /// trigger applied on session end.
    pub fn reset(&self) {
        self.dispatch(Action::LogoutSuccess);
    }

    /// Issue the next request token
    pub(crate) fn begin_request(&self) -> RequestId {
        RequestId(self.next_request.fetch_add(1, Ordering::Relaxed))
    }
}

/// Helper type to hide the concrete stream composition
///
/// See [`Store::follow`] and [`Store::subscribe`]
struct StoreStream<T> {
    inner: Pin<Box<dyn Stream<Item = T> + Send + 'static>>,
}

impl<T> StoreStream<T> {
    fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl<T> Stream for StoreStream<T> {
    type Item = T;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
