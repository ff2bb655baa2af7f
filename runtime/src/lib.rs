//! # Bookline Runtime
//!
//! The store runtime that drives Bookline's reducers.
//!
//! A [`Store`] owns one reducer, its state, and its environment. Sending an
//! action runs the reducer synchronously behind a write lock; the returned
//! effect descriptions are executed in spawned tasks, and any action an
//! effect resolves to is fed back into the reducer. Actions produced by
//! effects are also broadcast to observers, which is how the surrounding UI
//! watches a checkout attempt progress without polling state.
//!
//! There is deliberately no retry machinery in this runtime: a failed
//! booking or payment call is terminal for the checkout attempt, and a new
//! attempt is always user-initiated. Effects run at most once.
//!
//! ## Example
//!
//! ```ignore
//! use bookline_runtime::Store;
//!
//! let store = Store::new(CartState::default(), CartReducer, environment);
//!
//! let handle = store.send(CartAction::Restore).await?;
//! handle.wait().await;
//!
//! let count = store.state(|s| s.item_count()).await;
//! ```

use bookline_core::{effect::Effect, reducer::Reducer};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, watch};

/// Error types for the store runtime.
pub mod error {
    use thiserror::Error;

    /// Errors surfaced by [`crate::Store`] operations.
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// The store is shutting down and no longer accepts actions.
        #[error("store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out with effects still running.
        #[error("shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// `send_and_wait_for` expired before a matching action arrived.
        #[error("timeout waiting for action")]
        Timeout,

        /// The action broadcast channel closed mid-wait.
        #[error("action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Store configuration.
///
/// The defaults suit the checkout client: a small broadcast buffer (one
/// checkout attempt produces a handful of actions) and a shutdown window
/// long enough for an in-flight collaborator call to finish.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the action broadcast channel.
    broadcast_capacity: usize,

    /// How often `shutdown` polls for outstanding effects.
    shutdown_poll_interval: Duration,
}

impl StoreConfig {
    /// Create a config with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            broadcast_capacity: 16,
            shutdown_poll_interval: Duration::from_millis(50),
        }
    }

    /// Set the action broadcast capacity.
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the shutdown poll interval.
    #[must_use]
    pub const fn with_shutdown_poll_interval(mut self, interval: Duration) -> Self {
        self.shutdown_poll_interval = interval;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks one `send` call's effect chain from root effects through every
/// feedback action they produce.
struct EffectTracker {
    outstanding: AtomicUsize,
    notify: watch::Sender<usize>,
}

impl EffectTracker {
    fn new() -> Arc<Self> {
        let (notify, _) = watch::channel(0);
        Arc::new(Self {
            outstanding: AtomicUsize::new(0),
            notify,
        })
    }

    fn handle(self: &Arc<Self>) -> EffectHandle {
        EffectHandle {
            changes: self.notify.subscribe(),
        }
    }

    fn increment(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        self.publish();
    }

    fn decrement(&self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        self.publish();
    }

    /// Publish the live count. The load happens inside the watch lock so
    /// the last writer always stores the settled value.
    fn publish(&self) {
        self.notify
            .send_modify(|v| *v = self.outstanding.load(Ordering::Acquire));
    }
}

/// Handle returned by [`Store::send`] for awaiting effect completion.
///
/// `send` returns once effect execution has *started*; use the handle when
/// a test or caller needs the whole chain — including feedback actions and
/// the effects those produce — to have settled.
pub struct EffectHandle {
    changes: watch::Receiver<usize>,
}

impl EffectHandle {
    /// A handle that is already complete (an action produced no effects).
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(0);
        drop(tx);
        Self { changes: rx }
    }

    /// Wait until every effect in the chain has finished.
    pub async fn wait(&mut self) {
        loop {
            if *self.changes.borrow() == 0 {
                return;
            }
            // A closed channel means the tracker is gone, so nothing runs.
            if self.changes.changed().await.is_err() {
                return;
            }
        }
    }

    /// Wait for effect completion, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when
    /// the timeout elapses.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("outstanding", &*self.changes.borrow())
            .finish()
    }
}

struct Inner<S, A, E, R> {
    state: RwLock<S>,
    reducer: R,
    environment: E,
    shutdown: AtomicBool,
    pending_effects: AtomicUsize,
    action_broadcast: broadcast::Sender<A>,
    config: StoreConfig,
}

/// The store — runtime coordinator for one reducer.
///
/// Cloning a store is cheap (it shares the same state and reducer) and is
/// how effect tasks reach back into the reducer with feedback actions.
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    inner: Arc<Inner<S, A, E, R>>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a store with default configuration.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_config(initial_state, reducer, environment, StoreConfig::default())
    }

    /// Create a store with custom configuration.
    #[must_use]
    pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
        let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(initial_state),
                reducer,
                environment,
                shutdown: AtomicBool::new(false),
                pending_effects: AtomicUsize::new(0),
                action_broadcast,
                config,
            }),
        }
    }

    /// Send an action to the store.
    ///
    /// Runs the reducer behind the state write lock, then starts executing
    /// the returned effects in spawned tasks. Concurrent `send` calls
    /// serialize at the reducer; effects complete in their own time — use
    /// the returned [`EffectHandle`] to wait for them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once shutdown has begun.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(StoreError::ShutdownInProgress);
        }

        metrics::counter!("store.actions.sent").increment(1);

        let mut effects = self.reduce(action).await;
        effects.retain(|e| !e.is_none());
        if effects.is_empty() {
            return Ok(EffectHandle::completed());
        }

        let tracker = EffectTracker::new();
        let handle = tracker.handle();
        for effect in effects {
            self.spawn_effect(effect, &tracker);
        }
        Ok(handle)
    }

    /// Send an action and wait for a matching result action.
    ///
    /// Request/response helper: subscribes to the action broadcast before
    /// sending (so the result cannot slip past), then returns the first
    /// effect-produced action the predicate accepts. The surrounding UI
    /// uses this to await a checkout attempt's terminal action.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if no matching action arrives in time
    /// - [`StoreError::ChannelClosed`] if the broadcast closes mid-wait
    /// - [`StoreError::ShutdownInProgress`] if the store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        // Subscribe before sending to avoid a lost-wakeup race.
        let mut rx = self.inner.action_broadcast.subscribe();

        self.send(action).await?;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Slow observer; the timeout catches a dropped
                        // terminal action.
                        tracing::warn!(skipped, "action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Read state through a projection function.
    ///
    /// The read lock is held only for the duration of `f`; the projection
    /// observes a fully settled state, never a mid-reduction view.
    pub async fn state<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let guard = self.inner.state.read().await;
        f(&guard)
    }

    /// Subscribe to actions produced by effects.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<A> {
        self.inner.action_broadcast.subscribe()
    }

    /// Initiate graceful shutdown.
    ///
    /// New `send` calls are rejected immediately; effects already running
    /// (and the feedback they produce) are given until `timeout` to
    /// settle. An in-flight booking call therefore completes rather than
    /// being abandoned halfway.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] with the count of still
    /// running effects when the timeout expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("initiating graceful shutdown");
        metrics::counter!("store.shutdown.initiated").increment(1);

        self.inner.shutdown.store(true, Ordering::Release);

        let start = std::time::Instant::now();
        loop {
            let pending = self.inner.pending_effects.load(Ordering::Acquire);
            if pending == 0 {
                metrics::counter!("store.shutdown.completed").increment(1);
                return Ok(());
            }
            if start.elapsed() >= timeout {
                tracing::error!(pending, "shutdown timed out");
                return Err(StoreError::ShutdownTimeout(pending));
            }
            tokio::time::sleep(self.inner.config.shutdown_poll_interval).await;
        }
    }

    /// Run the reducer for one action under the write lock.
    async fn reduce(&self, action: A) -> Vec<Effect<A>> {
        let mut state = self.inner.state.write().await;
        self.inner
            .reducer
            .reduce(&mut state, action, &self.inner.environment)
    }

    /// Start executing an effect in its own task.
    ///
    /// The tracker is incremented before spawning so an `EffectHandle`
    /// obtained from `send` can never observe a spuriously idle chain.
    fn spawn_effect(&self, effect: Effect<A>, tracker: &Arc<EffectTracker>) {
        tracker.increment();
        self.inner.pending_effects.fetch_add(1, Ordering::AcqRel);
        metrics::counter!("store.effects.spawned").increment(1);

        let store = self.clone();
        let tracker = Arc::clone(tracker);
        tokio::spawn(async move {
            store.run_effect(effect, &tracker).await;
            tracker.decrement();
            store.inner.pending_effects.fetch_sub(1, Ordering::AcqRel);
        });
    }

    /// Interpret one effect value.
    ///
    /// Boxed so `Sequential` can recurse.
    fn run_effect<'a>(
        &'a self,
        effect: Effect<A>,
        tracker: &'a Arc<EffectTracker>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            match effect {
                Effect::None => {},
                Effect::Parallel(effects) => {
                    for effect in effects {
                        self.spawn_effect(effect, tracker);
                    }
                },
                Effect::Sequential(effects) => {
                    for effect in effects {
                        self.run_effect(effect, tracker).await;
                    }
                },
                Effect::Delay { duration, action } => {
                    tokio::time::sleep(duration).await;
                    self.feedback(*action, tracker).await;
                },
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        self.feedback(action, tracker).await;
                    }
                },
            }
        })
    }

    /// Feed an effect-produced action back into the reducer.
    ///
    /// The reducer runs before the action is broadcast, so an observer
    /// that sees a terminal action always reads post-transition state.
    /// Feedback is processed even during shutdown so an in-flight
    /// checkout transaction can reach a terminal state.
    async fn feedback(&self, action: A, tracker: &Arc<EffectTracker>) {
        metrics::counter!("store.actions.fed_back").increment(1);

        let effects = self.reduce(action.clone()).await;
        let _ = self.inner.action_broadcast.send(action);
        for effect in effects {
            if !effect.is_none() {
                self.spawn_effect(effect, tracker);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bookline_core::effect::Effect;
    use bookline_core::reducer::Reducer;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct CounterState {
        value: u32,
        echoes: Vec<u32>,
    }

    #[derive(Clone, Debug)]
    enum CounterAction {
        Increment,
        IncrementThenEcho,
        Echoed { value: u32 },
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut CounterState,
            action: CounterAction,
            (): &(),
        ) -> Vec<Effect<CounterAction>> {
            match action {
                CounterAction::Increment => {
                    state.value += 1;
                    vec![Effect::None]
                },
                CounterAction::IncrementThenEcho => {
                    state.value += 1;
                    let value = state.value;
                    vec![Effect::future(async move {
                        Some(CounterAction::Echoed { value })
                    })]
                },
                CounterAction::Echoed { value } => {
                    state.echoes.push(value);
                    vec![Effect::None]
                },
            }
        }
    }

    fn store() -> Store<CounterState, CounterAction, (), CounterReducer> {
        Store::new(CounterState::default(), CounterReducer, ())
    }

    #[tokio::test]
    async fn send_runs_reducer() {
        let store = store();
        let mut handle = store.send(CounterAction::Increment).await.unwrap();
        handle.wait().await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn effect_feedback_reaches_reducer() {
        let store = store();
        let mut handle = store.send(CounterAction::IncrementThenEcho).await.unwrap();
        handle.wait().await;
        let state = store.state(Clone::clone).await;
        assert_eq!(state.value, 1);
        assert_eq!(state.echoes, vec![1]);
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_matching_action() {
        let store = store();
        let result = store
            .send_and_wait_for(
                CounterAction::IncrementThenEcho,
                |a| matches!(a, CounterAction::Echoed { .. }),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert!(matches!(result, CounterAction::Echoed { value: 1 }));
    }

    #[tokio::test]
    async fn send_and_wait_for_times_out_without_match() {
        let store = store();
        let result = store
            .send_and_wait_for(
                CounterAction::Increment,
                |a| matches!(a, CounterAction::Echoed { .. }),
                Duration::from_millis(50),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = store();
        store.shutdown(Duration::from_secs(1)).await.unwrap();
        let result = store.send(CounterAction::Increment).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    }

    #[tokio::test]
    async fn completed_handle_is_idle() {
        let mut handle = EffectHandle::completed();
        handle
            .wait_with_timeout(Duration::from_millis(50))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sequential_effects_run_in_order() {
        struct SeqReducer;
        #[derive(Clone, Debug)]
        enum SeqAction {
            Go,
            Mark { value: u32 },
        }

        impl Reducer for SeqReducer {
            type State = Vec<u32>;
            type Action = SeqAction;
            type Environment = ();

            fn reduce(
                &self,
                state: &mut Vec<u32>,
                action: SeqAction,
                (): &(),
            ) -> Vec<Effect<SeqAction>> {
                match action {
                    SeqAction::Go => vec![Effect::chain(vec![
                        Effect::future(async { Some(SeqAction::Mark { value: 1 }) }),
                        Effect::future(async { Some(SeqAction::Mark { value: 2 }) }),
                        Effect::future(async { Some(SeqAction::Mark { value: 3 }) }),
                    ])],
                    SeqAction::Mark { value } => {
                        state.push(value);
                        vec![Effect::None]
                    },
                }
            }
        }

        let store = Store::new(Vec::new(), SeqReducer, ());
        let mut handle = store.send(SeqAction::Go).await.unwrap();
        handle.wait().await;
        assert_eq!(store.state(Clone::clone).await, vec![1, 2, 3]);
    }
}
