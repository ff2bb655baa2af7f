//! # Bookline Core
//!
//! Foundational abstractions for the Bookline checkout client.
//!
//! Every stateful feature in the client — the cart, the checkout
//! transaction — is written as a reducer: a pure function from
//! `(state, action, environment)` to a new state plus a list of effect
//! descriptions. Effects are *values*; the store runtime (in
//! `bookline-runtime`) executes them and feeds any resulting actions back
//! into the reducer. This keeps every state transition — including every
//! failure point of the checkout transaction — explicit and unit-testable
//! without I/O.
//!
//! ## Example
//!
//! ```ignore
//! use bookline_core::effect::Effect;
//! use bookline_core::reducer::Reducer;
//!
//! impl Reducer for CartReducer {
//!     type State = CartState;
//!     type Action = CartAction;
//!     type Environment = CartEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CartState,
//!         action: CartAction,
//!         env: &CartEnvironment,
//!     ) -> Vec<Effect<CartAction>> {
//!         match action {
//!             CartAction::RemoveItem { service_id } => {
//!                 state.items.retain(|i| i.service_id != service_id);
//!                 vec![persist_effect(env)]
//!             },
//!             _ => vec![Effect::None],
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

/// The reducer abstraction — all business logic lives here.
///
/// Reducers are deterministic: given the same state, action, and
/// environment they produce the same state mutation and the same effect
/// descriptions. All I/O is deferred to effects.
pub mod reducer {
    use super::effect::Effect;

    /// A pure state-transition function with declared side effects.
    ///
    /// # Type Parameters
    ///
    /// - `State`: the domain state this reducer owns
    /// - `Action`: every input the reducer can receive — UI commands and
    ///   effect feedback alike
    /// - `Environment`: injected collaborators (clock, HTTP services,
    ///   storage), always behind traits so tests can substitute mocks
    pub trait Reducer {
        /// The state type this reducer operates on.
        type State;

        /// The action type this reducer processes.
        type Action;

        /// The injected dependencies this reducer reads.
        type Environment;

        /// Apply `action` to `state`, returning effects for the runtime.
        ///
        /// The reducer must not perform I/O itself: it validates the
        /// action, mutates state in place, and describes what should
        /// happen next as [`Effect`] values. Unknown or invalid
        /// transitions conventionally return `vec![Effect::None]`.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Vec<Effect<Self::Action>>;
    }
}

/// Effect descriptions returned by reducers.
///
/// An effect is a *plan* for a side effect, not its execution. The store
/// runtime interprets the returned values: it spawns futures, applies
/// delays, and dispatches any produced actions back into the reducer.
pub mod effect {
    use futures::future::BoxFuture;
    use std::time::Duration;

    /// A description of a side effect to be executed by the store runtime.
    ///
    /// The `Action` parameter is the feedback type: an effect may resolve
    /// to an action, which the runtime sends back through the reducer.
    /// This is how a booking-creation call reports
    /// `BookingCreated`/`BookingFailed` without the reducer ever touching
    /// the network.
    pub enum Effect<Action> {
        /// Nothing to do.
        None,

        /// Execute the contained effects concurrently.
        Parallel(Vec<Effect<Action>>),

        /// Execute the contained effects one after another.
        ///
        /// The checkout pipeline leans on this ordering guarantee: an
        /// effect chained after another observes its completion.
        Sequential(Vec<Effect<Action>>),

        /// Dispatch `action` after `duration` has elapsed.
        Delay {
            /// How long to wait.
            duration: Duration,
            /// The action to dispatch once the delay expires.
            action: Box<Action>,
        },

        /// Run an arbitrary async computation.
        ///
        /// Resolving to `Some(action)` feeds the action back into the
        /// reducer; `None` ends the chain.
        Future(BoxFuture<'static, Option<Action>>),
    }

    impl<Action> Effect<Action> {
        /// Wrap an async computation as an effect.
        ///
        /// Shorthand for `Effect::Future(Box::pin(fut))`.
        pub fn future<F>(fut: F) -> Self
        where
            F: std::future::Future<Output = Option<Action>> + Send + 'static,
        {
            Self::Future(Box::pin(fut))
        }

        /// Combine effects to run concurrently.
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run in order.
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// `true` when the effect performs no work.
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Self::None)
        }
    }

    impl<Action> Effect<Action>
    where
        Action: Send + 'static,
    {
        /// Lift this effect into a parent action type.
        ///
        /// Composition hook: a parent reducer that embeds a child reducer
        /// maps the child's effects into its own action space, so the
        /// child's feedback actions route back through the parent.
        pub fn map<Parent, F>(self, f: F) -> Effect<Parent>
        where
            Parent: Send + 'static,
            F: Fn(Action) -> Parent + Send + Sync + Clone + 'static,
        {
            match self {
                Self::None => Effect::None,
                Self::Parallel(effects) => Effect::Parallel(
                    effects.into_iter().map(|e| e.map(f.clone())).collect(),
                ),
                Self::Sequential(effects) => Effect::Sequential(
                    effects.into_iter().map(|e| e.map(f.clone())).collect(),
                ),
                Self::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Self::Future(fut) => {
                    Effect::Future(Box::pin(async move { fut.await.map(f) }))
                },
            }
        }
    }

    // Manual Debug since boxed futures are opaque.
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::None => write!(f, "Effect::None"),
                Self::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Self::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Self::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Self::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }
}

/// Environment traits shared by every feature.
///
/// Feature-specific collaborators (booking service, payment gateway, cart
/// storage) live next to their reducers in `bookline-checkout`; this
/// module holds only the dependencies every reducer needs.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Abstracts the current time so reducers stay deterministic.
    ///
    /// Production wiring uses [`SystemClock`]; tests use the fixed clock
    /// from `bookline-testing`.
    pub trait Clock: Send + Sync {
        /// The current instant.
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock implementation of [`Clock`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, SystemClock};

    #[test]
    fn merge_produces_parallel() {
        let effect: Effect<u32> = Effect::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(effect, Effect::Parallel(ref inner) if inner.len() == 2));
    }

    #[test]
    fn chain_produces_sequential() {
        let effect: Effect<u32> = Effect::chain(vec![Effect::None]);
        assert!(matches!(effect, Effect::Sequential(ref inner) if inner.len() == 1));
    }

    #[test]
    fn debug_hides_future_internals() {
        let effect: Effect<u32> = Effect::future(async { None });
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn none_is_none() {
        assert!(Effect::<u32>::None.is_none());
        assert!(!Effect::<u32>::Parallel(vec![]).is_none());
    }

    #[tokio::test]
    async fn map_lifts_future_actions() {
        let effect: Effect<u32> = Effect::future(async { Some(2) });
        let mapped: Effect<String> = effect.map(|n| n.to_string());
        match mapped {
            Effect::Future(fut) => assert_eq!(fut.await.as_deref(), Some("2")),
            _ => unreachable!("map preserves the future variant"),
        }
    }

    #[tokio::test]
    async fn future_effect_resolves_to_action() {
        let effect: Effect<u32> = Effect::future(async { Some(7) });
        match effect {
            Effect::Future(fut) => assert_eq!(fut.await, Some(7)),
            _ => unreachable!("constructed as a future"),
        }
    }

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
