//! App-level composition of the cart and the checkout coordinator.
//!
//! [`AppReducer`] is the single mutation surface the UI talks to. It
//! routes cart operations to the cart reducer, enriches checkout
//! commands with the live cart snapshot, and owns the one rule no child
//! can express alone: **the cart is cleared exactly once, when a
//! checkout attempt completes** — never from the UI, never on failure.

use crate::cart::{CartAction, CartEnvironment, CartReducer, CartState};
use crate::config::CheckoutConfig;
use crate::coordinator::{
    CheckoutAction, CheckoutEnvironment, CheckoutReducer, CheckoutState,
};
use crate::providers::booking::BookingService;
use crate::providers::payment::PaymentGateway;
use crate::providers::storage::CartStorage;
use crate::types::{CartItemDraft, ContactInfo, PaymentCredentials, ServiceId};
use bookline_core::effect::Effect;
use bookline_core::environment::Clock;
use bookline_core::reducer::Reducer;
use std::sync::Arc;

/// Combined client state.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// The cart.
    pub cart: CartState,
    /// The checkout state machine.
    pub checkout: CheckoutState,
}

/// Everything the UI can do, plus child feedback routing.
///
/// Note the absence of a cart-clear action: clearing is internal to the
/// completion transition.
#[derive(Clone, Debug)]
pub enum AppAction {
    /// Add a service to the cart (or overwrite its existing line).
    AddItem {
        /// The item as the UI describes it.
        item: CartItemDraft,
    },
    /// Remove a service's line from the cart.
    RemoveItem {
        /// The service to remove.
        service_id: ServiceId,
    },
    /// Change a line's quantity; zero removes the line.
    UpdateQuantity {
        /// The service to update.
        service_id: ServiceId,
        /// New quantity; `0` removes.
        quantity: u32,
    },
    /// Load the persisted cart (startup).
    RestoreCart,
    /// Open checkout over the current cart.
    StartCheckout,
    /// Submit the contact form.
    SubmitContact {
        /// Entered contact details.
        contact: ContactInfo,
    },
    /// Submit payment credentials; commits the transaction against the
    /// current cart.
    SubmitPayment {
        /// Collected payment credentials.
        credentials: PaymentCredentials,
    },
    /// Abandon checkout (only honoured before the commit point).
    AbandonCheckout,

    /// Routed cart feedback (restore results, internal operations).
    Cart(CartAction),
    /// Routed checkout feedback (collaborator results, notifications).
    Checkout(CheckoutAction),
}

/// Combined environment: the two child environments side by side.
#[derive(Clone)]
pub struct AppEnvironment<C, B, P, S>
where
    C: Clock,
    B: BookingService,
    P: PaymentGateway,
    S: CartStorage,
{
    /// Cart dependencies.
    pub cart: CartEnvironment<C, S>,
    /// Checkout dependencies.
    pub checkout: CheckoutEnvironment<C, B, P>,
}

impl<C, B, P, S> AppEnvironment<C, B, P, S>
where
    C: Clock + Clone,
    B: BookingService,
    P: PaymentGateway,
    S: CartStorage,
{
    /// Wire up the full environment from its collaborators.
    #[must_use]
    pub fn new(
        clock: C,
        bookings: Arc<B>,
        payments: Arc<P>,
        storage: Arc<S>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            cart: CartEnvironment::new(clock.clone(), storage),
            checkout: CheckoutEnvironment::new(clock, bookings, payments, config),
        }
    }
}

/// The app reducer: routing plus the clear-on-completion rule.
#[derive(Clone)]
pub struct AppReducer<C, B, P, S>
where
    C: Clock,
    B: BookingService,
    P: PaymentGateway,
    S: CartStorage,
{
    cart: CartReducer<C, S>,
    checkout: CheckoutReducer<C, B, P>,
}

impl<C, B, P, S> Default for AppReducer<C, B, P, S>
where
    C: Clock,
    B: BookingService,
    P: PaymentGateway,
    S: CartStorage,
{
    fn default() -> Self {
        Self {
            cart: CartReducer::default(),
            checkout: CheckoutReducer::default(),
        }
    }
}

impl<C, B, P, S> AppReducer<C, B, P, S>
where
    C: Clock,
    B: BookingService + 'static,
    P: PaymentGateway + 'static,
    S: CartStorage + 'static,
{
    fn reduce_cart(
        &self,
        state: &mut AppState,
        action: CartAction,
        env: &AppEnvironment<C, B, P, S>,
    ) -> Vec<Effect<AppAction>> {
        self.cart
            .reduce(&mut state.cart, action, &env.cart)
            .into_iter()
            .map(|e| e.map(AppAction::Cart))
            .collect()
    }

    fn reduce_checkout(
        &self,
        state: &mut AppState,
        action: CheckoutAction,
        env: &AppEnvironment<C, B, P, S>,
    ) -> Vec<Effect<AppAction>> {
        let was_completed = matches!(state.checkout, CheckoutState::Completed { .. });
        let mut effects: Vec<Effect<AppAction>> = self
            .checkout
            .reduce(&mut state.checkout, action, &env.checkout)
            .into_iter()
            .map(|e| e.map(AppAction::Checkout))
            .collect();

        // The one permitted clear: the attempt just completed. The clear
        // runs through the cart reducer so it re-persists the (now
        // empty) cart like any other mutation.
        if !was_completed && matches!(state.checkout, CheckoutState::Completed { .. }) {
            effects.extend(self.reduce_cart(state, CartAction::Clear, env));
        }
        effects
    }
}

impl<C, B, P, S> Reducer for AppReducer<C, B, P, S>
where
    C: Clock,
    B: BookingService + 'static,
    P: PaymentGateway + 'static,
    S: CartStorage + 'static,
{
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment<C, B, P, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Vec<Effect<Self::Action>> {
        match action {
            AppAction::AddItem { item } => {
                self.reduce_cart(state, CartAction::AddItem { item }, env)
            },
            AppAction::RemoveItem { service_id } => {
                self.reduce_cart(state, CartAction::RemoveItem { service_id }, env)
            },
            AppAction::UpdateQuantity {
                service_id,
                quantity,
            } => self.reduce_cart(
                state,
                CartAction::UpdateQuantity {
                    service_id,
                    quantity,
                },
                env,
            ),
            AppAction::RestoreCart => self.reduce_cart(state, CartAction::Restore, env),

            AppAction::StartCheckout => {
                let snapshot = state.cart.snapshot();
                self.reduce_checkout(state, CheckoutAction::Start { snapshot }, env)
            },
            AppAction::SubmitContact { contact } => {
                self.reduce_checkout(state, CheckoutAction::SubmitContact { contact }, env)
            },
            AppAction::SubmitPayment { credentials } => {
                let snapshot = state.cart.snapshot();
                self.reduce_checkout(
                    state,
                    CheckoutAction::SubmitPayment {
                        snapshot,
                        credentials,
                    },
                    env,
                )
            },
            AppAction::AbandonCheckout => {
                self.reduce_checkout(state, CheckoutAction::Abandon, env)
            },

            AppAction::Cart(action) => {
                if matches!(action, CartAction::Clear) {
                    // Clear never travels as a routed action; the only
                    // call site is the completion transition above.
                    tracing::warn!("external cart clear refused");
                    return vec![Effect::None];
                }
                self.reduce_cart(state, action, env)
            },
            AppAction::Checkout(action) => self.reduce_checkout(state, action, env),
        }
    }
}
