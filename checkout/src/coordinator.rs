//! The checkout coordinator: a state machine over the whole transaction.
//!
//! One checkout attempt walks
//! `Idle → CollectingContactInfo → CollectingPayment → CreatingBookings →
//! RequestingPayment → ConfirmingPayment → Completed`, with a terminal
//! `Failed` reachable from every in-flight state. Each transition is a
//! reducer case, so every failure point is enumerable and testable.
//!
//! Booking creation is strictly sequential and in cart order: the effect
//! for line *k+1* is only issued by the transition that consumed line
//! *k*'s result. Payment metadata therefore lists bookings in a stable
//! order, and a mid-sequence failure leaves exactly "the first K bookings
//! exist, the rest do not".
//!
//! Already-created bookings are never rolled back when a later step
//! fails: a created booking is a real reservation, and cancelling it
//! automatically could race the user's own retry. The `Failed` state
//! carries the created ids (and intent id, when one exists) so the UI can
//! say "K of N bookings were created; payment did not complete".

use crate::booking;
use crate::cart::CartSnapshot;
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::payment;
use crate::pricing::{self, PriceQuote};
use crate::providers::booking::BookingService;
use crate::providers::payment::PaymentGateway;
use crate::types::{
    BookingId, CartLineItem, ContactInfo, PaymentCredentials, PaymentIntentId,
};
use crate::utils::validate_contact;
use bookline_core::effect::Effect;
use bookline_core::environment::Clock;
use bookline_core::reducer::Reducer;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Correlates collaborator feedback with the checkout attempt that issued
/// it, so results from an abandoned attempt are dropped instead of
/// corrupting a newer one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttemptId(uuid::Uuid);

impl AttemptId {
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The step a checkout attempt was in when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutStep {
    /// Collecting contact fields.
    CollectingContactInfo,
    /// Collecting payment credentials.
    CollectingPayment,
    /// Creating bookings, one per cart line.
    CreatingBookings,
    /// Requesting the aggregate payment intent.
    RequestingPayment,
    /// Confirming payment.
    ConfirmingPayment,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CollectingContactInfo => "collecting contact info",
            Self::CollectingPayment => "collecting payment",
            Self::CreatingBookings => "creating bookings",
            Self::RequestingPayment => "requesting payment",
            Self::ConfirmingPayment => "confirming payment",
        };
        write!(f, "{name}")
    }
}

/// The order frozen at the commit point.
///
/// Captured once when the user submits payment: the cart lines, the
/// authoritative quote for them, contact details, and credentials. The
/// payment amount always comes from this quote — it is never recomputed
/// mid-transaction, even if the cart were mutated concurrently.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutOrder {
    /// Attempt correlation id.
    pub attempt: AttemptId,
    /// The cart lines, in cart order.
    pub lines: Vec<CartLineItem>,
    /// The authoritative quote for `lines`.
    pub quote: PriceQuote,
    /// Contact details collected earlier in the flow.
    pub contact: ContactInfo,
    /// Payment credentials collected at submission.
    pub credentials: PaymentCredentials,
    /// When the transaction committed to external side effects.
    pub committed_at: chrono::DateTime<chrono::Utc>,
}

/// Checkout state machine position, with the data each phase carries.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CheckoutState {
    /// No checkout in progress.
    #[default]
    Idle,

    /// Contact form is open; nothing committed.
    CollectingContactInfo,

    /// Payment form is open; nothing committed.
    CollectingPayment {
        /// Validated contact details.
        contact: ContactInfo,
    },

    /// Bookings are being created sequentially, in cart order.
    CreatingBookings {
        /// The frozen order.
        order: CheckoutOrder,
        /// Ids created so far; its length is the next line index.
        created: Vec<BookingId>,
    },

    /// All bookings exist; the payment intent is being requested.
    RequestingPayment {
        /// The frozen order.
        order: CheckoutOrder,
        /// One id per cart line, in cart order.
        created: Vec<BookingId>,
    },

    /// The intent exists; confirmation is in flight.
    ConfirmingPayment {
        /// The frozen order.
        order: CheckoutOrder,
        /// One id per cart line, in cart order.
        created: Vec<BookingId>,
        /// The intent being confirmed.
        intent_id: PaymentIntentId,
    },

    /// Payment settled. The composition layer clears the cart on
    /// observing this transition — the only path that does.
    Completed {
        /// Created bookings, in cart order.
        created: Vec<BookingId>,
        /// The settled intent.
        intent_id: PaymentIntentId,
        /// Settlement reference.
        reference: String,
    },

    /// The attempt ended without settling.
    ///
    /// Bookings already created are *not* rolled back; the UI reads
    /// `created` (and `intent_id`) to tell the user which reservations
    /// exist even though payment did not complete. The cart is left
    /// untouched for a retry.
    Failed {
        /// The step that failed.
        step: CheckoutStep,
        /// Why it failed.
        reason: CheckoutError,
        /// Bookings that were created before the failure.
        created: Vec<BookingId>,
        /// The payment intent, when one was requested.
        intent_id: Option<PaymentIntentId>,
    },
}

impl CheckoutState {
    /// `true` once the attempt has committed to external side effects and
    /// has not yet reached a terminal state. Re-entry is refused and the
    /// UI must treat the coordinator as busy for this whole span.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::CreatingBookings { .. }
                | Self::RequestingPayment { .. }
                | Self::ConfirmingPayment { .. }
        )
    }

    /// Booking ids created so far, in cart order.
    #[must_use]
    pub fn created_booking_ids(&self) -> &[BookingId] {
        match self {
            Self::CreatingBookings { created, .. }
            | Self::RequestingPayment { created, .. }
            | Self::ConfirmingPayment { created, .. }
            | Self::Completed { created, .. }
            | Self::Failed { created, .. } => created,
            _ => &[],
        }
    }

    /// The payment intent id, once one has been requested.
    #[must_use]
    pub const fn payment_intent_id(&self) -> Option<&PaymentIntentId> {
        match self {
            Self::ConfirmingPayment { intent_id, .. } | Self::Completed { intent_id, .. } => {
                Some(intent_id)
            },
            Self::Failed { intent_id, .. } => intent_id.as_ref(),
            _ => None,
        }
    }

    /// The failing step and reason, for terminal failures.
    #[must_use]
    pub const fn failure(&self) -> Option<(&CheckoutStep, &CheckoutError)> {
        match self {
            Self::Failed { step, reason, .. } => Some((step, reason)),
            _ => None,
        }
    }
}

/// Checkout actions: UI commands plus collaborator feedback.
#[derive(Clone, Debug)]
pub enum CheckoutAction {
    /// Command: begin checkout over the given cart snapshot.
    Start {
        /// The cart at the moment checkout opened.
        snapshot: CartSnapshot,
    },

    /// Event: a start was refused (empty cart, or an attempt in flight).
    /// The UI redirects to the cart.
    StartRefused {
        /// Why the start was refused.
        reason: String,
    },

    /// Command: submit the contact form.
    SubmitContact {
        /// The entered contact details.
        contact: ContactInfo,
    },

    /// Event: contact validation failed; shown as inline field errors.
    ContactRejected {
        /// The validation error.
        error: CheckoutError,
    },

    /// Command: submit payment credentials. This is the commit point —
    /// the cart is frozen and external side effects begin.
    SubmitPayment {
        /// The cart at the commit point.
        snapshot: CartSnapshot,
        /// Collected payment credentials.
        credentials: PaymentCredentials,
    },

    /// Event: the submission was rejected before committing.
    SubmissionRejected {
        /// The validation error.
        error: CheckoutError,
    },

    /// Command: abandon checkout. Only honoured before the commit point.
    Abandon,

    /// Feedback: one booking was created.
    BookingCreated {
        /// The attempt the result belongs to.
        attempt: AttemptId,
        /// Index of the cart line, in cart order.
        index: usize,
        /// The created booking.
        booking_id: BookingId,
    },

    /// Feedback: a booking creation was rejected.
    BookingFailed {
        /// The attempt the result belongs to.
        attempt: AttemptId,
        /// Index of the cart line that failed.
        index: usize,
        /// The rejection.
        error: CheckoutError,
    },

    /// Feedback: the payment intent was created.
    IntentRequested {
        /// The attempt the result belongs to.
        attempt: AttemptId,
        /// The new intent.
        intent_id: PaymentIntentId,
    },

    /// Feedback: intent creation was rejected.
    IntentFailed {
        /// The attempt the result belongs to.
        attempt: AttemptId,
        /// The rejection.
        error: CheckoutError,
    },

    /// Feedback: payment settled.
    PaymentConfirmed {
        /// The attempt the result belongs to.
        attempt: AttemptId,
        /// Settlement reference.
        reference: String,
    },

    /// Feedback: payment was declined or settlement failed.
    PaymentDeclined {
        /// The attempt the result belongs to.
        attempt: AttemptId,
        /// The failure.
        error: CheckoutError,
    },
}

/// Dependencies of the checkout coordinator.
#[derive(Clone)]
pub struct CheckoutEnvironment<C, B, P>
where
    C: Clock,
    B: BookingService,
    P: PaymentGateway,
{
    /// Clock; stamps the commit point of each attempt.
    pub clock: C,
    /// Booking service collaborator.
    pub bookings: Arc<B>,
    /// Payment service collaborator.
    pub payments: Arc<P>,
    /// Pricing constants, currency, and endpoints.
    pub config: CheckoutConfig,
}

impl<C, B, P> CheckoutEnvironment<C, B, P>
where
    C: Clock,
    B: BookingService,
    P: PaymentGateway,
{
    /// Create a checkout environment.
    #[must_use]
    pub const fn new(
        clock: C,
        bookings: Arc<B>,
        payments: Arc<P>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            clock,
            bookings,
            payments,
            config,
        }
    }
}

/// The checkout coordinator reducer.
#[derive(Clone)]
pub struct CheckoutReducer<C, B, P>
where
    C: Clock,
    B: BookingService,
    P: PaymentGateway,
{
    _phantom: PhantomData<(C, B, P)>,
}

impl<C, B, P> Default for CheckoutReducer<C, B, P>
where
    C: Clock,
    B: BookingService,
    P: PaymentGateway,
{
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<C, B, P> Reducer for CheckoutReducer<C, B, P>
where
    C: Clock,
    B: BookingService + 'static,
    P: PaymentGateway + 'static,
{
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = CheckoutEnvironment<C, B, P>;

    #[allow(clippy::too_many_lines)] // one arm per state transition
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Vec<Effect<Self::Action>> {
        match (state.clone(), action) {
            // Begin checkout. Allowed from Idle and from terminal states
            // (a new attempt); refused mid-collection restarts cleanly.
            (
                CheckoutState::Idle
                | CheckoutState::CollectingContactInfo
                | CheckoutState::CollectingPayment { .. }
                | CheckoutState::Completed { .. }
                | CheckoutState::Failed { .. },
                CheckoutAction::Start { snapshot },
            ) => {
                if snapshot.is_empty() {
                    tracing::info!("checkout start refused: cart is empty");
                    return vec![announce(CheckoutAction::StartRefused {
                        reason: "cart is empty".to_string(),
                    })];
                }
                metrics::counter!("checkout.started").increment(1);
                *state = CheckoutState::CollectingContactInfo;
                vec![Effect::None]
            },

            // No concurrent re-entry while an attempt is in flight.
            (current, CheckoutAction::Start { .. }) if current.is_in_flight() => {
                tracing::warn!("checkout start refused: attempt already in progress");
                vec![announce(CheckoutAction::StartRefused {
                    reason: "a checkout attempt is already in progress".to_string(),
                })]
            },

            // Contact form. Validation failures stay local; no network
            // call has happened yet.
            (CheckoutState::CollectingContactInfo, CheckoutAction::SubmitContact { contact }) => {
                match validate_contact(&contact) {
                    Ok(()) => {
                        *state = CheckoutState::CollectingPayment { contact };
                        vec![Effect::None]
                    },
                    Err(error) => {
                        tracing::info!(%error, "contact validation failed");
                        vec![announce(CheckoutAction::ContactRejected { error })]
                    },
                }
            },

            // The commit point: freeze the order, start creating
            // bookings. From here the transaction has external side
            // effects.
            (
                CheckoutState::CollectingPayment { contact },
                CheckoutAction::SubmitPayment {
                    snapshot,
                    credentials,
                },
            ) => {
                if snapshot.is_empty() {
                    return vec![announce(CheckoutAction::SubmissionRejected {
                        error: CheckoutError::validation("cart", "cart is empty"),
                    })];
                }

                let quote = pricing::price_quote(&snapshot, &env.config.pricing);
                let order = CheckoutOrder {
                    attempt: AttemptId::generate(),
                    lines: snapshot.into_items(),
                    quote,
                    contact,
                    credentials,
                    committed_at: env.clock.now(),
                };

                tracing::info!(
                    attempt = %order.attempt,
                    lines = order.lines.len(),
                    total = %order.quote.total,
                    committed_at = %order.committed_at,
                    "checkout committed, creating bookings"
                );
                metrics::counter!("checkout.committed").increment(1);

                let effect = create_booking_effect(env, &order, 0);
                *state = CheckoutState::CreatingBookings {
                    order,
                    created: Vec::new(),
                };
                vec![effect]
            },

            // One booking done; issue the next line, or move to payment
            // once every line has an id.
            (
                CheckoutState::CreatingBookings { order, mut created },
                CheckoutAction::BookingCreated {
                    attempt,
                    index,
                    booking_id,
                },
            ) if attempt == order.attempt && index == created.len() => {
                created.push(booking_id);

                if created.len() < order.lines.len() {
                    let effect = create_booking_effect(env, &order, created.len());
                    *state = CheckoutState::CreatingBookings { order, created };
                    return vec![effect];
                }

                tracing::info!(
                    attempt = %order.attempt,
                    bookings = created.len(),
                    "all bookings created, requesting payment intent"
                );
                let effect = request_intent_effect(env, &order, &created);
                *state = CheckoutState::RequestingPayment { order, created };
                vec![effect]
            },

            // A line was rejected: terminal. Whatever was created stays
            // created, and no payment intent is ever requested.
            (
                CheckoutState::CreatingBookings { order, created },
                CheckoutAction::BookingFailed {
                    attempt,
                    index,
                    error,
                },
            ) if attempt == order.attempt && index == created.len() => {
                tracing::warn!(
                    attempt = %order.attempt,
                    index,
                    %error,
                    created = created.len(),
                    "booking creation failed, checkout attempt ended"
                );
                metrics::counter!("checkout.failed", "step" => "creating_bookings").increment(1);
                *state = CheckoutState::Failed {
                    step: CheckoutStep::CreatingBookings,
                    reason: error,
                    created,
                    intent_id: None,
                };
                vec![Effect::None]
            },

            // Intent created: confirm it with the frozen credentials.
            (
                CheckoutState::RequestingPayment { order, created },
                CheckoutAction::IntentRequested { attempt, intent_id },
            ) if attempt == order.attempt => {
                let effect = confirm_effect(env, &order, intent_id.clone());
                *state = CheckoutState::ConfirmingPayment {
                    order,
                    created,
                    intent_id,
                };
                vec![effect]
            },

            (
                CheckoutState::RequestingPayment { order, created },
                CheckoutAction::IntentFailed { attempt, error },
            ) if attempt == order.attempt => {
                tracing::warn!(attempt = %order.attempt, %error, "payment intent failed");
                metrics::counter!("checkout.failed", "step" => "requesting_payment").increment(1);
                *state = CheckoutState::Failed {
                    step: CheckoutStep::RequestingPayment,
                    reason: error,
                    created,
                    intent_id: None,
                };
                vec![Effect::None]
            },

            // Settled. The composition layer observes this action and
            // clears the cart — the only point that may.
            (
                CheckoutState::ConfirmingPayment {
                    order,
                    created,
                    intent_id,
                },
                CheckoutAction::PaymentConfirmed { attempt, reference },
            ) if attempt == order.attempt => {
                tracing::info!(
                    attempt = %order.attempt,
                    %reference,
                    bookings = created.len(),
                    "checkout completed"
                );
                metrics::counter!("checkout.completed").increment(1);
                *state = CheckoutState::Completed {
                    created,
                    intent_id,
                    reference,
                };
                vec![Effect::None]
            },

            (
                CheckoutState::ConfirmingPayment {
                    order,
                    created,
                    intent_id,
                },
                CheckoutAction::PaymentDeclined { attempt, error },
            ) if attempt == order.attempt => {
                tracing::warn!(attempt = %order.attempt, %error, "payment confirmation failed");
                metrics::counter!("checkout.failed", "step" => "confirming_payment").increment(1);
                *state = CheckoutState::Failed {
                    step: CheckoutStep::ConfirmingPayment,
                    reason: error,
                    created,
                    intent_id: Some(intent_id),
                };
                vec![Effect::None]
            },

            // Abandon is free before the commit point and meaningless
            // after it: requests already issued complete server-side
            // regardless.
            (
                CheckoutState::CollectingContactInfo | CheckoutState::CollectingPayment { .. },
                CheckoutAction::Abandon,
            ) => {
                *state = CheckoutState::Idle;
                vec![Effect::None]
            },

            // Stale feedback (an abandoned attempt's results), repeated
            // terminal actions, and anything else out of protocol.
            (current, action) => {
                tracing::debug!(state = ?current, action = ?action, "ignoring out-of-protocol action");
                vec![Effect::None]
            },
        }
    }
}

/// Wrap a notification action as an effect so observers see it on the
/// action broadcast.
fn announce(action: CheckoutAction) -> Effect<CheckoutAction> {
    Effect::future(async move { Some(action) })
}

/// Effect: create the booking for `order.lines[index]`.
fn create_booking_effect<C, B, P>(
    env: &CheckoutEnvironment<C, B, P>,
    order: &CheckoutOrder,
    index: usize,
) -> Effect<CheckoutAction>
where
    C: Clock,
    B: BookingService + 'static,
    P: PaymentGateway + 'static,
{
    let Some(line) = order.lines.get(index).cloned() else {
        return Effect::None;
    };
    let bookings = Arc::clone(&env.bookings);
    let pricing = env.config.pricing.clone();
    let contact = order.contact.clone();
    let attempt = order.attempt;

    Effect::future(async move {
        match booking::create(bookings.as_ref(), &line, &contact, &pricing).await {
            Ok(response) => Some(CheckoutAction::BookingCreated {
                attempt,
                index,
                booking_id: response.booking_id,
            }),
            Err(error) => Some(CheckoutAction::BookingFailed {
                attempt,
                index,
                error,
            }),
        }
    })
}

/// Effect: request the payment intent for the frozen quote's total.
fn request_intent_effect<C, B, P>(
    env: &CheckoutEnvironment<C, B, P>,
    order: &CheckoutOrder,
    created: &[BookingId],
) -> Effect<CheckoutAction>
where
    C: Clock,
    B: BookingService + 'static,
    P: PaymentGateway + 'static,
{
    let payments = Arc::clone(&env.payments);
    let amount = order.quote.total;
    let currency = env.config.currency.clone();
    let booking_ids = created.to_vec();
    let attempt = order.attempt;

    Effect::future(async move {
        match payment::request_intent(payments.as_ref(), amount, currency, booking_ids).await {
            Ok(response) => Some(CheckoutAction::IntentRequested {
                attempt,
                intent_id: response.intent_id,
            }),
            Err(error) => Some(CheckoutAction::IntentFailed { attempt, error }),
        }
    })
}

/// Effect: confirm the intent with the frozen credentials.
fn confirm_effect<C, B, P>(
    env: &CheckoutEnvironment<C, B, P>,
    order: &CheckoutOrder,
    intent_id: PaymentIntentId,
) -> Effect<CheckoutAction>
where
    C: Clock,
    B: BookingService + 'static,
    P: PaymentGateway + 'static,
{
    let payments = Arc::clone(&env.payments);
    let credentials = order.credentials.clone();
    let attempt = order.attempt;

    Effect::future(async move {
        match payment::confirm(payments.as_ref(), intent_id, credentials).await {
            Ok(reference) => Some(CheckoutAction::PaymentConfirmed { attempt, reference }),
            Err(error) => Some(CheckoutAction::PaymentDeclined { attempt, error }),
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{MockBookingService, MockPaymentGateway};
    use crate::types::{CartItemDraft, Money, ProviderId, ServiceId};
    use bookline_testing::{FixedClock, test_clock};

    type Env = CheckoutEnvironment<FixedClock, MockBookingService, MockPaymentGateway>;
    type TestReducer = CheckoutReducer<FixedClock, MockBookingService, MockPaymentGateway>;

    fn env() -> Env {
        CheckoutEnvironment::new(
            test_clock(),
            Arc::new(MockBookingService::new()),
            Arc::new(MockPaymentGateway::new()),
            CheckoutConfig::default(),
        )
    }

    fn snapshot(lines: &[(&str, i64, u32)]) -> CartSnapshot {
        use bookline_core::environment::Clock;
        let now = test_clock().now();
        CartSnapshot::from_items(
            lines
                .iter()
                .map(|(id, price, quantity)| {
                    CartItemDraft::new(
                        ServiceId::from(*id),
                        format!("Service {id}"),
                        Money::from_major(*price),
                        ProviderId::from("prov-1"),
                    )
                    .with_quantity(*quantity)
                    .into_line_item(now)
                })
                .collect(),
        )
    }

    fn contact() -> ContactInfo {
        ContactInfo {
            name: "Dana Smith".to_string(),
            email: "dana@example.com".to_string(),
            phone: "+15550109900".to_string(),
            location: None,
        }
    }

    fn credentials() -> PaymentCredentials {
        PaymentCredentials::new("tok_test".to_string())
    }

    /// Drive state to `CollectingPayment`.
    fn to_collecting_payment(state: &mut CheckoutState, env: &Env) {
        let reducer = TestReducer::default();
        let _ = reducer.reduce(
            state,
            CheckoutAction::Start {
                snapshot: snapshot(&[("a", 100, 1)]),
            },
            env,
        );
        let _ = reducer.reduce(
            state,
            CheckoutAction::SubmitContact { contact: contact() },
            env,
        );
        assert!(matches!(state, CheckoutState::CollectingPayment { .. }));
    }

    #[tokio::test]
    async fn start_with_empty_cart_is_refused() {
        let env = env();
        let mut state = CheckoutState::default();
        let mut effects = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::Start {
                snapshot: CartSnapshot::default(),
            },
            &env,
        );

        assert_eq!(state, CheckoutState::Idle);
        let Effect::Future(fut) = effects.remove(0) else {
            unreachable!("refusal is announced to observers");
        };
        assert!(matches!(
            fut.await,
            Some(CheckoutAction::StartRefused { .. })
        ));
    }

    #[test]
    fn start_with_items_opens_contact_form() {
        let env = env();
        let mut state = CheckoutState::default();
        let _ = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::Start {
                snapshot: snapshot(&[("a", 100, 1)]),
            },
            &env,
        );
        assert_eq!(state, CheckoutState::CollectingContactInfo);
    }

    #[tokio::test]
    async fn invalid_contact_stays_on_form() {
        let env = env();
        let mut state = CheckoutState::CollectingContactInfo;
        let mut bad_contact = contact();
        bad_contact.email = "not-an-email".to_string();

        let mut effects = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::SubmitContact {
                contact: bad_contact,
            },
            &env,
        );

        assert_eq!(state, CheckoutState::CollectingContactInfo);
        let Effect::Future(fut) = effects.remove(0) else {
            unreachable!("rejection is announced to observers");
        };
        let Some(CheckoutAction::ContactRejected { error }) = fut.await else {
            unreachable!("rejection carries the validation error");
        };
        assert!(error.is_validation());
    }

    #[tokio::test]
    async fn submit_payment_freezes_quote_and_starts_bookings() {
        let env = env();
        let mut state = CheckoutState::default();
        to_collecting_payment(&mut state, &env);

        let effects = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::SubmitPayment {
                snapshot: snapshot(&[("a", 100, 1)]),
                credentials: credentials(),
            },
            &env,
        );

        let CheckoutState::CreatingBookings { order, created } = &state else {
            unreachable!("submission commits the transaction");
        };
        assert!(created.is_empty());
        // 100 + 10 fee + 8 tax
        assert_eq!(order.quote.total, Money::from_major(118));
        assert_eq!(effects.len(), 1);
    }

    #[tokio::test]
    async fn stale_attempt_feedback_is_ignored() {
        let env = env();
        let mut state = CheckoutState::default();
        to_collecting_payment(&mut state, &env);
        let _ = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::SubmitPayment {
                snapshot: snapshot(&[("a", 100, 1)]),
                credentials: credentials(),
            },
            &env,
        );

        let before = state.clone();
        let _ = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::BookingCreated {
                attempt: AttemptId::generate(), // wrong attempt
                index: 0,
                booking_id: BookingId::new("bk-stale".to_string()),
            },
            &env,
        );
        assert_eq!(state, before);
    }

    #[test]
    fn reentry_is_refused_while_in_flight() {
        let env = env();
        let mut state = CheckoutState::default();
        to_collecting_payment(&mut state, &env);
        let _ = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::SubmitPayment {
                snapshot: snapshot(&[("a", 100, 1)]),
                credentials: credentials(),
            },
            &env,
        );
        assert!(state.is_in_flight());

        let before = state.clone();
        let _ = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::Start {
                snapshot: snapshot(&[("b", 5, 1)]),
            },
            &env,
        );
        assert_eq!(state, before);
    }

    #[test]
    fn abandon_before_commit_returns_to_idle() {
        let env = env();
        let mut state = CheckoutState::default();
        to_collecting_payment(&mut state, &env);

        let _ = TestReducer::default().reduce(&mut state, CheckoutAction::Abandon, &env);
        assert_eq!(state, CheckoutState::Idle);
    }

    #[test]
    fn abandon_after_commit_is_ignored() {
        let env = env();
        let mut state = CheckoutState::default();
        to_collecting_payment(&mut state, &env);
        let _ = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::SubmitPayment {
                snapshot: snapshot(&[("a", 100, 1)]),
                credentials: credentials(),
            },
            &env,
        );

        let before = state.clone();
        let _ = TestReducer::default().reduce(&mut state, CheckoutAction::Abandon, &env);
        assert_eq!(state, before);
    }

    #[test]
    fn booking_failure_keeps_created_ids_and_is_terminal() {
        let env = env();
        let mut state = CheckoutState::default();
        to_collecting_payment(&mut state, &env);
        let _ = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::SubmitPayment {
                snapshot: snapshot(&[("a", 50, 2), ("b", 30, 1)]),
                credentials: credentials(),
            },
            &env,
        );

        let CheckoutState::CreatingBookings { order, .. } = state.clone() else {
            unreachable!("submission commits the transaction");
        };
        let attempt = order.attempt;

        // First line succeeds.
        let _ = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::BookingCreated {
                attempt,
                index: 0,
                booking_id: BookingId::new("bk-0".to_string()),
            },
            &env,
        );
        // Second line fails.
        let _ = TestReducer::default().reduce(
            &mut state,
            CheckoutAction::BookingFailed {
                attempt,
                index: 1,
                error: CheckoutError::BookingCreation {
                    service_id: ServiceId::from("b"),
                    cause: "slot no longer available".to_string(),
                },
            },
            &env,
        );

        let CheckoutState::Failed {
            step,
            created,
            intent_id,
            ..
        } = &state
        else {
            unreachable!("booking failure is terminal");
        };
        assert_eq!(*step, CheckoutStep::CreatingBookings);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0], BookingId::new("bk-0".to_string()));
        assert!(intent_id.is_none());
    }
}
