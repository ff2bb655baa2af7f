//! End-to-end checkout flows driven through the store runtime with mock
//! collaborators.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use bookline_checkout::app::{AppAction, AppEnvironment, AppReducer, AppState};
use bookline_checkout::cart::CartSnapshot;
use bookline_checkout::config::CheckoutConfig;
use bookline_checkout::coordinator::{CheckoutState, CheckoutStep};
use bookline_checkout::mocks::{InMemoryCartStorage, MockBookingService, MockPaymentGateway};
use bookline_checkout::{
    CartItemDraft, ContactInfo, Money, PaymentCredentials, ProviderId, ServiceId,
};
use bookline_core::environment::Clock;
use bookline_runtime::Store;
use bookline_testing::{FixedClock, test_clock};
use std::sync::Arc;
use std::time::Duration;

type TestStore = Store<
    AppState,
    AppAction,
    AppEnvironment<FixedClock, MockBookingService, MockPaymentGateway, InMemoryCartStorage>,
    AppReducer<FixedClock, MockBookingService, MockPaymentGateway, InMemoryCartStorage>,
>;

struct Harness {
    store: TestStore,
    bookings: MockBookingService,
    payments: MockPaymentGateway,
    storage: InMemoryCartStorage,
}

fn harness(bookings: MockBookingService, payments: MockPaymentGateway) -> Harness {
    harness_with_storage(bookings, payments, InMemoryCartStorage::new())
}

fn harness_with_storage(
    bookings: MockBookingService,
    payments: MockPaymentGateway,
    storage: InMemoryCartStorage,
) -> Harness {
    let env = AppEnvironment::new(
        test_clock(),
        Arc::new(bookings.clone()),
        Arc::new(payments.clone()),
        Arc::new(storage.clone()),
        CheckoutConfig::default(),
    );
    Harness {
        store: Store::new(AppState::default(), AppReducer::default(), env),
        bookings,
        payments,
        storage,
    }
}

fn contact() -> ContactInfo {
    ContactInfo {
        name: "Dana Smith".to_string(),
        email: "dana@example.com".to_string(),
        phone: "+1 555 010 9900".to_string(),
        location: None,
    }
}

fn draft(id: &str, price: i64, quantity: u32) -> CartItemDraft {
    CartItemDraft::new(
        ServiceId::from(id),
        format!("Service {id}"),
        Money::from_major(price),
        ProviderId::from("prov-1"),
    )
    .with_quantity(quantity)
}

async fn send_and_settle(store: &TestStore, action: AppAction) {
    let mut handle = store.send(action).await.expect("store accepts actions");
    handle
        .wait_with_timeout(Duration::from_secs(5))
        .await
        .expect("effects settle");
}

/// Add the two standard lines: 50×2 and 30×1 (subtotal 130, fee 20,
/// tax 10.40, total 160.40).
async fn fill_two_line_cart(store: &TestStore) {
    send_and_settle(store, AppAction::AddItem { item: draft("a", 50, 2) }).await;
    send_and_settle(store, AppAction::AddItem { item: draft("b", 30, 1) }).await;
}

/// Run checkout to its terminal state.
async fn run_checkout(store: &TestStore) {
    send_and_settle(store, AppAction::StartCheckout).await;
    send_and_settle(store, AppAction::SubmitContact { contact: contact() }).await;
    send_and_settle(
        store,
        AppAction::SubmitPayment {
            credentials: PaymentCredentials::new("tok_test".to_string()),
        },
    )
    .await;
}

#[tokio::test]
async fn successful_two_line_checkout_clears_the_cart() {
    let h = harness(MockBookingService::new(), MockPaymentGateway::new());
    fill_two_line_cart(&h.store).await;
    run_checkout(&h.store).await;

    let (checkout, cart_empty) = h
        .store
        .state(|s| (s.checkout.clone(), s.cart.is_empty()))
        .await;

    // Scenario: both lines booked, one intent, settled, cart empty.
    let CheckoutState::Completed { created, .. } = checkout else {
        panic!("expected completion, got {checkout:?}");
    };
    assert_eq!(created.len(), 2);
    assert!(cart_empty);

    // Bookings were created sequentially, in cart order.
    let requests = h.bookings.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].service_id, ServiceId::from("a"));
    assert_eq!(requests[1].service_id, ServiceId::from("b"));

    // Exactly one payment intent, for the combined total.
    assert_eq!(h.payments.intent_requests(), 1);
    let intent = h.payments.last_intent_request().expect("one intent");
    assert_eq!(intent.amount, Money::with_scale(16040, 2));
    assert_eq!(intent.metadata.booking_ids, created);
}

#[tokio::test]
async fn per_line_booking_amounts_include_the_flat_fee() {
    let h = harness(MockBookingService::new(), MockPaymentGateway::new());
    fill_two_line_cart(&h.store).await;
    run_checkout(&h.store).await;

    let requests = h.bookings.requests();
    // 50×2 + 10 fee, then 30×1 + 10 fee.
    assert_eq!(requests[0].total_amount, Money::from_major(110));
    assert_eq!(requests[1].total_amount, Money::from_major(40));
}

#[tokio::test]
async fn second_booking_failure_stops_before_payment() {
    let h = harness(
        MockBookingService::new().failing_at(1),
        MockPaymentGateway::new(),
    );
    fill_two_line_cart(&h.store).await;
    run_checkout(&h.store).await;

    let (checkout, item_count) = h
        .store
        .state(|s| (s.checkout.clone(), s.cart.item_count()))
        .await;

    // Scenario: first line booked, second rejected. Exactly one booking
    // id survives, no payment intent was ever requested, and the cart
    // still holds both original lines.
    let CheckoutState::Failed {
        step,
        created,
        intent_id,
        ..
    } = checkout
    else {
        panic!("expected failure, got {checkout:?}");
    };
    assert_eq!(step, CheckoutStep::CreatingBookings);
    assert_eq!(created.len(), 1);
    assert!(intent_id.is_none());
    assert_eq!(h.payments.intent_requests(), 0);
    assert_eq!(item_count, 2);
}

#[tokio::test]
async fn first_booking_failure_creates_nothing() {
    let h = harness(
        MockBookingService::new().failing_at(0),
        MockPaymentGateway::new(),
    );
    fill_two_line_cart(&h.store).await;
    run_checkout(&h.store).await;

    let checkout = h.store.state(|s| s.checkout.clone()).await;
    assert_eq!(checkout.created_booking_ids().len(), 0);
    // The sequence stopped at the first line: the second was never sent.
    assert_eq!(h.bookings.request_count(), 1);
    assert_eq!(h.payments.intent_requests(), 0);
}

#[tokio::test]
async fn rejected_intent_keeps_all_bookings_and_the_cart() {
    let h = harness(
        MockBookingService::new(),
        MockPaymentGateway::new().rejecting_intents(),
    );
    fill_two_line_cart(&h.store).await;
    run_checkout(&h.store).await;

    let (checkout, item_count) = h
        .store
        .state(|s| (s.checkout.clone(), s.cart.item_count()))
        .await;

    let CheckoutState::Failed { step, created, .. } = checkout else {
        panic!("expected failure, got {checkout:?}");
    };
    assert_eq!(step, CheckoutStep::RequestingPayment);
    // Both bookings exist even though payment never started.
    assert_eq!(created.len(), 2);
    assert_eq!(item_count, 2);
}

#[tokio::test]
async fn declined_payment_reports_created_bookings_and_intent() {
    let h = harness(
        MockBookingService::new(),
        MockPaymentGateway::new().declining_confirmations(),
    );
    fill_two_line_cart(&h.store).await;
    run_checkout(&h.store).await;

    let (checkout, item_count) = h
        .store
        .state(|s| (s.checkout.clone(), s.cart.item_count()))
        .await;

    let CheckoutState::Failed {
        step,
        created,
        intent_id,
        ..
    } = checkout
    else {
        panic!("expected failure, got {checkout:?}");
    };
    // "2 of 2 bookings were created; payment did not complete."
    assert_eq!(step, CheckoutStep::ConfirmingPayment);
    assert_eq!(created.len(), 2);
    assert!(intent_id.is_some());
    assert_eq!(item_count, 2);
}

#[tokio::test]
async fn payment_amount_is_frozen_at_the_commit_point() {
    let h = harness(MockBookingService::new(), MockPaymentGateway::new());
    fill_two_line_cart(&h.store).await;

    send_and_settle(&h.store, AppAction::StartCheckout).await;
    send_and_settle(&h.store, AppAction::SubmitContact { contact: contact() }).await;

    // Commit, then immediately mutate the cart while the transaction is
    // in flight. The charged amount must come from the frozen quote.
    let mut handle = h
        .store
        .send(AppAction::SubmitPayment {
            credentials: PaymentCredentials::new("tok_test".to_string()),
        })
        .await
        .expect("store accepts actions");
    let _ = h
        .store
        .send(AppAction::AddItem {
            item: draft("late", 999, 1),
        })
        .await;
    handle
        .wait_with_timeout(Duration::from_secs(5))
        .await
        .expect("effects settle");

    let intent = h.payments.last_intent_request().expect("one intent");
    assert_eq!(intent.amount, Money::with_scale(16040, 2));
}

#[tokio::test]
async fn empty_cart_checkout_is_refused() {
    let h = harness(MockBookingService::new(), MockPaymentGateway::new());
    send_and_settle(&h.store, AppAction::StartCheckout).await;

    let checkout = h.store.state(|s| s.checkout.clone()).await;
    assert_eq!(checkout, CheckoutState::Idle);
    assert_eq!(h.bookings.request_count(), 0);
}

#[tokio::test]
async fn cart_survives_a_reload_through_storage() {
    let storage = InMemoryCartStorage::new();
    let h = harness_with_storage(
        MockBookingService::new(),
        MockPaymentGateway::new(),
        storage.clone(),
    );
    fill_two_line_cart(&h.store).await;

    // A "new session" restores from the same storage.
    let restored = harness_with_storage(
        MockBookingService::new(),
        MockPaymentGateway::new(),
        storage,
    );
    send_and_settle(&restored.store, AppAction::RestoreCart).await;

    let items = restored.store.state(|s| s.cart.item_count()).await;
    assert_eq!(items, 2);
}

#[tokio::test]
async fn completed_checkout_persists_the_empty_cart() {
    let h = harness(MockBookingService::new(), MockPaymentGateway::new());
    fill_two_line_cart(&h.store).await;
    run_checkout(&h.store).await;

    let stored = h.storage.stored().expect("cart was persisted");
    assert_eq!(stored, CartSnapshot::default());
}

#[tokio::test]
async fn persistence_failure_does_not_block_checkout() {
    let h = harness_with_storage(
        MockBookingService::new(),
        MockPaymentGateway::new(),
        InMemoryCartStorage::new().failing_saves(),
    );
    fill_two_line_cart(&h.store).await;
    run_checkout(&h.store).await;

    let (checkout, cart_empty) = h
        .store
        .state(|s| (s.checkout.clone(), s.cart.is_empty()))
        .await;
    assert!(matches!(checkout, CheckoutState::Completed { .. }));
    // The in-memory cart cleared even though every save failed.
    assert!(cart_empty);
    assert!(h.storage.save_count() >= 3);
}

#[tokio::test]
async fn restore_stamps_match_the_fixed_clock() {
    let h = harness(MockBookingService::new(), MockPaymentGateway::new());
    send_and_settle(&h.store, AppAction::AddItem { item: draft("a", 50, 2) }).await;

    let added_at = h.store.state(|s| s.cart.items()[0].added_at).await;
    assert_eq!(added_at, test_clock().now());
}
