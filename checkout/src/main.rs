//! CLI walkthrough of the checkout pipeline against mock collaborators.
//!
//! Runs a successful two-line checkout, then a checkout whose second
//! booking is rejected, printing the partial-failure report the UI would
//! render.

use bookline_checkout::app::{AppAction, AppEnvironment, AppReducer, AppState};
use bookline_checkout::config::CheckoutConfig;
use bookline_checkout::coordinator::{CheckoutAction, CheckoutState};
use bookline_checkout::mocks::{InMemoryCartStorage, MockBookingService, MockPaymentGateway};
use bookline_checkout::pricing;
use bookline_checkout::{CartItemDraft, ContactInfo, Money, PaymentCredentials, ProviderId, ServiceId};
use bookline_core::environment::SystemClock;
use bookline_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type DemoStore = Store<
    AppState,
    AppAction,
    AppEnvironment<SystemClock, MockBookingService, MockPaymentGateway, InMemoryCartStorage>,
    AppReducer<SystemClock, MockBookingService, MockPaymentGateway, InMemoryCartStorage>,
>;

fn demo_store(bookings: MockBookingService) -> DemoStore {
    let env = AppEnvironment::new(
        SystemClock,
        Arc::new(bookings),
        Arc::new(MockPaymentGateway::new()),
        Arc::new(InMemoryCartStorage::new()),
        CheckoutConfig::default(),
    );
    Store::new(AppState::default(), AppReducer::default(), env)
}

fn contact() -> ContactInfo {
    ContactInfo {
        name: "Dana Smith".to_string(),
        email: "dana@example.com".to_string(),
        phone: "+1 555 010 9900".to_string(),
        location: Some("12 Elm St".to_string()),
    }
}

async fn fill_cart(store: &DemoStore) -> anyhow::Result<()> {
    store
        .send(AppAction::AddItem {
            item: CartItemDraft::new(
                ServiceId::from("svc-cleaning"),
                "Deep cleaning".to_string(),
                Money::from_major(50),
                ProviderId::from("prov-alpha"),
            )
            .with_quantity(2),
        })
        .await?;
    store
        .send(AppAction::AddItem {
            item: CartItemDraft::new(
                ServiceId::from("svc-garden"),
                "Garden tidy".to_string(),
                Money::from_major(30),
                ProviderId::from("prov-beta"),
            ),
        })
        .await?;
    Ok(())
}

async fn run_checkout(store: &DemoStore) -> anyhow::Result<()> {
    store.send(AppAction::StartCheckout).await?;
    store
        .send(AppAction::SubmitContact { contact: contact() })
        .await?;

    // The terminal action arrives on the broadcast once the booking and
    // payment effects settle.
    let terminal = store
        .send_and_wait_for(
            AppAction::SubmitPayment {
                credentials: PaymentCredentials::new("tok_demo".to_string()),
            },
            |action| {
                matches!(
                    action,
                    AppAction::Checkout(
                        CheckoutAction::PaymentConfirmed { .. }
                            | CheckoutAction::BookingFailed { .. }
                            | CheckoutAction::IntentFailed { .. }
                            | CheckoutAction::PaymentDeclined { .. }
                    )
                )
            },
            Duration::from_secs(5),
        )
        .await?;
    tracing::debug!(?terminal, "checkout reached a terminal action");
    Ok(())
}

fn report(state: &CheckoutState, cart_items: usize) {
    match state {
        CheckoutState::Completed {
            created, reference, ..
        } => {
            println!("  checkout completed, reference {reference}");
            println!("  bookings created: {}", created.len());
            for id in created {
                println!("    - {id}");
            }
        },
        CheckoutState::Failed {
            step,
            reason,
            created,
            ..
        } => {
            println!("  checkout failed while {step}: {reason}");
            println!(
                "  {} booking(s) were created before the failure:",
                created.len()
            );
            for id in created {
                println!("    - {id}");
            }
        },
        other => println!("  unexpected terminal state: {other:?}"),
    }
    println!("  cart now holds {cart_items} item(s)\n");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== Bookline checkout demo ===\n");

    // Happy path: both bookings succeed, payment settles, cart clears.
    println!("Successful checkout:");
    let store = demo_store(MockBookingService::new());
    fill_cart(&store).await?;

    let quote = store
        .state(|s| pricing::price_quote(&s.cart.snapshot(), &CheckoutConfig::default().pricing))
        .await;
    println!(
        "  quote: subtotal {}, fee {}, tax {}, total {}",
        quote.subtotal, quote.booking_fee, quote.tax, quote.total
    );

    run_checkout(&store).await?;
    let (checkout, items) = store
        .state(|s| (s.checkout.clone(), s.cart.item_count()))
        .await;
    report(&checkout, items);

    // Partial failure: the second booking is rejected. The first booking
    // stays created, no payment intent is requested, the cart is kept.
    println!("Checkout with a failing second booking:");
    let store = demo_store(MockBookingService::new().failing_at(1));
    fill_cart(&store).await?;
    run_checkout(&store).await?;
    let (checkout, items) = store
        .state(|s| (s.checkout.clone(), s.cart.item_count()))
        .await;
    report(&checkout, items);

    store.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
