//! # Bookline Checkout
//!
//! Cart, pricing, and the checkout transaction pipeline for the Bookline
//! booking marketplace client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  add / remove / update          ┌──────────────┐
//! │     UI      │────────────────────────────────►│  Cart        │──► CartStorage
//! └──────┬──────┘                                 │  (reducer)   │    (best-effort)
//!        │ start / contact / payment              └──────┬───────┘
//!        ▼                                               │ snapshot
//! ┌─────────────┐   frozen quote (sole total)     ┌──────▼───────┐
//! │  Checkout   │◄────────────────────────────────│  Pricing     │
//! │ Coordinator │                                 └──────────────┘
//! └──────┬──────┘
//!        │ sequential, cart order                 one intent per checkout
//!        ▼                                                ▼
//! ┌─────────────┐                                 ┌──────────────┐
//! │  Booking    │──► POST /bookings (per line)    │  Payment     │──► POST /payment-intents
//! │ Materializer│                                 │ Orchestrator │──► POST /payment-confirmations
//! └─────────────┘                                 └──────────────┘
//! ```
//!
//! The coordinator walks `Idle → CollectingContactInfo →
//! CollectingPayment → CreatingBookings → RequestingPayment →
//! ConfirmingPayment → Completed`, with `Failed` reachable from every
//! in-flight state. Bookings are created strictly sequentially in cart
//! order; a mid-sequence failure leaves "the first K bookings exist" and
//! is never compensated automatically. The cart is cleared exactly once,
//! on completion, by the composition layer in [`app`].
//!
//! # Example
//!
//! ```ignore
//! use bookline_checkout::app::{AppAction, AppEnvironment, AppReducer, AppState};
//! use bookline_checkout::config::CheckoutConfig;
//! use bookline_runtime::Store;
//!
//! let store = Store::new(AppState::default(), AppReducer::default(), environment);
//! store.send(AppAction::RestoreCart).await?;
//! ```

pub mod app;
pub mod booking;
pub mod cart;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod payment;
pub mod pricing;
pub mod providers;
pub mod types;
pub mod utils;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use error::{CheckoutError, Result};
pub use types::{
    BookingId, CartItemDraft, CartLineItem, ContactInfo, Currency, Money, PaymentCredentials,
    PaymentIntentId, ProviderId, ServiceId,
};
