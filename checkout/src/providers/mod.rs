//! Collaborator interfaces for the checkout pipeline.
//!
//! Providers are traits, not implementations: reducers and the
//! orchestration helpers depend on these interfaces, and the runtime wires
//! in concrete implementations — the REST clients in [`rest`] for
//! production, the in-memory mocks in [`crate::mocks`] for tests.
//!
//! The backend owns all booking and payment validation; this client only
//! carries the request/response contracts.

pub mod booking;
pub mod payment;
pub mod rest;
pub mod storage;

pub use booking::{BookingContact, BookingService, CreateBookingRequest, CreateBookingResponse};
pub use payment::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreateIntentRequest, CreateIntentResponse,
    IntentMetadata, PaymentGateway, PaymentStatus,
};
pub use rest::{RestBookingService, RestPaymentGateway};
pub use storage::{CartStorage, FileCartStorage};
