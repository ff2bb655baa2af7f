//! Booking materialization: cart lines become booking-creation requests.
//!
//! Each cart line turns into exactly one request at checkout time. The
//! per-booking amount is the line's price plus the flat per-booking fee,
//! rounded here because it leaves the system on the wire; the aggregate
//! payment amount is computed separately by pricing and is never derived
//! from these per-line amounts.

use crate::config::PricingConfig;
use crate::error::Result;
use crate::providers::booking::{
    BookingContact, BookingService, CreateBookingRequest, CreateBookingResponse,
};
use crate::types::{CartLineItem, ContactInfo};

/// Build the booking-creation request for one cart line.
#[must_use]
pub fn materialize(
    line: &CartLineItem,
    contact: &ContactInfo,
    pricing: &PricingConfig,
) -> CreateBookingRequest {
    CreateBookingRequest {
        service_id: line.service_id.clone(),
        provider_id: line.provider.clone(),
        booking_date: line.date,
        start_time: line.time.clone(),
        duration: line.quantity,
        total_amount: (line.price() + pricing.fixed_fee).rounded(),
        contact_info: BookingContact {
            phone: contact.phone.clone(),
            email: contact.email.clone(),
        },
        special_requests: line.special_requests.clone(),
        location: contact.location.clone(),
    }
}

/// Materialize one line and submit it to the booking service.
///
/// # Errors
///
/// Propagates [`crate::error::CheckoutError::BookingCreation`] from the
/// collaborator. Never retried here: a failed line ends the checkout
/// attempt, and a retry is a user-initiated new attempt.
pub async fn create<B: BookingService>(
    service: &B,
    line: &CartLineItem,
    contact: &ContactInfo,
    pricing: &PricingConfig,
) -> Result<CreateBookingResponse> {
    let request = materialize(line, contact, pricing);
    tracing::debug!(service_id = %request.service_id, "submitting booking creation");
    service.create_booking(request).await
}
