//! Booking service interface and wire contract.

use crate::error::Result;
use crate::types::{BookingId, Money, ProviderId, ServiceId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Contact fields the booking service receives with each booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingContact {
    /// Customer phone number.
    pub phone: String,
    /// Customer email address.
    pub email: String,
}

/// The booking-creation request, one per cart line item.
///
/// `total_amount` is the line's price plus the per-booking fee, already
/// currency-rounded; `duration` carries the cart line's quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Service being booked.
    pub service_id: ServiceId,
    /// The offering party.
    pub provider_id: ProviderId,
    /// Requested calendar date.
    pub booking_date: Option<NaiveDate>,
    /// Requested time of day.
    pub start_time: Option<String>,
    /// Duration units.
    pub duration: u32,
    /// Line price plus per-booking fee, currency-rounded.
    pub total_amount: Money,
    /// Customer contact details.
    pub contact_info: BookingContact,
    /// Free-text requests forwarded to the provider.
    pub special_requests: Option<String>,
    /// Service location, when off-site.
    pub location: Option<String>,
}

/// The booking service's response to a successful creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    /// Identifier of the created booking.
    pub booking_id: BookingId,
    /// The amount the backend recorded, echoed back.
    pub total_amount: Money,
    /// Backend booking status (e.g. "pending").
    pub status: String,
}

/// The booking service collaborator.
///
/// One call per cart line item, issued sequentially in cart order by the
/// checkout coordinator. A rejection is terminal for the attempt — the
/// client never retries a booking creation on its own.
pub trait BookingService: Send + Sync {
    /// Submit one booking-creation request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CheckoutError::BookingCreation`] when the
    /// service rejects the request (slot no longer available, validation
    /// failure) or the call fails on the wire, including timeouts.
    fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> impl Future<Output = Result<CreateBookingResponse>> + Send;
}
