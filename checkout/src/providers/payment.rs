//! Payment service interface and wire contract.

use crate::error::Result;
use crate::types::{BookingId, Currency, Money, PaymentCredentials, PaymentIntentId};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Correlation metadata attached to a payment intent.
///
/// Lists the created bookings in cart order so a settled payment can be
/// traced back to the reservations it covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMetadata {
    /// Created booking identifiers, in cart order.
    pub booking_ids: Vec<BookingId>,
}

/// Request for a payment intent covering the whole checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    /// Grand total across all lines, currency-rounded.
    pub amount: Money,
    /// Currency the intent is denominated in.
    pub currency: Currency,
    /// Booking correlation metadata.
    pub metadata: IntentMetadata,
}

/// The payment service's response to intent creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    /// Identifier of the created intent.
    pub intent_id: PaymentIntentId,
    /// The amount the client should present for collection.
    pub client_amount: Money,
    /// Currency echoed back.
    pub currency: Currency,
}

/// Request to confirm a payment intent with collected credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    /// The intent being confirmed.
    pub intent_id: PaymentIntentId,
    /// Collected payment credentials.
    pub credentials: PaymentCredentials,
}

/// Settlement outcome of a confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Funds captured.
    Settled,
    /// Confirmation rejected or settlement failed.
    Failed,
}

/// The payment service's response to a confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentResponse {
    /// Settlement outcome.
    pub status: PaymentStatus,
    /// Settlement reference, present when settled.
    pub reference: Option<String>,
}

/// The payment service collaborator.
///
/// One intent per checkout transaction — never per line item. A fresh
/// attempt always creates a fresh intent; stale intent identifiers are
/// discarded with the failed transaction state that held them.
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for the aggregate amount.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CheckoutError::PaymentIntent`] when the
    /// service rejects the request or the call fails on the wire.
    fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> impl Future<Output = Result<CreateIntentResponse>> + Send;

    /// Submit credentials to confirm an intent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CheckoutError::PaymentConfirmation`] when
    /// the call fails on the wire. A declined payment is reported through
    /// [`ConfirmPaymentResponse::status`], not as a transport error.
    fn confirm(
        &self,
        request: ConfirmPaymentRequest,
    ) -> impl Future<Output = Result<ConfirmPaymentResponse>> + Send;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn intent_request_serialises_camel_case() {
        let request = CreateIntentRequest {
            amount: Money::with_scale(16040, 2),
            currency: Currency::default(),
            metadata: IntentMetadata {
                booking_ids: vec![
                    BookingId::new("bk-1".to_string()),
                    BookingId::new("bk-2".to_string()),
                ],
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], "160.40");
        assert_eq!(json["currency"], "usd");
        assert_eq!(json["metadata"]["bookingIds"][1], "bk-2");
    }

    #[test]
    fn confirmation_status_parses_lowercase() {
        let settled: ConfirmPaymentResponse =
            serde_json::from_str(r#"{"status": "settled", "reference": "ref-9"}"#).unwrap();
        assert_eq!(settled.status, PaymentStatus::Settled);

        let failed: ConfirmPaymentResponse =
            serde_json::from_str(r#"{"status": "failed", "reference": null}"#).unwrap();
        assert_eq!(failed.status, PaymentStatus::Failed);
    }
}
