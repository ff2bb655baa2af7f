//! Payment orchestration: one intent per checkout, confirmed separately.

use crate::error::{CheckoutError, Result};
use crate::providers::payment::{
    ConfirmPaymentRequest, CreateIntentRequest, CreateIntentResponse, IntentMetadata,
    PaymentGateway, PaymentStatus,
};
use crate::types::{BookingId, Currency, Money, PaymentCredentials, PaymentIntentId};

/// Request a payment intent for the aggregate checkout amount.
///
/// The amount is rounded here — the one place the grand total leaves the
/// system — and must be strictly positive; that is checked locally before
/// any network call. The metadata lists every created booking in cart
/// order so the payment correlates back to its reservations.
///
/// # Errors
///
/// Returns [`CheckoutError::PaymentIntent`] for a non-positive amount or
/// a collaborator rejection.
pub async fn request_intent<P: PaymentGateway>(
    gateway: &P,
    amount: Money,
    currency: Currency,
    booking_ids: Vec<BookingId>,
) -> Result<CreateIntentResponse> {
    let amount = amount.rounded();
    if !amount.is_positive() {
        return Err(CheckoutError::PaymentIntent {
            cause: format!("amount must be positive, got {amount}"),
        });
    }

    tracing::debug!(%amount, %currency, bookings = booking_ids.len(), "requesting payment intent");
    gateway
        .create_intent(CreateIntentRequest {
            amount,
            currency,
            metadata: IntentMetadata { booking_ids },
        })
        .await
}

/// Confirm a payment intent with collected credentials.
///
/// Returns the settlement reference on success. A declined or failed
/// settlement maps to [`CheckoutError::PaymentConfirmation`], exactly as
/// a transport failure does — neither is retried.
///
/// # Errors
///
/// Returns [`CheckoutError::PaymentConfirmation`] when the collaborator
/// rejects the confirmation or reports a failed settlement.
pub async fn confirm<P: PaymentGateway>(
    gateway: &P,
    intent_id: PaymentIntentId,
    credentials: PaymentCredentials,
) -> Result<String> {
    let response = gateway
        .confirm(ConfirmPaymentRequest {
            intent_id: intent_id.clone(),
            credentials,
        })
        .await?;

    match response.status {
        PaymentStatus::Settled => Ok(response.reference.unwrap_or_else(|| intent_id.to_string())),
        PaymentStatus::Failed => Err(CheckoutError::PaymentConfirmation {
            cause: "payment was declined".to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::MockPaymentGateway;

    #[tokio::test]
    async fn zero_amount_is_rejected_locally() {
        let gateway = MockPaymentGateway::new();
        let error = request_intent(&gateway, Money::ZERO, Currency::default(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(error, CheckoutError::PaymentIntent { .. }));
        assert_eq!(gateway.intent_requests(), 0);
    }

    #[tokio::test]
    async fn sub_cent_amount_rounds_to_zero_and_is_rejected() {
        let gateway = MockPaymentGateway::new();
        let error = request_intent(
            &gateway,
            Money::with_scale(4, 3), // 0.004 rounds to 0.00
            Currency::default(),
            vec![],
        )
        .await
        .unwrap_err();
        assert!(matches!(error, CheckoutError::PaymentIntent { .. }));
    }

    #[tokio::test]
    async fn intent_carries_booking_metadata() {
        let gateway = MockPaymentGateway::new();
        let ids = vec![
            BookingId::new("bk-1".to_string()),
            BookingId::new("bk-2".to_string()),
        ];
        let response = request_intent(
            &gateway,
            Money::with_scale(16040, 2),
            Currency::default(),
            ids.clone(),
        )
        .await
        .unwrap();

        assert_eq!(response.client_amount, Money::with_scale(16040, 2));
        let recorded = gateway.last_intent_request().unwrap();
        assert_eq!(recorded.metadata.booking_ids, ids);
    }

    #[tokio::test]
    async fn declined_confirmation_is_an_error() {
        let gateway = MockPaymentGateway::new().declining_confirmations();
        let intent = request_intent(
            &gateway,
            Money::from_major(10),
            Currency::default(),
            vec![BookingId::new("bk-1".to_string())],
        )
        .await
        .unwrap();

        let error = confirm(
            &gateway,
            intent.intent_id,
            PaymentCredentials::new("tok_test".to_string()),
        )
        .await
        .unwrap_err();
        assert!(matches!(error, CheckoutError::PaymentConfirmation { .. }));
    }
}
