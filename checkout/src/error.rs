//! Error taxonomy for the cart and checkout pipeline.

use crate::types::ServiceId;
use thiserror::Error;

/// Result type alias for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Every failure mode of the checkout pipeline.
///
/// Validation errors are resolved locally (inline field errors) and never
/// commit the transaction. The four transaction-step errors are terminal
/// for the current checkout attempt: none are retried automatically, and
/// a new attempt is always user-initiated. Storage errors are non-fatal
/// everywhere they occur — a cart that fails to persist keeps working in
/// memory.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Input failed local validation before any network call.
    #[error("invalid {field}: {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// Human-readable description.
        message: String,
    },

    /// The booking service rejected one line item's creation request.
    #[error("booking creation failed for service {service_id}: {cause}")]
    BookingCreation {
        /// The cart line whose booking was rejected.
        service_id: ServiceId,
        /// Collaborator-reported cause (slot taken, validation, timeout).
        cause: String,
    },

    /// The payment service rejected the aggregate payment intent.
    #[error("payment intent rejected: {cause}")]
    PaymentIntent {
        /// Collaborator-reported cause.
        cause: String,
    },

    /// Payment confirmation was declined or settlement failed.
    #[error("payment confirmation failed: {cause}")]
    PaymentConfirmation {
        /// Collaborator-reported cause.
        cause: String,
    },

    /// Cart persistence read/write failed. Always non-fatal.
    #[error("cart storage error: {cause}")]
    Storage {
        /// Underlying I/O or serialization cause.
        cause: String,
    },
}

impl CheckoutError {
    /// Shorthand for a validation error.
    #[must_use]
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// `true` for errors resolved locally, before any network call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// `true` for errors that end a committed checkout attempt.
    #[must_use]
    pub const fn is_transaction_failure(&self) -> bool {
        matches!(
            self,
            Self::BookingCreation { .. }
                | Self::PaymentIntent { .. }
                | Self::PaymentConfirmation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_not_a_transaction_failure() {
        let error = CheckoutError::validation("email", "missing @");
        assert!(error.is_validation());
        assert!(!error.is_transaction_failure());
    }

    #[test]
    fn booking_error_names_the_service() {
        let error = CheckoutError::BookingCreation {
            service_id: ServiceId::from("svc-9"),
            cause: "slot no longer available".to_string(),
        };
        assert!(error.to_string().contains("svc-9"));
        assert!(error.is_transaction_failure());
    }

    #[test]
    fn storage_error_is_not_terminal() {
        let error = CheckoutError::Storage {
            cause: "disk full".to_string(),
        };
        assert!(!error.is_transaction_failure());
    }
}
