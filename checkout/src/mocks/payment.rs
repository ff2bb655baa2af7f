//! Mock payment gateway.

use crate::error::{CheckoutError, Result};
use crate::providers::payment::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreateIntentRequest, CreateIntentResponse,
    PaymentGateway, PaymentStatus,
};
use crate::types::PaymentIntentId;
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    intent_requests: Vec<CreateIntentRequest>,
    confirmations: Vec<ConfirmPaymentRequest>,
    reject_intents: bool,
    decline_confirmations: bool,
}

/// In-memory payment gateway.
///
/// Issues sequential intent ids (`pi-0`, `pi-1`, …) and settles every
/// confirmation unless scripted otherwise.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<Inner>>,
}

impl MockPaymentGateway {
    /// Create a gateway that accepts intents and settles confirmations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script every intent request to be rejected.
    #[must_use]
    pub fn rejecting_intents(self) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.reject_intents = true;
        }
        self
    }

    /// Script every confirmation to come back declined.
    #[must_use]
    pub fn declining_confirmations(self) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.decline_confirmations = true;
        }
        self
    }

    /// Number of intent requests received.
    #[must_use]
    pub fn intent_requests(&self) -> usize {
        self.inner
            .lock()
            .map(|i| i.intent_requests.len())
            .unwrap_or(0)
    }

    /// The most recent intent request, if any.
    #[must_use]
    pub fn last_intent_request(&self) -> Option<CreateIntentRequest> {
        self.inner
            .lock()
            .ok()
            .and_then(|i| i.intent_requests.last().cloned())
    }

    /// Number of confirmation calls received.
    #[must_use]
    pub fn confirmation_count(&self) -> usize {
        self.inner
            .lock()
            .map(|i| i.confirmations.len())
            .unwrap_or(0)
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> impl Future<Output = Result<CreateIntentResponse>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            let mut guard = inner.lock().map_err(|_| CheckoutError::PaymentIntent {
                cause: "mock lock poisoned".to_string(),
            })?;

            let call_index = guard.intent_requests.len();
            guard.intent_requests.push(request.clone());

            if guard.reject_intents {
                return Err(CheckoutError::PaymentIntent {
                    cause: "amount rejected".to_string(),
                });
            }

            Ok(CreateIntentResponse {
                intent_id: PaymentIntentId::new(format!("pi-{call_index}")),
                client_amount: request.amount,
                currency: request.currency,
            })
        }
    }

    fn confirm(
        &self,
        request: ConfirmPaymentRequest,
    ) -> impl Future<Output = Result<ConfirmPaymentResponse>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            let mut guard = inner
                .lock()
                .map_err(|_| CheckoutError::PaymentConfirmation {
                    cause: "mock lock poisoned".to_string(),
                })?;

            let call_index = guard.confirmations.len();
            guard.confirmations.push(request);

            if guard.decline_confirmations {
                return Ok(ConfirmPaymentResponse {
                    status: PaymentStatus::Failed,
                    reference: None,
                });
            }

            Ok(ConfirmPaymentResponse {
                status: PaymentStatus::Settled,
                reference: Some(format!("ref-{call_index}")),
            })
        }
    }
}
