//! REST implementations of the collaborator traits.
//!
//! Thin reqwest clients over the wire contracts. Timeouts are applied
//! per request and surface as the failing step's error — a timed-out
//! booking call reads exactly like a rejected one, and neither is
//! retried.

use crate::error::{CheckoutError, Result};
use crate::providers::booking::{BookingService, CreateBookingRequest, CreateBookingResponse};
use crate::providers::payment::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreateIntentRequest, CreateIntentResponse,
    PaymentGateway,
};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Error body the services return with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Read the failure cause out of a non-success response.
async fn failure_cause(response: reqwest::Response) -> String {
    let status = response.status();
    let message = match response.json::<ApiErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => None,
    };
    match message {
        Some(message) => format!("{status}: {message}"),
        None => status.to_string(),
    }
}

/// Booking service client.
#[derive(Debug, Clone)]
pub struct RestBookingService {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl RestBookingService {
    /// Create a client against `base_url` (no trailing slash).
    #[must_use]
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            base_url,
            timeout,
        }
    }
}

impl BookingService for RestBookingService {
    fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> impl Future<Output = Result<CreateBookingResponse>> + Send {
        let http = self.http.clone();
        let url = format!("{}/bookings", self.base_url);
        let timeout = self.timeout;

        async move {
            let service_id = request.service_id.clone();
            let to_error = |cause: String| CheckoutError::BookingCreation {
                service_id: service_id.clone(),
                cause,
            };

            let response = http
                .post(&url)
                .timeout(timeout)
                .json(&request)
                .send()
                .await
                .map_err(|e| to_error(e.to_string()))?;

            if !response.status().is_success() {
                let cause = failure_cause(response).await;
                tracing::warn!(%service_id, %cause, "booking service rejected creation");
                return Err(to_error(cause));
            }

            response
                .json::<CreateBookingResponse>()
                .await
                .map_err(|e| to_error(format!("malformed response: {e}")))
        }
    }
}

/// Payment service client.
#[derive(Debug, Clone)]
pub struct RestPaymentGateway {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl RestPaymentGateway {
    /// Create a client against `base_url` (no trailing slash).
    #[must_use]
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            base_url,
            timeout,
        }
    }
}

impl PaymentGateway for RestPaymentGateway {
    fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> impl Future<Output = Result<CreateIntentResponse>> + Send {
        let http = self.http.clone();
        let url = format!("{}/payment-intents", self.base_url);
        let timeout = self.timeout;

        async move {
            let response = http
                .post(&url)
                .timeout(timeout)
                .json(&request)
                .send()
                .await
                .map_err(|e| CheckoutError::PaymentIntent {
                    cause: e.to_string(),
                })?;

            if !response.status().is_success() {
                let cause = failure_cause(response).await;
                tracing::warn!(%cause, "payment service rejected intent");
                return Err(CheckoutError::PaymentIntent { cause });
            }

            response
                .json::<CreateIntentResponse>()
                .await
                .map_err(|e| CheckoutError::PaymentIntent {
                    cause: format!("malformed response: {e}"),
                })
        }
    }

    fn confirm(
        &self,
        request: ConfirmPaymentRequest,
    ) -> impl Future<Output = Result<ConfirmPaymentResponse>> + Send {
        let http = self.http.clone();
        let url = format!("{}/payment-confirmations", self.base_url);
        let timeout = self.timeout;

        async move {
            let response = http
                .post(&url)
                .timeout(timeout)
                .json(&request)
                .send()
                .await
                .map_err(|e| CheckoutError::PaymentConfirmation {
                    cause: e.to_string(),
                })?;

            if !response.status().is_success() {
                let cause = failure_cause(response).await;
                tracing::warn!(%cause, "payment confirmation rejected");
                return Err(CheckoutError::PaymentConfirmation { cause });
            }

            response
                .json::<ConfirmPaymentResponse>()
                .await
                .map_err(|e| CheckoutError::PaymentConfirmation {
                    cause: format!("malformed response: {e}"),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clients_build_expected_endpoints() {
        let bookings =
            RestBookingService::new("http://svc/api".to_string(), Duration::from_secs(5));
        assert_eq!(bookings.base_url, "http://svc/api");

        let payments =
            RestPaymentGateway::new("http://pay/api".to_string(), Duration::from_secs(5));
        assert_eq!(payments.base_url, "http://pay/api");
    }
}
