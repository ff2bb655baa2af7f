//! Mock booking service.

use crate::error::{CheckoutError, Result};
use crate::providers::booking::{BookingService, CreateBookingRequest, CreateBookingResponse};
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    requests: Vec<CreateBookingRequest>,
    fail_at: Option<usize>,
}

/// In-memory booking service.
///
/// Assigns sequential booking ids (`bk-0`, `bk-1`, …) and records every
/// request. `failing_at(k)` scripts the k-th call (0-based) to be
/// rejected, for partial-failure tests.
#[derive(Debug, Clone, Default)]
pub struct MockBookingService {
    inner: Arc<Mutex<Inner>>,
}

impl MockBookingService {
    /// Create a mock that accepts every booking.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the `index`-th creation call (0-based) to fail.
    #[must_use]
    pub fn failing_at(self, index: usize) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_at = Some(index);
        }
        self
    }

    /// The requests received so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<CreateBookingRequest> {
        self.inner.lock().map(|i| i.requests.clone()).unwrap_or_default()
    }

    /// Number of creation calls received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.inner.lock().map(|i| i.requests.len()).unwrap_or(0)
    }
}

impl BookingService for MockBookingService {
    fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> impl Future<Output = Result<CreateBookingResponse>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            let mut guard = inner.lock().map_err(|_| CheckoutError::BookingCreation {
                service_id: request.service_id.clone(),
                cause: "mock lock poisoned".to_string(),
            })?;

            let call_index = guard.requests.len();
            guard.requests.push(request.clone());

            if guard.fail_at == Some(call_index) {
                return Err(CheckoutError::BookingCreation {
                    service_id: request.service_id,
                    cause: "slot no longer available".to_string(),
                });
            }

            Ok(CreateBookingResponse {
                booking_id: crate::types::BookingId::new(format!("bk-{call_index}")),
                total_amount: request.total_amount,
                status: "pending".to_string(),
            })
        }
    }
}
