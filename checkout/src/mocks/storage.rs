//! Mock cart storage.

use crate::cart::CartSnapshot;
use crate::error::{CheckoutError, Result};
use crate::providers::storage::CartStorage;
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    stored: Option<CartSnapshot>,
    saves: usize,
    fail_saves: bool,
}

/// In-memory cart storage.
///
/// `failing_saves()` scripts every save to fail, which tests use to show
/// persistence failures are non-fatal for the in-memory cart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStorage {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryCartStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-seeded with a persisted cart.
    #[must_use]
    pub fn seeded(snapshot: CartSnapshot) -> Self {
        let storage = Self::default();
        if let Ok(mut inner) = storage.inner.lock() {
            inner.stored = Some(snapshot);
        }
        storage
    }

    /// Script every save to fail.
    #[must_use]
    pub fn failing_saves(self) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_saves = true;
        }
        self
    }

    /// The currently stored snapshot, if any.
    #[must_use]
    pub fn stored(&self) -> Option<CartSnapshot> {
        self.inner.lock().ok().and_then(|i| i.stored.clone())
    }

    /// Number of save calls received (including failed ones).
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.inner.lock().map(|i| i.saves).unwrap_or(0)
    }
}

impl CartStorage for InMemoryCartStorage {
    fn load(&self) -> impl Future<Output = Result<Option<CartSnapshot>>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            inner
                .lock()
                .map(|i| i.stored.clone())
                .map_err(|_| CheckoutError::Storage {
                    cause: "mock lock poisoned".to_string(),
                })
        }
    }

    fn save(&self, snapshot: &CartSnapshot) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        let snapshot = snapshot.clone();
        async move {
            let mut guard = inner.lock().map_err(|_| CheckoutError::Storage {
                cause: "mock lock poisoned".to_string(),
            })?;

            guard.saves += 1;
            if guard.fail_saves {
                return Err(CheckoutError::Storage {
                    cause: "simulated storage failure".to_string(),
                });
            }
            guard.stored = Some(snapshot);
            Ok(())
        }
    }
}
