//! Durable cart storage.
//!
//! The cart is re-persisted after every mutation and read back on
//! startup, so a restart does not lose cart contents. Persistence is
//! best-effort: a failed write is logged by the caller and never fails
//! the in-memory operation.

use crate::cart::CartSnapshot;
use crate::error::{CheckoutError, Result};
use std::future::Future;
use std::path::PathBuf;

/// Key-value storage for the serialized cart under a fixed key.
///
/// An absent stored value is not an error — it reads as an empty cart.
pub trait CartStorage: Send + Sync {
    /// Read the persisted cart, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Storage`] when the underlying read or
    /// deserialization fails. Callers treat this as an empty cart.
    fn load(&self) -> impl Future<Output = Result<Option<CartSnapshot>>> + Send;

    /// Persist the current cart, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Storage`] when the underlying write
    /// fails. Callers log and ignore this.
    fn save(&self, snapshot: &CartSnapshot) -> impl Future<Output = Result<()>> + Send;
}

/// Cart storage backed by a JSON file.
///
/// The fixed storage key is the file path. Writes go through a sibling
/// temp file and a rename so a crash mid-write cannot leave a truncated
/// cart behind.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    /// Create storage rooted at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.path.clone();
        path.set_extension("json.tmp");
        path
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> impl Future<Output = Result<Option<CartSnapshot>>> + Send {
        let path = self.path.clone();
        async move {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => {
                    return Err(CheckoutError::Storage {
                        cause: format!("read {}: {e}", path.display()),
                    });
                },
            };

            let snapshot =
                serde_json::from_slice(&bytes).map_err(|e| CheckoutError::Storage {
                    cause: format!("parse {}: {e}", path.display()),
                })?;
            Ok(Some(snapshot))
        }
    }

    fn save(&self, snapshot: &CartSnapshot) -> impl Future<Output = Result<()>> + Send {
        let path = self.path.clone();
        let temp = self.temp_path();
        let payload = serde_json::to_vec_pretty(snapshot);

        async move {
            let bytes = payload.map_err(|e| CheckoutError::Storage {
                cause: format!("serialize cart: {e}"),
            })?;

            tokio::fs::write(&temp, &bytes)
                .await
                .map_err(|e| CheckoutError::Storage {
                    cause: format!("write {}: {e}", temp.display()),
                })?;
            tokio::fs::rename(&temp, &path)
                .await
                .map_err(|e| CheckoutError::Storage {
                    cause: format!("rename {}: {e}", path.display()),
                })?;
            Ok(())
        }
    }
}
