//! JSON payloads on top of a byte store.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::store::CacheStore;

/// Typed access to any [`CacheStore`].
///
/// A payload that no longer decodes (for instance after a schema change) is
/// reported as a miss so the caller recomputes and overwrites it.
pub trait CacheStoreExt: CacheStore {
    /// Fetch and decode a JSON payload.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "undecodable cache payload, treating as miss");
                None
            }
        }
    }

    /// Encode `value` as JSON and store it.
    ///
    /// # Errors
    /// `StoreError::Serialization` when `value` cannot be encoded.
    fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes, ttl);
        Ok(())
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}
