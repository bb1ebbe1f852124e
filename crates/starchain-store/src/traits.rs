//! Store trait: the abstract interface for block persistence.
//!
//! The ledger only needs ordered byte storage keyed by height. Encoding and
//! hashing happen above this layer.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Ordered key→value byte storage keyed by block height.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Source of truth**: the ledger rebuilds its view from [`Store::scan_all`]
///   before appending, so writers outside this process are picked up.
/// - **Overwrites**: `put` replaces an existing value. The ledger never asks
///   for that; it is how out-of-band edits reach the store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get the value stored at `height`.
    async fn get(&self, height: u64) -> Result<Option<Bytes>>;

    /// Store `value` at `height`.
    async fn put(&self, height: u64, value: Bytes) -> Result<()>;

    /// All `(height, value)` pairs, ascending by height.
    async fn scan_all(&self) -> Result<Vec<(u64, Bytes)>>;

    /// Number of stored entries.
    async fn count(&self) -> Result<u64>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn get(&self, height: u64) -> Result<Option<Bytes>> {
        (**self).get(height).await
    }

    async fn put(&self, height: u64, value: Bytes) -> Result<()> {
        (**self).put(height, value).await
    }

    async fn scan_all(&self) -> Result<Vec<(u64, Bytes)>> {
        (**self).scan_all().await
    }

    async fn count(&self) -> Result<u64> {
        (**self).count().await
    }
}
