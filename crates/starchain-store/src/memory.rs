//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    blocks: RwLock<BTreeMap<u64, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<u64, Bytes>>> {
        self.blocks
            .read()
            .map_err(|e| StoreError::Background(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<u64, Bytes>>> {
        self.blocks
            .write()
            .map_err(|e| StoreError::Background(format!("lock poisoned: {}", e)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, height: u64) -> Result<Option<Bytes>> {
        Ok(self.read()?.get(&height).cloned())
    }

    async fn put(&self, height: u64, value: Bytes) -> Result<()> {
        self.write()?.insert(height, value);
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<(u64, Bytes)>> {
        Ok(self
            .read()?
            .iter()
            .map(|(height, value)| (*height, value.clone()))
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();

        store.put(0, Bytes::from_static(b"genesis")).await.unwrap();

        let value = store.get(0).await.unwrap().unwrap();
        assert_eq!(value.as_ref(), b"genesis");
        assert!(store.get(1).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_scan_is_ordered() {
        let store = MemoryStore::new();
        for height in [2u64, 0, 10, 1] {
            store
                .put(height, Bytes::from(format!("block {}", height)))
                .await
                .unwrap();
        }

        let heights: Vec<u64> = store
            .scan_all()
            .await
            .unwrap()
            .into_iter()
            .map(|(h, _)| h)
            .collect();
        assert_eq!(heights, vec![0, 1, 2, 10]);
    }

    #[tokio::test]
    async fn test_memory_store_put_overwrites() {
        let store = MemoryStore::new();
        store.put(0, Bytes::from_static(b"one")).await.unwrap();
        store.put(0, Bytes::from_static(b"two")).await.unwrap();

        assert_eq!(store.get(0).await.unwrap().unwrap().as_ref(), b"two");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    proptest::proptest! {
        #[test]
        fn prop_scan_matches_puts(heights in proptest::collection::btree_set(0u64..1_000, 0..32)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = MemoryStore::new();
                for h in heights.iter().rev() {
                    store.put(*h, Bytes::from(h.to_be_bytes().to_vec())).await.unwrap();
                }
                let scanned: Vec<u64> = store.scan_all().await.unwrap().into_iter().map(|(h, _)| h).collect();
                let expected: Vec<u64> = heights.iter().copied().collect();
                assert_eq!(scanned, expected);
                assert_eq!(store.count().await.unwrap(), heights.len() as u64);
            });
        }
    }
}
