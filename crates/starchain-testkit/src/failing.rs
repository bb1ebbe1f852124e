//! A store whose reads or writes can be made to fail on demand.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use starchain_store::{MemoryStore, Result, Store, StoreError};

/// A [`MemoryStore`] with switchable failure injection.
///
/// Both switches start off, so a ledger can be opened normally first.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingStore {
    /// Create a new store with failures disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `get`, `scan_all` and `count` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `put` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Io(io::Error::other(format!(
                "injected {} failure",
                op
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn get(&self, height: u64) -> Result<Option<Bytes>> {
        self.check(&self.fail_reads, "read")?;
        self.inner.get(height).await
    }

    async fn put(&self, height: u64, value: Bytes) -> Result<()> {
        self.check(&self.fail_writes, "write")?;
        self.inner.put(height, value).await
    }

    async fn scan_all(&self) -> Result<Vec<(u64, Bytes)>> {
        self.check(&self.fail_reads, "read")?;
        self.inner.scan_all().await
    }

    async fn count(&self) -> Result<u64> {
        self.check(&self.fail_reads, "read")?;
        self.inner.count().await
    }
}
