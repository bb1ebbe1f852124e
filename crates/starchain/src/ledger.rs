//! The Ledger: the hash-chained block log.
//!
//! The store is the source of truth. The in-memory chain is rebuilt from it
//! before every append, so blocks written by another process sharing the same
//! database are linked to rather than overwritten. Placement follows store
//! keys only; the `height` field inside stored bytes is never trusted.

use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use starchain_core::validation;
use starchain_core::{
    canonical_bytes, decode_block, Block, BlockBody, BlockHash, BlockView, ChainReport,
};
use starchain_store::Store;
use tokio::sync::Mutex;

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::time::TimeSource;

type Result<T> = std::result::Result<T, LedgerError>;

/// An append-only chain of blocks over a [`Store`].
///
/// Appends are serialized by an async mutex held across the re-sync, the hash
/// computation and the store write. Reads never take it and never touch the
/// cached chain.
pub struct Ledger<S: Store> {
    store: Arc<S>,
    config: LedgerConfig,
    clock: Arc<dyn TimeSource>,
    /// Decoded blocks keyed by store height, as of the last re-sync.
    /// Only written while `append_lock` is held.
    chain: RwLock<Vec<(u64, Block)>>,
    append_lock: Mutex<()>,
}

impl<S: Store> Ledger<S> {
    /// Open a ledger over `store`, writing the genesis block if it is empty.
    pub async fn open(
        store: S,
        config: LedgerConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        let ledger = Self {
            store: Arc::new(store),
            config,
            clock,
            chain: RwLock::new(Vec::new()),
            append_lock: Mutex::new(()),
        };

        {
            let _guard = ledger.append_lock.lock().await;
            if ledger.resync().await?.is_none() {
                let genesis = BlockBody::Note(ledger.config.genesis_note.clone());
                let block = ledger.write_next(None, genesis).await?;
                tracing::info!(hash = %block.hash, "created genesis block");
            }
        }

        tracing::info!(height = ledger.cached_tip_height(), "ledger opened");
        Ok(ledger)
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Height of the newest block: the number of stored blocks minus one.
    pub async fn height(&self) -> Result<u64> {
        let count = self.store.count().await.map_err(LedgerError::StoreRead)?;
        Ok(count.saturating_sub(1))
    }

    /// Append a block carrying `body` and return it as stored.
    pub async fn append(&self, body: BlockBody) -> Result<Block> {
        let _guard = self.append_lock.lock().await;
        let tip = self.resync().await?;
        let block = self.write_next(tip, body).await?;
        tracing::debug!(height = block.height, hash = %block.hash, "appended block");
        Ok(block)
    }

    /// The block at `height`, read straight from the store.
    pub async fn get(&self, height: u64) -> Result<BlockView> {
        let bytes = self
            .store
            .get(height)
            .await
            .map_err(LedgerError::StoreRead)?
            .ok_or(LedgerError::NotFound(height))?;
        Ok(decode_block(&bytes)?.view())
    }

    /// Every block written under `address`, in height order.
    pub async fn find_by_address(&self, address: &str) -> Result<Vec<BlockView>> {
        self.find(|block| block.address() == Some(address)).await
    }

    /// Every block whose stored hash equals `hash`, in height order.
    pub async fn find_by_hash(&self, hash: &BlockHash) -> Result<Vec<BlockView>> {
        self.find(|block| block.hash == *hash).await
    }

    /// Whether the block at `height` still matches its stored hash.
    ///
    /// Bytes that no longer decode count as invalid.
    pub async fn validate_block(&self, height: u64) -> Result<bool> {
        let bytes = self
            .store
            .get(height)
            .await
            .map_err(LedgerError::StoreRead)?
            .ok_or(LedgerError::NotFound(height))?;

        match decode_block(&bytes) {
            Ok(block) => {
                let valid = validation::validate_block(&block);
                if !valid {
                    tracing::warn!(height, "block hash mismatch");
                }
                Ok(valid)
            }
            Err(e) => {
                tracing::warn!(height, error = %e, "block bytes undecodable");
                Ok(false)
            }
        }
    }

    /// Scan the whole chain for hash and link failures.
    ///
    /// Reports problems without repairing them or blocking further appends.
    pub async fn validate_chain(&self) -> Result<ChainReport> {
        let rows = self.store.scan_all().await.map_err(LedgerError::StoreRead)?;
        let blocks: Vec<(u64, Option<Block>)> = rows
            .iter()
            .map(|(height, bytes)| (*height, decode_block(bytes).ok()))
            .collect();

        let report = validation::validate_chain(&blocks);
        for error in &report.errors {
            tracing::warn!(height = error.height, kind = ?error.kind, "chain integrity error");
        }
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    fn cached_tip_height(&self) -> u64 {
        self.chain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map_or(0, |(height, _)| *height)
    }

    /// Replace the cached chain with what the store holds now and return the
    /// store key and hash of the tip.
    ///
    /// Caller must hold `append_lock`.
    async fn resync(&self) -> Result<Option<(u64, BlockHash)>> {
        let rows = self.store.scan_all().await.map_err(LedgerError::StoreRead)?;
        let mut blocks = Vec::with_capacity(rows.len());
        for (height, bytes) in rows {
            let block = decode_block(&bytes).map_err(|e| {
                tracing::warn!(height, error = %e, "cannot decode stored block");
                LedgerError::Codec(e)
            })?;
            if block.height != height {
                tracing::warn!(
                    height,
                    claimed = block.height,
                    "stored block claims another height"
                );
            }
            blocks.push((height, block));
        }

        let tip = blocks.last().map(|(height, block)| (*height, block.hash));
        *self.chain.write().unwrap_or_else(PoisonError::into_inner) = blocks;
        Ok(tip)
    }

    /// Seal `body` one key past `tip` and persist it.
    ///
    /// Caller must hold `append_lock` and pass the tip from its own re-sync.
    async fn write_next(
        &self,
        tip: Option<(u64, BlockHash)>,
        body: BlockBody,
    ) -> Result<Block> {
        let (height, previous_hash) = match tip {
            Some((key, hash)) => (
                key.checked_add(1).ok_or(LedgerError::HeightExhausted)?,
                Some(hash),
            ),
            None => (0, None),
        };

        let block = Block::seal(height, self.clock.now_secs(), previous_hash, body);
        let bytes = Bytes::from(canonical_bytes(&block));
        self.store
            .put(height, bytes)
            .await
            .map_err(LedgerError::StoreWrite)?;

        self.chain
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((height, block.clone()));
        Ok(block)
    }

    async fn find<F>(&self, matches: F) -> Result<Vec<BlockView>>
    where
        F: Fn(&Block) -> bool,
    {
        let rows = self.store.scan_all().await.map_err(LedgerError::StoreRead)?;
        let mut found = Vec::new();
        for (height, bytes) in rows {
            match decode_block(&bytes) {
                Ok(block) if matches(&block) => found.push(block.view()),
                Ok(_) => {}
                Err(e) => tracing::warn!(height, error = %e, "skipping undecodable block"),
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_GENESIS_NOTE;
    use crate::time::ManualTimeSource;
    use starchain_core::Star;
    use starchain_store::MemoryStore;

    async fn open_memory() -> Ledger<MemoryStore> {
        let clock = Arc::new(ManualTimeSource::new(1_700_000_000_000));
        Ledger::open(MemoryStore::new(), LedgerConfig::default(), clock)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_writes_genesis() {
        let ledger = open_memory().await;

        assert_eq!(ledger.height().await.unwrap(), 0);
        let genesis = ledger.get(0).await.unwrap().block;
        assert!(genesis.is_genesis());
        assert_eq!(genesis.timestamp, 1_700_000_000);
        assert_eq!(genesis.body, BlockBody::Note(DEFAULT_GENESIS_NOTE.into()));
    }

    #[tokio::test]
    async fn test_append_links_to_tip() {
        let ledger = open_memory().await;
        let first = ledger.append(BlockBody::Note("one".into())).await.unwrap();
        let second = ledger.append(BlockBody::Note("two".into())).await.unwrap();

        assert_eq!(first.height, 1);
        assert_eq!(second.height, 2);
        assert_eq!(second.previous_hash, Some(first.hash));
        assert_eq!(ledger.height().await.unwrap(), 2);
        assert!(ledger.validate_chain().await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_get_missing_height() {
        let ledger = open_memory().await;
        assert!(matches!(
            ledger.get(7).await,
            Err(LedgerError::NotFound(7))
        ));
        assert!(matches!(
            ledger.validate_block(7).await,
            Err(LedgerError::NotFound(7))
        ));
    }

    #[tokio::test]
    async fn test_find_by_address_and_hash() {
        let ledger = open_memory().await;
        let star = Star::new("16h 29m 1.0s", "-26° 29' 24.9", "bright").unwrap();
        let a1 = ledger.append(BlockBody::star("alice", star.clone())).await.unwrap();
        ledger.append(BlockBody::star("bob", star.clone())).await.unwrap();
        let a2 = ledger.append(BlockBody::star("alice", star)).await.unwrap();

        let found = ledger.find_by_address("alice").await.unwrap();
        let heights: Vec<u64> = found.iter().map(|v| v.block.height).collect();
        assert_eq!(heights, vec![a1.height, a2.height]);
        assert_eq!(found[0].story_decoded.as_deref(), Some("bright"));

        assert!(ledger.find_by_address("carol").await.unwrap().is_empty());

        let by_hash = ledger.find_by_hash(&a2.hash).await.unwrap();
        assert_eq!(by_hash.len(), 1);
        assert_eq!(by_hash[0].block, a2);
    }

    #[tokio::test]
    async fn test_validate_block_detects_rewrite() {
        let ledger = open_memory().await;
        let mut block = ledger.append(BlockBody::Note("original".into())).await.unwrap();
        assert!(ledger.validate_block(block.height).await.unwrap());

        block.body = BlockBody::Note("forged".into());
        ledger
            .store()
            .put(block.height, Bytes::from(canonical_bytes(&block)))
            .await
            .unwrap();
        assert!(!ledger.validate_block(block.height).await.unwrap());
    }

    #[tokio::test]
    async fn test_undecodable_bytes() {
        let ledger = open_memory().await;
        ledger.append(BlockBody::Note("one".into())).await.unwrap();
        ledger.append(BlockBody::Note("two".into())).await.unwrap();
        ledger
            .store()
            .put(1, Bytes::from_static(b"not cbor"))
            .await
            .unwrap();

        assert!(!ledger.validate_block(1).await.unwrap());
        assert!(matches!(ledger.get(1).await, Err(LedgerError::Codec(_))));

        let report = ledger.validate_chain().await.unwrap();
        assert!(report.offending_heights().contains(&1));

        // the tip cannot be derived past a corrupt block
        assert!(matches!(
            ledger.append(BlockBody::Note("three".into())).await,
            Err(LedgerError::Codec(_))
        ));
    }

    async fn rewrite<F>(ledger: &Ledger<MemoryStore>, height: u64, edit: F)
    where
        F: FnOnce(&mut Block),
    {
        let bytes = ledger.store().get(height).await.unwrap().unwrap();
        let mut block = decode_block(&bytes).unwrap();
        edit(&mut block);
        ledger
            .store()
            .put(height, Bytes::from(canonical_bytes(&block)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_placement_ignores_stored_height_field() {
        let ledger = open_memory().await;
        ledger.append(BlockBody::Note("one".into())).await.unwrap();
        ledger.append(BlockBody::Note("two".into())).await.unwrap();
        rewrite(&ledger, 2, |block| block.height = 0).await;

        let three = ledger.append(BlockBody::Note("three".into())).await.unwrap();
        assert_eq!(three.height, 3);
        assert_eq!(ledger.height().await.unwrap(), 3);
        assert_eq!(
            ledger.get(1).await.unwrap().block.body,
            BlockBody::Note("one".into())
        );
        assert_eq!(ledger.store().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_max_height_field_does_not_overflow() {
        let ledger = open_memory().await;
        ledger.append(BlockBody::Note("one".into())).await.unwrap();
        rewrite(&ledger, 1, |block| block.height = u64::MAX).await;

        let next = ledger.append(BlockBody::Note("two".into())).await.unwrap();
        assert_eq!(next.height, 2);
        assert_eq!(ledger.height().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_last_store_key_exhausts_heights() {
        let ledger = open_memory().await;
        let genesis = ledger.store().get(0).await.unwrap().unwrap();
        ledger.store().put(u64::MAX, genesis).await.unwrap();

        assert!(matches!(
            ledger.append(BlockBody::Note("past the end".into())).await,
            Err(LedgerError::HeightExhausted)
        ));
        assert_eq!(ledger.store().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_gap_in_store_is_never_overwritten() {
        let ledger = open_memory().await;
        ledger.append(BlockBody::Note("one".into())).await.unwrap();
        let two = ledger.append(BlockBody::Note("two".into())).await.unwrap();
        let moved = ledger.store().get(2).await.unwrap().unwrap();
        ledger.store().put(5, moved).await.unwrap();

        let next = ledger.append(BlockBody::Note("after gap".into())).await.unwrap();
        assert_eq!(next.height, 6);
        assert_eq!(next.previous_hash, Some(two.hash));
        assert_eq!(ledger.get(5).await.unwrap().block, two);
    }

    #[tokio::test]
    async fn test_height_reads_do_not_disturb_appends() {
        let ledger = Arc::new(open_memory().await);

        let reader = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                for _ in 0..50 {
                    ledger.height().await.unwrap();
                }
            })
        };
        let mut previous = ledger.get(0).await.unwrap().block;
        for i in 0..50 {
            let block = ledger.append(BlockBody::Note(format!("note {}", i))).await.unwrap();
            assert_eq!(block.previous_hash, Some(previous.hash));
            previous = block;
        }
        reader.await.unwrap();

        assert_eq!(ledger.height().await.unwrap(), 50);
        assert!(ledger.validate_chain().await.unwrap().is_valid());
    }
}
