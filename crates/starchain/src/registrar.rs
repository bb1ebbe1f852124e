//! The Registrar: write admission over the ledger.
//!
//! A star body names an address, and is only appended after that address
//! answered a signature challenge. Each clearance admits exactly one write.

use std::sync::Arc;

use starchain_core::{BlockBody, BlockHash, BlockView, Ed25519Verifier, SignatureVerifier, Star};
use starchain_store::Store;

use crate::config::RegistrarConfig;
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::registry::{ValidatedRequest, ValidationRegistry, ValidationRequest};
use crate::time::{SystemTimeSource, TimeSource};

/// Caller-facing API combining the [`Ledger`] and the [`ValidationRegistry`].
pub struct Registrar<S: Store> {
    ledger: Ledger<S>,
    registry: Arc<ValidationRegistry>,
}

impl<S: Store> Registrar<S> {
    /// Open a registrar using Ed25519 addresses and the system clock.
    pub async fn open(store: S, config: RegistrarConfig) -> Result<Self> {
        Self::with_parts(
            store,
            config,
            Arc::new(Ed25519Verifier),
            Arc::new(SystemTimeSource),
        )
        .await
    }

    /// Open a registrar with an explicit verifier and clock.
    pub async fn with_parts(
        store: S,
        config: RegistrarConfig,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        let ledger = Ledger::open(store, config.ledger, Arc::clone(&clock)).await?;
        let registry = Arc::new(ValidationRegistry::new(config.registry, verifier, clock));
        Ok(Self { ledger, registry })
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    /// The validation registry, shared with anything else that issues challenges.
    pub fn registry(&self) -> &Arc<ValidationRegistry> {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admission
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue (or re-issue) a signature challenge for `address`.
    pub fn request_validation(&self, address: &str) -> Result<ValidationRequest> {
        Ok(self.registry.request_challenge(address)?)
    }

    /// Answer the pending challenge for `address`.
    pub fn validate_signature(&self, address: &str, signature: &str) -> Result<ValidatedRequest> {
        Ok(self.registry.verify_signature(address, signature)?)
    }

    /// Append a star under `address`, spending its clearance.
    ///
    /// The clearance is returned to the registry if the write fails.
    pub async fn register_star(&self, address: &str, star: Star) -> Result<BlockView> {
        let body = BlockBody::star(address, star);
        body.validate().map_err(Error::InvalidBody)?;

        if !self.registry.is_validated(address) {
            return Err(Error::NotValidated(address.to_string()));
        }
        let clearance = self
            .registry
            .take(address)
            .ok_or_else(|| Error::NotValidated(address.to_string()))?;

        match self.ledger.append(body).await {
            Ok(block) => {
                tracing::debug!(address, height = block.height, "registered star");
                Ok(block.view())
            }
            Err(e) => {
                tracing::warn!(address, error = %e, "star append failed, clearance reinstated");
                self.registry.reinstate(clearance);
                Err(e.into())
            }
        }
    }

    /// Append a free-form note. Notes are not identity-gated.
    pub async fn submit_note(&self, text: &str) -> Result<BlockView> {
        let body = BlockBody::Note(text.to_string());
        body.validate().map_err(Error::InvalidBody)?;
        Ok(self.ledger.append(body).await?.view())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The block at `height`.
    pub async fn block(&self, height: u64) -> Result<BlockView> {
        Ok(self.ledger.get(height).await?)
    }

    /// Stars registered by `address`.
    pub async fn stars_by_address(&self, address: &str) -> Result<Vec<BlockView>> {
        Ok(self.ledger.find_by_address(address).await?)
    }

    /// The block with this hash, if any.
    pub async fn star_by_hash(&self, hash: &BlockHash) -> Result<Option<BlockView>> {
        Ok(self.ledger.find_by_hash(hash).await?.into_iter().next())
    }
}
