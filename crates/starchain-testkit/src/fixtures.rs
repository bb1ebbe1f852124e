//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use starchain::{
    Ledger, LedgerConfig, ManualTimeSource, Registrar, RegistrarConfig, ValidatedRequest,
};
use starchain_core::{Ed25519Verifier, Keypair, Star};
use starchain_store::MemoryStore;

/// Instant the fixture clock starts at: 2023-11-14T22:13:20Z.
pub const FIXTURE_EPOCH_MS: i64 = 1_700_000_000_000;

/// A test fixture with a keypair, a memory store and a manual clock.
///
/// The store is shared, so tests can write to it behind the ledger's back.
pub struct TestFixture {
    pub keypair: Keypair,
    pub store: Arc<MemoryStore>,
    pub clock: ManualTimeSource,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self::from_keypair(Keypair::generate())
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::from_keypair(Keypair::from_seed(&seed))
    }

    fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair,
            store: Arc::new(MemoryStore::new()),
            clock: ManualTimeSource::new(FIXTURE_EPOCH_MS),
        }
    }

    /// The keypair's address.
    pub fn address(&self) -> String {
        self.keypair.address()
    }

    /// Sign a challenge message, hex-encoded.
    pub fn sign(&self, message: &str) -> String {
        self.keypair.sign_message(message)
    }

    /// A ledger over the fixture's store and clock.
    pub async fn ledger(&self) -> Ledger<Arc<MemoryStore>> {
        Ledger::open(
            Arc::clone(&self.store),
            LedgerConfig::default(),
            Arc::new(self.clock.clone()),
        )
        .await
        .expect("open ledger over memory store")
    }

    /// A registrar over the fixture's store and clock.
    pub async fn registrar(&self) -> Registrar<Arc<MemoryStore>> {
        Registrar::with_parts(
            Arc::clone(&self.store),
            RegistrarConfig::default(),
            Arc::new(Ed25519Verifier),
            Arc::new(self.clock.clone()),
        )
        .await
        .expect("open registrar over memory store")
    }

    /// Run the full challenge for this fixture's address.
    pub fn validate<S: starchain_store::Store>(&self, registrar: &Registrar<S>) -> ValidatedRequest {
        let address = self.address();
        let request = registrar
            .request_validation(&address)
            .expect("issue challenge");
        registrar
            .validate_signature(&address, &self.sign(&request.message))
            .expect("fixture signature verifies")
    }

    /// A well-formed star with the given story.
    pub fn star(&self, story: &str) -> Star {
        Star::new("16h 29m 1.0s", "-26° 29' 24.9", story).expect("fixture star is valid")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-party tests.
///
/// Parties share nothing; each has its own store and clock.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}
