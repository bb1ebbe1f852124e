//! # Starchain
//!
//! A tamper-evident, append-only ledger of star registrations, where every
//! write naming an identity must first pass a signed challenge.
//!
//! ## Overview
//!
//! - **Ledger**: hash-chained blocks over a pluggable [`store::Store`]
//! - **Validation registry**: short-lived challenges and one-shot clearances
//! - **Registrar**: the write-admission layer combining both
//!
//! ## Key Concepts
//!
//! - **Block**: Immutable. Linked to its predecessor by hash.
//! - **Challenge**: `address:timestamp:starRegistry`, signed by the address owner.
//! - **Clearance**: Granted by a valid signature, spent by exactly one star.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use starchain::{Registrar, RegistrarConfig};
//! use starchain::core::{Keypair, Star};
//! use starchain::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("starchain.db").unwrap();
//!     let registrar = Registrar::open(store, RegistrarConfig::default()).await.unwrap();
//!
//!     // The address owner signs the challenge out of band
//!     let keypair = Keypair::generate();
//!     let address = keypair.address();
//!     let request = registrar.request_validation(&address).unwrap();
//!     let signature = keypair.sign_message(&request.message);
//!     registrar.validate_signature(&address, &signature).unwrap();
//!
//!     let star = Star::new("16h 29m 1.0s", "-26° 29' 24.9", "Found star").unwrap();
//!     let view = registrar.register_star(&address, star).await.unwrap();
//!     assert_eq!(view.block.height, 1);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `starchain::core` - Core primitives (Block, BlockHash, Keypair, etc.)
//! - `starchain::store` - Storage abstraction and SQLite

pub mod config;
pub mod error;
pub mod ledger;
pub mod registrar;
pub mod registry;
pub mod time;

// Re-export component crates
pub use starchain_core as core;
pub use starchain_store as store;

// Re-export main types for convenience
pub use config::{LedgerConfig, RegistrarConfig, RegistryConfig};
pub use error::{Error, LedgerError, RegistryError, Result};
pub use ledger::Ledger;
pub use registrar::Registrar;
pub use registry::{SignatureStatus, ValidatedRequest, ValidationRegistry, ValidationRequest};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};

// Re-export commonly used core types
pub use starchain_core::{
    Block, BlockBody, BlockHash, BlockView, ChainReport, Ed25519Verifier, IntegrityError,
    IntegrityErrorKind, Keypair, SignatureVerifier, Star, StarRecord,
};
