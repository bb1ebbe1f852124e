//! # Starchain Core
//!
//! Pure primitives for Starchain: blocks, canonical encoding, hashing and
//! signature checks.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over the ledger's data structures.
//!
//! ## Key Types
//!
//! - [`Block`] - One immutable, hash-linked ledger entry
//! - [`BlockBody`] - Tagged payload: free-form note or identity-gated star
//! - [`BlockHash`] - SHA-256 digest of a block's canonical bytes
//! - [`SignatureVerifier`] - Capability that checks challenge signatures
//!
//! ## Canonicalization
//!
//! Blocks are encoded using deterministic CBOR. See [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod story;
pub mod types;
pub mod validation;

pub use block::{Block, BlockBody, BlockView, Star, StarRecord};
pub use canonical::{canonical_bytes, decode_block, digest_bytes};
pub use crypto::{
    sha256, sha256_hex, Ed25519PublicKey, Ed25519Signature, Ed25519Verifier, Keypair,
    SignatureVerifier,
};
pub use error::{CoreError, Result};
pub use types::BlockHash;
pub use validation::{ChainReport, IntegrityError, IntegrityErrorKind};
