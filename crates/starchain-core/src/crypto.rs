//! Cryptographic primitives for Starchain.
//!
//! Wraps SHA-256 hashing and Ed25519 signing with strong types, and defines
//! the [`SignatureVerifier`] capability the validation registry consumes.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::types::BlockHash;

/// Compute the SHA-256 digest of `data` as a [`BlockHash`].
pub fn sha256(data: &[u8]) -> BlockHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    BlockHash(hasher.finalize().into())
}

/// Compute the SHA-256 digest of `data` as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    sha256(data).to_hex()
}

/// A 32-byte Ed25519 public key. Its hex form is a wallet address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse an address (hex-encoded public key).
    pub fn from_address(address: &str) -> Result<Self> {
        let bytes =
            hex::decode(address).map_err(|e| CoreError::MalformedAddress(e.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            CoreError::MalformedAddress(format!("expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }

    /// Verify a signature over a message.
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not verify.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<bool> {
        let verifying_key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CoreError::MalformedAddress(e.to_string()))?;
        let sig = Signature::from_bytes(&signature.0);
        Ok(verifying_key.verify(message, &sig).is_ok())
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

impl From<[u8; 32]> for Ed25519PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::MalformedSignature(e.to_string()))?;
        let arr: [u8; 64] = bytes.try_into().map_err(|b: Vec<u8>| {
            CoreError::MalformedSignature(format!("expected 64 bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({}...)", &self.to_hex()[..16])
    }
}

/// A keypair controlling a wallet address.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// The wallet address controlled by this keypair.
    pub fn address(&self) -> String {
        self.public_key().to_hex()
    }

    /// Sign raw bytes.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let sig = self.signing_key.sign(message);
        Ed25519Signature(sig.to_bytes())
    }

    /// Sign a challenge message, returning the hex signature a client submits.
    pub fn sign_message(&self, message: &str) -> String {
        self.sign(message.as_bytes()).to_hex()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

/// Checks that a message was signed by the key controlling an address.
///
/// Implementations return `Ok(false)` for a signature that does not verify
/// and reserve `Err` for input that cannot be interpreted at all.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &str, address: &str, signature: &str) -> Result<bool>;
}

/// Verifies hex Ed25519 signatures against hex public-key addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &str, address: &str, signature: &str) -> Result<bool> {
        let public_key = Ed25519PublicKey::from_address(address)?;
        let signature = Ed25519Signature::from_hex(signature)?;
        public_key.verify(message.as_bytes(), &signature)
    }
}
