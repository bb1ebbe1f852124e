//! The validation registry: identity challenges and their clearances.
//!
//! An address moves through three states:
//!
//! ```text
//!   absent ──request_challenge──▶ pending ──verify_signature──▶ validated
//!      ▲                            │                              │
//!      └────────── expired ─────────┘                              │
//!      └──────────────────────── take / consume ───────────────────┘
//! ```
//!
//! A pending challenge expires a fixed window after it was issued; asking
//! again does not extend it. A clearance is spent by exactly one gated write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use starchain_core::{CoreError, SignatureVerifier};

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::time::TimeSource;

type Result<T> = std::result::Result<T, RegistryError>;

/// A challenge issued to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub address: String,
    /// Unix milliseconds at issuance.
    pub request_timestamp: i64,
    /// `address:request_timestamp:suffix`, the text the address must sign.
    pub message: String,
    /// Seconds left to answer, rounded up, as of when this value was produced.
    pub validation_window: u64,
}

/// Outcome of a signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    Valid,
}

/// A clearance: the address proved ownership and may write one star.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedRequest {
    pub register_star: bool,
    /// The answered challenge, with its window as of verification.
    #[serde(rename = "status")]
    pub request: ValidationRequest,
    pub message_signature: SignatureStatus,
}

impl ValidatedRequest {
    /// The address this clearance belongs to.
    pub fn address(&self) -> &str {
        &self.request.address
    }
}

#[derive(Default)]
struct RegistryState {
    pending: HashMap<String, ValidationRequest>,
    validated: HashMap<String, ValidatedRequest>,
}

/// Tracks pending challenges and unspent clearances.
///
/// Every check-then-act runs under one lock, so concurrent callers cannot
/// both answer the same challenge or both spend the same clearance.
pub struct ValidationRegistry {
    config: RegistryConfig,
    verifier: Arc<dyn SignatureVerifier>,
    clock: Arc<dyn TimeSource>,
    state: Mutex<RegistryState>,
}

impl ValidationRegistry {
    /// Create an empty registry.
    pub fn new(
        config: RegistryConfig,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            verifier,
            clock,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Issue a challenge for `address`, or return the live one.
    ///
    /// A live challenge comes back with the same message and a smaller
    /// window. An expired one is replaced.
    pub fn request_challenge(&self, address: &str) -> Result<ValidationRequest> {
        if address.trim().is_empty() {
            return Err(CoreError::MalformedAddress("address is empty".into()).into());
        }

        let now = self.clock.now_millis();
        let mut state = self.lock();

        if let Some(existing) = state.pending.get(address) {
            let remaining = self.remaining_millis(existing.request_timestamp, now);
            if remaining > 0 {
                let mut request = existing.clone();
                request.validation_window = window_secs(remaining);
                return Ok(request);
            }
            tracing::debug!(address, "replacing expired challenge");
        }

        let request = ValidationRequest {
            address: address.to_string(),
            request_timestamp: now,
            message: format!("{}:{}:{}", address, now, self.config.message_suffix),
            validation_window: window_secs(self.remaining_millis(now, now)),
        };
        state.pending.insert(address.to_string(), request.clone());
        tracing::debug!(address, request_timestamp = now, "issued challenge");
        Ok(request)
    }

    /// Check `signature` over the pending challenge for `address`.
    ///
    /// On success the challenge becomes a clearance. A bad signature leaves
    /// the challenge pending; an expired one is dropped.
    pub fn verify_signature(&self, address: &str, signature: &str) -> Result<ValidatedRequest> {
        let now = self.clock.now_millis();
        let mut state = self.lock();

        let pending = state
            .pending
            .get(address)
            .ok_or_else(|| RegistryError::NotFound(address.to_string()))?;

        let remaining = self.remaining_millis(pending.request_timestamp, now);
        if remaining <= 0 {
            state.pending.remove(address);
            tracing::warn!(address, "challenge expired before verification");
            return Err(RegistryError::Expired(address.to_string()));
        }

        match self.verifier.verify(&pending.message, address, signature) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(address, "signature did not verify");
                return Err(RegistryError::InvalidSignature(address.to_string()));
            }
            Err(e) => {
                tracing::warn!(address, error = %e, "malformed signature input");
                return Err(RegistryError::Malformed(e));
            }
        }

        let Some(mut request) = state.pending.remove(address) else {
            return Err(RegistryError::NotFound(address.to_string()));
        };
        request.validation_window = window_secs(remaining);
        let validated = ValidatedRequest {
            register_star: true,
            request,
            message_signature: SignatureStatus::Valid,
        };
        state
            .validated
            .insert(address.to_string(), validated.clone());
        tracing::debug!(address, "address validated");
        Ok(validated)
    }

    /// Whether `address` holds an unspent clearance.
    pub fn is_validated(&self, address: &str) -> bool {
        self.lock().validated.contains_key(address)
    }

    /// Spend the clearance for `address`. True iff one existed.
    pub fn consume(&self, address: &str) -> bool {
        self.take(address).is_some()
    }

    /// Remove and return the clearance for `address`.
    pub fn take(&self, address: &str) -> Option<ValidatedRequest> {
        self.lock().validated.remove(address)
    }

    /// Put back a clearance taken for a write that did not persist.
    pub fn reinstate(&self, validated: ValidatedRequest) {
        let address = validated.address().to_string();
        self.lock().validated.insert(address, validated);
    }

    /// The configured challenge lifetime.
    pub fn validation_window(&self) -> Duration {
        self.config.validation_window
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Milliseconds left on a challenge issued at `issued`.
    ///
    /// A clock that steps backwards never lengthens the window.
    fn remaining_millis(&self, issued: i64, now: i64) -> i64 {
        let elapsed = now.saturating_sub(issued).max(0);
        let window = i64::try_from(self.validation_window().as_millis()).unwrap_or(i64::MAX);
        window.saturating_sub(elapsed)
    }
}

fn window_secs(remaining_millis: i64) -> u64 {
    (remaining_millis.max(0) as u64).div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualTimeSource;
    use starchain_core::{Ed25519Verifier, Keypair};

    const START: i64 = 1_700_000_000_000;

    fn registry() -> (ValidationRegistry, ManualTimeSource) {
        let clock = ManualTimeSource::new(START);
        let registry = ValidationRegistry::new(
            RegistryConfig::default(),
            Arc::new(Ed25519Verifier),
            Arc::new(clock.clone()),
        );
        (registry, clock)
    }

    #[test]
    fn test_challenge_message_format() {
        let (registry, _) = registry();
        let request = registry.request_challenge("abc").unwrap();

        assert_eq!(request.message, format!("abc:{}:starRegistry", START));
        assert_eq!(request.request_timestamp, START);
        assert_eq!(request.validation_window, 300);
    }

    #[test]
    fn test_fresh_challenge_reports_configured_window() {
        let clock = ManualTimeSource::new(START);
        let config = RegistryConfig {
            validation_window: Duration::from_millis(1500),
            ..RegistryConfig::default()
        };
        let registry = ValidationRegistry::new(config, Arc::new(Ed25519Verifier), Arc::new(clock));

        assert_eq!(registry.validation_window(), Duration::from_millis(1500));
        let request = registry.request_challenge("abc").unwrap();
        assert_eq!(request.validation_window, 2);
    }

    #[test]
    fn test_reissue_keeps_message_and_counts_down() {
        let (registry, clock) = registry();
        let first = registry.request_challenge("abc").unwrap();

        clock.advance(Duration::from_millis(10_500));
        let second = registry.request_challenge("abc").unwrap();
        assert_eq!(second.message, first.message);
        assert_eq!(second.validation_window, 290);

        clock.advance(Duration::from_secs(100));
        let third = registry.request_challenge("abc").unwrap();
        assert_eq!(third.message, first.message);
        assert!(third.validation_window < second.validation_window);
    }

    #[test]
    fn test_expired_challenge_is_replaced() {
        let (registry, clock) = registry();
        let first = registry.request_challenge("abc").unwrap();

        clock.advance(Duration::from_secs(300));
        let second = registry.request_challenge("abc").unwrap();
        assert_ne!(second.message, first.message);
        assert_eq!(second.validation_window, 300);
    }

    #[test]
    fn test_empty_address_is_malformed() {
        let (registry, _) = registry();
        assert!(matches!(
            registry.request_challenge("  "),
            Err(RegistryError::Malformed(_))
        ));
    }

    #[test]
    fn test_verify_moves_to_validated() {
        let (registry, clock) = registry();
        let keypair = Keypair::from_seed(&[7u8; 32]);
        let address = keypair.address();
        let request = registry.request_challenge(&address).unwrap();

        clock.advance(Duration::from_secs(60));
        let signature = keypair.sign_message(&request.message);
        let validated = registry.verify_signature(&address, &signature).unwrap();

        assert!(validated.register_star);
        assert_eq!(validated.message_signature, SignatureStatus::Valid);
        assert_eq!(validated.request.validation_window, 240);
        assert!(registry.is_validated(&address));

        // the pending entry is gone
        assert!(matches!(
            registry.verify_signature(&address, &signature),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_verify_without_challenge() {
        let (registry, _) = registry();
        assert!(matches!(
            registry.verify_signature("abc", "00"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_verify_after_expiry_drops_challenge() {
        let (registry, clock) = registry();
        let keypair = Keypair::from_seed(&[8u8; 32]);
        let address = keypair.address();
        let request = registry.request_challenge(&address).unwrap();
        let signature = keypair.sign_message(&request.message);

        clock.advance(Duration::from_secs(301));
        assert!(matches!(
            registry.verify_signature(&address, &signature),
            Err(RegistryError::Expired(_))
        ));
        assert!(matches!(
            registry.verify_signature(&address, &signature),
            Err(RegistryError::NotFound(_))
        ));
        assert!(!registry.is_validated(&address));
    }

    #[test]
    fn test_wrong_signer_leaves_challenge_pending() {
        let (registry, _) = registry();
        let owner = Keypair::from_seed(&[1u8; 32]);
        let intruder = Keypair::from_seed(&[2u8; 32]);
        let address = owner.address();
        let request = registry.request_challenge(&address).unwrap();

        let forged = intruder.sign_message(&request.message);
        assert!(matches!(
            registry.verify_signature(&address, &forged),
            Err(RegistryError::InvalidSignature(_))
        ));
        assert!(!registry.is_validated(&address));

        let genuine = owner.sign_message(&request.message);
        assert!(registry.verify_signature(&address, &genuine).is_ok());
    }

    #[test]
    fn test_garbage_signature_is_malformed() {
        let (registry, _) = registry();
        let keypair = Keypair::from_seed(&[3u8; 32]);
        let address = keypair.address();
        registry.request_challenge(&address).unwrap();

        assert!(matches!(
            registry.verify_signature(&address, "not hex"),
            Err(RegistryError::Malformed(_))
        ));
    }

    #[test]
    fn test_consume_once_and_reinstate() {
        let (registry, _) = registry();
        let keypair = Keypair::from_seed(&[4u8; 32]);
        let address = keypair.address();
        let request = registry.request_challenge(&address).unwrap();
        registry
            .verify_signature(&address, &keypair.sign_message(&request.message))
            .unwrap();

        let clearance = registry.take(&address).unwrap();
        assert!(!registry.consume(&address));

        registry.reinstate(clearance);
        assert!(registry.is_validated(&address));
        assert!(registry.consume(&address));
        assert!(!registry.consume(&address));
    }

    #[test]
    fn test_validated_serializes_with_status() {
        let validated = ValidatedRequest {
            register_star: true,
            request: ValidationRequest {
                address: "abc".into(),
                request_timestamp: 1,
                message: "abc:1:starRegistry".into(),
                validation_window: 12,
            },
            message_signature: SignatureStatus::Valid,
        };
        let json = serde_json::to_value(&validated).unwrap();
        assert_eq!(json["message_signature"], "valid");
        assert_eq!(json["status"]["validation_window"], 12);
    }
}
