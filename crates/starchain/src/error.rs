//! Error types for the ledger, the validation registry and the registrar.

use starchain_core::CoreError;
use starchain_store::StoreError;
use thiserror::Error;

/// Errors raised by [`Ledger`](crate::Ledger) operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No block is stored at this height.
    #[error("block {0} not found")]
    NotFound(u64),

    /// Reading from the store failed.
    #[error("store read failed: {0}")]
    StoreRead(#[source] StoreError),

    /// Persisting a block failed. The in-memory chain is unchanged.
    #[error("store write failed: {0}")]
    StoreWrite(#[source] StoreError),

    /// The store already holds a block at the largest representable height.
    #[error("ledger height exhausted")]
    HeightExhausted,

    /// Stored bytes could not be decoded into a block.
    #[error("codec error: {0}")]
    Codec(#[from] CoreError),
}

/// Errors raised by [`ValidationRegistry`](crate::ValidationRegistry) operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No pending challenge for this address.
    #[error("no pending validation request for {0}")]
    NotFound(String),

    /// The challenge window closed before a signature arrived.
    #[error("validation window expired for {0}")]
    Expired(String),

    /// The signature does not verify against the challenge message.
    #[error("invalid signature for {0}")]
    InvalidSignature(String),

    /// Address or signature could not be parsed.
    #[error("malformed input: {0}")]
    Malformed(#[from] CoreError),
}

/// Errors raised by the [`Registrar`](crate::Registrar).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The address has not completed a signature challenge.
    #[error("address {0} has not been validated")]
    NotValidated(String),

    /// The submitted body failed boundary checks.
    #[error("invalid body: {0}")]
    InvalidBody(#[source] CoreError),
}

impl Error {
    /// Whether the caller caused this failure, as opposed to the store or a
    /// corrupted chain.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Ledger(LedgerError::NotFound(_)) => true,
            Self::Ledger(_) => false,
            Self::Registry(_) | Self::NotValidated(_) | Self::InvalidBody(_) => true,
        }
    }
}

/// Result type for Registrar operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(Error::NotValidated("addr".into()).is_client_error());
        assert!(Error::from(LedgerError::NotFound(9)).is_client_error());
        assert!(Error::from(RegistryError::Expired("addr".into())).is_client_error());
        assert!(Error::InvalidBody(CoreError::InvalidStory("too long".into())).is_client_error());

        let write = LedgerError::StoreWrite(StoreError::Migration("boom".into()));
        assert!(!Error::from(write).is_client_error());
        let codec = LedgerError::Codec(CoreError::DecodingError("bad cbor".into()));
        assert!(!Error::from(codec).is_client_error());
        assert!(!Error::from(LedgerError::HeightExhausted).is_client_error());
    }

    #[test]
    fn test_messages_name_the_address() {
        let err = Error::from(RegistryError::InvalidSignature("abc123".into()));
        assert_eq!(err.to_string(), "invalid signature for abc123");
    }
}
