//! Configuration for the ledger, the validation registry and the registrar.

use std::time::Duration;

/// Note stored in the genesis block by default.
pub const DEFAULT_GENESIS_NOTE: &str = "First block in the chain - Genesis block";

/// Default lifetime of an identity challenge.
pub const DEFAULT_VALIDATION_WINDOW: Duration = Duration::from_secs(300);

/// Default trailing component of a challenge message.
pub const DEFAULT_MESSAGE_SUFFIX: &str = "starRegistry";

/// Configuration for the [`Ledger`](crate::Ledger).
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Body of the block written when the ledger opens on an empty store.
    pub genesis_note: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_note: DEFAULT_GENESIS_NOTE.to_string(),
        }
    }
}

/// Configuration for the [`ValidationRegistry`](crate::ValidationRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a challenge may be answered after it was issued.
    pub validation_window: Duration,
    /// Appended to `address:timestamp:` to form the challenge message.
    pub message_suffix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            validation_window: DEFAULT_VALIDATION_WINDOW,
            message_suffix: DEFAULT_MESSAGE_SUFFIX.to_string(),
        }
    }
}

/// Configuration for the [`Registrar`](crate::Registrar).
#[derive(Debug, Clone, Default)]
pub struct RegistrarConfig {
    pub ledger: LedgerConfig,
    pub registry: RegistryConfig,
}
