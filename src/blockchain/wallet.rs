//! Credential handling and signer derivation.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys live in zeroizing buffers and are wiped on drop
//! - Keys are never logged, serialized, or echoed in error messages

use alloy::signers::local::PrivateKeySigner;
use zeroize::Zeroizing;

use crate::blockchain::types::{ChainError, ChainResult};

/// Default environment variable holding the sender's private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "TRANSFER_LOOP_PRIVATE_KEY";

/// Secret key material for the sending account.
///
/// The buffer is zeroed when the credential is dropped. The transfer loop
/// consumes it and drops it as soon as the signer exists.
pub struct Credential {
    secret: Zeroizing<String>,
}

impl Credential {
    /// Wrap a hex-encoded private key (with or without `0x`).
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Load the key from the named environment variable.
    pub fn from_env(var: &str) -> ChainResult<Self> {
        let secret = Zeroizing::new(std::env::var(var).map_err(|_| {
            ChainError::InvalidCredential(format!("environment variable {} not set", var))
        })?);
        Ok(Self { secret })
    }

    /// Derive the local signer for this key.
    pub fn to_signer(&self) -> ChainResult<PrivateKeySigner> {
        let key_hex = self.secret.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        if key_hex.len() != 64 {
            return Err(ChainError::InvalidCredential(
                "malformed private key: expected 32 bytes of hex".to_string(),
            ));
        }

        key_hex.parse::<PrivateKeySigner>().map_err(|_| {
            ChainError::InvalidCredential(
                "malformed private key: not a valid secp256k1 scalar".to_string(),
            )
        })
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
