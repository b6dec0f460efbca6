//! Chain-specific types and error definitions.

use alloy::primitives::TxHash;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why the network refused a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    InsufficientFunds,
    InvalidRecipient,
    NonceConflict,
    Other,
}

impl RejectionReason {
    /// Best-effort classification of a node's error message.
    ///
    /// Geth, Erigon, Nethermind and Anvil word these slightly differently, so
    /// this matches on the common fragments.
    pub fn classify(message: &str) -> Self {
        let msg = message.to_ascii_lowercase();
        if msg.contains("insufficient funds") || msg.contains("insufficient balance") {
            Self::InsufficientFunds
        } else if msg.contains("nonce too low")
            || msg.contains("nonce too high")
            || msg.contains("already known")
            || msg.contains("replacement transaction underpriced")
            || msg.contains("invalid nonce")
        {
            Self::NonceConflict
        } else if msg.contains("invalid address") || msg.contains("invalid recipient") {
            Self::InvalidRecipient
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InsufficientFunds => "insufficient funds",
            Self::InvalidRecipient => "invalid recipient",
            Self::NonceConflict => "nonce conflict",
            Self::Other => "rejected",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The endpoint could not be resolved or contacted.
    #[error("Endpoint {endpoint} unreachable: {reason}")]
    EndpointUnreachable { endpoint: String, reason: String },

    /// Malformed private key. Never carries key material.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// The node refused the transaction.
    #[error("Rejected by network ({reason}): {message}")]
    RejectedByNetwork {
        reason: RejectionReason,
        message: String,
    },

    /// Connectivity failure, including per-call RPC timeouts.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transaction was mined but execution failed.
    #[error("Transaction {hash} reverted in block {block_number}")]
    TransactionReverted { hash: TxHash, block_number: u64 },

    /// No confirmation arrived within the configured deadline.
    #[error("Transaction {hash} not confirmed after {}s", .after.as_secs())]
    ConfirmationTimeout { hash: TxHash, after: Duration },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl ChainError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EndpointUnreachable { .. } => "endpoint_unreachable",
            Self::InvalidCredential(_) => "invalid_credential",
            Self::RejectedByNetwork { reason, .. } => match reason {
                RejectionReason::InsufficientFunds => "insufficient_funds",
                RejectionReason::InvalidRecipient => "invalid_recipient",
                RejectionReason::NonceConflict => "nonce_conflict",
                RejectionReason::Other => "rejected",
            },
            Self::Transport(_) => "transport",
            Self::TransactionReverted { .. } => "reverted",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
            Self::ChainMismatch { .. } => "chain_mismatch",
        }
    }
}

/// Result type for blockchain operations.
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(11155111u64);
        assert_eq!(chain_id.0, 11155111);
        assert_eq!(u64::from(chain_id), 11155111);
        assert_eq!(chain_id.to_string(), "11155111");
    }

    #[test]
    fn test_rejection_classification() {
        assert_eq!(
            RejectionReason::classify("insufficient funds for gas * price + value"),
            RejectionReason::InsufficientFunds
        );
        assert_eq!(
            RejectionReason::classify("nonce too low: next nonce 5, tx nonce 4"),
            RejectionReason::NonceConflict
        );
        assert_eq!(
            RejectionReason::classify("already known"),
            RejectionReason::NonceConflict
        );
        assert_eq!(
            RejectionReason::classify("execution reverted"),
            RejectionReason::Other
        );
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::ChainMismatch {
            expected: 1,
            actual: 5,
        };
        assert_eq!(err.to_string(), "Chain ID mismatch: expected 1, got 5");

        let err = ChainError::ConfirmationTimeout {
            hash: TxHash::ZERO,
            after: Duration::from_secs(300),
        };
        assert!(err.to_string().ends_with("not confirmed after 300s"));

        let err = ChainError::RejectedByNetwork {
            reason: RejectionReason::InsufficientFunds,
            message: "insufficient funds".into(),
        };
        assert_eq!(err.kind(), "insufficient_funds");
    }
}
