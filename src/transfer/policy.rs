//! Failure classification.
//!
//! Maps each failure to what the loop does next:
//!
//! ```text
//! stage    error                          classified   abort policy
//! submit   Transport / EndpointUnreachable Retry        Abort
//! submit   Rejected(nonce conflict)        Retry        Abort
//! submit   Rejected(insufficient funds)    Skip         Abort
//! submit   Rejected(other)                 Skip         Abort
//! submit   Rejected(invalid recipient)     Abort        Abort
//! confirm  Transport                       Retry        Abort
//! confirm  ConfirmationTimeout             Retry        Abort
//! confirm  TransactionReverted             Skip         Abort
//! any      InvalidCredential/ChainMismatch Abort        Abort
//! ```
//!
//! A confirm-stage retry re-awaits the same transaction, so nothing new is
//! broadcast while the old one may still be pending.

use serde::Serialize;

use crate::blockchain::types::{ChainError, RejectionReason};
use crate::config::FailurePolicy;

/// Which half of an iteration failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Submit,
    Confirm,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Confirm => "confirm",
        }
    }
}

/// What to do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Repeat the failed stage after backoff, while the budget lasts.
    Retry,
    /// Give up on this iteration and move to the next.
    Skip,
    /// Stop the whole run.
    Abort,
}

pub fn classify(policy: FailurePolicy, stage: Stage, err: &ChainError) -> Disposition {
    if policy == FailurePolicy::Abort {
        return Disposition::Abort;
    }

    match (stage, err) {
        (_, ChainError::InvalidCredential(_)) | (_, ChainError::ChainMismatch { .. }) => {
            Disposition::Abort
        }

        (_, ChainError::Transport(_)) | (_, ChainError::EndpointUnreachable { .. }) => {
            Disposition::Retry
        }
        (_, ChainError::ConfirmationTimeout { .. }) => Disposition::Retry,

        (Stage::Submit, ChainError::RejectedByNetwork { reason, .. }) => match reason {
            RejectionReason::NonceConflict => Disposition::Retry,
            RejectionReason::InsufficientFunds | RejectionReason::Other => Disposition::Skip,
            RejectionReason::InvalidRecipient => Disposition::Abort,
        },
        // A rejection while confirming means the node no longer knows the
        // transaction; its fate is unknown.
        (Stage::Confirm, ChainError::RejectedByNetwork { .. }) => Disposition::Abort,

        (_, ChainError::TransactionReverted { .. }) => Disposition::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::TxHash;
    use std::time::Duration;

    fn rejected(reason: RejectionReason) -> ChainError {
        ChainError::RejectedByNetwork {
            reason,
            message: "node says no".into(),
        }
    }

    #[test]
    fn test_transport_is_retried() {
        let err = ChainError::Transport("connection reset".into());
        assert_eq!(
            classify(FailurePolicy::Classified, Stage::Submit, &err),
            Disposition::Retry
        );
        assert_eq!(
            classify(FailurePolicy::Classified, Stage::Confirm, &err),
            Disposition::Retry
        );
    }

    #[test]
    fn test_confirmation_timeout_is_retryable() {
        let err = ChainError::ConfirmationTimeout {
            hash: TxHash::ZERO,
            after: Duration::from_secs(300),
        };
        assert_eq!(
            classify(FailurePolicy::Classified, Stage::Confirm, &err),
            Disposition::Retry
        );
    }

    #[test]
    fn test_rejections() {
        let p = FailurePolicy::Classified;
        assert_eq!(
            classify(p, Stage::Submit, &rejected(RejectionReason::NonceConflict)),
            Disposition::Retry
        );
        assert_eq!(
            classify(p, Stage::Submit, &rejected(RejectionReason::InsufficientFunds)),
            Disposition::Skip
        );
        assert_eq!(
            classify(p, Stage::Submit, &rejected(RejectionReason::InvalidRecipient)),
            Disposition::Abort
        );
    }

    #[test]
    fn test_revert_skips() {
        let err = ChainError::TransactionReverted {
            hash: TxHash::ZERO,
            block_number: 10,
        };
        assert_eq!(
            classify(FailurePolicy::Classified, Stage::Confirm, &err),
            Disposition::Skip
        );
    }

    #[test]
    fn test_credential_always_aborts() {
        let err = ChainError::InvalidCredential("bad".into());
        assert_eq!(
            classify(FailurePolicy::Classified, Stage::Submit, &err),
            Disposition::Abort
        );
    }

    #[test]
    fn test_abort_policy_aborts_everything() {
        let err = ChainError::Transport("timeout".into());
        assert_eq!(
            classify(FailurePolicy::Abort, Stage::Submit, &err),
            Disposition::Abort
        );
        assert_eq!(
            classify(
                FailurePolicy::Abort,
                Stage::Submit,
                &rejected(RejectionReason::NonceConflict)
            ),
            Disposition::Abort
        );
    }
}
