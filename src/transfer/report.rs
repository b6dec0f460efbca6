//! Iteration states and the end-of-run summary.

use alloy::primitives::TxHash;
use serde::Serialize;
use uuid::Uuid;

use crate::blockchain::transaction::{ConfirmationReceipt, SubmittedTransaction};
use crate::blockchain::types::ChainError;

/// Where an iteration is, or where it ended.
///
/// ```text
/// Idle → Submitting → Submitted → Confirming → Confirmed
///                 │                        ├→ Reverted
///                 │                        └→ TimedOut / TransportFailed
///                 ├→ Rejected
///                 └→ TransportFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationState {
    Idle,
    Submitting,
    Submitted,
    Confirming,
    Confirmed,
    Reverted,
    Rejected,
    TransportFailed,
    TimedOut,
}

impl IterationState {
    /// Terminal state reached by a failure.
    pub fn from_error(err: &ChainError) -> Self {
        match err {
            ChainError::TransactionReverted { .. } => Self::Reverted,
            ChainError::ConfirmationTimeout { .. } => Self::TimedOut,
            ChainError::Transport(_) | ChainError::EndpointUnreachable { .. } => {
                Self::TransportFailed
            }
            ChainError::RejectedByNetwork { .. }
            | ChainError::InvalidCredential(_)
            | ChainError::ChainMismatch { .. } => Self::Rejected,
        }
    }
}

/// How an iteration ended from the loop's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationResult {
    Confirmed,
    Skipped,
    Aborted,
    Cancelled,
}

/// One attempted iteration.
#[derive(Debug, Clone, Serialize)]
pub struct IterationRecord {
    /// 1-based iteration number.
    pub iteration: u64,
    pub result: IterationResult,
    pub state: IterationState,
    pub transaction: Option<SubmittedTransaction>,
    pub receipt: Option<ConfirmationReceipt>,
    /// Broadcasts made during this iteration (retries included).
    pub submissions: u32,
    pub error: Option<String>,
}

/// How the whole run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every requested iteration was attempted.
    Completed,
    /// Stopped by an unrecoverable failure on `iteration`.
    Aborted { iteration: u64, error: String },
    /// Stopped by shutdown before or during `iteration`.
    Cancelled {
        iteration: u64,
        in_flight: Option<TxHash>,
    },
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Aborted { iteration, error } => {
                write!(f, "aborted at iteration {}: {}", iteration, error)
            }
            Self::Cancelled { iteration, .. } => write!(f, "cancelled at iteration {}", iteration),
        }
    }
}

/// Summary of a run, printed when the loop exits.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub iterations_requested: u64,
    pub records: Vec<IterationRecord>,
    pub outcome: RunOutcome,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn new(run_id: Uuid, iterations_requested: u64) -> Self {
        Self {
            run_id,
            iterations_requested,
            records: Vec::new(),
            outcome: RunOutcome::Completed,
            elapsed_ms: 0,
        }
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &ConfirmationReceipt> {
        self.records.iter().filter_map(|r| r.receipt.as_ref())
    }

    pub fn confirmed_count(&self) -> usize {
        self.count(IterationResult::Confirmed)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(IterationResult::Skipped)
    }

    /// Total broadcasts across the run.
    pub fn submissions(&self) -> u64 {
        self.records.iter().map(|r| r.submissions as u64).sum()
    }

    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    fn count(&self, result: IterationResult) -> usize {
        self.records.iter().filter(|r| r.result == result).count()
    }
}
