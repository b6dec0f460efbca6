//! Transfer requests, submitted transactions and confirmation receipts.
//!
//! # Responsibilities
//! - Parse and validate the fixed recipient and amount once
//! - Describe a broadcast transaction and its observed status
//! - Carry the finalized receipt back to the loop

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use thiserror::Error;

/// Native currency has 18 decimals on every supported network.
const MAX_DECIMALS: usize = 18;

/// Errors building a [`TransferRequest`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Invalid recipient address '{0}'")]
    InvalidRecipient(String),

    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },
}

/// A native-currency transfer, built once and reused for every iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
    recipient: Address,
    amount: String,
    #[serde(skip)]
    value: U256,
}

impl TransferRequest {
    /// Parse a recipient address and a decimal amount in the base currency.
    pub fn parse(recipient: &str, amount: &str) -> Result<Self, RequestError> {
        let recipient_addr: Address = recipient
            .trim()
            .parse()
            .map_err(|_| RequestError::InvalidRecipient(recipient.to_string()))?;

        let amount = amount.trim();
        let invalid = |reason: &str| RequestError::InvalidAmount {
            amount: amount.to_string(),
            reason: reason.to_string(),
        };

        if amount.is_empty() {
            return Err(invalid("empty"));
        }
        if !amount.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(invalid("expected an unsigned decimal number"));
        }
        if let Some((_, fraction)) = amount.split_once('.') {
            if fraction.len() > MAX_DECIMALS {
                return Err(invalid("more than 18 decimal places"));
            }
        }

        let value = parse_ether(amount).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            recipient: recipient_addr,
            amount: amount.to_string(),
            value,
        })
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    /// Amount as configured, e.g. `"0.0001"`.
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Amount in wei.
    pub fn value(&self) -> U256 {
        self.value
    }
}

/// Lifecycle of a broadcast transaction as seen from the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// A transaction the network accepted into its mempool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedTransaction {
    hash: TxHash,
    status: TxStatus,
}

impl SubmittedTransaction {
    /// A freshly broadcast transaction.
    pub fn pending(hash: TxHash) -> Self {
        Self {
            hash,
            status: TxStatus::Pending,
        }
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// The same transaction as the network reported it once finalized.
    pub fn observed(&self, status: TxStatus) -> Self {
        Self {
            hash: self.hash,
            status,
        }
    }
}

/// Proof that a transaction is included with enough blocks on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationReceipt {
    pub hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub effective_gas_price: u128,
}
