//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (private key) + config (endpoint, recipient, amount)
//!     → wallet.rs (scoped credential, signer derivation)
//!     → network.rs (named endpoints)
//!     → client.rs (ChainClient capability)
//!     → rpc.rs (alloy implementation: connect, sign, broadcast, confirm)
//!     → transaction.rs (request, submitted tx, receipt)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod network;
pub mod rpc;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::ChainClient;
pub use network::{Endpoint, NamedNetwork};
pub use rpc::{AlloyChainClient, RpcSettings};
pub use transaction::{ConfirmationReceipt, SubmittedTransaction, TransferRequest, TxStatus};
pub use types::{ChainError, ChainId, ChainResult, RejectionReason};
pub use wallet::Credential;
