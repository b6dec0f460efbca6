//! Sequential native-currency transfer loop for EVM networks.
//!
//! Submits the same transfer N times from one key, waiting for each to
//! confirm before sending the next, with classified retry/skip/abort
//! handling of failures.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod transfer;

pub use blockchain::{AlloyChainClient, ChainClient, Credential};
pub use config::TransferConfig;
pub use lifecycle::Shutdown;
pub use transfer::{LoopSettings, RunReport, TransferLoop};
