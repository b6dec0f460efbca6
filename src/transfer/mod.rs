//! Transfer loop subsystem.
//!
//! # Data Flow
//! ```text
//! LoopSettings + Credential
//!     → runner.rs: connect → derive signer (credential dropped)
//!     → for each iteration:
//!           submit ─(fail)→ policy.rs → retry / skip / abort
//!             │
//!           confirm (deadline + cancellation) ─(fail)→ policy.rs
//!             │
//!           record in report.rs
//!     → RunReport
//! ```

pub mod policy;
pub mod report;
pub mod runner;

pub use policy::{classify, Disposition, Stage};
pub use report::{IterationRecord, IterationResult, IterationState, RunOutcome, RunReport};
pub use runner::{LoopError, LoopSettings, TransferLoop};
