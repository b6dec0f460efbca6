//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Iteration stage (submit or confirm) fails:
//!     → transfer/policy.rs classifies the failure
//!     → retries.rs (is another attempt allowed?)
//!     → backoff.rs (how long to wait)
//!     → timeouts.rs (sleep / wait, interruptible by cancellation)
//! ```
//!
//! # Design Decisions
//! - Every wait on the network has a deadline
//! - Retry budgets are per stage, per iteration
//! - Jittered backoff avoids hammering a struggling endpoint

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::Backoff;
pub use retries::AttemptBudget;
pub use timeouts::{bounded, sleep_or_cancel, Interrupted};
