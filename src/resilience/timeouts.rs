//! Deadline and cancellation enforcement for long waits.
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Cancellation wins over completion when both are ready
//! - Timeout errors are distinct from cancellation

use std::future::IntoFuture;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a bounded wait did not produce a value.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Interrupted {
    #[error("deadline of {}s elapsed", .0.as_secs())]
    TimedOut(Duration),

    #[error("cancelled")]
    Cancelled,
}

/// Await `fut` for at most `limit`, giving up early on cancellation.
///
/// The inner future is dropped on either interruption.
pub async fn bounded<F>(
    fut: F,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<F::Output, Interrupted>
where
    F: IntoFuture,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        res = tokio::time::timeout(limit, fut) => res.map_err(|_| Interrupted::TimedOut(limit)),
    }
}

/// Sleep for `delay` unless cancelled first.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<(), Interrupted> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
