//! Retry budget for one stage of one iteration.
//!
//! # Design Decisions
//! - Submission and confirmation keep separate budgets
//! - The first attempt counts against the budget
//! - A budget of 1 means "never retry"

/// Counts attempts at one stage and says whether another is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptBudget {
    max_attempts: u32,
    attempts: u32,
}

impl AttemptBudget {
    /// A fresh budget with the first attempt already in progress.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempts: 1,
        }
    }

    /// Record a failed attempt.
    ///
    /// Returns the retry number (1-based, for backoff) when another attempt
    /// is allowed, `None` when the budget is spent.
    pub fn next_retry(&mut self) -> Option<u32> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        let retry = self.attempts;
        self.attempts += 1;
        Some(retry)
    }

    /// Attempts made so far, including the one in progress.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
