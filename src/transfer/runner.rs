//! The transfer loop: N sequential submit-and-confirm cycles.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::client::ChainClient;
use crate::blockchain::network::Endpoint;
use crate::blockchain::transaction::{TransferRequest, TxStatus};
use crate::blockchain::types::ChainError;
use crate::blockchain::wallet::Credential;
use crate::config::{ConfigError, FailurePolicy, RetryConfig, TransferConfig, ValidationError};
use crate::observability::metrics;
use crate::resilience::{bounded, sleep_or_cancel, AttemptBudget, Backoff, Interrupted};
use crate::transfer::policy::{classify, Disposition, Stage};
use crate::transfer::report::{
    IterationRecord, IterationResult, IterationState, RunOutcome, RunReport,
};

/// Errors that stop a run before the first iteration.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("Startup failed: {0}")]
    Startup(#[source] ChainError),

    #[error("Cancelled during startup")]
    Cancelled,
}

/// Everything the loop needs besides the client and the credential.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub endpoint: Endpoint,
    pub request: TransferRequest,
    pub iterations: u64,
    /// Deadline for one confirmation wait.
    pub confirmation_timeout: Duration,
    pub policy: FailurePolicy,
    /// Attempts per stage per iteration.
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub max_consecutive_skips: u32,
}

impl LoopSettings {
    /// Settings with the default failure handling.
    pub fn new(endpoint: Endpoint, request: TransferRequest, iterations: u64) -> Self {
        let retries = RetryConfig::default();
        Self {
            endpoint,
            request,
            iterations,
            confirmation_timeout: Duration::from_secs(300),
            policy: retries.policy,
            max_attempts: retries.max_attempts,
            backoff: Backoff::from_config(&retries),
            max_consecutive_skips: retries.max_consecutive_skips,
        }
    }

    /// Resolve a validated configuration.
    pub fn from_config(config: &TransferConfig) -> Result<Self, ConfigError> {
        let endpoint = config.network.endpoint().map_err(|e| {
            ConfigError::Validation(vec![ValidationError::new("network.rpc_url", e.to_string())])
        })?;

        let request = TransferRequest::parse(&config.transfer.recipient, &config.transfer.amount)
            .map_err(|e| {
                ConfigError::Validation(vec![ValidationError::new("transfer", e.to_string())])
            })?;

        Ok(Self {
            endpoint,
            request,
            iterations: config.transfer.iterations,
            confirmation_timeout: Duration::from_secs(config.confirmation.timeout_secs),
            policy: config.retries.policy,
            max_attempts: config.retries.max_attempts,
            backoff: Backoff::from_config(&config.retries),
            max_consecutive_skips: config.retries.max_consecutive_skips,
        })
    }
}

/// What happened to one iteration, before it is folded into the report.
enum IterationOutcome {
    Confirmed(IterationRecord),
    Skipped(IterationRecord),
    Aborted(IterationRecord),
    Cancelled(IterationRecord),
}

/// What to do after a classified failure.
enum Step {
    Retry,
    Skip,
    Abort,
    Cancelled,
}

/// Drives `iterations` strictly sequential transfers through one client.
///
/// At most one transaction is in flight at any time: iteration `i + 1` never
/// starts before iteration `i` is confirmed, skipped, or the run stops.
pub struct TransferLoop<C: ChainClient> {
    client: C,
    settings: LoopSettings,
    cancel: CancellationToken,
}

impl<C: ChainClient> TransferLoop<C> {
    pub fn new(client: C, settings: LoopSettings) -> Self {
        Self {
            client,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between iterations, during backoff, and during confirmation
    /// waits once `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run the loop. The credential is dropped (and zeroed) as soon as the
    /// signer exists.
    ///
    /// Returns `Err` only when no iteration could start. Aborts and
    /// cancellations after startup are reported in [`RunReport::outcome`].
    pub async fn run(self, credential: Credential) -> Result<RunReport, LoopError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "transfer_run",
            run_id = %run_id,
            endpoint = %self.settings.endpoint.label
        );
        self.run_inner(run_id, credential).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, credential: Credential) -> Result<RunReport, LoopError> {
        let started = Instant::now();

        if self.cancel.is_cancelled() {
            return Err(LoopError::Cancelled);
        }

        let connection = self
            .client
            .connect(&self.settings.endpoint)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect");
                LoopError::Startup(e)
            })?;

        let signer = {
            let credential = credential;
            self.client
                .derive_signer(&connection, &credential)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to derive signer");
                    LoopError::Startup(e)
                })?
        };

        tracing::info!(
            from = %self.client.signer_address(&signer),
            to = %self.settings.request.recipient(),
            amount = %self.settings.request.amount(),
            iterations = self.settings.iterations,
            policy = ?self.settings.policy,
            "Starting transfer loop"
        );

        let mut report = RunReport::new(run_id, self.settings.iterations);
        let mut consecutive_skips = 0u32;

        for index in 0..self.settings.iterations {
            let iteration = index + 1;

            if self.cancel.is_cancelled() {
                tracing::warn!(iteration, "Cancelled before iteration");
                report.outcome = RunOutcome::Cancelled {
                    iteration,
                    in_flight: None,
                };
                break;
            }

            let span = tracing::info_span!("iteration", iteration);
            let outcome = self
                .run_iteration(iteration, &connection, &signer)
                .instrument(span)
                .await;

            match outcome {
                IterationOutcome::Confirmed(record) => {
                    consecutive_skips = 0;
                    report.records.push(record);
                }
                IterationOutcome::Skipped(record) => {
                    consecutive_skips += 1;
                    let error = record.error.clone().unwrap_or_default();
                    report.records.push(record);

                    if consecutive_skips >= self.settings.max_consecutive_skips {
                        tracing::error!(
                            iteration,
                            consecutive_skips,
                            "Too many consecutive skipped iterations, aborting"
                        );
                        report.outcome = RunOutcome::Aborted {
                            iteration,
                            error: format!(
                                "{} consecutive iterations skipped, last: {}",
                                consecutive_skips, error
                            ),
                        };
                        break;
                    }
                }
                IterationOutcome::Aborted(record) => {
                    report.outcome = RunOutcome::Aborted {
                        iteration,
                        error: record.error.clone().unwrap_or_default(),
                    };
                    report.records.push(record);
                    break;
                }
                IterationOutcome::Cancelled(record) => {
                    let in_flight = record
                        .transaction
                        .as_ref()
                        .filter(|tx| tx.status() == TxStatus::Pending)
                        .map(|tx| tx.hash());
                    report.outcome = RunOutcome::Cancelled {
                        iteration,
                        in_flight,
                    };
                    report.records.push(record);
                    break;
                }
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            confirmed = report.confirmed_count(),
            skipped = report.skipped_count(),
            submissions = report.submissions(),
            elapsed_ms = report.elapsed_ms,
            outcome = %report.outcome,
            "Transfer loop finished"
        );

        Ok(report)
    }

    async fn run_iteration(
        &self,
        iteration: u64,
        connection: &C::Connection,
        signer: &C::Signer,
    ) -> IterationOutcome {
        let mut record = IterationRecord {
            iteration,
            result: IterationResult::Confirmed,
            state: IterationState::Idle,
            transaction: None,
            receipt: None,
            submissions: 0,
            error: None,
        };

        // Submit
        let mut budget = AttemptBudget::new(self.settings.max_attempts);
        let tx = loop {
            record.state = IterationState::Submitting;
            record.submissions += 1;
            tracing::debug!(state = ?record.state, attempt = budget.attempts(), "Submitting transfer");

            match self.client.submit_transfer(signer, &self.settings.request).await {
                Ok(tx) => break tx,
                Err(err) => {
                    metrics::record_failure(err.kind(), true);
                    record.state = IterationState::from_error(&err);
                    tracing::warn!(error = %err, kind = err.kind(), "Submission failed");

                    match self.next_step(Stage::Submit, &err, &mut budget).await {
                        Step::Retry => continue,
                        step => return finish(record, step, err),
                    }
                }
            }
        };

        record.state = IterationState::Submitted;
        record.transaction = Some(tx.clone());
        metrics::record_submitted();
        tracing::info!(tx_hash = %tx.hash(), "Transaction submitted");
        let submitted_at = Instant::now();

        // Confirm
        let mut budget = AttemptBudget::new(self.settings.max_attempts);
        loop {
            record.state = IterationState::Confirming;
            tracing::debug!(state = ?record.state, tx_hash = %tx.hash(), attempt = budget.attempts(), "Awaiting confirmation");

            let wait = self.client.await_confirmation(connection, &tx);
            let err = match bounded(wait, self.settings.confirmation_timeout, &self.cancel).await {
                Ok(Ok(receipt)) => {
                    metrics::record_confirmed(submitted_at.elapsed());
                    tracing::info!(
                        tx_hash = %receipt.hash,
                        block_number = receipt.block_number,
                        gas_used = receipt.gas_used,
                        effective_gas_price = receipt.effective_gas_price,
                        "Transaction confirmed"
                    );
                    record.state = IterationState::Confirmed;
                    record.transaction = Some(tx.observed(TxStatus::Confirmed));
                    record.receipt = Some(receipt);
                    return IterationOutcome::Confirmed(record);
                }
                Ok(Err(err)) => err,
                Err(Interrupted::TimedOut(after)) => ChainError::ConfirmationTimeout {
                    hash: tx.hash(),
                    after,
                },
                Err(Interrupted::Cancelled) => {
                    tracing::warn!(tx_hash = %tx.hash(), "Cancelled while awaiting confirmation; transaction may still confirm");
                    metrics::clear_in_flight();
                    record.result = IterationResult::Cancelled;
                    record.error = Some("cancelled".to_string());
                    return IterationOutcome::Cancelled(record);
                }
            };

            let reverted = matches!(err, ChainError::TransactionReverted { .. });
            metrics::record_failure(err.kind(), reverted);
            record.state = IterationState::from_error(&err);
            if reverted {
                record.transaction = Some(tx.observed(TxStatus::Failed));
            }
            tracing::warn!(tx_hash = %tx.hash(), error = %err, kind = err.kind(), "Confirmation failed");

            match self.next_step(Stage::Confirm, &err, &mut budget).await {
                Step::Retry => continue,
                step => {
                    metrics::clear_in_flight();
                    return finish(record, step, err);
                }
            }
        }
    }

    /// Classify a failure and, for retries, wait out the backoff.
    async fn next_step(&self, stage: Stage, err: &ChainError, budget: &mut AttemptBudget) -> Step {
        match classify(self.settings.policy, stage, err) {
            Disposition::Skip => Step::Skip,
            Disposition::Abort => Step::Abort,
            Disposition::Retry => {
                let Some(retry) = budget.next_retry() else {
                    tracing::error!(
                        stage = stage.as_str(),
                        attempts = budget.attempts(),
                        "Retry budget exhausted"
                    );
                    return Step::Abort;
                };

                let delay = self.settings.backoff.delay(retry);
                metrics::record_retry(stage.as_str());
                tracing::info!(
                    stage = stage.as_str(),
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying"
                );

                match sleep_or_cancel(delay, &self.cancel).await {
                    Ok(()) => Step::Retry,
                    Err(_) => Step::Cancelled,
                }
            }
        }
    }
}

fn finish(mut record: IterationRecord, step: Step, err: ChainError) -> IterationOutcome {
    record.error = Some(err.to_string());
    match step {
        Step::Skip => {
            tracing::warn!(error = %err, "Skipping iteration");
            record.result = IterationResult::Skipped;
            IterationOutcome::Skipped(record)
        }
        Step::Cancelled => {
            record.result = IterationResult::Cancelled;
            IterationOutcome::Cancelled(record)
        }
        Step::Abort | Step::Retry => {
            tracing::error!(error = %err, "Aborting run");
            record.result = IterationResult::Aborted;
            IterationOutcome::Aborted(record)
        }
    }
}

impl<C: ChainClient> std::fmt::Debug for TransferLoop<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferLoop")
            .field("endpoint", &self.settings.endpoint.label)
            .field("iterations", &self.settings.iterations)
            .field("policy", &self.settings.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::network::NamedNetwork;

    #[test]
    fn test_settings_from_default_config() {
        let settings = LoopSettings::from_config(&TransferConfig::default()).unwrap();
        assert_eq!(settings.endpoint, Endpoint::named(NamedNetwork::Sepolia));
        assert_eq!(settings.iterations, 1000);
        assert_eq!(settings.request.amount(), "0.0001");
        assert_eq!(settings.confirmation_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_settings_custom_endpoint() {
        let mut config = TransferConfig::default();
        config.network.rpc_url = Some("http://10.0.0.5:8545".into());
        config.network.chain_id = Some(1337);
        let settings = LoopSettings::from_config(&config).unwrap();
        assert_eq!(settings.endpoint.url.as_str(), "http://10.0.0.5:8545/");
        assert_eq!(settings.endpoint.expected_chain_id, Some(1337));
    }

    #[test]
    fn test_settings_reject_bad_amount() {
        let mut config = TransferConfig::default();
        config.transfer.amount = "lots".into();
        assert!(matches!(
            LoopSettings::from_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
