//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, iterations > 0)
//! - Check the recipient, amount and endpoint parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TransferConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::blockchain::transaction::{RequestError, TransferRequest};
use crate::config::schema::TransferConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending key, e.g. `transfer.amount`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &TransferConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(raw) = &config.network.rpc_url {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "network.rpc_url",
                format!("unsupported scheme '{}', expected http or https", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("network.rpc_url", e.to_string())),
        }
    }
    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }

    if config.credential.env_var.trim().is_empty() {
        errors.push(ValidationError::new("credential.env_var", "must not be empty"));
    }

    if config.transfer.iterations == 0 {
        errors.push(ValidationError::new("transfer.iterations", "must be > 0"));
    }
    if let Err(e) = TransferRequest::parse(&config.transfer.recipient, &config.transfer.amount) {
        let field = match e {
            RequestError::InvalidRecipient(_) => "transfer.recipient",
            RequestError::InvalidAmount { .. } => "transfer.amount",
        };
        errors.push(ValidationError::new(field, e.to_string()));
    }

    if config.confirmation.timeout_secs == 0 {
        errors.push(ValidationError::new("confirmation.timeout_secs", "must be > 0"));
    }
    if config.confirmation.required_confirmations == 0 {
        errors.push(ValidationError::new(
            "confirmation.required_confirmations",
            "must be >= 1",
        ));
    }
    if config.confirmation.poll_interval_ms == 0 {
        errors.push(ValidationError::new("confirmation.poll_interval_ms", "must be > 0"));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }
    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }
    if config.retries.max_consecutive_skips == 0 {
        errors.push(ValidationError::new("retries.max_consecutive_skips", "must be >= 1"));
    }

    if tracing_subscriber::EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("invalid filter '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
