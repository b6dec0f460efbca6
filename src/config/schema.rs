//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a transfer run.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::blockchain::network::{Endpoint, NamedNetwork};
use crate::blockchain::wallet::PRIVATE_KEY_ENV_VAR;

/// Root configuration for a transfer run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransferConfig {
    /// Which network to talk to.
    pub network: NetworkConfig,

    /// Where the sender's key comes from.
    pub credential: CredentialConfig,

    /// The fixed transfer and how many times to repeat it.
    pub transfer: TransferParams,

    /// Confirmation wait settings.
    pub confirmation: ConfirmationConfig,

    /// Failure handling.
    pub retries: RetryConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Network selection.
///
/// `rpc_url` replaces the named network's endpoint. With a custom URL the
/// chain ID is only checked when `chain_id` is set explicitly.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Named network (e.g. "sepolia").
    pub name: NamedNetwork,

    /// Custom JSON-RPC endpoint URL.
    pub rpc_url: Option<String>,

    /// Expected chain ID, overriding the named network's.
    pub chain_id: Option<u64>,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl NetworkConfig {
    /// Resolve the endpoint the run connects to.
    pub fn endpoint(&self) -> Result<Endpoint, url::ParseError> {
        match &self.rpc_url {
            Some(raw) => Ok(Endpoint::custom(Url::parse(raw)?, self.chain_id)),
            None => {
                let mut endpoint = Endpoint::named(self.name);
                if let Some(chain_id) = self.chain_id {
                    endpoint.expected_chain_id = Some(chain_id);
                }
                Ok(endpoint)
            }
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: NamedNetwork::Sepolia,
            rpc_url: None,
            chain_id: None,
            rpc_timeout_secs: 10,
        }
    }
}

/// Credential source. The key itself never appears in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Environment variable holding the hex private key.
    pub env_var: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            env_var: PRIVATE_KEY_ENV_VAR.to_string(),
        }
    }
}

/// The fixed transfer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferParams {
    /// Recipient address.
    pub recipient: String,

    /// Amount in the native currency, as a decimal string (e.g. "0.0001").
    pub amount: String,

    /// Number of submit-and-confirm iterations.
    pub iterations: u64,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            recipient: "0x799Fd477fD1483c89299E53368344dA9d446492a".to_string(),
            amount: "0.0001".to_string(),
            iterations: 1000,
        }
    }
}

/// Confirmation wait settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Deadline for one confirmation wait in seconds.
    pub timeout_secs: u64,

    /// Blocks, counting the inclusion block, before a transfer is confirmed.
    pub required_confirmations: u32,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            required_confirmations: 1,
            poll_interval_ms: 2000,
        }
    }
}

/// How failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Retry, skip or abort depending on the failure kind.
    #[default]
    Classified,
    /// Stop the run on the first failure.
    Abort,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub policy: FailurePolicy,

    /// Maximum attempts per stage of one iteration (1 = no retry).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Consecutive skipped iterations that abort the run.
    pub max_consecutive_skips: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::Classified,
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            max_consecutive_skips: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (trace, debug, info, warn, error, or a full directive).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransferConfig::default();
        assert_eq!(config.network.name, NamedNetwork::Sepolia);
        assert_eq!(config.transfer.amount, "0.0001");
        assert_eq!(config.transfer.iterations, 1000);
        assert_eq!(config.retries.policy, FailurePolicy::Classified);
        assert_eq!(config.credential.env_var, PRIVATE_KEY_ENV_VAR);
    }

    #[test]
    fn test_named_endpoint_with_chain_override() {
        let network = NetworkConfig {
            name: NamedNetwork::Anvil,
            chain_id: Some(1),
            ..NetworkConfig::default()
        };
        let endpoint = network.endpoint().unwrap();
        assert_eq!(endpoint.url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(endpoint.expected_chain_id, Some(1));
    }

    #[test]
    fn test_partial_toml() {
        let config: TransferConfig = toml::from_str(
            r#"
            [network]
            name = "polygon"

            [retries]
            policy = "abort"
            "#,
        )
        .unwrap();
        assert_eq!(config.network.name, NamedNetwork::Polygon);
        assert_eq!(config.network.rpc_timeout_secs, 10);
        assert_eq!(config.retries.policy, FailurePolicy::Abort);
        assert_eq!(config.retries.max_attempts, 3);
        assert_eq!(config.confirmation.timeout_secs, 300);
    }
}
