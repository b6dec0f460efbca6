//! JSON-RPC chain client backed by alloy.
//!
//! # Responsibilities
//! - Connect to the endpoint and verify its chain ID
//! - Build the wallet-filled provider that assigns nonce, gas and chain ID
//! - Broadcast transfers and classify node rejections
//! - Poll receipts until the required confirmation depth is reached

use alloy::network::{EthereumWallet, ReceiptResponse as _, TransactionBuilder};
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::ChainClient;
use crate::blockchain::network::Endpoint;
use crate::blockchain::transaction::{ConfirmationReceipt, SubmittedTransaction, TransferRequest};
use crate::blockchain::types::{ChainError, ChainId, ChainResult, RejectionReason};
use crate::blockchain::wallet::Credential;
use crate::config::schema::TransferConfig;

/// Transport-level knobs for the alloy client.
#[derive(Debug, Clone)]
pub struct RpcSettings {
    /// Deadline for each individual RPC call.
    pub rpc_timeout: Duration,
    /// Blocks (including the inclusion block) before a receipt counts.
    pub required_confirmations: u32,
    /// Delay between receipt polls.
    pub poll_interval: Duration,
}

impl RpcSettings {
    pub fn from_config(config: &TransferConfig) -> Self {
        Self {
            rpc_timeout: Duration::from_secs(config.network.rpc_timeout_secs),
            required_confirmations: config.confirmation.required_confirmations,
            poll_interval: Duration::from_millis(config.confirmation.poll_interval_ms),
        }
    }
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            rpc_timeout: Duration::from_secs(10),
            required_confirmations: 1,
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Read-only session with one endpoint.
pub struct AlloyConnection {
    endpoint: Endpoint,
    provider: Arc<dyn Provider + Send + Sync>,
    chain_id: ChainId,
}

impl AlloyConnection {
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }
}

impl std::fmt::Debug for AlloyConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyConnection")
            .field("endpoint", &self.endpoint.label)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// Wallet-filled provider for one sending address.
pub struct AlloySigner {
    address: Address,
    provider: Arc<dyn Provider + Send + Sync>,
}

impl std::fmt::Debug for AlloySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloySigner")
            .field("address", &self.address)
            .finish()
    }
}

/// Production [`ChainClient`].
#[derive(Debug, Clone, Default)]
pub struct AlloyChainClient {
    settings: RpcSettings,
}

impl AlloyChainClient {
    pub fn new(settings: RpcSettings) -> Self {
        Self { settings }
    }

    /// Run one RPC call under the per-call deadline.
    async fn call<T, F>(&self, what: &str, fut: F) -> ChainResult<T>
    where
        F: IntoFuture<Output = Result<T, TransportError>>,
    {
        match timeout(self.settings.rpc_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ChainError::Transport(format!("{}: {}", what, e))),
            Err(_) => Err(ChainError::Transport(format!(
                "{} timed out after {}s",
                what,
                self.settings.rpc_timeout.as_secs()
            ))),
        }
    }

    /// Probe `provider` for its chain ID and bind it to `endpoint`.
    async fn attach(
        &self,
        endpoint: &Endpoint,
        provider: Arc<dyn Provider + Send + Sync>,
    ) -> ChainResult<AlloyConnection> {
        let chain_id = match timeout(self.settings.rpc_timeout, provider.get_chain_id()).await {
            Ok(Ok(id)) => ChainId(id),
            Ok(Err(e)) => {
                return Err(ChainError::EndpointUnreachable {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ChainError::EndpointUnreachable {
                    endpoint: endpoint.to_string(),
                    reason: format!(
                        "no response within {}s",
                        self.settings.rpc_timeout.as_secs()
                    ),
                })
            }
        };

        if let Some(expected) = endpoint.expected_chain_id {
            if expected != chain_id.0 {
                return Err(ChainError::ChainMismatch {
                    expected,
                    actual: chain_id.0,
                });
            }
        }

        tracing::info!(
            endpoint = %endpoint.label,
            chain_id = chain_id.0,
            "Connected to RPC endpoint"
        );

        Ok(AlloyConnection {
            endpoint: endpoint.clone(),
            provider,
            chain_id,
        })
    }
}

/// Blocks on top of and including the one holding the transaction.
fn confirmation_depth(current_block: u64, tx_block: u64) -> u64 {
    current_block.saturating_sub(tx_block) + 1
}

/// Map a broadcast failure onto the error taxonomy.
///
/// JSON-RPC error responses mean the node saw and refused the transaction;
/// everything else is treated as a transport problem.
fn classify_send_error(err: TransportError) -> ChainError {
    match err {
        RpcError::ErrorResp(payload) => ChainError::RejectedByNetwork {
            reason: RejectionReason::classify(&payload.message),
            message: payload.message.to_string(),
        },
        other => ChainError::Transport(other.to_string()),
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    type Connection = AlloyConnection;
    type Signer = AlloySigner;

    async fn connect(&self, endpoint: &Endpoint) -> ChainResult<AlloyConnection> {
        let provider: Arc<dyn Provider + Send + Sync> =
            Arc::new(ProviderBuilder::new().connect_http(endpoint.url.clone()));
        self.attach(endpoint, provider).await
    }

    async fn derive_signer(
        &self,
        connection: &AlloyConnection,
        credential: &Credential,
    ) -> ChainResult<AlloySigner> {
        let signer = credential.to_signer()?;
        let address = signer.address();

        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(connection.endpoint.url.clone()),
        );

        tracing::info!(
            address = %address,
            chain_id = %connection.chain_id(),
            "Signer derived"
        );

        Ok(AlloySigner { address, provider })
    }

    fn signer_address(&self, signer: &AlloySigner) -> Address {
        signer.address
    }

    async fn submit_transfer(
        &self,
        signer: &AlloySigner,
        request: &TransferRequest,
    ) -> ChainResult<SubmittedTransaction> {
        let tx = TransactionRequest::default()
            .with_from(signer.address)
            .with_to(request.recipient())
            .with_value(request.value());

        let pending = match timeout(self.settings.rpc_timeout, signer.provider.send_transaction(tx)).await {
            Ok(Ok(pending)) => pending,
            Ok(Err(e)) => return Err(classify_send_error(e)),
            Err(_) => {
                return Err(ChainError::Transport(format!(
                    "send_transaction timed out after {}s",
                    self.settings.rpc_timeout.as_secs()
                )))
            }
        };

        Ok(SubmittedTransaction::pending(*pending.tx_hash()))
    }

    async fn await_confirmation(
        &self,
        connection: &AlloyConnection,
        tx: &SubmittedTransaction,
    ) -> ChainResult<ConfirmationReceipt> {
        let tx_hash = tx.hash();
        let required = self.settings.required_confirmations.max(1) as u64;
        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let receipt = match self
                .call(
                    "eth_getTransactionReceipt",
                    connection.provider.get_transaction_receipt(tx_hash),
                )
                .await?
            {
                Some(r) => r,
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
            };

            let current_block = self
                .call("eth_blockNumber", connection.provider.get_block_number())
                .await?;
            let tx_block = receipt.block_number.unwrap_or(current_block);

            if !receipt.status() {
                return Err(ChainError::TransactionReverted {
                    hash: tx_hash,
                    block_number: tx_block,
                });
            }

            let confirmations = confirmation_depth(current_block, tx_block);
            if confirmations >= required {
                return Ok(ConfirmationReceipt {
                    hash: tx_hash,
                    block_number: tx_block,
                    gas_used: receipt.gas_used,
                    effective_gas_price: receipt.effective_gas_price,
                });
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = confirmations,
                required = required,
                "Waiting for confirmations"
            );
        }
    }
}
