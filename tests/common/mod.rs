//! Shared test helpers: a scripted in-memory ChainClient.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, TxHash};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use transfer_loop::blockchain::{
    ChainClient, ChainError, ChainResult, ConfirmationReceipt, Credential, Endpoint, NamedNetwork,
    RejectionReason, SubmittedTransaction, TransferRequest,
};
use transfer_loop::resilience::Backoff;
use transfer_loop::transfer::LoopSettings;

// Anvil's first account.
#[allow(dead_code)]
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[allow(dead_code)]
pub const RECIPIENT: &str = "0x799Fd477fD1483c89299E53368344dA9d446492a";

/// Scripted result of one `submit_transfer` call. Calls beyond the script
/// succeed.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Submit {
    Accept,
    Transport,
    Reject(RejectionReason),
}

/// Scripted result of one `await_confirmation` call. Calls beyond the script
/// confirm.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Confirm {
    Accept,
    Revert,
    Transport,
    /// Never resolves.
    Hang,
}

#[derive(Default)]
struct State {
    submits: VecDeque<Submit>,
    confirms: VecDeque<Confirm>,
    unreachable: bool,
    submit_calls: u64,
    confirm_calls: u64,
    requests: Vec<TransferRequest>,
    hashes: Vec<TxHash>,
    in_flight: Option<TxHash>,
    overlapping_submits: u32,
    cancel_after: Option<(u64, CancellationToken)>,
}

/// In-memory chain that records every call and tracks the in-flight
/// transaction.
#[derive(Clone, Default)]
pub struct MockChainClient {
    state: Arc<Mutex<State>>,
}

#[allow(dead_code)]
impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submits(self, script: impl IntoIterator<Item = Submit>) -> Self {
        self.state.lock().unwrap().submits.extend(script);
        self
    }

    pub fn with_confirms(self, script: impl IntoIterator<Item = Confirm>) -> Self {
        self.state.lock().unwrap().confirms.extend(script);
        self
    }

    pub fn unreachable(self) -> Self {
        self.state.lock().unwrap().unreachable = true;
        self
    }

    /// Cancel `token` once `confirmations` transfers have confirmed.
    pub fn cancel_after(self, confirmations: u64, token: CancellationToken) -> Self {
        self.state.lock().unwrap().cancel_after = Some((confirmations, token));
        self
    }

    pub fn submit_calls(&self) -> u64 {
        self.state.lock().unwrap().submit_calls
    }

    pub fn confirm_calls(&self) -> u64 {
        self.state.lock().unwrap().confirm_calls
    }

    pub fn requests(&self) -> Vec<TransferRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Hashes of accepted broadcasts, in order.
    pub fn hashes(&self) -> Vec<TxHash> {
        self.state.lock().unwrap().hashes.clone()
    }

    /// Submissions made while another transaction was still unconfirmed.
    pub fn overlapping_submits(&self) -> u32 {
        self.state.lock().unwrap().overlapping_submits
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    type Connection = ();
    type Signer = Address;

    async fn connect(&self, endpoint: &Endpoint) -> ChainResult<()> {
        if self.state.lock().unwrap().unreachable {
            return Err(ChainError::EndpointUnreachable {
                endpoint: endpoint.to_string(),
                reason: "connection refused".into(),
            });
        }
        Ok(())
    }

    async fn derive_signer(&self, _connection: &(), credential: &Credential) -> ChainResult<Address> {
        Ok(credential.to_signer()?.address())
    }

    fn signer_address(&self, signer: &Address) -> Address {
        *signer
    }

    async fn submit_transfer(
        &self,
        _signer: &Address,
        request: &TransferRequest,
    ) -> ChainResult<SubmittedTransaction> {
        let mut state = self.state.lock().unwrap();
        state.submit_calls += 1;
        if state.in_flight.is_some() {
            state.overlapping_submits += 1;
        }
        state.requests.push(request.clone());

        match state.submits.pop_front().unwrap_or(Submit::Accept) {
            Submit::Accept => {
                let hash = keccak256(state.submit_calls.to_be_bytes());
                state.in_flight = Some(hash);
                state.hashes.push(hash);
                Ok(SubmittedTransaction::pending(hash))
            }
            Submit::Transport => Err(ChainError::Transport("connection reset by peer".into())),
            Submit::Reject(reason) => Err(ChainError::RejectedByNetwork {
                reason,
                message: reason.to_string(),
            }),
        }
    }

    async fn await_confirmation(
        &self,
        _connection: &(),
        tx: &SubmittedTransaction,
    ) -> ChainResult<ConfirmationReceipt> {
        let step = {
            let mut state = self.state.lock().unwrap();
            state.confirm_calls += 1;
            let step = state.confirms.pop_front().unwrap_or(Confirm::Accept);
            if matches!(step, Confirm::Accept | Confirm::Revert) {
                state.in_flight = None;
            }
            if let Some((after, token)) = &state.cancel_after {
                if state.confirm_calls == *after {
                    token.cancel();
                }
            }
            (step, state.confirm_calls)
        };

        match step {
            (Confirm::Accept, block) => Ok(ConfirmationReceipt {
                hash: tx.hash(),
                block_number: block,
                gas_used: 21_000,
                effective_gas_price: 1_000_000_000,
            }),
            (Confirm::Revert, block) => Err(ChainError::TransactionReverted {
                hash: tx.hash(),
                block_number: block,
            }),
            (Confirm::Transport, _) => Err(ChainError::Transport("eof".into())),
            (Confirm::Hang, _) => std::future::pending().await,
        }
    }
}

#[allow(dead_code)]
pub fn credential() -> Credential {
    Credential::new(TEST_PRIVATE_KEY)
}

#[allow(dead_code)]
pub fn request() -> TransferRequest {
    TransferRequest::parse(RECIPIENT, "0.0001").unwrap()
}

/// Loop settings with short delays for tests.
#[allow(dead_code)]
pub fn settings(iterations: u64) -> LoopSettings {
    let mut settings = LoopSettings::new(Endpoint::named(NamedNetwork::Anvil), request(), iterations);
    settings.backoff = Backoff::new(10, 100);
    settings.confirmation_timeout = Duration::from_secs(30);
    settings
}
