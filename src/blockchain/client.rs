//! The chain capability consumed by the transfer loop.

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::blockchain::network::Endpoint;
use crate::blockchain::transaction::{ConfirmationReceipt, SubmittedTransaction, TransferRequest};
use crate::blockchain::types::ChainResult;
use crate::blockchain::wallet::Credential;

/// Connection, signing, broadcast and confirmation against one network.
///
/// Implementations own transport details and per-call RPC timeouts. They do
/// not retry; retry and abort decisions belong to the caller.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// A logical RPC session.
    type Connection: Send + Sync;
    /// A key-bound identity able to authorize transfers.
    type Signer: Send + Sync;

    /// Establish a session. Fails with `EndpointUnreachable` or `ChainMismatch`.
    async fn connect(&self, endpoint: &Endpoint) -> ChainResult<Self::Connection>;

    /// Fails with `InvalidCredential` when the key is malformed.
    async fn derive_signer(
        &self,
        connection: &Self::Connection,
        credential: &Credential,
    ) -> ChainResult<Self::Signer>;

    /// Address the signer sends from.
    fn signer_address(&self, signer: &Self::Signer) -> Address;

    /// Build, sign and broadcast one transfer. The signer assigns the nonce.
    async fn submit_transfer(
        &self,
        signer: &Self::Signer,
        request: &TransferRequest,
    ) -> ChainResult<SubmittedTransaction>;

    /// Suspend until the transaction is included with enough confirmations.
    ///
    /// Never returns on a stalled network; callers bound it with a deadline.
    async fn await_confirmation(
        &self,
        connection: &Self::Connection,
        tx: &SubmittedTransaction,
    ) -> ChainResult<ConfirmationReceipt>;
}
