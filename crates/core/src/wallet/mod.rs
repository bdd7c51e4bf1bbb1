//! The wallet capability the treasury and checkout screens lean on.
//!
//! Signing and broadcasting live outside this crate. A provider hands back a
//! [`TransferHandle`] once it accepted a transfer and later reports how that
//! transfer ended; nothing here retries on its behalf.

use alloy_primitives::Address;
use castpos_types::{CurrencyAmount, TransferHandle, TransferOutcome};

pub mod rpc;
pub mod sandbox;

pub use rpc::RpcWallet;
pub use sandbox::{SandboxOutcome, SandboxWallet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("No wallet connected")]
    NotConnected,
    #[error("Transfer rejected: {0}")]
    TransferRejected(String),
    #[error("Timed out waiting for transfer confirmation")]
    TransferTimedOut,
    #[error("Unknown transfer {0}")]
    UnknownTransfer(TransferHandle),
    #[error("Wallet RPC error: {0}")]
    Rpc(String),
}

pub trait WalletProvider {
    /// Address of the connected account, if any
    fn connected_address(&self) -> impl Future<Output = Option<Address>> + Send;

    /// Current `token` balance of `owner`, in minor units
    fn token_balance(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = Result<CurrencyAmount, WalletError>> + Send;

    /// Ask the wallet to send `amount` of `token` to `to`. Returns once the
    /// wallet accepted the request, before it is confirmed.
    fn submit_transfer(
        &self,
        token: Address,
        to: Address,
        amount: CurrencyAmount,
    ) -> impl Future<Output = Result<TransferHandle, WalletError>> + Send;

    /// Wait for the chain's verdict on a submitted transfer
    fn await_confirmation(
        &self,
        handle: TransferHandle,
    ) -> impl Future<Output = Result<TransferOutcome, WalletError>> + Send;
}
