use std::collections::HashMap;

use alloy_primitives::{Address, keccak256};
use castpos_types::{CurrencyAmount, TransferHandle, TransferOutcome};
use parking_lot::Mutex;
use tracing::debug;

use super::{WalletError, WalletProvider};

/// How the sandbox answers the next transfer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SandboxOutcome {
    /// Accept, then confirm and move the funds
    #[default]
    Settle,
    /// Refuse at submission time
    RejectSubmission(String),
    /// Accept, then report the transfer as failed on chain
    Revert(String),
    /// Accept, then never confirm
    TimeOut,
}

#[derive(Debug, Clone, Copy)]
struct PendingTransfer {
    token: Address,
    from: Address,
    to: Address,
    amount: CurrencyAmount,
}

#[derive(Debug, Default)]
struct Ledger {
    balances: HashMap<(Address, Address), CurrencyAmount>,
    pending: HashMap<TransferHandle, PendingTransfer>,
    nonce: u64,
}

/// In-memory wallet for local runs and tests
#[derive(Debug, Default)]
pub struct SandboxWallet {
    connected: Option<Address>,
    ledger: Mutex<Ledger>,
    outcome: Mutex<SandboxOutcome>,
}

impl SandboxWallet {
    pub fn new(connected: Option<Address>) -> Self {
        Self {
            connected,
            ..Default::default()
        }
    }

    /// Set the `token` balance held by `owner`
    pub fn with_balance(self, token: Address, owner: Address, amount: CurrencyAmount) -> Self {
        self.set_balance(token, owner, amount);
        self
    }

    pub fn with_outcome(self, outcome: SandboxOutcome) -> Self {
        self.set_outcome(outcome);
        self
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: CurrencyAmount) {
        self.ledger.lock().balances.insert((token, owner), amount);
    }

    pub fn set_outcome(&self, outcome: SandboxOutcome) {
        *self.outcome.lock() = outcome;
    }

    pub fn balance_of(&self, token: Address, owner: Address) -> CurrencyAmount {
        self.ledger
            .lock()
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    /// Number of transfers accepted so far
    pub fn submissions(&self) -> u64 {
        self.ledger.lock().nonce
    }
}

impl WalletProvider for SandboxWallet {
    async fn connected_address(&self) -> Option<Address> {
        self.connected
    }

    async fn token_balance(
        &self,
        token: Address,
        owner: Address,
    ) -> Result<CurrencyAmount, WalletError> {
        Ok(self.balance_of(token, owner))
    }

    async fn submit_transfer(
        &self,
        token: Address,
        to: Address,
        amount: CurrencyAmount,
    ) -> Result<TransferHandle, WalletError> {
        let from = self.connected.ok_or(WalletError::NotConnected)?;
        if let SandboxOutcome::RejectSubmission(reason) = &*self.outcome.lock() {
            return Err(WalletError::TransferRejected(reason.clone()));
        }

        let mut ledger = self.ledger.lock();
        let available = ledger.balances.get(&(token, from)).copied().unwrap_or_default();
        if available < amount {
            return Err(WalletError::TransferRejected(format!(
                "insufficient balance: {available} < {amount}"
            )));
        }

        ledger.nonce += 1;
        let mut preimage = Vec::with_capacity(20 * 3 + 32 + 8);
        preimage.extend_from_slice(token.as_slice());
        preimage.extend_from_slice(from.as_slice());
        preimage.extend_from_slice(to.as_slice());
        preimage.extend_from_slice(&amount.units().to_be_bytes::<32>());
        preimage.extend_from_slice(&ledger.nonce.to_be_bytes());
        let handle = TransferHandle(keccak256(&preimage));

        ledger.pending.insert(
            handle,
            PendingTransfer {
                token,
                from,
                to,
                amount,
            },
        );
        debug!("Sandbox accepted transfer {} of {} to {}", handle, amount, to);
        Ok(handle)
    }

    async fn await_confirmation(
        &self,
        handle: TransferHandle,
    ) -> Result<TransferOutcome, WalletError> {
        let outcome = self.outcome.lock().clone();
        let mut ledger = self.ledger.lock();
        let transfer = ledger
            .pending
            .remove(&handle)
            .ok_or(WalletError::UnknownTransfer(handle))?;

        match outcome {
            SandboxOutcome::Settle => {
                let from_key = (transfer.token, transfer.from);
                let to_key = (transfer.token, transfer.to);
                let from_balance = ledger.balances.get(&from_key).copied().unwrap_or_default();
                let Some(remaining) = from_balance.checked_sub(transfer.amount) else {
                    return Ok(TransferOutcome::Failed {
                        reason: "insufficient balance at settlement".to_string(),
                    });
                };
                let to_balance = ledger.balances.get(&to_key).copied().unwrap_or_default();
                let Some(credited) = to_balance.checked_add(transfer.amount) else {
                    return Ok(TransferOutcome::Failed {
                        reason: "recipient balance overflow".to_string(),
                    });
                };
                ledger.balances.insert(from_key, remaining);
                ledger.balances.insert(to_key, credited);
                Ok(TransferOutcome::Settled)
            }
            SandboxOutcome::Revert(reason) => Ok(TransferOutcome::Failed { reason }),
            SandboxOutcome::TimeOut => Err(WalletError::TransferTimedOut),
            SandboxOutcome::RejectSubmission(reason) => Err(WalletError::TransferRejected(reason)),
        }
    }
}
