//! One attempt at sweeping surplus to the reserve.
//!
//! ```text
//! Idle -> Submitting -> Confirming -> Settled
//!             |             |
//!             +-------------+------> Failed
//! ```
//!
//! `Failed` and `Settled` are terminal for the attempt; [`AllocationState::reset`]
//! re-arms the machine on the next user action. Nothing here retries a
//! transfer: a second submission only ever happens because the user asked.

use std::fmt::{self, Display, Formatter};

use alloy_primitives::Address;
use castpos_types::{CurrencyAmount, TransferHandle, TransferOutcome};
use tracing::{info, warn};

use super::{SurplusResult, TargetParse, is_eligible};
use crate::wallet::{WalletError, WalletProvider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationFailure {
    /// The wallet or the chain refused the transfer; the message is theirs
    Rejected(String),
    TimedOut,
}

impl Display for AllocationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AllocationFailure::Rejected(reason) => write!(f, "transfer rejected: {reason}"),
            AllocationFailure::TimedOut => write!(f, "transfer confirmation timed out"),
        }
    }
}

impl From<WalletError> for AllocationFailure {
    fn from(error: WalletError) -> Self {
        match error {
            WalletError::TransferTimedOut => AllocationFailure::TimedOut,
            WalletError::TransferRejected(reason) => AllocationFailure::Rejected(reason),
            other => AllocationFailure::Rejected(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllocationState {
    #[default]
    Idle,
    Submitting {
        amount: CurrencyAmount,
        reserve: Address,
    },
    Confirming {
        amount: CurrencyAmount,
        reserve: Address,
        handle: TransferHandle,
    },
    Settled {
        amount: CurrencyAmount,
        reserve: Address,
        handle: TransferHandle,
    },
    Failed {
        amount: CurrencyAmount,
        failure: AllocationFailure,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("Nothing to allocate: no surplus or no reserve address configured")]
    NotEligible,
    #[error("An allocation is already in progress")]
    InProgress,
    #[error("Cannot {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
    #[error("Failed to read treasury balance: {0}")]
    Balance(WalletError),
}

impl AllocationState {
    pub fn name(&self) -> &'static str {
        match self {
            AllocationState::Idle => "idle",
            AllocationState::Submitting { .. } => "submitting",
            AllocationState::Confirming { .. } => "confirming",
            AllocationState::Settled { .. } => "settled",
            AllocationState::Failed { .. } => "failed",
        }
    }

    /// Whether a transfer is out with the wallet; re-submission must be
    /// disabled while this holds
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            AllocationState::Submitting { .. } | AllocationState::Confirming { .. }
        )
    }

    fn invalid(&self, event: &'static str) -> AllocationError {
        if self.is_in_flight() {
            AllocationError::InProgress
        } else {
            AllocationError::InvalidTransition {
                state: self.name(),
                event,
            }
        }
    }

    /// `Idle -> Submitting`, only for a non-zero surplus with a reserve.
    /// The `eligible` flag on `result` is not trusted on its own.
    pub fn begin(
        &mut self,
        result: &SurplusResult,
        reserve: Option<Address>,
    ) -> Result<(), AllocationError> {
        if !matches!(self, AllocationState::Idle) {
            return Err(self.invalid("start an allocation"));
        }
        let reserve = match reserve {
            Some(reserve) if result.eligible && is_eligible(result.surplus, true) => reserve,
            _ => return Err(AllocationError::NotEligible),
        };
        *self = AllocationState::Submitting {
            amount: result.surplus,
            reserve,
        };
        Ok(())
    }

    /// `Submitting -> Confirming` once the wallet returned a pending handle
    pub fn accepted(&mut self, handle: TransferHandle) -> Result<(), AllocationError> {
        let AllocationState::Submitting { amount, reserve } = *self else {
            return Err(self.invalid("record an accepted transfer"));
        };
        *self = AllocationState::Confirming {
            amount,
            reserve,
            handle,
        };
        Ok(())
    }

    /// `Confirming -> Settled` on the confirmation signal
    pub fn confirmed(&mut self) -> Result<(), AllocationError> {
        let AllocationState::Confirming {
            amount,
            reserve,
            handle,
        } = *self
        else {
            return Err(self.invalid("confirm a transfer"));
        };
        *self = AllocationState::Settled {
            amount,
            reserve,
            handle,
        };
        Ok(())
    }

    /// `Submitting | Confirming -> Failed`
    pub fn fail(&mut self, failure: AllocationFailure) -> Result<(), AllocationError> {
        let amount = match self {
            AllocationState::Submitting { amount, .. } | AllocationState::Confirming { amount, .. } => {
                *amount
            }
            _ => {
                return Err(AllocationError::InvalidTransition {
                    state: self.name(),
                    event: "fail a transfer",
                });
            }
        };
        *self = AllocationState::Failed { amount, failure };
        Ok(())
    }

    /// Back to `Idle` from any resting state
    pub fn reset(&mut self) -> Result<(), AllocationError> {
        if self.is_in_flight() {
            return Err(AllocationError::InProgress);
        }
        *self = AllocationState::Idle;
        Ok(())
    }
}

impl Display for AllocationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AllocationState::Idle => write!(f, "idle"),
            AllocationState::Submitting { amount, reserve } => {
                write!(f, "submitting {amount} units to {reserve}")
            }
            AllocationState::Confirming { handle, .. } => write!(f, "confirming {handle}"),
            AllocationState::Settled { amount, handle, .. } => {
                write!(f, "settled {amount} units in {handle}")
            }
            AllocationState::Failed { failure, .. } => write!(f, "failed: {failure}"),
        }
    }
}

/// Drives allocation attempts for one treasury through a wallet provider.
///
/// `allocate` borrows the allocator mutably for the whole attempt, so two
/// attempts can never overlap on the same allocator.
pub struct Allocator<W> {
    wallet: W,
    token: Address,
    reserve: Option<Address>,
    state: AllocationState,
}

impl<W: WalletProvider> Allocator<W> {
    pub fn new(wallet: W, token: Address, reserve: Option<Address>) -> Self {
        Self {
            wallet,
            token,
            reserve,
            state: AllocationState::Idle,
        }
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn reserve_configured(&self) -> bool {
        self.reserve.is_some()
    }

    /// Read the connected wallet's balance now and derive a fresh result.
    /// Call this again after `Settled` instead of reusing the old one.
    pub async fn refresh(&self, target: &TargetParse) -> Result<SurplusResult, AllocationError> {
        let owner = self
            .wallet
            .connected_address()
            .await
            .ok_or(AllocationError::Balance(WalletError::NotConnected))?;
        let balance = self
            .wallet
            .token_balance(self.token, owner)
            .await
            .map_err(AllocationError::Balance)?;
        Ok(SurplusResult::evaluate(
            balance,
            target,
            self.reserve_configured(),
        ))
    }

    /// Run one attempt to completion and return where it ended
    pub async fn allocate(
        &mut self,
        result: &SurplusResult,
    ) -> Result<&AllocationState, AllocationError> {
        self.allocate_with(result, |_| {}).await
    }

    /// Like [`Allocator::allocate`], calling `on_transition` after every
    /// state change
    pub async fn allocate_with(
        &mut self,
        result: &SurplusResult,
        mut on_transition: impl FnMut(&AllocationState),
    ) -> Result<&AllocationState, AllocationError> {
        self.state.begin(result, self.reserve)?;
        on_transition(&self.state);

        let AllocationState::Submitting { amount, reserve } = self.state else {
            return Err(self.state.invalid("submit a transfer"));
        };
        info!("Allocating {} units of surplus to reserve {}", amount, reserve);

        let handle = match self.wallet.submit_transfer(self.token, reserve, amount).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Allocation submission rejected: {}", e);
                self.state.fail(e.into())?;
                on_transition(&self.state);
                return Ok(&self.state);
            }
        };
        self.state.accepted(handle)?;
        on_transition(&self.state);

        match self.wallet.await_confirmation(handle).await {
            Ok(TransferOutcome::Settled) => {
                info!("Allocation {} settled", handle);
                self.state.confirmed()?;
            }
            Ok(TransferOutcome::Failed { reason }) => {
                warn!("Allocation {} failed on chain: {}", handle, reason);
                self.state.fail(AllocationFailure::Rejected(reason))?;
            }
            Err(e) => {
                warn!("Allocation {} did not confirm: {}", handle, e);
                self.state.fail(e.into())?;
            }
        }
        on_transition(&self.state);
        Ok(&self.state)
    }

    /// Re-arm after `Settled` or `Failed`
    pub fn reset(&mut self) -> Result<(), AllocationError> {
        self.state.reset()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{B256, address};

    use super::*;
    use crate::{
        treasury::parse_target,
        wallet::{SandboxOutcome, SandboxWallet},
    };

    const TOKEN: Address = address!("0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d");
    const MERCHANT: Address = address!("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    const RESERVE: Address = address!("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");

    fn eligible(units: u64) -> SurplusResult {
        SurplusResult {
            surplus: CurrencyAmount::from(units),
            eligible: true,
        }
    }

    fn funded_wallet(balance: u64) -> SandboxWallet {
        SandboxWallet::new(Some(MERCHANT)).with_balance(
            TOKEN,
            MERCHANT,
            CurrencyAmount::from(balance),
        )
    }

    #[test]
    fn test_begin_requires_eligibility() {
        let mut state = AllocationState::Idle;
        let not_eligible = SurplusResult {
            surplus: CurrencyAmount::from(5u64),
            eligible: false,
        };
        assert_eq!(
            state.begin(&not_eligible, Some(RESERVE)),
            Err(AllocationError::NotEligible)
        );
        assert_eq!(
            state.begin(&eligible(5), None),
            Err(AllocationError::NotEligible)
        );
        assert_eq!(state, AllocationState::Idle);

        state.begin(&eligible(5), Some(RESERVE)).unwrap();
        assert!(state.is_in_flight());
    }

    #[test]
    fn test_illegal_transitions() {
        let handle = TransferHandle(B256::repeat_byte(1));
        let mut state = AllocationState::Idle;
        assert!(state.accepted(handle).is_err());
        assert!(state.confirmed().is_err());
        assert!(state.fail(AllocationFailure::TimedOut).is_err());

        state.begin(&eligible(5), Some(RESERVE)).unwrap();
        assert_eq!(
            state.begin(&eligible(5), Some(RESERVE)),
            Err(AllocationError::InProgress)
        );
        assert_eq!(state.reset(), Err(AllocationError::InProgress));
        assert_eq!(state.confirmed(), Err(AllocationError::InProgress));

        state.accepted(handle).unwrap();
        state.confirmed().unwrap();
        assert_eq!(state.name(), "settled");
        assert!(matches!(
            state.begin(&eligible(5), Some(RESERVE)),
            Err(AllocationError::InvalidTransition { state: "settled", .. })
        ));
        state.reset().unwrap();
        assert_eq!(state, AllocationState::Idle);
    }

    #[tokio::test]
    async fn test_allocation_settles_and_refreshes() {
        let mut allocator = Allocator::new(funded_wallet(1_500_000_000), TOKEN, Some(RESERVE));
        let target = parse_target("1000", 6);

        let result = allocator.refresh(&target).await.unwrap();
        assert_eq!(result.surplus, CurrencyAmount::from(500_000_000u64));
        assert!(result.eligible);

        let mut seen = vec![];
        let end = allocator
            .allocate_with(&result, |state| seen.push(state.name()))
            .await
            .unwrap()
            .clone();
        assert_eq!(seen, vec!["submitting", "confirming", "settled"]);
        assert!(matches!(end, AllocationState::Settled { amount, reserve, .. }
            if amount == CurrencyAmount::from(500_000_000u64) && reserve == RESERVE));

        // a new balance is read after settlement, not assumed
        let after = allocator.refresh(&target).await.unwrap();
        assert_eq!(after.surplus, CurrencyAmount::ZERO);
        assert!(!after.eligible);
        assert_eq!(
            allocator.wallet().balance_of(TOKEN, RESERVE),
            CurrencyAmount::from(500_000_000u64)
        );
    }

    /// Only the trait's bounds are visible here, so this compiles only if
    /// wallet futures are `Send`
    fn spawn_allocation<W>(
        mut allocator: Allocator<W>,
        result: SurplusResult,
    ) -> tokio::task::JoinHandle<Result<AllocationState, AllocationError>>
    where
        W: WalletProvider + Send + Sync + 'static,
    {
        tokio::spawn(async move { allocator.allocate(&result).await.cloned() })
    }

    #[tokio::test]
    async fn test_allocation_runs_on_spawned_task() {
        let allocator = Allocator::new(funded_wallet(1_500_000_000), TOKEN, Some(RESERVE));
        let end = spawn_allocation(allocator, eligible(500_000_000))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(end.name(), "settled");
    }

    #[tokio::test]
    async fn test_rejection_is_terminal_until_reset() {
        let wallet = funded_wallet(10).with_outcome(SandboxOutcome::RejectSubmission(
            "user denied transaction".to_string(),
        ));
        let mut allocator = Allocator::new(wallet, TOKEN, Some(RESERVE));

        let end = allocator.allocate(&eligible(4)).await.unwrap().clone();
        assert_eq!(
            end,
            AllocationState::Failed {
                amount: CurrencyAmount::from(4u64),
                failure: AllocationFailure::Rejected("user denied transaction".to_string()),
            }
        );

        // no silent retry: the next attempt needs an explicit reset
        assert!(matches!(
            allocator.allocate(&eligible(4)).await,
            Err(AllocationError::InvalidTransition { state: "failed", .. })
        ));
        assert_eq!(allocator.wallet().submissions(), 0);

        allocator.wallet().set_outcome(SandboxOutcome::Settle);
        allocator.reset().unwrap();
        let end = allocator.allocate(&eligible(4)).await.unwrap();
        assert_eq!(end.name(), "settled");
        assert_eq!(allocator.wallet().submissions(), 1);
    }

    #[tokio::test]
    async fn test_timeout_and_revert_fail() {
        let wallet = funded_wallet(10).with_outcome(SandboxOutcome::TimeOut);
        let mut allocator = Allocator::new(wallet, TOKEN, Some(RESERVE));
        let end = allocator.allocate(&eligible(3)).await.unwrap();
        assert!(matches!(
            end,
            AllocationState::Failed {
                failure: AllocationFailure::TimedOut,
                ..
            }
        ));

        allocator.reset().unwrap();
        allocator
            .wallet()
            .set_outcome(SandboxOutcome::Revert("execution reverted".to_string()));
        let end = allocator.allocate(&eligible(3)).await.unwrap();
        assert_eq!(end.to_string(), "failed: transfer rejected: execution reverted");
    }

    #[tokio::test]
    async fn test_no_reserve_never_submits() {
        let mut allocator = Allocator::new(funded_wallet(2_000_000_000), TOKEN, None);
        let result = allocator.refresh(&parse_target("1000", 6)).await.unwrap();
        assert_eq!(result.surplus, CurrencyAmount::from(1_000_000_000u64));
        assert!(!result.eligible);
        assert_eq!(
            allocator.allocate(&result).await,
            Err(AllocationError::NotEligible)
        );
        assert_eq!(allocator.wallet().submissions(), 0);
    }

    #[tokio::test]
    async fn test_zero_surplus_marked_eligible_never_submits() {
        let forged = SurplusResult {
            surplus: CurrencyAmount::ZERO,
            eligible: true,
        };
        let mut state = AllocationState::Idle;
        assert_eq!(
            state.begin(&forged, Some(RESERVE)),
            Err(AllocationError::NotEligible)
        );
        assert_eq!(state, AllocationState::Idle);

        let mut allocator = Allocator::new(funded_wallet(2_000_000_000), TOKEN, Some(RESERVE));
        assert_eq!(
            allocator.allocate(&forged).await,
            Err(AllocationError::NotEligible)
        );
        assert_eq!(allocator.state(), &AllocationState::Idle);
        assert_eq!(allocator.wallet().submissions(), 0);
    }
}
