//! Treasury surplus accounting.
//!
//! The surplus is whatever the merchant holds above the operating target.
//! All functions here are pure and cheap, meant to be re-run on every balance
//! update or keystroke in the target field.

use castpos_types::CurrencyAmount;
use serde::Serialize;
use tracing::warn;

use crate::request::scale_decimal;

pub mod allocation;

pub use allocation::{AllocationError, AllocationFailure, AllocationState, Allocator};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreasuryError {
    #[error("Operating target '{0}' is not a valid amount; surplus is treated as zero")]
    TargetParseDegraded(String),
}

/// `max(0, balance - target)`, in integer minor units
pub fn compute_surplus(balance: CurrencyAmount, target: CurrencyAmount) -> CurrencyAmount {
    balance.saturating_sub(target)
}

/// A surplus can be swept only if there is one and somewhere to send it
pub fn is_eligible(surplus: CurrencyAmount, reserve_configured: bool) -> bool {
    !surplus.is_zero() && reserve_configured
}

/// Outcome of reading the operating target field.
///
/// The target is advisory, so a bad value never becomes an error for the
/// caller: it degrades to "no surplus" and carries the reason for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetParse {
    Parsed(CurrencyAmount),
    Degraded(TreasuryError),
}

impl TargetParse {
    pub fn target(&self) -> Option<CurrencyAmount> {
        match self {
            TargetParse::Parsed(target) => Some(*target),
            TargetParse::Degraded(_) => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TargetParse::Degraded(_))
    }
}

/// Parse an operating target with the same grammar as payment amounts.
///
/// A target of zero is accepted (sweep everything above zero). Anything that
/// does not parse, including an empty field, is [`TargetParse::Degraded`].
pub fn parse_target(input: &str, decimals: u8) -> TargetParse {
    match scale_decimal(input, decimals) {
        Some(units) => TargetParse::Parsed(CurrencyAmount::from_units(units)),
        None => {
            warn!("Operating target {:?} could not be parsed, surplus set to zero", input);
            TargetParse::Degraded(TreasuryError::TargetParseDegraded(input.to_string()))
        }
    }
}

/// Balance and target read at the same logical instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreasurySnapshot {
    pub balance: CurrencyAmount,
    pub target: CurrencyAmount,
}

impl TreasurySnapshot {
    pub fn new(balance: CurrencyAmount, target: CurrencyAmount) -> Self {
        Self { balance, target }
    }

    pub fn surplus(&self) -> CurrencyAmount {
        compute_surplus(self.balance, self.target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurplusResult {
    pub surplus: CurrencyAmount,
    pub eligible: bool,
}

impl SurplusResult {
    pub fn compute(snapshot: &TreasurySnapshot, reserve_configured: bool) -> Self {
        let surplus = snapshot.surplus();
        SurplusResult {
            surplus,
            eligible: is_eligible(surplus, reserve_configured),
        }
    }

    /// Derive the result straight from a balance and the target field.
    /// A degraded target yields zero surplus.
    pub fn evaluate(balance: CurrencyAmount, target: &TargetParse, reserve_configured: bool) -> Self {
        match target.target() {
            Some(target) => Self::compute(&TreasurySnapshot::new(balance, target), reserve_configured),
            None => SurplusResult {
                surplus: CurrencyAmount::ZERO,
                eligible: false,
            },
        }
    }
}
