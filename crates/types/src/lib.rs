//! Shared value types for Cast-POS.
//!
//! Everything in this crate is a plain value: amounts in minor units, transfer
//! handles, the discovery manifest document and the workspace defaults. None
//! of it carries shared mutable state.

pub use alloy_primitives::Address;

pub mod amount;
pub mod constants;
pub mod manifest;
pub mod transfer;

pub use amount::{CurrencyAmount, CurrencyAmountError};
pub use manifest::AppManifest;
pub use transfer::{TransferHandle, TransferOutcome};

/// EVM chain identifier (e.g. 84532 for Base Sepolia)
pub type ChainId = u64;
