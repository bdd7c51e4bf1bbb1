//! Payment requests: from a typed-in dollar amount to a scannable URI.
//!
//! A request is a projection of its inputs. It is rebuilt whenever the
//! amount or the recipient changes and is never edited in place, so the
//! same inputs always produce byte-identical URIs.

use std::fmt::{self, Display, Formatter};

use alloy_primitives::Address;
use castpos_types::{ChainId, CurrencyAmount, constants::PAYMENT_URI_SCHEME};
use serde::{Deserialize, Serialize};

mod amount;

pub use amount::{AmountInput, accepts_keystroke, format_amount, parse_amount, parse_balance};
pub(crate) use amount::scale_decimal;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid amount '{0}': expected a positive decimal number")]
    InvalidAmount(String),
    #[error("No recipient address: connect a wallet before requesting payment")]
    MissingRecipient,
}

/// Canonical ERC-20 transfer request:
/// `ethereum:<token>/transfer?address=<recipient>&uint256=<amount>&chainId=<chain>`
///
/// `encode(12500000, 84532, "0xToken", "0xRecipient")` yields
/// `ethereum:0xToken/transfer?address=0xRecipient&uint256=12500000&chainId=84532`.
/// Fails with [`RequestError::MissingRecipient`] when the recipient is blank.
pub fn encode(
    amount: CurrencyAmount,
    chain_id: ChainId,
    token_address: &str,
    recipient_address: &str,
) -> Result<String, RequestError> {
    if recipient_address.trim().is_empty() {
        return Err(RequestError::MissingRecipient);
    }
    Ok(transfer_uri(amount, chain_id, token_address, recipient_address))
}

fn transfer_uri(
    amount: CurrencyAmount,
    chain_id: ChainId,
    token_address: &str,
    recipient_address: &str,
) -> String {
    format!(
        "{PAYMENT_URI_SCHEME}:{token_address}/transfer?address={recipient_address}&uint256={amount}&chainId={chain_id}"
    )
}

/// An immutable request for `amount` of `token_address` paid to
/// `recipient_address` on `chain_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub token_address: Address,
    pub recipient_address: Address,
    pub amount: CurrencyAmount,
    pub chain_id: ChainId,
}

impl PaymentRequest {
    /// Build a request. An unset (or zero) recipient is a
    /// [`RequestError::MissingRecipient`]; a zero amount is an
    /// [`RequestError::InvalidAmount`].
    pub fn new(
        amount: CurrencyAmount,
        chain_id: ChainId,
        token_address: Address,
        recipient_address: Option<Address>,
    ) -> Result<Self, RequestError> {
        let recipient_address = recipient_address
            .filter(|address| !address.is_zero())
            .ok_or(RequestError::MissingRecipient)?;
        if amount.is_zero() {
            return Err(RequestError::InvalidAmount(amount.to_string()));
        }
        Ok(PaymentRequest {
            token_address,
            recipient_address,
            amount,
            chain_id,
        })
    }

    /// Parse `input` with the token's decimals and build the request in one go
    pub fn from_input(
        input: &str,
        decimals: u8,
        chain_id: ChainId,
        token_address: Address,
        recipient_address: Option<Address>,
    ) -> Result<Self, RequestError> {
        let amount = parse_amount(input, decimals)?;
        Self::new(amount, chain_id, token_address, recipient_address)
    }

    /// The canonical URI, with both addresses in checksum form
    pub fn to_uri(&self) -> String {
        transfer_uri(
            self.amount,
            self.chain_id,
            &self.token_address.to_checksum(None),
            &self.recipient_address.to_checksum(None),
        )
    }
}

impl Display for PaymentRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}
