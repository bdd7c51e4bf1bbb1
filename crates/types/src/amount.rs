use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative integer number of token minor units.
///
/// The scale is the token's decimals: with a 6-decimal stablecoin,
/// `CurrencyAmount::from(12_500_000u64)` is 12.50. Amounts are never held as
/// binary floats; decimal strings are converted with exact scaling by
/// `castpos_core::request::parse_amount`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurrencyAmount(U256);

impl CurrencyAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub const fn from_units(units: U256) -> Self {
        Self(units)
    }

    /// Raw minor units, as they go on chain (`uint256`)
    pub const fn units(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtraction clamped at zero
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl From<u64> for CurrencyAmount {
    fn from(units: u64) -> Self {
        Self(U256::from(units))
    }
}

impl From<u128> for CurrencyAmount {
    fn from(units: u128) -> Self {
        Self(U256::from(units))
    }
}

impl From<U256> for CurrencyAmount {
    fn from(units: U256) -> Self {
        Self(units)
    }
}

/// Base-10 integer string with no separators, as used in payment URIs
impl Display for CurrencyAmount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyAmountError {
    #[error("Expected a base-10 integer amount in minor units, got '{0}'")]
    NotAnInteger(String),
    #[error("Amount '{0}' does not fit in 256 bits")]
    Overflow(String),
}

impl FromStr for CurrencyAmount {
    type Err = CurrencyAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CurrencyAmountError::NotAnInteger(s.to_string()));
        }
        U256::from_str_radix(s, 10)
            .map(Self)
            .map_err(|_| CurrencyAmountError::Overflow(s.to_string()))
    }
}

impl Serialize for CurrencyAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CurrencyAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CurrencyAmount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_plain_base10() {
        let amount = CurrencyAmount::from(1_500_000_000u64);
        assert_eq!(amount.to_string(), "1500000000");
        assert_eq!(CurrencyAmount::ZERO.to_string(), "0");
    }

    #[test]
    fn test_from_str_rejects_non_digits() {
        assert_eq!(
            "12500000".parse::<CurrencyAmount>().unwrap(),
            CurrencyAmount::from(12_500_000u64)
        );
        assert!("".parse::<CurrencyAmount>().is_err());
        assert!("-5".parse::<CurrencyAmount>().is_err());
        assert!("12.5".parse::<CurrencyAmount>().is_err());
        assert!("0x10".parse::<CurrencyAmount>().is_err());
        assert!("1_000".parse::<CurrencyAmount>().is_err());
    }

    #[test]
    fn test_from_str_overflow() {
        let too_big = "9".repeat(80);
        assert!(matches!(
            too_big.parse::<CurrencyAmount>(),
            Err(CurrencyAmountError::Overflow(_))
        ));
    }

    #[test]
    fn test_saturating_sub_never_negative() {
        let small = CurrencyAmount::from(5u64);
        let large = CurrencyAmount::from(9u64);
        assert_eq!(small.saturating_sub(large), CurrencyAmount::ZERO);
        assert_eq!(large.saturating_sub(small), CurrencyAmount::from(4u64));
        assert_eq!(small.checked_sub(large), None);
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let amount = CurrencyAmount::from(500_000_000u64);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"500000000\"");
        let back: CurrencyAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
        assert!(serde_json::from_str::<CurrencyAmount>("\"1.5\"").is_err());
    }
}
