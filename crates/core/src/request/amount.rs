use alloy_primitives::U256;
use castpos_types::{
    CurrencyAmount,
    constants::{DISPLAY_FRACTION_DIGITS, INPUT_FRACTION_DIGITS},
};

use super::RequestError;

/// `10^exp` as a 256-bit integer; `exp` stays within token decimals
fn ten_pow(exp: u32) -> U256 {
    let ten = U256::from(10u64);
    (0..exp).fold(U256::from(1u64), |acc, _| acc.saturating_mul(ten))
}

/// Scale a decimal string by `10^decimals` without rounding.
///
/// Accepts `^\d+(\.\d{1,decimals})?$` only. Zero is a valid result here;
/// callers decide whether zero is acceptable.
pub(crate) fn scale_decimal(input: &str, decimals: u8) -> Option<U256> {
    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => {
            // "12." and fractions longer than the token allows are both malformed
            if fraction.is_empty() || fraction.len() > decimals as usize {
                return None;
            }
            (whole, fraction)
        }
        None => (input, ""),
    };

    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat_n('0', decimals as usize - fraction.len()));

    U256::from_str_radix(&digits, 10).ok()
}

/// Parse a human-entered decimal string into minor units.
///
/// The input must look like `^\d+(\.\d{1,decimals})?$` and be strictly
/// positive. Scaling is done on the digits themselves (integer part followed
/// by the zero-padded fraction), so no value is ever rounded.
///
/// ```
/// use castpos_core::request::parse_amount;
///
/// let amount = parse_amount("12.5", 6).unwrap();
/// assert_eq!(amount.to_string(), "12500000");
/// ```
pub fn parse_amount(input: &str, decimals: u8) -> Result<CurrencyAmount, RequestError> {
    match scale_decimal(input, decimals) {
        Some(units) if !units.is_zero() => Ok(CurrencyAmount::from_units(units)),
        _ => Err(RequestError::InvalidAmount(input.to_string())),
    }
}

/// Like [`parse_amount`] but zero is allowed, for balances typed by hand
pub fn parse_balance(input: &str, decimals: u8) -> Result<CurrencyAmount, RequestError> {
    scale_decimal(input.trim(), decimals)
        .map(CurrencyAmount::from_units)
        .ok_or_else(|| RequestError::InvalidAmount(input.to_string()))
}

/// Format minor units for display, rounded half-up to two fractional digits.
///
/// Only meant for people: on-chain values always use the raw units.
pub fn format_amount(amount: CurrencyAmount, decimals: u8) -> String {
    let units = amount.units();
    let display = DISPLAY_FRACTION_DIGITS;
    let decimals = decimals as u32;

    let hundredths = if decimals >= display {
        let divisor = ten_pow(decimals - display);
        let quotient = units / divisor;
        let remainder = units % divisor;
        if remainder.saturating_mul(U256::from(2u64)) >= divisor && !remainder.is_zero() {
            quotient.saturating_add(U256::from(1u64))
        } else {
            quotient
        }
    } else {
        units.saturating_mul(ten_pow(display - decimals))
    };

    let scale = ten_pow(display);
    let whole = hundredths / scale;
    let fraction = (hundredths % scale).as_limbs()[0];
    format!("{whole}.{fraction:0width$}", width = display as usize)
}

/// Whether a keystroke leaves the amount field in an accepted shape.
///
/// The field takes digits with at most one dot and two fractional digits.
/// Accepted text can still be an invalid amount (`"12."`, `"0"`); that is
/// decided by [`AmountInput::classify`].
pub fn accepts_keystroke(value: &str) -> bool {
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };
    whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
        && fraction.len() <= INPUT_FRACTION_DIGITS
}

/// What the user currently has in an amount field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountInput {
    /// Nothing entered yet; no request and no error message
    Absent,
    /// Something entered that is not a positive amount
    Invalid(RequestError),
    Valid(CurrencyAmount),
}

impl AmountInput {
    pub fn classify(input: &str, decimals: u8) -> Self {
        if input.trim().is_empty() {
            return AmountInput::Absent;
        }
        match parse_amount(input, decimals) {
            Ok(amount) => AmountInput::Valid(amount),
            Err(e) => AmountInput::Invalid(e),
        }
    }

    pub fn amount(&self) -> Option<CurrencyAmount> {
        match self {
            AmountInput::Valid(amount) => Some(*amount),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        match self {
            AmountInput::Invalid(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AmountInput::Absent)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn units(n: u64) -> CurrencyAmount {
        CurrencyAmount::from(n)
    }

    #[test]
    fn test_parse_balance_allows_zero() {
        assert_eq!(parse_balance("0", 6).unwrap(), CurrencyAmount::ZERO);
        assert_eq!(parse_balance(" 1500 ", 6).unwrap(), units(1_500_000_000));
        assert!(parse_balance("", 6).is_err());
        assert!(parse_balance("1.2345678", 6).is_err());
    }

    #[test]
    fn test_parse_amount_scales_exactly() {
        assert_eq!(parse_amount("12.5", 6).unwrap(), units(12_500_000));
        assert_eq!(parse_amount("12.50", 6).unwrap(), units(12_500_000));
        assert_eq!(parse_amount("1000", 6).unwrap(), units(1_000_000_000));
        assert_eq!(parse_amount("0.01", 6).unwrap(), units(10_000));
        assert_eq!(parse_amount("0.000001", 6).unwrap(), units(1));
        // 0.29 * 10^6 is 289999.99... in binary floating point
        assert_eq!(parse_amount("0.29", 6).unwrap(), units(290_000));
        assert_eq!(parse_amount("19.99", 6).unwrap(), units(19_990_000));
    }

    #[test]
    fn test_parse_amount_rejects_non_positive() {
        for input in ["0", "0.0", "0.000000", "-5", "-0.5"] {
            assert_eq!(
                parse_amount(input, 6),
                Err(RequestError::InvalidAmount(input.to_string())),
                "{input}"
            );
        }
    }

    #[test]
    fn test_parse_amount_rejects_malformed() {
        for input in [
            "", ".5", "12.", "1.2.3", "abc", "1e3", " 12", "12 ", "+12", "1,000", "12.5x",
        ] {
            assert!(parse_amount(input, 6).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_parse_amount_rejects_excess_precision() {
        assert!(parse_amount("1.0000001", 6).is_err());
        assert!(parse_amount("1.5", 0).is_err());
        assert_eq!(parse_amount("15", 0).unwrap(), units(15));
    }

    #[test]
    fn test_parse_amount_overflow_is_invalid() {
        let huge = "9".repeat(90);
        assert!(matches!(
            parse_amount(&huge, 6),
            Err(RequestError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_format_amount_two_decimals() {
        assert_eq!(format_amount(units(500_000_000), 6), "500.00");
        assert_eq!(format_amount(units(12_500_000), 6), "12.50");
        assert_eq!(format_amount(CurrencyAmount::ZERO, 6), "0.00");
        assert_eq!(format_amount(units(1), 6), "0.00");
        assert_eq!(format_amount(units(5_000), 6), "0.01");
        assert_eq!(format_amount(units(4_999), 6), "0.00");
        assert_eq!(format_amount(units(1_999_999), 6), "2.00");
        assert_eq!(format_amount(units(7), 0), "7.00");
        assert_eq!(format_amount(units(75), 1), "7.50");
    }

    #[test]
    fn test_parse_then_format_normalizes_to_two_decimals() {
        let cases = [
            ("12.5", "12.50"),
            ("12.50", "12.50"),
            ("1", "1.00"),
            ("0.01", "0.01"),
            ("0.1", "0.10"),
            ("999999.99", "999999.99"),
            ("1500", "1500.00"),
        ];
        for (input, expected) in cases {
            let amount = parse_amount(input, 6).unwrap();
            assert_eq!(format_amount(amount, 6), expected, "{input}");
        }
    }

    #[test]
    fn test_accepts_keystroke() {
        for accepted in ["", "1", "12", "12.", "12.5", "12.50", ".", ".5", "0"] {
            assert!(accepts_keystroke(accepted), "{accepted}");
        }
        for rejected in ["12.505", "1.2.3", "a", "-1", "1 ", "1e5"] {
            assert!(!accepts_keystroke(rejected), "{rejected}");
        }
    }

    #[test]
    fn test_classify_distinguishes_absent_from_invalid() {
        assert_eq!(AmountInput::classify("", 6), AmountInput::Absent);
        assert_eq!(AmountInput::classify("   ", 6), AmountInput::Absent);
        assert!(AmountInput::classify("", 6).error().is_none());

        let invalid = AmountInput::classify("0", 6);
        assert!(invalid.error().is_some());
        assert_eq!(invalid.amount(), None);

        let valid = AmountInput::classify("12.5", 6);
        assert_eq!(valid.amount(), Some(units(12_500_000)));
        assert!(!valid.is_absent());
    }

    /// How the display shows a typed amount: no leading zeros and exactly
    /// two fractional digits
    fn displayed(input: &str) -> String {
        let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
        let whole = whole.trim_start_matches('0');
        let whole = if whole.is_empty() { "0" } else { whole };
        format!("{whole}.{fraction:0<2}")
    }

    proptest! {
        #[test]
        fn test_parse_then_format_matches_typed_amount(
            input in "[0-9]{1,12}(\\.[0-9]{1,2})?",
        ) {
            match parse_amount(&input, 6) {
                Ok(amount) => prop_assert_eq!(format_amount(amount, 6), displayed(&input)),
                Err(_) => prop_assert!(input.bytes().all(|b| b == b'0' || b == b'.')),
            }
        }
    }
}
