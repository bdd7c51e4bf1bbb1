//! View models for the two merchant screens.
//!
//! Both are recomputed from the current inputs on every change. Nothing
//! here is cached between keystrokes, so a stale request can never be shown
//! for a newer amount.

use alloy_primitives::Address;
use castpos_types::CurrencyAmount;
use rand::Rng;

use crate::{
    request::{AmountInput, PaymentRequest, RequestError, accepts_keystroke, format_amount},
    settings::Settings,
    treasury::{SurplusResult, parse_target},
};

pub const NEEDS_WALLET_MESSAGE: &str = "Please connect your wallet first";
pub const INVALID_AMOUNT_MESSAGE: &str = "Please enter a valid amount";

pub const READY_HINT: &str = "Ready to allocate to reserve wallet";
pub const NO_SURPLUS_HINT: &str = "Increase your balance or lower target to create surplus";
pub const NO_RESERVE_HINT: &str = "Reserve address is not configured";

const ORDER_SUFFIX_LEN: usize = 5;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn order_id_from(millis: u64, rng: &mut impl Rng) -> String {
    let suffix: String = (0..ORDER_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("POS-{}-{}", base36(millis), suffix)
}

/// `POS-{base36 millis}-{5 random base36 chars}`
pub fn new_order_id() -> String {
    let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
    order_id_from(millis, &mut rand::rng())
}

/// What the accept screen shows for the current amount field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutView {
    /// Empty field: no request, no error
    Idle,
    NeedsWallet,
    Invalid {
        message: String,
    },
    Ready {
        request: PaymentRequest,
        uri: String,
    },
}

impl CheckoutView {
    pub fn derive(input: &str, merchant: Option<Address>, settings: &Settings) -> Self {
        let amount = match AmountInput::classify(input, settings.token_decimals) {
            AmountInput::Absent => return CheckoutView::Idle,
            amount => amount,
        };
        // a typed amount without a receiving wallet asks for the wallet first
        let Some(merchant) = merchant.filter(|address| !address.is_zero()) else {
            return CheckoutView::NeedsWallet;
        };
        let AmountInput::Valid(amount) = amount else {
            return CheckoutView::invalid();
        };

        match PaymentRequest::new(
            amount,
            settings.chain_id,
            settings.token_address,
            Some(merchant),
        ) {
            Ok(request) => CheckoutView::Ready {
                uri: request.to_uri(),
                request,
            },
            Err(RequestError::MissingRecipient) => CheckoutView::NeedsWallet,
            Err(RequestError::InvalidAmount(_)) => CheckoutView::invalid(),
        }
    }

    fn invalid() -> Self {
        CheckoutView::Invalid {
            message: INVALID_AMOUNT_MESSAGE.to_string(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CheckoutView::NeedsWallet => Some(NEEDS_WALLET_MESSAGE),
            CheckoutView::Invalid { message } => Some(message),
            _ => None,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            CheckoutView::Ready { uri, .. } => Some(uri),
            _ => None,
        }
    }

    pub fn request(&self) -> Option<&PaymentRequest> {
        match self {
            CheckoutView::Ready { request, .. } => Some(request),
            _ => None,
        }
    }
}

/// One sale on the accept screen
#[derive(Debug, Clone)]
pub struct Checkout {
    order_id: String,
    input: String,
    paid: bool,
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new()
    }
}

impl Checkout {
    pub fn new() -> Self {
        Checkout {
            order_id: new_order_id(),
            input: String::new(),
            paid: false,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    /// Replace the amount field if the keystroke filter accepts `value`.
    /// An accepted edit clears the paid flag. Returns whether the field
    /// changed.
    pub fn set_input(&mut self, value: &str) -> bool {
        if !accepts_keystroke(value) {
            return false;
        }
        self.input = value.to_string();
        self.paid = false;
        true
    }

    pub fn view(&self, merchant: Option<Address>, settings: &Settings) -> CheckoutView {
        CheckoutView::derive(&self.input, merchant, settings)
    }

    pub fn mark_paid(&mut self) {
        self.paid = true;
    }

    /// Clear the sale and start over under a fresh order id
    pub fn new_payment(&mut self) {
        *self = Checkout::new();
    }
}

/// What the treasury screen shows for a balance and the target field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreasuryView {
    pub result: SurplusResult,
    pub balance: String,
    pub surplus: String,
    pub target_degraded: bool,
    pub hint: Option<&'static str>,
}

impl TreasuryView {
    pub fn derive(
        balance: CurrencyAmount,
        target_input: &str,
        reserve_configured: bool,
        decimals: u8,
    ) -> Self {
        let target = parse_target(target_input, decimals);
        let result = SurplusResult::evaluate(balance, &target, reserve_configured);

        let hint = if result.eligible {
            Some(READY_HINT)
        } else if !result.surplus.is_zero() {
            Some(NO_RESERVE_HINT)
        } else if !balance.is_zero() {
            Some(NO_SURPLUS_HINT)
        } else {
            None
        };

        TreasuryView {
            balance: format_amount(balance, decimals),
            surplus: format_amount(result.surplus, decimals),
            target_degraded: target.is_degraded(),
            hint,
            result,
        }
    }

    pub fn for_settings(balance: CurrencyAmount, settings: &Settings) -> Self {
        Self::derive(
            balance,
            &settings.operating_target,
            settings.reserve_configured(),
            settings.token_decimals,
        )
    }
}
