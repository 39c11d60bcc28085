//! Human amount <-> base-unit conversion
//!
//! Amounts cross the client boundary as decimal strings ("12.5") and reach
//! the contract as integer base units scaled by the token's decimals. The
//! conversion works on digit strings and `U256`, so it is exact for every
//! representable base-unit value. Fractional digits beyond the token's
//! precision are rounded down.

use ethers::types::U256;
use thiserror::Error;
use tracing::debug;

/// Decimals of the pool share token and of fee fractions
pub const WEI_DECIMALS: u8 = 18;

/// Why a human amount could not be converted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,

    #[error("'{0}' is not a decimal number")]
    InvalidDigits(String),

    #[error("'{0}' is negative")]
    Negative(String),

    #[error("'{0}' does not fit in 256 bits of base units")]
    Overflow(String),
}

/// Convert a human amount to base units using `decimals`
pub fn amount_to_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }
    if amount.starts_with('-') {
        return Err(UnitsError::Negative(amount.to_string()));
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(UnitsError::InvalidDigits(amount.to_string()));
    }

    let decimals = decimals as usize;
    let kept = if fraction.len() > decimals {
        debug!(
            "Truncating '{}' to {} fractional digits",
            amount, decimals
        );
        &fraction[..decimals]
    } else {
        fraction
    };

    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    digits.push_str(kept);
    digits.extend(std::iter::repeat('0').take(decimals - kept.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(digits).map_err(|_| UnitsError::Overflow(amount.to_string()))
}

/// Convert base units to a human amount using `decimals`
pub fn units_to_amount(value: U256, decimals: u8) -> String {
    format_scaled(value, decimals as u32)
}

/// Render `value / 10^scale` as a decimal string without trailing zeros
pub fn format_scaled(value: U256, scale: u32) -> String {
    let digits = value.to_string();
    if scale == 0 {
        return digits;
    }

    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - scale);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// `amount` as an 18-decimal fixed-point value
pub fn to_wei(amount: &str) -> Result<U256, UnitsError> {
    amount_to_units(amount, WEI_DECIMALS)
}

/// 18-decimal fixed-point value as a human amount
pub fn from_wei(value: U256) -> String {
    units_to_amount(value, WEI_DECIMALS)
}

/// `10^exponent`, or `None` when it exceeds 256 bits
pub fn pow10(exponent: u32) -> Option<U256> {
    U256::from(10u8).checked_pow(U256::from(exponent))
}
