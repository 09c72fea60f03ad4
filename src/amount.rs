// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Raw on-chain amounts.
//!
//! Everything upstream hands us is an integer in base units. We keep it that
//! way (`U256`) through every sum and only scale by `10^decimals` at the point
//! a value is displayed or divided into a percentage.

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer};

/// Decimals of the SOL quote leg (lamports).
pub const SOL_DECIMALS: u8 = 9;

/// Wrapped SOL mint, used to spot the quote leg of a swap.
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Parse a base-10 integer string into a raw amount.
pub fn parse_raw(s: &str) -> Option<U256> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(s, 10).ok()
}

/// Sum raw amounts without a floating point accumulator.
pub fn sum_raw<I>(amounts: I) -> U256
where
    I: IntoIterator<Item = U256>,
{
    amounts
        .into_iter()
        .fold(U256::ZERO, |acc, amount| acc.saturating_add(amount))
}

/// Scale a raw amount by `10^decimals`.
///
/// Goes through the decimal string so that amounts above 2^128 and tokens
/// with unusual decimals never touch a lossy intermediate.
pub fn to_ui_amount(raw: U256, decimals: u8) -> f64 {
    let digits = raw.to_string();
    let decimals = decimals as usize;

    let text = if decimals == 0 {
        digits
    } else if digits.len() > decimals {
        let (whole, frac) = digits.split_at(digits.len() - decimals);
        format!("{whole}.{frac}")
    } else {
        format!("0.{}{}", "0".repeat(decimals - digits.len()), digits)
    };

    text.parse().unwrap_or_default()
}

/// `part / whole * 100`, both given in the same raw units.
pub fn percentage_of(part: U256, whole: U256, decimals: u8) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    to_ui_amount(part, decimals) / to_ui_amount(whole, decimals) * 100.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmountRepr {
    Text(String),
    Number(serde_json::Number),
}

/// Serde helper accepting either `"12345"` or `12345` for a raw amount.
pub fn deserialize_raw_amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match RawAmountRepr::deserialize(deserializer)? {
        RawAmountRepr::Text(text) => parse_raw(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid raw amount: {text}"))),
        RawAmountRepr::Number(number) => {
            if let Some(value) = number.as_u64() {
                return Ok(U256::from(value));
            }
            // Large integers arrive as floats without serde_json's
            // arbitrary_precision feature.
            match number.as_f64() {
                // `u128::MAX as f64` rounds up to 2^128, so the bound is exclusive.
                Some(value)
                    if value.is_finite()
                        && value >= 0.0
                        && value < u128::MAX as f64
                        && value.fract() == 0.0 =>
                {
                    Ok(U256::from(value as u128))
                }
                _ => Err(D::Error::custom(format!("invalid raw amount: {number}"))),
            }
        }
    }
}
