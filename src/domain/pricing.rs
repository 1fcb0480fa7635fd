//! Pricing arithmetic over raw on-chain amounts.
//!
//! Three primitives shared by the reconciliation engine:
//!
//! - [`format_token_amount`] scales a raw integer reserve into whole units.
//! - [`calculate_price_for_token`] derives the constant-product unit price of
//!   a token from the anchor side of its pool.
//! - [`calculate_volume`] scores a pool's USD liquidity for arbitration.

use std::collections::HashMap;

use super::Amount;
use crate::error::OracleError;

/// Fractional digits of a derived unit price.
pub const PRICE_PRECISION: u32 = 5;

/// Fractional digits of a liquidity score.
pub const VOLUME_PRECISION: u32 = 0;

/// Divides `raw` by `10^decimals`.
///
/// With `precision`, the result is rounded half-up to that many fractional
/// digits; otherwise it keeps full precision. Returns `None` when `raw` is
/// absent, which callers must treat as "unavailable", not as zero.
#[must_use]
pub fn format_token_amount(
    raw: Option<&Amount>,
    decimals: u32,
    precision: Option<u32>,
) -> Option<Amount> {
    let scaled = raw?.shift_down(decimals);
    Some(match precision {
        Some(places) => scaled.round_dp(places),
        None => scaled,
    })
}

/// Computes `fiat_amount * fiat_unit_price / token_amount` rounded to
/// [`PRICE_PRECISION`] digits.
///
/// Returns zero when the anchor unit price is absent or zero, or when
/// `fiat_amount` is not positive, whatever `token_amount` is.
///
/// # Errors
///
/// Returns [`OracleError::DivisionByZero`] when `token_amount` is zero and
/// a price would otherwise be derived.
pub fn calculate_price_for_token(
    fiat_amount: &Amount,
    token_amount: &Amount,
    fiat_unit_price: Option<&Amount>,
) -> Result<Amount, OracleError> {
    let Some(unit_price) = fiat_unit_price.filter(|p| !p.is_zero()) else {
        return Ok(Amount::zero());
    };
    if !fiat_amount.is_positive() {
        return Ok(Amount::zero());
    }
    let value = fiat_amount * unit_price;
    value
        .checked_div(token_amount)
        .map(|price| price.round_dp(PRICE_PRECISION))
        .ok_or(OracleError::DivisionByZero)
}

/// Sums `reserve * unit_price` over every token of a pool, rounded to
/// [`VOLUME_PRECISION`] digits.
///
/// Returns zero unless every token in `supplies` has an entry in `prices`.
/// Reserves are raw on-chain integers and are deliberately not scaled by
/// token decimals.
#[must_use]
pub fn calculate_volume(
    supplies: &HashMap<String, Amount>,
    prices: &HashMap<String, Amount>,
) -> Amount {
    if !supplies.keys().all(|token| prices.contains_key(token)) {
        return Amount::zero();
    }
    supplies
        .iter()
        .filter_map(|(token, reserve)| prices.get(token).map(|price| reserve * price))
        .fold(Amount::zero(), |acc, term| acc + term)
        .round_dp(VOLUME_PRECISION)
}
