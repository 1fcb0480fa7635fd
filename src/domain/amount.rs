//! Exact-precision decimal quantity.
//!
//! [`Amount`] wraps a [`BigDecimal`] and is used for every monetary and
//! reserve quantity in the oracle: raw on-chain integer amounts, decimal
//! scaled token amounts, USD unit prices, and liquidity scores. Binary
//! floating point is never involved. Rounding is always half-up.

use std::fmt;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::OracleError;

/// Arbitrary-precision, non-negative-by-convention decimal value.
///
/// Serializes as a plain decimal string (`"10.00000"`, never exponent
/// notation) so that `u128`-sized raw amounts survive JSON round trips.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(BigDecimal);

impl Amount {
    /// Returns zero.
    #[must_use]
    pub fn zero() -> Self {
        Self(BigDecimal::zero())
    }

    /// Parses a decimal string such as `"1000000"` or `"5.02"`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::InvalidAmount`] when the input is empty or is
    /// not a decimal number.
    pub fn parse(raw: &str) -> Result<Self, OracleError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OracleError::InvalidAmount(raw.to_string()));
        }
        BigDecimal::from_str(trimmed)
            .map(Self)
            .map_err(|_| OracleError::InvalidAmount(raw.to_string()))
    }

    /// Returns `true` if the value equals zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if the value is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > BigDecimal::zero()
    }

    /// Rounds half-up to `places` fractional digits.
    ///
    /// The result always carries exactly `places` fractional digits when
    /// rendered, e.g. `10` rounded to 5 places renders as `"10.00000"`.
    #[must_use]
    pub fn round_dp(&self, places: u32) -> Self {
        Self(self.0.with_scale_round(i64::from(places), RoundingMode::HalfUp))
    }

    /// Divides by `10^decimals` exactly by shifting the decimal exponent.
    #[must_use]
    pub fn shift_down(&self, decimals: u32) -> Self {
        let (digits, scale) = self.0.as_bigint_and_exponent();
        Self(BigDecimal::new(digits, scale + i64::from(decimals)))
    }

    /// Multiplies by `10^decimals` exactly by shifting the decimal exponent.
    #[must_use]
    pub fn shift_up(&self, decimals: u32) -> Self {
        let (digits, scale) = self.0.as_bigint_and_exponent();
        Self(BigDecimal::new(digits, scale - i64::from(decimals)))
    }

    /// Divides `self` by `rhs`, returning `None` when `rhs` is zero.
    #[must_use]
    pub fn checked_div(&self, rhs: &Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        Some(Self(&self.0 / &rhs.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_zero() {
            // A zero with a positive scale would otherwise render as "0.00000".
            return f.write_str("0");
        }
        f.write_str(&self.0.to_plain_string())
    }
}

impl FromStr for Amount {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn add(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        self.0 += &rhs.0;
    }
}

impl<'a> Mul<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn mul(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 * &rhs.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Wire shapes accepted for an [`Amount`]: upstream feeds send either
/// decimal strings or bare JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match AmountRepr::deserialize(deserializer)? {
            AmountRepr::Text(s) => s,
            AmountRepr::Number(n) => n.to_string(),
        };
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
