//! Token records and the metadata they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Amount;

/// A fungible token with its latest USD price.
///
/// Keyed by the token contract account. `decimals` and `symbol` are fixed
/// once observed; `price` is rewritten every cycle and may legitimately be
/// zero when no liquidity corroborates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token contract account (primary key).
    pub id: String,
    /// Number of fractional digits of the raw on-chain amount.
    pub decimals: u8,
    /// Display symbol.
    pub symbol: String,
    /// USD per whole unit.
    pub price: Amount,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
}

impl Token {
    /// Creates a freshly discovered token with a zero price.
    #[must_use]
    pub fn from_metadata(id: String, metadata: FtMetadata) -> Self {
        Self {
            id,
            decimals: metadata.decimals,
            symbol: metadata.symbol,
            price: Amount::zero(),
            updated_at: Utc::now(),
        }
    }
}

/// Subset of the NEP-148 `ft_metadata` view the oracle needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtMetadata {
    /// Number of fractional digits.
    pub decimals: u8,
    /// Display symbol.
    pub symbol: String,
}

/// One entry of the external token price feed.
///
/// The feed is a JSON object keyed by token account; field names follow
/// the feed's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenQuote {
    /// Number of fractional digits.
    pub decimal: u8,
    /// Display symbol.
    pub symbol: String,
    /// USD per whole unit as quoted by the feed.
    pub price: Amount,
}
