//! Token price DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Token;

/// One entry of `GET /token-prices`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPriceDto {
    /// Token contract account.
    #[schema(example = "wrap.near")]
    pub id: String,
    /// Fractional digits of raw amounts.
    pub decimal: u8,
    /// Display symbol.
    pub symbol: String,
    /// USD per whole unit, as a decimal string.
    #[schema(example = "10.00000")]
    pub price: String,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
}

impl From<Token> for TokenPriceDto {
    fn from(token: Token) -> Self {
        Self {
            id: token.id,
            decimal: token.decimals,
            symbol: token.symbol,
            price: token.price.to_string(),
            updated_at: token.updated_at,
        }
    }
}
