//! Database row models for the `token` and `pool` tables.
//!
//! Amounts are stored as `VARCHAR` decimal strings so raw `u128`-sized
//! reserves never lose precision in the database.

use chrono::{DateTime, Utc};

use crate::domain::{Amount, Pool, PoolId, Token};
use crate::error::OracleError;

/// A row of the `token` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenRow {
    /// Token account.
    pub id: String,
    /// Fractional digits.
    pub decimals: i32,
    /// Display symbol.
    pub symbol: String,
    /// Decimal string price.
    pub price: String,
    /// Last write.
    pub updated_at: DateTime<Utc>,
}

/// A row of the `pool` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PoolRow {
    /// Numeric pool id as text.
    pub id: String,
    /// First token in reserve order.
    pub token_first: String,
    /// Second token in reserve order.
    pub token_second: String,
    /// Raw reserve of the first token.
    pub volume_first: String,
    /// Raw reserve of the second token.
    pub volume_second: String,
    /// 24 h raw volume traded in on the first side.
    pub volume24h_first: String,
    /// 24 h raw volume traded in on the second side.
    pub volume24h_second: String,
    /// Last write.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for Token {
    type Error = OracleError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let decimals = u8::try_from(row.decimals).map_err(|_| {
            OracleError::Persistence(format!("token {}: bad decimals {}", row.id, row.decimals))
        })?;
        Ok(Self {
            price: Amount::parse(&row.price)?,
            id: row.id,
            decimals,
            symbol: row.symbol,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Token> for TokenRow {
    fn from(token: &Token) -> Self {
        Self {
            id: token.id.clone(),
            decimals: i32::from(token.decimals),
            symbol: token.symbol.clone(),
            price: token.price.to_string(),
            updated_at: token.updated_at,
        }
    }
}

impl TryFrom<PoolRow> for Pool {
    type Error = OracleError;

    fn try_from(row: PoolRow) -> Result<Self, Self::Error> {
        let id: PoolId = row
            .id
            .parse()
            .map_err(|_| OracleError::Persistence(format!("pool id {:?} is not numeric", row.id)))?;
        Ok(Self {
            id,
            token_first: row.token_first,
            token_second: row.token_second,
            volume_first: Amount::parse(&row.volume_first)?,
            volume_second: Amount::parse(&row.volume_second)?,
            volume24h_first: Amount::parse(&row.volume24h_first)?,
            volume24h_second: Amount::parse(&row.volume24h_second)?,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Pool> for PoolRow {
    fn from(pool: &Pool) -> Self {
        Self {
            id: pool.id.to_string(),
            token_first: pool.token_first.clone(),
            token_second: pool.token_second.clone(),
            volume_first: pool.volume_first.to_string(),
            volume_second: pool.volume_second.to_string(),
            volume24h_first: pool.volume24h_first.to_string(),
            volume24h_second: pool.volume24h_second.to_string(),
            updated_at: pool.updated_at,
        }
    }
}
