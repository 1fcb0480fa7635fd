//! Pool volume DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Pool;

/// One entry of `GET /pool-volumes`.
///
/// Reserves and volumes are raw integer amounts in each token's smallest
/// unit. Field names are camel-case.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolVolumeDto {
    /// Pool index on the exchange contract, as a decimal string.
    #[schema(example = "3")]
    pub id: String,
    /// First token in reserve order.
    pub token_first: String,
    /// Second token in reserve order.
    pub token_second: String,
    /// Current reserve of the first token.
    pub volume_first: String,
    /// Current reserve of the second token.
    pub volume_second: String,
    /// Amount of the first token traded in over the last 24 h.
    pub volume24h_first: String,
    /// Amount of the second token traded in over the last 24 h.
    pub volume24h_second: String,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
}

impl From<Pool> for PoolVolumeDto {
    fn from(pool: Pool) -> Self {
        Self {
            id: pool.id.to_string(),
            token_first: pool.token_first,
            token_second: pool.token_second,
            volume_first: pool.volume_first.to_string(),
            volume_second: pool.volume_second.to_string(),
            volume24h_first: pool.volume24h_first.to_string(),
            volume24h_second: pool.volume24h_second.to_string(),
            updated_at: pool.updated_at,
        }
    }
}
