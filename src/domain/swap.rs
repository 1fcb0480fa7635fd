//! Historical swap events from the swap feed.

use serde::{Deserialize, Deserializer};

use super::{Amount, PoolId};

/// One historical trade. Ephemeral: only folded into the 24 h rollup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swap {
    /// Composite id `"<receipt> <poolId>"`.
    pub id: String,
    /// Token account traded in.
    pub token_in: String,
    /// Token account traded out.
    pub token_out: String,
    /// Raw amount traded in.
    pub token_in_amount: Amount,
    /// Raw amount traded out.
    pub token_out_amount: Amount,
    /// Block time in unix seconds.
    #[serde(deserialize_with = "integer_or_string")]
    pub block_timestamp: i64,
}

impl Swap {
    /// Pool the swap was executed against, if the id encodes one.
    #[must_use]
    pub fn pool_id(&self) -> Option<PoolId> {
        PoolId::from_swap_id(&self.id)
    }
}

/// The feed serialises big integers as strings on some deployments.
fn integer_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(i64),
        Text(String),
    }
    match Repr::deserialize(deserializer)? {
        Repr::Int(v) => Ok(v),
        Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
