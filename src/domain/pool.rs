//! Pool records: the raw chain snapshot, the 24 h rollup entry, and the
//! persisted aggregate that merges both.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Amount, PoolId, Swap};

/// Raw reserve snapshot of one pool as returned by the exchange contract.
///
/// `token_account_ids` and `amounts` are positionally aligned; `supplies`
/// is derived by zipping them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractPool {
    /// Pool index on the contract.
    pub id: PoolId,
    /// Token accounts in on-chain reserve order.
    pub token_account_ids: Vec<String>,
    /// Raw reserves aligned with `token_account_ids`.
    pub amounts: Vec<Amount>,
    /// Token account → raw reserve.
    pub supplies: HashMap<String, Amount>,
}

impl ContractPool {
    /// Builds a snapshot and derives its `supplies` map.
    #[must_use]
    pub fn new(id: PoolId, token_account_ids: Vec<String>, amounts: Vec<Amount>) -> Self {
        let supplies = token_account_ids
            .iter()
            .cloned()
            .zip(amounts.iter().cloned())
            .collect();
        Self {
            id,
            token_account_ids,
            amounts,
            supplies,
        }
    }

    /// Returns `true` if `token` is one of the pool's sides.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.token_account_ids.iter().any(|t| t == token)
    }

    /// Returns the `(first, second)` tokens of a two-token pool.
    #[must_use]
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.token_account_ids.as_slice() {
            [first, second] => Some((first.as_str(), second.as_str())),
            _ => None,
        }
    }

    /// Returns the raw reserve of `token`.
    #[must_use]
    pub fn supply(&self, token: &str) -> Option<&Amount> {
        self.supplies.get(token)
    }

    /// Returns `true` if any side of the pool is on `denylist`.
    #[must_use]
    pub fn touches_any(&self, denylist: &HashSet<String>) -> bool {
        self.token_account_ids.iter().any(|t| denylist.contains(t))
    }
}

/// Rolling 24 h traded amounts of one pool, folded from swap events.
///
/// Token order is the order of the first swap seen for the pool, which may
/// differ from the chain's reserve order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolVolume {
    /// Input token of the first swap seen.
    pub token_first: String,
    /// Output token of the first swap seen.
    pub token_second: String,
    /// Raw amount traded in on the first side.
    pub volume24h_first: Amount,
    /// Raw amount traded in on the second side.
    pub volume24h_second: Amount,
}

impl PoolVolume {
    /// Seeds an empty entry oriented like `swap`.
    #[must_use]
    pub fn seed(swap: &Swap) -> Self {
        Self {
            token_first: swap.token_in.clone(),
            token_second: swap.token_out.clone(),
            volume24h_first: Amount::zero(),
            volume24h_second: Amount::zero(),
        }
    }

    /// Adds the swap's input amount to the side it was traded in on.
    pub fn accumulate(&mut self, swap: &Swap) {
        if self.token_first == swap.token_in {
            self.volume24h_first += &swap.token_in_amount;
        } else {
            self.volume24h_second += &swap.token_in_amount;
        }
    }

    /// Returns `(first, second)` volumes re-oriented to the given token
    /// order, or `None` if the entry is for a different pair.
    #[must_use]
    pub fn oriented(&self, first: &str, second: &str) -> Option<(Amount, Amount)> {
        if self.token_first == first && self.token_second == second {
            Some((self.volume24h_first.clone(), self.volume24h_second.clone()))
        } else if self.token_first == second && self.token_second == first {
            Some((self.volume24h_second.clone(), self.volume24h_first.clone()))
        } else {
            None
        }
    }
}

/// Persisted per-pool aggregate served by the read API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Pool index on the contract (primary key).
    pub id: PoolId,
    /// First token in on-chain reserve order.
    pub token_first: String,
    /// Second token in on-chain reserve order.
    pub token_second: String,
    /// Current raw reserve of the first token.
    pub volume_first: Amount,
    /// Current raw reserve of the second token.
    pub volume_second: Amount,
    /// Raw amount of the first token traded in over the last 24 h.
    pub volume24h_first: Amount,
    /// Raw amount of the second token traded in over the last 24 h.
    pub volume24h_second: Amount,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
}

impl Pool {
    /// Builds the record for a chain pool, taking token order and reserves
    /// from the snapshot and rolling volume from `rollup` when present.
    ///
    /// Returns `None` for pools that are not two-token pools.
    #[must_use]
    pub fn from_snapshot(
        snapshot: &ContractPool,
        rollup: Option<&PoolVolume>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let (first, second) = snapshot.pair()?;
        let (volume24h_first, volume24h_second) = rollup
            .and_then(|v| v.oriented(first, second))
            .unwrap_or_default();
        Some(Self {
            id: snapshot.id,
            token_first: first.to_string(),
            token_second: second.to_string(),
            volume_first: snapshot.supply(first).cloned().unwrap_or_default(),
            volume_second: snapshot.supply(second).cloned().unwrap_or_default(),
            volume24h_first,
            volume24h_second,
            updated_at: now,
        })
    }
}
