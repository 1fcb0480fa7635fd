//! Type-safe pool identifier.
//!
//! [`PoolId`] is a newtype wrapper around the chain-assigned numeric pool
//! index so that pool identifiers cannot be confused with other integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of an AMM pool on the exchange contract.
///
/// Assigned by the contract at pool creation (its position in the
/// contract's pool list) and immutable thereafter. Persisted and served as
/// a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(u64);

impl PoolId {
    /// Creates a `PoolId` from its on-chain index.
    #[must_use]
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    /// Returns the on-chain index.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.0
    }

    /// Extracts the pool id from a swap-feed record id.
    ///
    /// Swap ids have the form `"<receipt> <poolId> ..."`; the second
    /// whitespace-separated token is the pool id. Returns `None` when that
    /// token is missing or not an integer.
    #[must_use]
    pub fn from_swap_id(swap_id: &str) -> Option<Self> {
        swap_id.split_whitespace().nth(1)?.parse().ok()
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PoolId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for PoolId {
    fn from(index: u64) -> Self {
        Self(index)
    }
}
