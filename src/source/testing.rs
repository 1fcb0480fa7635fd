//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{FiatPriceSource, PoolSource, SwapSource, TokenMetadataSource, TokenPriceFeed};
use crate::domain::{Amount, ContractPool, FtMetadata, PoolId, Swap, TokenQuote};
use crate::error::OracleError;

#[allow(clippy::panic)]
pub(crate) fn amt(s: &str) -> Amount {
    let Ok(a) = Amount::parse(s) else {
        panic!("valid amount {s}");
    };
    a
}

pub(crate) fn two_token_pool(id: u64, first: (&str, &str), second: (&str, &str)) -> ContractPool {
    ContractPool::new(
        PoolId::new(id),
        vec![first.0.to_string(), second.0.to_string()],
        vec![amt(first.1), amt(second.1)],
    )
}

pub(crate) fn swap(id: &str, token_in: &str, token_out: &str, amount_in: &str, ts: i64) -> Swap {
    Swap {
        id: id.to_string(),
        token_in: token_in.to_string(),
        token_out: token_out.to_string(),
        token_in_amount: amt(amount_in),
        token_out_amount: amt("1"),
        block_timestamp: ts,
    }
}

/// Exchange contract and token contracts with scripted failures.
#[derive(Debug, Default)]
pub(crate) struct FakeChain {
    pub pools: Vec<ContractPool>,
    pub metadata: HashMap<String, FtMetadata>,
    pub failing_pages: HashSet<u64>,
    pub count_fails: bool,
    pub metadata_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
}

impl FakeChain {
    pub(crate) fn with_pools(pools: Vec<ContractPool>) -> Self {
        Self {
            pools,
            ..Self::default()
        }
    }

    pub(crate) fn token(mut self, id: &str, decimals: u8, symbol: &str) -> Self {
        self.metadata.insert(
            id.to_string(),
            FtMetadata {
                decimals,
                symbol: symbol.to_string(),
            },
        );
        self
    }

    pub(crate) fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolSource for FakeChain {
    async fn pool_count(&self) -> Result<u64, OracleError> {
        if self.count_fails {
            return Err(OracleError::Rpc("count unavailable".to_string()));
        }
        Ok(self.pools.len() as u64)
    }

    async fn pools(&self, from_index: u64, limit: u64) -> Result<Vec<ContractPool>, OracleError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_pages.contains(&from_index) {
            return Err(OracleError::Rpc(format!("page {from_index} failed")));
        }
        Ok(self
            .pools
            .iter()
            .filter(|p| p.id.index() >= from_index && p.id.index() < from_index + limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TokenMetadataSource for FakeChain {
    async fn ft_metadata(&self, token: &str) -> Result<FtMetadata, OracleError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .get(token)
            .cloned()
            .ok_or_else(|| OracleError::Rpc(format!("{token} has no ft_metadata")))
    }
}

/// Swap feed answering range queries from a fixed event list.
#[derive(Debug, Default)]
pub(crate) struct FakeSwapFeed {
    pub swaps: Vec<Swap>,
    pub failing_from: HashSet<i64>,
    pub ranges: Mutex<Vec<(i64, i64)>>,
}

impl FakeSwapFeed {
    pub(crate) fn with_swaps(swaps: Vec<Swap>) -> Self {
        Self {
            swaps,
            ..Self::default()
        }
    }

    pub(crate) fn ranges(&self) -> Vec<(i64, i64)> {
        self.ranges.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SwapSource for FakeSwapFeed {
    async fn swaps(&self, from_ts: i64, to_ts: i64) -> Result<Vec<Swap>, OracleError> {
        if let Ok(mut ranges) = self.ranges.lock() {
            ranges.push((from_ts, to_ts));
        }
        if self.failing_from.contains(&from_ts) {
            return Err(OracleError::Decode("range failed".to_string()));
        }
        Ok(self
            .swaps
            .iter()
            .filter(|s| s.block_timestamp >= from_ts && s.block_timestamp <= to_ts)
            .cloned()
            .collect())
    }
}

/// Fiat helper and token feed. `None` simulates an unreachable endpoint.
#[derive(Debug, Default)]
pub(crate) struct FakePrices {
    pub near: Option<Amount>,
    pub quotes: Option<HashMap<String, TokenQuote>>,
}

impl FakePrices {
    pub(crate) fn near(price: &str) -> Self {
        Self {
            near: Some(amt(price)),
            quotes: Some(HashMap::new()),
        }
    }

    pub(crate) fn quote(mut self, id: &str, decimal: u8, symbol: &str, price: &str) -> Self {
        self.quotes.get_or_insert_with(HashMap::new).insert(
            id.to_string(),
            TokenQuote {
                decimal,
                symbol: symbol.to_string(),
                price: amt(price),
            },
        );
        self
    }
}

#[async_trait]
impl FiatPriceSource for FakePrices {
    async fn fiat_price(&self) -> Result<Amount, OracleError> {
        self.near
            .clone()
            .ok_or_else(|| OracleError::Rpc("helper down".to_string()))
    }
}

#[async_trait]
impl TokenPriceFeed for FakePrices {
    async fn token_prices(&self) -> Result<HashMap<String, TokenQuote>, OracleError> {
        self.quotes
            .clone()
            .ok_or_else(|| OracleError::Rpc("feed down".to_string()))
    }
}
