//! In-memory [`Store`] backed by ordered maps.
//!
//! Each table is a `BTreeMap` behind its own [`tokio::sync::RwLock`], so
//! readers of one table never wait on writers of the other. Used when
//! persistence is disabled and throughout the test suite.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use crate::domain::{Pool, PoolId, Token};
use crate::error::OracleError;

/// Volatile token and pool storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: RwLock<BTreeMap<String, Token>>,
    pools: RwLock<BTreeMap<PoolId, Pool>>,
    token_writes: AtomicUsize,
    pool_writes: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `upsert_tokens` calls served so far.
    #[must_use]
    pub fn token_writes(&self) -> usize {
        self.token_writes.load(Ordering::Relaxed)
    }

    /// Number of `upsert_pools` calls served so far.
    #[must_use]
    pub fn pool_writes(&self) -> usize {
        self.pool_writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_token(&self, id: &str) -> Result<Option<Token>, OracleError> {
        Ok(self.tokens.read().await.get(id).cloned())
    }

    async fn find_all_tokens(&self) -> Result<Vec<Token>, OracleError> {
        Ok(self.tokens.read().await.values().cloned().collect())
    }

    async fn upsert_tokens(&self, tokens: &[Token]) -> Result<(), OracleError> {
        let mut map = self.tokens.write().await;
        for token in tokens {
            map.insert(token.id.clone(), token.clone());
        }
        self.token_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn find_all_pools(&self) -> Result<Vec<Pool>, OracleError> {
        Ok(self.pools.read().await.values().cloned().collect())
    }

    async fn upsert_pools(&self, pools: &[Pool]) -> Result<(), OracleError> {
        let mut map = self.pools.write().await;
        for pool in pools {
            map.insert(pool.id, pool.clone());
        }
        self.pool_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
