//! Paginated, partial-failure-tolerant retrieval of every pool on the
//! exchange contract.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;

use crate::domain::ContractPool;
use crate::source::PoolSource;

/// Reads the full pool list page by page.
#[derive(Debug, Clone)]
pub struct PoolFetcher {
    source: Arc<dyn PoolSource>,
    page_size: u64,
    denylist: HashSet<String>,
}

impl PoolFetcher {
    /// Creates a fetcher requesting `page_size` pools per call and dropping
    /// every pool that touches `denylist`.
    #[must_use]
    pub fn new(source: Arc<dyn PoolSource>, page_size: u64, denylist: HashSet<String>) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            denylist,
        }
    }

    /// Fetches all pools, requesting every page concurrently.
    ///
    /// A failed page contributes nothing; a failed count yields an empty
    /// snapshot. Both are logged and never abort the cycle.
    pub async fn fetch_all_pools(&self) -> Vec<ContractPool> {
        let total = match self.source.pool_count().await {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(error = %e, "pool count unavailable, empty snapshot");
                return Vec::new();
            }
        };

        let pages = total.div_ceil(self.page_size);
        let requests = (0..pages).map(|page| {
            let from_index = page * self.page_size;
            async move {
                match self.source.pools(from_index, self.page_size).await {
                    Ok(pools) => pools,
                    Err(e) => {
                        tracing::warn!(from_index, error = %e, "pool page failed");
                        Vec::new()
                    }
                }
            }
        });

        let pools: Vec<ContractPool> = join_all(requests)
            .await
            .into_iter()
            .flatten()
            .filter(|pool| !pool.touches_any(&self.denylist))
            .collect();

        tracing::debug!(total, pages, fetched = pools.len(), "pool snapshot fetched");
        pools
    }
}
