//! Aggregation cycle: concurrent collection, reconciliation, and one batch
//! write per tick.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::Instrument;
use uuid::Uuid;

use super::{PoolFetcher, PriceEngine, VolumeRollup};
use crate::domain::{ContractPool, Pool, PoolId, PoolVolume};
use crate::error::OracleError;
use crate::persistence::Store;
use crate::source::{FiatPriceSource, TokenPriceFeed};

/// Counts of what one cycle read and wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Pools in the chain snapshot after denylist filtering.
    pub pools_fetched: usize,
    /// Pools with at least one swap in the window.
    pub pools_rolled_up: usize,
    /// Token records written.
    pub tokens_saved: usize,
    /// Pool records written.
    pub pools_saved: usize,
}

/// Runs aggregation cycles and the periodic scheduler.
///
/// At most one cycle runs at a time: a tick arriving while a cycle is in
/// flight is skipped.
#[derive(Debug)]
pub struct Aggregator {
    fetcher: PoolFetcher,
    rollup: VolumeRollup,
    engine: PriceEngine,
    fiat: Arc<dyn FiatPriceSource>,
    feed: Arc<dyn TokenPriceFeed>,
    store: Arc<dyn Store>,
    running: AtomicBool,
}

/// Releases the single-flight flag on drop, including on early return.
#[derive(Debug)]
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Aggregator {
    /// Wires the cycle's collaborators together.
    #[must_use]
    pub fn new(
        fetcher: PoolFetcher,
        rollup: VolumeRollup,
        engine: PriceEngine,
        fiat: Arc<dyn FiatPriceSource>,
        feed: Arc<dyn TokenPriceFeed>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            fetcher,
            rollup,
            engine,
            fiat,
            feed,
            store,
            running: AtomicBool::new(false),
        }
    }

    /// Returns `true` while a cycle is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Runs one cycle unless another is already running.
    ///
    /// Returns `Ok(None)` when the tick was skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Persistence`] if the batch write fails. Every
    /// upstream failure is absorbed and logged instead.
    pub async fn run_cycle(&self) -> Result<Option<CycleReport>, OracleError> {
        let Some(_guard) = CycleGuard::acquire(&self.running) else {
            tracing::info!("previous cycle still running, tick skipped");
            return Ok(None);
        };
        let cycle_id = Uuid::new_v4();
        self.cycle()
            .instrument(tracing::info_span!("cycle", %cycle_id))
            .await
            .map(Some)
    }

    async fn cycle(&self) -> Result<CycleReport, OracleError> {
        let (feed, near_price, pools, volumes) = tokio::join!(
            self.feed.token_prices(),
            self.fiat.fiat_price(),
            self.fetcher.fetch_all_pools(),
            self.rollup.rollup_24h(),
        );

        let feed = feed.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "token price feed unavailable");
            HashMap::new()
        });
        let near_price = match near_price {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(error = %e, "near fiat price unavailable");
                None
            }
        };

        let tokens = self
            .engine
            .reconcile(&pools, near_price.as_ref(), feed)
            .await;
        let pool_records = build_pool_records(&pools, &volumes, Utc::now());

        self.store.save_batch(&tokens, &pool_records).await?;

        let report = CycleReport {
            pools_fetched: pools.len(),
            pools_rolled_up: volumes.len(),
            tokens_saved: tokens.len(),
            pools_saved: pool_records.len(),
        };
        tracing::info!(
            pools_fetched = report.pools_fetched,
            pools_rolled_up = report.pools_rolled_up,
            tokens_saved = report.tokens_saved,
            pools_saved = report.pools_saved,
            "cycle complete"
        );
        Ok(report)
    }

    /// Starts a cycle every `period`, forever.
    ///
    /// Each cycle runs on its own task so a slow cycle never delays the
    /// ticker; overlapping ticks are skipped by [`Self::run_cycle`].
    pub async fn run(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = this.run_cycle().await {
                    tracing::error!(error = %e, "cycle failed");
                }
            });
        }
    }
}

/// Builds one pool record per pool in the chain snapshot.
///
/// Records keep chain token order and reserves, with rollup volume
/// re-oriented to that order and zero volume for pools without swaps.
/// Rollup entries for pools absent from the snapshot are dropped so a
/// missed page never overwrites stored reserves. A pool pairing a token
/// with itself is never recorded.
#[must_use]
pub fn build_pool_records(
    pools: &[ContractPool],
    volumes: &BTreeMap<PoolId, PoolVolume>,
    now: DateTime<Utc>,
) -> Vec<Pool> {
    let unmatched = volumes
        .keys()
        .filter(|id| !pools.iter().any(|pool| pool.id == **id))
        .count();
    if unmatched > 0 {
        tracing::debug!(unmatched, "rolled-up pools outside the snapshot skipped");
    }

    let records: BTreeMap<PoolId, Pool> = pools
        .iter()
        .filter_map(|snapshot| Pool::from_snapshot(snapshot, volumes.get(&snapshot.id), now))
        .map(|pool| (pool.id, pool))
        .collect();
    records
        .into_values()
        .filter(|pool| {
            let distinct = pool.token_first != pool.token_second;
            if !distinct {
                tracing::debug!(pool_id = %pool.id, "pool pairs a token with itself, skipped");
            }
            distinct
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::PricingConfig;
    use crate::persistence::MemoryStore;
    use crate::service::TokenResolver;
    use crate::service::volume_rollup::hour_boundaries;
    use crate::source::testing::{FakeChain, FakePrices, FakeSwapFeed, amt, swap, two_token_pool};
    use crate::source::{PoolSource, SwapSource, TokenMetadataSource};

    const NEAR: &str = "wrap.near";

    fn aggregator(
        chain: FakeChain,
        feed: FakeSwapFeed,
        prices: FakePrices,
        store: Arc<MemoryStore>,
    ) -> Aggregator {
        aggregator_denying(chain, feed, prices, store, &[])
    }

    fn aggregator_denying(
        chain: FakeChain,
        feed: FakeSwapFeed,
        prices: FakePrices,
        store: Arc<MemoryStore>,
        denylist: &[&str],
    ) -> Aggregator {
        let chain = Arc::new(chain);
        let prices = Arc::new(prices);
        let store: Arc<dyn Store> = store;
        let resolver = TokenResolver::new(
            Arc::clone(&store),
            Arc::clone(&chain) as Arc<dyn TokenMetadataSource>,
        );
        Aggregator::new(
            PoolFetcher::new(
                Arc::clone(&chain) as Arc<dyn PoolSource>,
                100,
                denylist.iter().map(ToString::to_string).collect(),
            ),
            VolumeRollup::new(Arc::new(feed) as Arc<dyn SwapSource>),
            PriceEngine::new(resolver, PricingConfig::default()),
            Arc::clone(&prices) as Arc<dyn FiatPriceSource>,
            prices as Arc<dyn TokenPriceFeed>,
            store,
        )
    }

    fn e2e_chain() -> FakeChain {
        FakeChain::with_pools(vec![two_token_pool(
            1,
            (NEAR, "2000000000000000000000000000"),
            ("x.near", "1000000000"),
        )])
        .token(NEAR, 24, "wNEAR")
        .token("x.near", 6, "X")
    }

    #[tokio::test]
    async fn cycle_prices_token_and_persists_pool() {
        let store = Arc::new(MemoryStore::new());
        let agg = aggregator(
            e2e_chain(),
            FakeSwapFeed::default(),
            FakePrices::near("5.00"),
            Arc::clone(&store),
        );

        let Ok(Some(report)) = agg.run_cycle().await else {
            panic!("cycle should run");
        };
        assert_eq!(report.pools_fetched, 1);
        assert_eq!(report.pools_saved, 1);

        let Ok(Some(x)) = store.find_token("x.near").await else {
            panic!("x persisted");
        };
        assert_eq!(x.price.to_string(), "10.00000");

        let Ok(pools) = store.find_all_pools().await else {
            panic!("pools listed");
        };
        let Some(pool) = pools.first() else {
            panic!("pool persisted");
        };
        assert_eq!(pool.token_first, NEAR);
        assert!(pool.volume24h_first.is_zero());
        assert!(!agg.is_running());
    }

    #[tokio::test]
    async fn upstream_outages_do_not_abort_cycle() {
        let store = Arc::new(MemoryStore::new());
        let mut chain = e2e_chain();
        chain.count_fails = true;
        let agg = aggregator(chain, FakeSwapFeed::default(), FakePrices::default(), store);

        let Ok(Some(report)) = agg.run_cycle().await else {
            panic!("cycle should complete");
        };
        assert_eq!(report, CycleReport::default());
    }

    #[tokio::test]
    async fn overlapping_tick_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let agg = aggregator(
            e2e_chain(),
            FakeSwapFeed::default(),
            FakePrices::near("5.00"),
            Arc::clone(&store),
        );

        let held = CycleGuard::acquire(&agg.running);
        assert!(held.is_some());
        let skipped = agg.run_cycle().await;
        assert!(matches!(skipped, Ok(None)));
        assert_eq!(store.token_writes(), 0);

        drop(held);
        let ran = agg.run_cycle().await;
        assert!(matches!(ran, Ok(Some(_))));
    }

    #[test]
    fn guard_releases_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let Some(_guard) = CycleGuard::acquire(&flag) else {
                panic!("free flag");
            };
            assert!(CycleGuard::acquire(&flag).is_none());
        }
        assert!(CycleGuard::acquire(&flag).is_some());
    }

    #[test]
    fn only_snapshot_pools_are_recorded() {
        let snapshot = vec![
            two_token_pool(1, ("a", "10"), ("b", "20")),
            two_token_pool(2, ("c", "30"), ("d", "40")),
        ];
        let volumes = crate::service::volume_rollup::fold_swaps(vec![
            swap("r1 1", "b", "a", "5", 0),
            swap("r2 9", "e", "f", "7", 0),
        ]);
        let records = build_pool_records(&snapshot, &volumes, Utc::now());
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|p| p.id != PoolId::new(9)));

        let Some(traded) = records.iter().find(|p| p.id == PoolId::new(1)) else {
            panic!("pool 1");
        };
        assert_eq!(traded.token_first, "a");
        assert_eq!(traded.volume_first, amt("10"));
        assert_eq!(traded.volume24h_second, amt("5"));

        let Some(quiet) = records.iter().find(|p| p.id == PoolId::new(2)) else {
            panic!("pool 2");
        };
        assert_eq!(quiet.volume_second, amt("40"));
        assert!(quiet.volume24h_first.is_zero());
        assert!(quiet.volume24h_second.is_zero());
    }

    #[test]
    fn self_paired_pool_is_not_recorded() {
        let snapshot = vec![two_token_pool(4, ("a", "1"), ("b", "1"))];
        let volumes = crate::service::volume_rollup::fold_swaps(vec![swap("r1 4", "a", "b", "1", 0)]);
        assert_eq!(build_pool_records(&snapshot, &volumes, Utc::now()).len(), 1);

        let self_paired = ContractPool::new(
            PoolId::new(4),
            vec!["a".to_string(), "a".to_string()],
            vec![amt("1"), amt("1")],
        );
        assert!(build_pool_records(&[self_paired], &volumes, Utc::now()).is_empty());
    }

    #[tokio::test]
    async fn failed_snapshot_keeps_stored_reserves() {
        let store = Arc::new(MemoryStore::new());
        let newest = hour_boundaries(Utc::now()).first().copied().unwrap_or_default();
        let swaps = vec![swap("r1 1", "x.near", NEAR, "5", newest - 60)];

        let healthy = aggregator(
            e2e_chain(),
            FakeSwapFeed::with_swaps(swaps.clone()),
            FakePrices::near("5.00"),
            Arc::clone(&store),
        );
        let Ok(Some(_)) = healthy.run_cycle().await else {
            panic!("first cycle should run");
        };

        for broken in [
            FakeChain {
                count_fails: true,
                ..e2e_chain()
            },
            FakeChain {
                failing_pages: [0].into_iter().collect(),
                ..e2e_chain()
            },
        ] {
            let agg = aggregator(
                broken,
                FakeSwapFeed::with_swaps(swaps.clone()),
                FakePrices::near("5.00"),
                Arc::clone(&store),
            );
            let Ok(Some(report)) = agg.run_cycle().await else {
                panic!("cycle should complete");
            };
            assert_eq!(report.pools_rolled_up, 1);
            assert_eq!(report.pools_saved, 0);

            let Ok(pools) = store.find_all_pools().await else {
                panic!("pools listed");
            };
            let Some(pool) = pools.first() else {
                panic!("pool kept");
            };
            assert_eq!(pool.volume_first, amt("2000000000000000000000000000"));
            assert_eq!(pool.volume_second, amt("1000000000"));
        }
    }

    #[tokio::test]
    async fn denylisted_pool_with_swaps_is_never_recorded() {
        let store = Arc::new(MemoryStore::new());
        let newest = hour_boundaries(Utc::now()).first().copied().unwrap_or_default();
        let chain = FakeChain::with_pools(vec![
            two_token_pool(1, (NEAR, "2000000000000000000000000000"), ("x.near", "1000000000")),
            two_token_pool(2, (NEAR, "1000"), ("scam.near", "1000")),
        ])
        .token(NEAR, 24, "wNEAR")
        .token("x.near", 6, "X")
        .token("scam.near", 0, "SCAM");
        let feed = FakeSwapFeed::with_swaps(vec![
            swap("r1 2", "scam.near", NEAR, "900", newest - 60),
            swap("r2 1", "x.near", NEAR, "3", newest - 60),
        ]);
        let agg = aggregator_denying(
            chain,
            feed,
            FakePrices::near("5.00"),
            Arc::clone(&store),
            &["scam.near"],
        );

        let Ok(Some(report)) = agg.run_cycle().await else {
            panic!("cycle should run");
        };
        assert_eq!(report.pools_fetched, 1);
        assert_eq!(report.pools_saved, 1);

        let Ok(pools) = store.find_all_pools().await else {
            panic!("pools listed");
        };
        assert!(pools.iter().all(|p| p.id != PoolId::new(2)));
        let Ok(None) = store.find_token("scam.near").await else {
            panic!("denylisted token must not be priced");
        };
    }

    #[tokio::test]
    async fn feed_prices_merge_with_internal_prices() {
        let store = Arc::new(MemoryStore::new());
        let prices = FakePrices::near("5.00")
            .quote("x.near", 6, "FEEDX", "3")
            .quote("other.near", 8, "OTHER", "7.5");
        let agg = aggregator(e2e_chain(), FakeSwapFeed::default(), prices, Arc::clone(&store));

        let Ok(Some(report)) = agg.run_cycle().await else {
            panic!("cycle should run");
        };
        assert_eq!(report.tokens_saved, 2);

        let Ok(Some(x)) = store.find_token("x.near").await else {
            panic!("x persisted");
        };
        assert_eq!(x.price.to_string(), "10.00000");
        assert_eq!(x.symbol, "FEEDX");

        let Ok(Some(other)) = store.find_token("other.near").await else {
            panic!("feed-only token persisted");
        };
        assert_eq!(other.price, amt("7.5"));
        assert_eq!(other.decimals, 8);
    }

    #[tokio::test]
    async fn rollup_volume_lands_on_chain_pool() {
        let store = Arc::new(MemoryStore::new());
        let newest = hour_boundaries(Utc::now()).first().copied().unwrap_or_default();
        let feed = FakeSwapFeed::with_swaps(vec![swap("r1 1", "x.near", NEAR, "42", newest - 60)]);
        let agg = aggregator(e2e_chain(), feed, FakePrices::near("5.00"), Arc::clone(&store));

        let Ok(Some(report)) = agg.run_cycle().await else {
            panic!("cycle should run");
        };
        assert_eq!(report.pools_rolled_up, 1);

        let Ok(pools) = store.find_all_pools().await else {
            panic!("pools listed");
        };
        let Some(pool) = pools.first() else {
            panic!("pool persisted");
        };
        assert_eq!(pool.token_first, NEAR);
        assert_eq!(pool.volume24h_second, amt("42"));
        assert!(pool.volume24h_first.is_zero());
    }
}
