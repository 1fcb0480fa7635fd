//! 24 h per-pool swap volume, recomputed from the swap feed every cycle.
//!
//! The window is bucketed on UTC hour boundaries. With 24 boundaries going
//! backward from the current hour there are 23 closed ranges, each queried
//! concurrently; the partial current hour is not included.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;

use crate::domain::{PoolId, PoolVolume, Swap};
use crate::source::SwapSource;

/// Hour boundaries spanned by the window.
pub const WINDOW_HOURS: i64 = 24;

const HOUR_SECS: i64 = 3600;

/// Folds the swap feed into per-pool directional volume.
#[derive(Debug, Clone)]
pub struct VolumeRollup {
    source: Arc<dyn SwapSource>,
}

impl VolumeRollup {
    /// Creates a rollup over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn SwapSource>) -> Self {
        Self { source }
    }

    /// Rolls up the window ending at the current UTC hour.
    pub async fn rollup_24h(&self) -> BTreeMap<PoolId, PoolVolume> {
        self.rollup_at(Utc::now()).await
    }

    /// Rolls up the window ending at the UTC hour containing `now`.
    ///
    /// A failed range contributes no swaps and is logged.
    pub async fn rollup_at(&self, now: DateTime<Utc>) -> BTreeMap<PoolId, PoolVolume> {
        let boundaries = hour_boundaries(now);
        let requests = boundaries
            .iter()
            .zip(boundaries.iter().skip(1))
            .map(|(&to_ts, &from_ts)| async move {
                match self.source.swaps(from_ts, to_ts).await {
                    Ok(swaps) => swaps,
                    Err(e) => {
                        tracing::warn!(from_ts, to_ts, error = %e, "swap range failed");
                        Vec::new()
                    }
                }
            });

        let hours = join_all(requests).await;
        for (hour, swaps) in hours.iter().enumerate() {
            tracing::debug!(hour, swaps = swaps.len(), "swap range fetched");
        }

        fold_swaps(hours.into_iter().flatten())
    }
}

/// Unix seconds of the current UTC hour and the 23 hours before it,
/// newest first.
#[must_use]
pub fn hour_boundaries(now: DateTime<Utc>) -> Vec<i64> {
    let ts = now.timestamp();
    let hour_start = ts - ts.rem_euclid(HOUR_SECS);
    (0..WINDOW_HOURS).map(|i| hour_start - i * HOUR_SECS).collect()
}

/// Folds swaps into per-pool volume.
///
/// The first swap seen for a pool fixes its token order; each swap adds
/// its input amount to the side it was traded in on. Swaps whose id does
/// not encode a pool are dropped.
pub fn fold_swaps<I>(swaps: I) -> BTreeMap<PoolId, PoolVolume>
where
    I: IntoIterator<Item = Swap>,
{
    let mut volumes: BTreeMap<PoolId, PoolVolume> = BTreeMap::new();
    for swap in swaps {
        let Some(pool_id) = swap.pool_id() else {
            tracing::debug!(swap_id = %swap.id, "swap id has no pool, skipped");
            continue;
        };
        volumes
            .entry(pool_id)
            .or_insert_with(|| PoolVolume::seed(&swap))
            .accumulate(&swap);
    }
    volumes
}
