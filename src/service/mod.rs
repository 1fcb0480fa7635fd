//! Service layer: the aggregation pipeline.
//!
//! [`Aggregator`] drives one cycle per tick: [`PoolFetcher`] and
//! [`VolumeRollup`] collect chain and swap data, [`PriceEngine`] reconciles
//! prices (resolving metadata through [`TokenResolver`]), and the result is
//! written to the [`crate::persistence::Store`] as one batch.

pub mod aggregator;
pub mod pool_fetcher;
pub mod price_engine;
pub mod token_resolver;
pub mod volume_rollup;

pub use aggregator::{Aggregator, CycleReport};
pub use pool_fetcher::PoolFetcher;
pub use price_engine::{PoolQuote, PriceEngine};
pub use token_resolver::TokenResolver;
pub use volume_rollup::VolumeRollup;
