//! # amm-price-oracle
//!
//! Price oracle and volume aggregator for a NEAR constant-product AMM.
//!
//! Every cycle the oracle reads all pool reserves from the exchange
//! contract, folds the last 24 hours of swaps into per-pool volume, derives
//! USD token prices from pools paired with a priced anchor (NEAR, or JUMBO
//! bootstrapped from a reference pool), reconciles them with an external
//! price feed, and upserts the result. A small read API serves the latest
//! committed state.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler (tokio interval)
//!     │
//!     ├── Aggregator (service/)
//!     │     ├── PoolFetcher ──── PoolSource          ┐
//!     │     ├── VolumeRollup ─── SwapSource          │ source/
//!     │     ├── PriceEngine ──── TokenResolver ─ TokenMetadataSource
//!     │     └── FiatPriceSource, TokenPriceFeed      ┘
//!     │
//!     └── Store (persistence/) ── PostgreSQL or in-memory
//!                 │
//! Read API (api/) ┘
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod source;
