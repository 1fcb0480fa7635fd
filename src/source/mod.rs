//! External collaborators: the chain, the swap feed, and the price APIs.
//!
//! Every upstream the aggregation cycle reads from sits behind one of the
//! traits below so the core can run against in-memory fakes. Each call may
//! fail or time out independently; callers decide the fallback.

pub mod near_rpc;
pub mod price_api;
pub mod swap_feed;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;

use async_trait::async_trait;

pub use near_rpc::NearRpcClient;
pub use price_api::PriceApiClient;
pub use swap_feed::SwapFeedClient;

use crate::config::OracleConfig;
use crate::domain::{Amount, ContractPool, FtMetadata, Swap, TokenQuote};
use crate::error::OracleError;

/// Page size cap of the swap feed; a busier hour is silently truncated.
pub const SWAP_PAGE_LIMIT: usize = 1000;

/// Pool listing of the AMM exchange contract.
#[async_trait]
pub trait PoolSource: Send + Sync + std::fmt::Debug {
    /// Total number of pools on the contract.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] on transport or decode failure.
    async fn pool_count(&self) -> Result<u64, OracleError>;

    /// One page of pools starting at `from_index`.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] on transport or decode failure.
    async fn pools(&self, from_index: u64, limit: u64) -> Result<Vec<ContractPool>, OracleError>;
}

/// NEP-148 fungible token metadata lookup.
#[async_trait]
pub trait TokenMetadataSource: Send + Sync + std::fmt::Debug {
    /// Reads `ft_metadata` from the token contract.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] if the account is not a fungible token
    /// contract or the call fails.
    async fn ft_metadata(&self, token: &str) -> Result<FtMetadata, OracleError>;
}

/// Historical swap events.
#[async_trait]
pub trait SwapSource: Send + Sync + std::fmt::Debug {
    /// Swaps with `from_ts <= block_timestamp <= to_ts`, ascending, capped
    /// at [`SWAP_PAGE_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] on transport or decode failure.
    async fn swaps(&self, from_ts: i64, to_ts: i64) -> Result<Vec<Swap>, OracleError>;
}

/// USD price of the NEAR anchor.
#[async_trait]
pub trait FiatPriceSource: Send + Sync + std::fmt::Debug {
    /// Current USD price of one NEAR.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] on transport or decode failure.
    async fn fiat_price(&self) -> Result<Amount, OracleError>;
}

/// External per-token price feed used as a fallback.
#[async_trait]
pub trait TokenPriceFeed: Send + Sync + std::fmt::Debug {
    /// Quotes keyed by token account.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] on transport or decode failure.
    async fn token_prices(&self) -> Result<HashMap<String, TokenQuote>, OracleError>;
}

/// Builds the HTTP client shared by every adapter.
///
/// # Errors
///
/// Returns [`OracleError::Http`] if the TLS backend cannot be initialised.
pub fn http_client(config: &OracleConfig) -> Result<reqwest::Client, OracleError> {
    Ok(reqwest::Client::builder()
        .timeout(config.http_timeout())
        .user_agent(concat!("amm-price-oracle/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
