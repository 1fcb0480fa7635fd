//! HTTP clients for the fiat helper and the external token price feed.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{FiatPriceSource, TokenPriceFeed};
use crate::domain::{Amount, TokenQuote};
use crate::error::OracleError;

/// Reads `GET {helper}/fiat` and `GET {price_api}`.
#[derive(Debug, Clone)]
pub struct PriceApiClient {
    http: reqwest::Client,
    helper_url: String,
    price_api_url: String,
}

/// `{"near": {"usd": 1.23}}`
#[derive(Debug, Deserialize)]
struct FiatResponse {
    near: FiatQuote,
}

#[derive(Debug, Deserialize)]
struct FiatQuote {
    usd: Amount,
}

impl PriceApiClient {
    /// Creates a client for the two price endpoints. Either may be empty.
    #[must_use]
    pub fn new(http: reqwest::Client, helper_url: String, price_api_url: String) -> Self {
        Self {
            http,
            helper_url,
            price_api_url,
        }
    }

    fn fiat_url(&self) -> String {
        format!("{}/fiat", self.helper_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl FiatPriceSource for PriceApiClient {
    async fn fiat_price(&self) -> Result<Amount, OracleError> {
        if self.helper_url.is_empty() {
            return Err(OracleError::Config("HELPER_URL is not set".to_string()));
        }
        let response: FiatResponse = self
            .http
            .get(self.fiat_url())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.near.usd)
    }
}

#[async_trait]
impl TokenPriceFeed for PriceApiClient {
    async fn token_prices(&self) -> Result<HashMap<String, TokenQuote>, OracleError> {
        if self.price_api_url.is_empty() {
            return Err(OracleError::Config("PRICE_API is not set".to_string()));
        }
        Ok(self
            .http
            .get(&self.price_api_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}
