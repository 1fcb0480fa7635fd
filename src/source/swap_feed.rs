//! GraphQL client for the swap indexer.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{SWAP_PAGE_LIMIT, SwapSource};
use crate::domain::Swap;
use crate::error::OracleError;

const SWAPS_QUERY: &str = "query Swaps($first: Int!, $from: BigInt!, $to: BigInt!) {
  swaps(
    first: $first
    where: { blockTimestamp_gte: $from, blockTimestamp_lte: $to }
    orderBy: blockTimestamp
    orderDirection: asc
  ) {
    id
    tokenIn
    tokenOut
    tokenInAmount
    tokenOutAmount
    blockTimestamp
  }
}";

/// Swap feed backed by a subgraph-style GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct SwapFeedClient {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    data: Option<SwapsData>,
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SwapsData {
    swaps: Vec<Value>,
}

impl SwapFeedClient {
    /// Creates a client posting to `url`.
    #[must_use]
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self { http, url }
    }
}

/// Decodes each record on its own so a bad amount drops only that swap.
fn extract_swaps(response: GraphResponse) -> Result<Vec<Swap>, OracleError> {
    if let Some(first) = response.errors.first() {
        return Err(OracleError::Decode(format!("graphql error: {first}")));
    }
    let data = response
        .data
        .ok_or_else(|| OracleError::Decode("graphql response has no data".to_string()))?;
    Ok(data
        .swaps
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<Swap>(raw) {
            Ok(swap) => Some(swap),
            Err(e) => {
                tracing::debug!(error = %e, "skipping undecodable swap");
                None
            }
        })
        .collect())
}

#[async_trait]
impl SwapSource for SwapFeedClient {
    async fn swaps(&self, from_ts: i64, to_ts: i64) -> Result<Vec<Swap>, OracleError> {
        if self.url.is_empty() {
            return Err(OracleError::Config("GRAPH_API is not set".to_string()));
        }
        let body = json!({
            "query": SWAPS_QUERY,
            "variables": {
                "first": SWAP_PAGE_LIMIT,
                "from": from_ts.to_string(),
                "to": to_ts.to_string(),
            }
        });

        let response: GraphResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let swaps = extract_swaps(response)?;
        if swaps.len() >= SWAP_PAGE_LIMIT {
            tracing::warn!(from_ts, to_ts, "swap page is full, hour may be truncated");
        }
        Ok(swaps)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn extracts_swaps_from_data() {
        let Ok(response) = serde_json::from_value::<GraphResponse>(json!({
            "data": { "swaps": [{
                "id": "abc 3",
                "tokenIn": "wrap.near",
                "tokenOut": "x.near",
                "tokenInAmount": "10",
                "tokenOutAmount": "20",
                "blockTimestamp": "1700000000"
            }]}
        })) else {
            panic!("valid response");
        };
        let Ok(swaps) = extract_swaps(response) else {
            panic!("swaps extracted");
        };
        assert_eq!(swaps.len(), 1);
        assert_eq!(swaps.first().map(|s| s.block_timestamp), Some(1_700_000_000));
    }

    #[test]
    fn bad_amount_drops_only_that_swap() {
        let Ok(response) = serde_json::from_value::<GraphResponse>(json!({
            "data": { "swaps": [
                { "id": "a 1", "tokenIn": "x", "tokenOut": "y",
                  "tokenInAmount": "oops", "tokenOutAmount": "1", "blockTimestamp": 1 },
                { "id": "b 1", "tokenIn": "x", "tokenOut": "y",
                  "tokenInAmount": "5", "tokenOutAmount": "1", "blockTimestamp": 2 }
            ]}
        })) else {
            panic!("valid response");
        };
        let Ok(swaps) = extract_swaps(response) else {
            panic!("swaps extracted");
        };
        assert_eq!(swaps.len(), 1);
        assert_eq!(swaps.first().map(|s| s.id.as_str()), Some("b 1"));
    }

    #[test]
    fn graphql_errors_fail_the_range() {
        let Ok(response) = serde_json::from_value::<GraphResponse>(json!({
            "data": null,
            "errors": [{ "message": "indexer lagging" }]
        })) else {
            panic!("valid response");
        };
        assert!(matches!(extract_swaps(response), Err(OracleError::Decode(_))));
    }
}
