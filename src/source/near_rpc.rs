//! NEAR JSON-RPC client for contract view calls.
//!
//! Only `query` / `call_function` is used: `get_number_of_pools` and
//! `get_pools` on the exchange contract, `ft_metadata` on token contracts.
//! Arguments travel base64-encoded; the result is a byte array holding the
//! JSON return value.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{PoolSource, TokenMetadataSource};
use crate::domain::{Amount, ContractPool, FtMetadata, PoolId};
use crate::error::OracleError;

/// View-only NEAR RPC client bound to one exchange contract.
#[derive(Debug, Clone)]
pub struct NearRpcClient {
    http: reqwest::Client,
    node_url: String,
    contract_id: String,
}

/// JSON-RPC envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<Value>,
}

/// `call_function` result. Older nodes report contract panics inline in
/// `error` instead of the envelope.
#[derive(Debug, Deserialize)]
struct CallResult {
    #[serde(default)]
    result: Option<Vec<u8>>,
    #[serde(default)]
    error: Option<String>,
}

/// Element of the `get_pools` return value.
#[derive(Debug, Deserialize)]
struct PoolInfo {
    token_account_ids: Vec<String>,
    amounts: Vec<Amount>,
}

impl NearRpcClient {
    /// Creates a client for `contract_id` served by `node_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, node_url: String, contract_id: String) -> Self {
        Self {
            http,
            node_url,
            contract_id,
        }
    }

    /// Calls a view method on `account_id` and decodes its JSON result.
    async fn view<T: DeserializeOwned>(
        &self,
        account_id: &str,
        method_name: &str,
        args: &Value,
    ) -> Result<T, OracleError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": "dontcare",
            "method": "query",
            "params": {
                "request_type": "call_function",
                "finality": "final",
                "account_id": account_id,
                "method_name": method_name,
                "args_base64": BASE64.encode(args.to_string()),
            }
        });

        tracing::debug!(account_id, method_name, "rpc view call");

        let response: RpcResponse<CallResult> = self
            .http
            .post(&self.node_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        decode_call_result(response)
    }
}

/// Unwraps the envelope and decodes the returned bytes as JSON.
fn decode_call_result<T: DeserializeOwned>(
    response: RpcResponse<CallResult>,
) -> Result<T, OracleError> {
    if let Some(error) = response.error {
        return Err(OracleError::Rpc(error.to_string()));
    }
    let call = response
        .result
        .ok_or_else(|| OracleError::Decode("rpc response has no result".to_string()))?;
    if let Some(error) = call.error {
        return Err(OracleError::Rpc(error));
    }
    let bytes = call
        .result
        .ok_or_else(|| OracleError::Decode("call result has no payload".to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| OracleError::Decode(e.to_string()))
}

/// Assigns contract indices to a `get_pools` page.
fn pools_from_page(from_index: u64, page: Vec<PoolInfo>) -> Vec<ContractPool> {
    (from_index..)
        .zip(page)
        .map(|(index, info)| ContractPool::new(PoolId::new(index), info.token_account_ids, info.amounts))
        .collect()
}

#[async_trait]
impl PoolSource for NearRpcClient {
    async fn pool_count(&self) -> Result<u64, OracleError> {
        self.view(&self.contract_id, "get_number_of_pools", &json!({}))
            .await
    }

    async fn pools(&self, from_index: u64, limit: u64) -> Result<Vec<ContractPool>, OracleError> {
        let page: Vec<PoolInfo> = self
            .view(
                &self.contract_id,
                "get_pools",
                &json!({ "from_index": from_index, "limit": limit }),
            )
            .await?;
        Ok(pools_from_page(from_index, page))
    }
}

#[async_trait]
impl TokenMetadataSource for NearRpcClient {
    async fn ft_metadata(&self, token: &str) -> Result<FtMetadata, OracleError> {
        self.view(token, "ft_metadata", &json!({})).await
    }
}
