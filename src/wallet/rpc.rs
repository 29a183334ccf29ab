use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::chain::{ChainId, ChainRegistry};
use crate::error::{BalanceFetchError, WalletError};
use crate::wallet::account::FALLBACK_BALANCE;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal JSON-RPC 2.0 client over HTTP POST.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    /// `timeout` of `None` keeps the transport default.
    pub fn new(timeout: Option<Duration>) -> Result<Self, WalletError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| WalletError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub async fn call(&self, endpoint: &str, method: &str, params: Value) -> Result<Value, BalanceFetchError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self.http.post(endpoint).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BalanceFetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: RpcResponse =
            serde_json::from_str(&body).map_err(|e| BalanceFetchError::Malformed(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(BalanceFetchError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        parsed
            .result
            .ok_or_else(|| BalanceFetchError::Malformed("response has neither result nor error".into()))
    }
}

/// Queries native balances and turns them into display strings.
///
/// Failures never escape [`fetch`](Self::fetch): they are logged and replaced
/// by [`FALLBACK_BALANCE`].
#[derive(Debug, Clone)]
pub struct BalanceFetcher {
    client: JsonRpcClient,
    registry: Arc<ChainRegistry>,
}

impl BalanceFetcher {
    pub fn new(registry: Arc<ChainRegistry>, timeout: Option<Duration>) -> Result<Self, WalletError> {
        Ok(Self {
            client: JsonRpcClient::new(timeout)?,
            registry,
        })
    }

    /// Display balance for `public_key`, or the fallback on any error.
    pub async fn fetch(&self, chain: ChainId, public_key: &str) -> String {
        match self.fetch_formatted(chain, public_key).await {
            Ok(balance) => {
                debug!(%chain, address = public_key, %balance, "balance fetched");
                balance
            }
            Err(e) => {
                warn!(%chain, address = public_key, error = %e, "balance fetch failed");
                FALLBACK_BALANCE.to_string()
            }
        }
    }

    /// Base-unit balance, with the error kept.
    pub async fn fetch_base_units(&self, chain: ChainId, public_key: &str) -> Result<u128, BalanceFetchError> {
        let entry = self
            .registry
            .get(chain)
            .ok_or(BalanceFetchError::UnknownChain(chain))?;
        let (method, params) = entry.strategy.balance_request(public_key);
        let result = self
            .client
            .call(&entry.descriptor.rpc_endpoint, method, params)
            .await?;
        entry.strategy.parse_balance(&result)
    }

    async fn fetch_formatted(&self, chain: ChainId, public_key: &str) -> Result<String, BalanceFetchError> {
        let units = self.fetch_base_units(chain, public_key).await?;
        let strategy = self
            .registry
            .strategy(chain)
            .ok_or(BalanceFetchError::UnknownChain(chain))?;
        Ok(strategy.format_balance(units))
    }
}
