//! Coin daemon JSON-RPC client.
//!
//! `CoinRpc` is the seam the fee handler depends on; `HttpCoinRpc` is the production
//! implementation speaking JSON-RPC over HTTP with basic auth. Tests substitute their own.

use crate::node::config::DaemonConfig;
use crate::utils::errors::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// JSON-RPC "method not found".
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Error object returned by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum RpcCallError {
    /// The daemon answered with an error object.
    #[error("daemon error: {0}")]
    Daemon(RpcError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The reply was not a JSON-RPC envelope, or its result had the wrong shape.
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl RpcCallError {
    pub fn is_method_not_found(&self) -> bool {
        matches!(self, RpcCallError::Daemon(e) if e.code == METHOD_NOT_FOUND)
    }
}

/// Call interface to the coin daemon. Must be safe to invoke from concurrent requests.
#[async_trait]
pub trait CoinRpc: Send + Sync + 'static {
    async fn call(&self, method: &str, params: Vec<Value>) -> std::result::Result<Value, RpcCallError>;
}

#[derive(Serialize, Debug)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

/// Accepts both 1.0 (`result` and `error` always present) and 2.0 envelopes.
#[derive(Deserialize, Debug)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Decode a reply body. The HTTP status is ignored on purpose: bitcoind-family daemons
/// return error envelopes with 404/500 statuses.
fn decode_reply(status: StatusCode, body: &[u8]) -> std::result::Result<Value, RpcCallError> {
    let envelope: RpcResponse = serde_json::from_slice(body)
        .map_err(|e| RpcCallError::Malformed(format!("HTTP {}: {}", status, e)))?;
    if let Some(err) = envelope.error {
        return Err(RpcCallError::Daemon(err));
    }
    Ok(envelope.result.unwrap_or(Value::Null))
}

/// reqwest-backed daemon client.
pub struct HttpCoinRpc {
    client: Client,
    url: Url,
    username: String,
    password: String,
    request_id: AtomicU64,
}

impl HttpCoinRpc {
    pub fn new(cfg: &DaemonConfig) -> Result<Self> {
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            client,
            url: endpoint_url(&cfg.host, cfg.port)?,
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            request_id: AtomicU64::new(0),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn endpoint_url(host: &str, port: u16) -> Result<Url> {
    let invalid = || GatewayError::InvalidSetting { key: "rpchost", value: host.to_string() };
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    let mut url = Url::parse("http://localhost/").map_err(|e| GatewayError::Config(e.to_string()))?;
    url.set_host(Some(&host)).map_err(|_| invalid())?;
    url.set_port(Some(port)).map_err(|_| invalid())?;
    Ok(url)
}

#[async_trait]
impl CoinRpc for HttpCoinRpc {
    async fn call(&self, method: &str, params: Vec<Value>) -> std::result::Result<Value, RpcCallError> {
        let request = RpcRequest { jsonrpc: "2.0", id: self.next_request_id(), method, params };
        debug!(method, id = request.id, "daemon rpc call");

        let response = self
            .client
            .post(self.url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        decode_reply(status, &body)
    }
}
