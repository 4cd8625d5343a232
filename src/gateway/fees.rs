//! Fee resolution against the daemon.
//!
//! `getfee(bytes, amount)` is asked first. A daemon that does not know it (method not
//! found) is asked `getinfo` instead, and the fee is derived from its `paytxfee`:
//! one `paytxfee` per started kilobyte, where exactly 1000 bytes already counts as two.
//! The fallback runs at most once and only for that specific error.

use crate::gateway::form::FeeRequest;
use crate::rpc::{CoinRpc, RpcCallError};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// `pay_tx_fee * (1 + byte_size / 1000)` with integer division.
pub fn kilobyte_fee(pay_tx_fee: f64, byte_size: u64) -> f64 {
    pay_tx_fee * (1 + byte_size / 1000) as f64
}

pub struct FeeResolver<C: CoinRpc> {
    rpc: Arc<C>,
}

impl<C: CoinRpc> FeeResolver<C> {
    pub fn new(rpc: Arc<C>) -> Self {
        Self { rpc }
    }

    pub async fn resolve(&self, req: &FeeRequest) -> Result<f64, RpcCallError> {
        let params = vec![json!(req.byte_size), json!(req.amount)];
        match self.rpc.call("getfee", params).await {
            Ok(value) => as_amount(&value, "getfee result"),
            Err(e) if e.is_method_not_found() => {
                info!(bytes = req.byte_size, "daemon lacks getfee, deriving fee from getinfo");
                self.fee_from_getinfo(req.byte_size).await
            }
            Err(e) => Err(e),
        }
    }

    async fn fee_from_getinfo(&self, byte_size: u64) -> Result<f64, RpcCallError> {
        let info = self.rpc.call("getinfo", vec![]).await?;
        let pay_tx_fee = info
            .get("paytxfee")
            .ok_or_else(|| RpcCallError::Malformed("getinfo has no paytxfee".into()))?;
        Ok(kilobyte_fee(as_amount(pay_tx_fee, "paytxfee")?, byte_size))
    }
}

fn as_amount(value: &Value, what: &str) -> Result<f64, RpcCallError> {
    value
        .as_f64()
        .ok_or_else(|| RpcCallError::Malformed(format!("{} is not a number: {}", what, value)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rpc::RpcError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted daemon: fixed reply per method, unknown methods are "method not found".
    #[derive(Default)]
    pub(crate) struct StubRpc {
        replies: HashMap<&'static str, Result<Value, RpcError>>,
        pub calls: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl StubRpc {
        pub fn with(mut self, method: &'static str, reply: Result<Value, RpcError>) -> Self {
            self.replies.insert(method, reply);
            self
        }

        pub fn methods_called(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
        }
    }

    #[async_trait]
    impl CoinRpc for StubRpc {
        async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcCallError> {
            self.calls.lock().unwrap().push((method.to_string(), params));
            match self.replies.get(method) {
                Some(Ok(v)) => Ok(v.clone()),
                Some(Err(e)) => Err(RpcCallError::Daemon(e.clone())),
                None => Err(RpcCallError::Daemon(RpcError::new(crate::rpc::METHOD_NOT_FOUND, "Method not found"))),
            }
        }
    }

    fn request(byte_size: u64, amount: f64) -> FeeRequest {
        FeeRequest { byte_size, amount }
    }

    #[test]
    fn kilobyte_tiers() {
        assert_eq!(kilobyte_fee(0.25, 0), 0.25);
        assert_eq!(kilobyte_fee(0.25, 999), 0.25);
        assert_eq!(kilobyte_fee(0.25, 1000), 0.5);
        assert_eq!(kilobyte_fee(0.25, 1001), 0.5);
        assert_eq!(kilobyte_fee(0.25, 1999), 0.5);
        assert_eq!(kilobyte_fee(0.25, 2000), 0.75);
        assert_eq!(kilobyte_fee(0.001, 1500), 0.002);
    }

    #[tokio::test]
    async fn getfee_result_is_the_fee() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Ok(json!(0.01))));
        let fee = FeeResolver::new(rpc.clone()).resolve(&request(500, 10.0)).await.unwrap();
        assert_eq!(fee, 0.01);
        let calls = rpc.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec![json!(500), json!(10.0)]);
    }

    #[tokio::test]
    async fn falls_back_to_getinfo_on_method_not_found() {
        let rpc = Arc::new(StubRpc::default().with("getinfo", Ok(json!({"paytxfee": 0.001, "blocks": 10}))));
        let fee = FeeResolver::new(rpc.clone()).resolve(&request(1500, 5.0)).await.unwrap();
        assert_eq!(fee, 0.002);
        assert_eq!(rpc.methods_called(), vec!["getfee", "getinfo"]);
    }

    #[tokio::test]
    async fn other_errors_skip_fallback() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Err(RpcError::new(-32602, "Invalid params"))));
        let err = FeeResolver::new(rpc.clone()).resolve(&request(100, 1.0)).await.unwrap_err();
        assert!(matches!(err, RpcCallError::Daemon(ref e) if e.message == "Invalid params"));
        assert_eq!(rpc.methods_called(), vec!["getfee"]);
    }

    #[tokio::test]
    async fn fallback_failure_surfaces_its_own_error() {
        let rpc = Arc::new(StubRpc::default().with("getinfo", Err(RpcError::new(-28, "Loading block index..."))));
        let err = FeeResolver::new(rpc.clone()).resolve(&request(100, 1.0)).await.unwrap_err();
        assert!(matches!(err, RpcCallError::Daemon(ref e) if e.code == -28));
        // getinfo itself answering "method not found" must not loop
        let rpc = Arc::new(StubRpc::default());
        let err = FeeResolver::new(rpc.clone()).resolve(&request(100, 1.0)).await.unwrap_err();
        assert!(err.is_method_not_found());
        assert_eq!(rpc.methods_called(), vec!["getfee", "getinfo"]);
    }

    #[tokio::test]
    async fn wrong_shapes_are_malformed() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Ok(json!("0.01"))));
        let err = FeeResolver::new(rpc).resolve(&request(1, 1.0)).await.unwrap_err();
        assert!(matches!(err, RpcCallError::Malformed(_)));

        let rpc = Arc::new(StubRpc::default().with("getinfo", Ok(json!({"version": 1}))));
        let err = FeeResolver::new(rpc).resolve(&request(1, 1.0)).await.unwrap_err();
        assert!(matches!(err, RpcCallError::Malformed(_)));
    }
}
