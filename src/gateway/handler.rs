//! Per-request pipeline: screen the request head, then parse and price the body.

use crate::gateway::fees::FeeResolver;
use crate::gateway::form::FeeRequest;
use crate::gateway::negotiate::{negotiate, Decision};
use crate::gateway::reply::Outcome;
use crate::rpc::{CoinRpc, RpcCallError};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Method and the negotiation headers; everything needed before the body is read.
#[derive(Debug, Clone, Copy)]
pub struct RequestHead<'a> {
    pub method: &'a str,
    pub content_type: Option<&'a str>,
    pub accept: Option<&'a str>,
}

/// Stateless per-request handler. Holds only the daemon client.
pub struct FeeHandler<C: CoinRpc> {
    resolver: FeeResolver<C>,
}

impl<C: CoinRpc> FeeHandler<C> {
    pub fn new(rpc: Arc<C>) -> Self {
        Self { resolver: FeeResolver::new(rpc) }
    }

    /// Decide from the head alone whether the body is needed at all.
    pub fn screen(&self, head: &RequestHead<'_>) -> Decision {
        let decision = negotiate(head.method, head.content_type, head.accept);
        if let Decision::Respond(outcome) = &decision {
            debug!(method = head.method, ?outcome, "answered without reading body");
        }
        decision
    }

    /// Parse a form body and resolve its fee. No RPC call is made for an invalid body.
    pub async fn quote(&self, body: &[u8]) -> Outcome {
        let fee_request = match FeeRequest::from_form(body) {
            Ok(r) => r,
            Err(e) => {
                debug!("rejecting fee request: {}", e);
                return Outcome::BadRequest;
            }
        };

        match self.resolver.resolve(&fee_request).await {
            Ok(fee) => {
                debug!(bytes = fee_request.byte_size, amount = fee_request.amount, fee, "fee resolved");
                Outcome::Fee(fee)
            }
            Err(RpcCallError::Daemon(e)) => {
                warn!(code = e.code, "daemon rejected fee query: {}", e.message);
                Outcome::UpstreamFailure(e.message)
            }
            Err(e) => {
                error!("fee query failed: {}", e);
                Outcome::InternalError
            }
        }
    }

    /// `screen` then `quote`, for callers that already hold the body.
    pub async fn handle(&self, head: &RequestHead<'_>, body: &[u8]) -> Outcome {
        match self.screen(head) {
            Decision::Respond(outcome) => outcome,
            Decision::ReadBody => self.quote(body).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fees::tests::StubRpc;
    use crate::gateway::negotiate::REQUEST_MIME;
    use crate::rpc::RpcError;
    use serde_json::json;

    const POST: RequestHead<'static> = RequestHead { method: "POST", content_type: Some(REQUEST_MIME), accept: None };

    fn handler(rpc: &Arc<StubRpc>) -> FeeHandler<StubRpc> {
        FeeHandler::new(rpc.clone())
    }

    #[tokio::test]
    async fn negotiation_failures_never_reach_the_daemon() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Ok(json!(0.01))));
        let h = handler(&rpc);
        let body = b"bytes=500&amount=10.0000";

        let put = RequestHead { method: "PUT", ..POST };
        assert_eq!(h.handle(&put, body).await, Outcome::MethodNotAllowed);
        let json_ct = RequestHead { content_type: Some("application/json"), ..POST };
        assert_eq!(h.handle(&json_ct, body).await, Outcome::UnsupportedMediaType);
        let json_accept = RequestHead { accept: Some("application/json"), ..POST };
        assert_eq!(h.handle(&json_accept, body).await, Outcome::NotAcceptable);
        let get = RequestHead { method: "GET", ..POST };
        assert_eq!(h.handle(&get, body).await, Outcome::Usage);
        let options = RequestHead { method: "OPTIONS", ..POST };
        assert_eq!(h.handle(&options, body).await, Outcome::Preflight);

        assert!(rpc.methods_called().is_empty());
    }

    #[test]
    fn screening_needs_no_body() {
        let rpc = Arc::new(StubRpc::default());
        let h = handler(&rpc);
        assert_eq!(h.screen(&POST), Decision::ReadBody);
        assert_eq!(h.screen(&RequestHead { method: "GET", ..POST }), Decision::Respond(Outcome::Usage));
    }

    #[tokio::test]
    async fn invalid_bodies_never_reach_the_daemon() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Ok(json!(0.01))));
        let h = handler(&rpc);
        for body in [&b"bytes=500"[..], b"amount=1.0", b"bytes=x&amount=1.0", b"bytes=1&amount=y", b"garbage"] {
            assert_eq!(h.handle(&POST, body).await, Outcome::BadRequest);
        }
        assert!(rpc.methods_called().is_empty());
    }

    #[tokio::test]
    async fn direct_fee() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Ok(json!(0.01))));
        let outcome = handler(&rpc).handle(&POST, b"bytes=500&amount=10.0000").await;
        assert_eq!(outcome, Outcome::Fee(0.01));
        assert_eq!(outcome.body(), "0.01");
    }

    #[tokio::test]
    async fn missing_headers_pass_negotiation() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Ok(json!(0.01))));
        let head = RequestHead { content_type: None, accept: Some("*/*"), ..POST };
        assert_eq!(handler(&rpc).handle(&head, b"bytes=500&amount=10.0000").await, Outcome::Fee(0.01));
    }

    #[tokio::test]
    async fn fallback_fee() {
        let rpc = Arc::new(StubRpc::default().with("getinfo", Ok(json!({"paytxfee": 0.001}))));
        let outcome = handler(&rpc).handle(&POST, b"bytes=1500&amount=5.0000").await;
        assert_eq!(outcome.body(), "0.002");
        assert_eq!(rpc.methods_called(), vec!["getfee", "getinfo"]);
    }

    #[tokio::test]
    async fn daemon_error_message_is_passed_through() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Err(RpcError::new(-32602, "Invalid params"))));
        let outcome = handler(&rpc).handle(&POST, b"bytes=100&amount=1.0000").await;
        assert_eq!(outcome, Outcome::UpstreamFailure("Invalid params".into()));
        assert_eq!(rpc.methods_called(), vec!["getfee"]);
    }

    #[tokio::test]
    async fn getinfo_error_message_is_passed_through() {
        let rpc = Arc::new(StubRpc::default().with("getinfo", Err(RpcError::new(-28, "Loading block index..."))));
        let outcome = handler(&rpc).handle(&POST, b"bytes=100&amount=1.0000").await;
        assert_eq!(outcome, Outcome::UpstreamFailure("Loading block index...".into()));
        assert_eq!(outcome.body(), "Loading block index...");
        assert_eq!(rpc.methods_called(), vec!["getfee", "getinfo"]);
    }

    #[tokio::test]
    async fn malformed_daemon_reply_is_a_generic_500() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Ok(json!(null))));
        let outcome = handler(&rpc).handle(&POST, b"bytes=100&amount=1.0000").await;
        assert_eq!(outcome, Outcome::InternalError);
        assert_eq!(outcome.body(), "Internal Server Error");
    }

    #[tokio::test]
    async fn identical_requests_give_identical_outcomes() {
        let rpc = Arc::new(StubRpc::default().with("getfee", Ok(json!(0.05))));
        let h = handler(&rpc);
        let body = b"bytes=250&amount=2.0000";
        let first = h.handle(&POST, body).await;
        for _ in 0..5 {
            assert_eq!(h.handle(&POST, body).await, first);
        }
    }
}
