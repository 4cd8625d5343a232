//! axum binding: one fallback route, head screened before the body is buffered.

use crate::gateway::handler::{FeeHandler, RequestHead};
use crate::gateway::negotiate::Decision;
use crate::gateway::reply::Outcome;
use crate::rpc::CoinRpc;
use anyhow::Result;
use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, State};
use axum::http::header::{HeaderName, ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Every path and method lands on the fee handler; it does its own method dispatch.
pub fn router<C: CoinRpc>(handler: Arc<FeeHandler<C>>) -> Router {
    Router::new()
        .fallback(fee_endpoint::<C>)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(handler)
}

async fn fee_endpoint<C: CoinRpc>(
    State(handler): State<Arc<FeeHandler<C>>>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();

    let decision = {
        let content_type = header_text(&parts.headers, CONTENT_TYPE);
        let accept = header_text(&parts.headers, ACCEPT);
        handler.screen(&RequestHead {
            method: parts.method.as_str(),
            content_type: content_type.as_deref(),
            accept: accept.as_deref(),
        })
    };
    if let Decision::Respond(outcome) = decision {
        return outcome.into_response();
    }

    let body = match Bytes::from_request(Request::from_parts(parts, body), &()).await {
        Ok(body) => body,
        Err(rejection) => {
            debug!("unreadable request body: {}", rejection);
            return Outcome::BadRequest.into_response();
        }
    };
    handler.quote(&body).await.into_response()
}

/// All values of `name` joined with `", "`; `None` if the header is absent.
/// A value that is not visible ASCII turns the whole header into `""`, which matches no MIME.
fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    let mut values = Vec::new();
    for value in headers.get_all(name) {
        match value.to_str() {
            Ok(text) => values.push(text),
            Err(_) => return Some(String::new()),
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// HTTP front of the gateway.
pub struct GatewayServer<C: CoinRpc> {
    addr: SocketAddr,
    handler: Arc<FeeHandler<C>>,
}

impl<C: CoinRpc> GatewayServer<C> {
    pub fn new(addr: SocketAddr, rpc: Arc<C>) -> Self {
        Self { addr, handler: Arc::new(FeeHandler::new(rpc)) }
    }

    /// Bind and spawn the server. Returns the bound address (useful with port 0) and
    /// the task, which finishes once `shutdown` resolves and in-flight requests drain.
    pub fn start<F>(self, shutdown: F) -> Result<(SocketAddr, JoinHandle<Result<()>>)>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.handler);
        let server = axum::Server::try_bind(&self.addr)?.serve(app.into_make_service());
        let local_addr = server.local_addr();
        info!("Starting fee gateway on {}", local_addr);

        let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
            server.with_graceful_shutdown(shutdown).await?;
            info!("fee gateway stopped");
            Ok::<(), anyhow::Error>(())
        });
        Ok((local_addr, handle))
    }
}
