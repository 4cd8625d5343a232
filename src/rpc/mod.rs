//! RPC module
//!
//! - `CoinRpc` trait: the single `call(method, params)` operation the gateway needs
//! - `HttpCoinRpc`: JSON-RPC over HTTP with basic auth and a request timeout
//! - `RpcCallError`: daemon error objects kept apart from transport failures

pub mod client;

pub use client::{CoinRpc, HttpCoinRpc, RpcCallError, RpcError, METHOD_NOT_FOUND};
