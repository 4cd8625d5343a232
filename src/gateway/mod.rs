//! Fee gateway
//!
//! - `negotiate`: method / Content-Type / Accept checks, before the body is read
//! - `form`: strict form-body parsing into a `FeeRequest`
//! - `fees`: getfee, with the getinfo/paytxfee fallback
//! - `reply`: the closed set of outcomes and their status, headers and body
//! - `handler`: the ordered pipeline tying the above together
//! - `server`: axum binding
//!
//! Only `server` knows about the HTTP framework's request types; everything else works on
//! plain method/header strings and body bytes.

pub mod fees;
pub mod form;
pub mod handler;
pub mod negotiate;
pub mod reply;
pub mod server;

pub use fees::{kilobyte_fee, FeeResolver};
pub use form::{FeeRequest, FormError};
pub use handler::{FeeHandler, RequestHead};
pub use reply::Outcome;
pub use server::{router, GatewayServer};
