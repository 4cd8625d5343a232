//! nugetfee: an HTTP fee-estimation gateway in front of a NuBits daemon.
//!
//! A client POSTs a transaction's byte size and output amount; the gateway asks the daemon
//! for the fee (`getfee`, or `getinfo`'s `paytxfee` per started kilobyte when `getfee` is
//! unknown) and answers with the amount as plain text.

pub mod gateway;
pub mod node;
pub mod rpc;
pub mod utils;
