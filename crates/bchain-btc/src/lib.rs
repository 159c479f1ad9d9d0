//! Generic JSON-RPC backend for Bitcoin-family nodes.
//!
//! `BitcoinRpc` talks to a bitcoind-compatible node and implements the
//! `BlockChain` trait. Coin-specific adapters hold a `BitcoinRpc`, reconfigure
//! it (marshaling dialect, capability flags, parser) and forward the calls they
//! do not override.
//!
//! # Architecture
//!
//! - `transport`: HTTP transport and the retry wrapper around it
//! - `marshaler`: RPC commands and the request dialects that encode them
//! - `parser`: Bitcoin-like parser for amounts and verbose transaction JSON
//! - `params`: Bitcoin network parameters
//! - `rpc`: the `BitcoinRpc` client itself

pub mod marshaler;
pub mod params;
pub mod parser;
pub mod rpc;
pub mod transport;

pub use marshaler::{EstimateMode, JsonMarshalerV1, JsonMarshalerV2, RpcCommand, RpcMarshaler};
pub use parser::BitcoinLikeParser;
pub use rpc::BitcoinRpc;
pub use transport::{HttpTransport, RetryTransport, RpcTransport};
