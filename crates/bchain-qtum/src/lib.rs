//! Qtum backend.
//!
//! Qtum nodes speak the bitcoind RPC dialect with a few differences: they want
//! positional parameters, support `estimatesmartfee`, use their own network
//! magic values and produce contract outputs (`OP_CREATE` / `OP_CALL`) that
//! carry no address. `QtumRpc` layers those rules on top of `BitcoinRpc`.

pub mod params;
pub mod parser;
pub mod rpc;

pub use params::{get_chain_params, MAINNET_MAGIC, REGTEST_MAGIC, TESTNET_MAGIC};
pub use parser::QtumParser;
pub use rpc::{correct_fee_rate, NetworkState, QtumRpc, MIN_FEE_RATE};
