//! Shared types for Bitcoin-family chain backends.
//!
//! This crate defines the vocabulary the rest of the workspace speaks: the
//! `BlockChain` capability trait every backend implements, the `ChainParser`
//! trait used to turn node JSON into domain records, immutable chain parameters
//! and the error type all of them return.

pub mod chains;
pub mod common;
pub mod errors;
pub mod params;
pub mod parser;
pub mod transaction;

pub use chains::{BlockChain, BlockHeader, BlockchainInfo, ChainInfo};
pub use common::{BlockHeight, FeeRate, TxId};
pub use errors::{ChainError, Result};
pub use params::{ChainParams, ChainParamsRegistry};
pub use parser::ChainParser;
pub use transaction::{ScriptPubKey, ScriptSig, Tx, Vin, Vout};
