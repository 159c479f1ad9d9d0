//! Common types used throughout the chain backends.

pub use num_bigint::BigInt;

/// Fee rate in the smallest currency unit per kilobyte.
pub type FeeRate = BigInt;

/// Block height
pub type BlockHeight = u32;

/// Transaction id as reported by the node (hex, display byte order)
pub type TxId = String;
