//! Immutable chain parameters and the lookup table that resolves them.
//!
//! Each coin backend declares a `static` registry listing every network variant
//! its node can report. The registry is read-only after process start, so it is
//! shared between threads without any synchronization.

use crate::errors::{ChainError, Result};
use std::fmt;

/// Parameters identifying one deployment of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainParams {
	/// Chain name as reported by `getblockchaininfo` (`main`, `test`, ...).
	pub name: &'static str,
	/// Network magic value (message start bytes read as little-endian u32).
	pub net: u32,
	/// Version byte of pay-to-pubkey-hash addresses.
	pub pubkey_hash_addr_id: u8,
	/// Version byte of pay-to-script-hash addresses.
	pub script_hash_addr_id: u8,
	/// Human readable part of segwit addresses.
	pub bech32_hrp: &'static str,
	/// Default P2P port.
	pub default_port: u16,
}

impl fmt::Display for ChainParams {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} (magic 0x{:08x})", self.name, self.net)
	}
}

/// Static table mapping chain names to parameters.
pub struct ChainParamsRegistry {
	coin: &'static str,
	entries: &'static [ChainParams],
}

impl ChainParamsRegistry {
	/// Creates a registry over a fixed table. Names must be unique.
	pub const fn new(coin: &'static str, entries: &'static [ChainParams]) -> Self {
		Self { coin, entries }
	}

	/// Resolves the parameters for a chain name.
	///
	/// # Errors
	///
	/// Returns `ChainError::Config` if the name is not in the table. There is
	/// no fallback network.
	pub fn lookup(&self, chain: &str) -> Result<&'static ChainParams> {
		self.entries
			.iter()
			.find(|params| params.name == chain)
			.ok_or_else(|| {
				ChainError::Config(format!(
					"Unknown {} chain '{}', expected one of: {}",
					self.coin,
					chain,
					self.names().join(", ")
				))
			})
	}

	/// Returns the recognized chain names in table order.
	pub fn names(&self) -> Vec<&'static str> {
		self.entries.iter().map(|params| params.name).collect()
	}

	pub fn coin(&self) -> &'static str {
		self.coin
	}
}

impl fmt::Debug for ChainParamsRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChainParamsRegistry")
			.field("coin", &self.coin)
			.field("chains", &self.names())
			.finish()
	}
}
