//! Transaction records produced by chain parsers.

use crate::common::{BigInt, TxId};
use serde::{Deserialize, Serialize};

/// Transaction as returned to indexers.
///
/// `block_hash`, `confirmations`, `time` and `blocktime` are only populated for
/// confirmed transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
	pub hex: String,
	pub txid: TxId,
	pub version: i32,
	pub lock_time: u32,
	pub vin: Vec<Vin>,
	pub vout: Vec<Vout>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub block_hash: Option<String>,
	pub confirmations: u32,
	pub time: i64,
	pub blocktime: i64,
}

impl Tx {
	/// Coinbase transactions have a single input without a previous outpoint.
	pub fn is_coinbase(&self) -> bool {
		self.vin.len() == 1 && self.vin[0].coinbase.is_some()
	}

	/// Sum of all output values in base units.
	pub fn total_output(&self) -> BigInt {
		self.vout.iter().map(|vout| &vout.value_sat).sum()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vin {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub coinbase: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub txid: Option<TxId>,
	pub vout: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub script_sig: Option<ScriptSig>,
	pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSig {
	pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vout {
	#[serde(with = "amount")]
	pub value_sat: BigInt,
	pub n: u32,
	pub script_pub_key: ScriptPubKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPubKey {
	pub hex: String,
	#[serde(default)]
	pub addresses: Vec<String>,
}

/// Base-unit amounts travel as decimal strings so JSON consumers never
/// round them through a float.
mod amount {
	use num_bigint::BigInt;
	use serde::{de::Error, Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		s.parse::<BigInt>().map_err(D::Error::custom)
	}
}
