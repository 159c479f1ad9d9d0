//! Parser for bitcoind-style JSON.
//!
//! Amounts are converted with `rust_decimal` so a node value such as
//! `0.00400000` maps to exactly `400000` base units; nothing goes through `f64`.

use bchain_config::RpcConfig;
use bchain_types::{
	common::BigInt, ChainError, ChainParams, ChainParser, Result, ScriptPubKey, ScriptSig, Tx,
	Vin, Vout,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

/// Coinbase maturity of Bitcoin.
pub const DEFAULT_COINBASE_MATURITY: u32 = 100;

/// Parser shared by Bitcoin and its forks.
#[derive(Debug, Clone)]
pub struct BitcoinLikeParser {
	params: &'static ChainParams,
	amount_decimals: u32,
	minimum_coinbase_confirmations: u32,
}

impl BitcoinLikeParser {
	/// Creates a parser with Bitcoin's 100-block coinbase maturity unless the
	/// configuration overrides it.
	pub fn new(params: &'static ChainParams, config: &RpcConfig) -> Self {
		Self::with_default_maturity(params, config, DEFAULT_COINBASE_MATURITY)
	}

	/// Uses `default_maturity` unless the config sets
	/// `minimum_coinbase_confirmations`.
	pub fn with_default_maturity(
		params: &'static ChainParams,
		config: &RpcConfig,
		default_maturity: u32,
	) -> Self {
		Self {
			params,
			amount_decimals: config.amount_decimals,
			minimum_coinbase_confirmations: config
				.minimum_coinbase_confirmations
				.unwrap_or(default_maturity),
		}
	}

	fn parse_decimal(s: &str) -> Result<Decimal> {
		Decimal::from_str(s)
			.or_else(|_| Decimal::from_scientific(s))
			.map_err(|e| ChainError::Parse(format!("Invalid amount '{}': {}", s, e)))
	}

	fn convert_vin(vin: RawVin) -> Vin {
		Vin {
			coinbase: vin.coinbase,
			txid: vin.txid,
			vout: vin.vout,
			script_sig: vin.script_sig.map(|s| ScriptSig { hex: s.hex }),
			sequence: vin.sequence,
		}
	}

	fn convert_vout(&self, vout: RawVout) -> Result<Vout> {
		let mut addresses = vout.script_pub_key.addresses;
		if addresses.is_empty() {
			addresses.extend(vout.script_pub_key.address);
		}

		Ok(Vout {
			value_sat: self.amount_to_big_int(&vout.value)?,
			n: vout.n,
			script_pub_key: ScriptPubKey {
				hex: vout.script_pub_key.hex,
				addresses,
			},
		})
	}
}

impl ChainParser for BitcoinLikeParser {
	fn params(&self) -> &'static ChainParams {
		self.params
	}

	fn amount_decimals(&self) -> u32 {
		self.amount_decimals
	}

	fn minimum_coinbase_confirmations(&self) -> u32 {
		self.minimum_coinbase_confirmations
	}

	fn amount_to_big_int(&self, amount: &Value) -> Result<BigInt> {
		let decimal = match amount {
			Value::Number(n) => Self::parse_decimal(&n.to_string())?,
			Value::String(s) => Self::parse_decimal(s.trim())?,
			other => {
				return Err(ChainError::Parse(format!(
					"Amount must be a number or string, got {}",
					other
				)))
			}
		};

		let unit = Decimal::from(10u64.pow(self.amount_decimals));
		decimal
			.checked_mul(unit)
			.and_then(|scaled| scaled.trunc().to_i128())
			.map(BigInt::from)
			.ok_or_else(|| ChainError::Parse(format!("Amount {} out of range", decimal)))
	}

	fn amount_to_decimal_string(&self, amount: &BigInt) -> String {
		let decimals = self.amount_decimals as usize;
		let digits = amount.magnitude().to_string();
		let sign = if amount.sign() == num_bigint::Sign::Minus {
			"-"
		} else {
			""
		};

		if decimals == 0 {
			return format!("{}{}", sign, digits);
		}

		let padded = format!("{:0>width$}", digits, width = decimals + 1);
		let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
		let frac_part = frac_part.trim_end_matches('0');

		if frac_part.is_empty() {
			format!("{}{}", sign, int_part)
		} else {
			format!("{}{}.{}", sign, int_part, frac_part)
		}
	}

	fn parse_tx_json(&self, raw: &Value) -> Result<Tx> {
		let raw = RawTx::deserialize(raw)
			.map_err(|e| ChainError::Parse(format!("Invalid transaction JSON: {}", e)))?;

		let vout = raw
			.vout
			.into_iter()
			.map(|vout| self.convert_vout(vout))
			.collect::<Result<Vec<_>>>()?;

		Ok(Tx {
			hex: raw.hex,
			txid: raw.txid,
			version: raw.version,
			lock_time: raw.locktime,
			vin: raw.vin.into_iter().map(Self::convert_vin).collect(),
			vout,
			block_hash: raw.blockhash,
			confirmations: raw.confirmations,
			time: raw.time,
			blocktime: raw.blocktime,
		})
	}
}

#[derive(Debug, Deserialize)]
struct RawTx {
	#[serde(default)]
	hex: String,
	txid: String,
	version: i32,
	locktime: u32,
	vin: Vec<RawVin>,
	vout: Vec<RawVout>,
	#[serde(default)]
	blockhash: Option<String>,
	#[serde(default)]
	confirmations: u32,
	#[serde(default)]
	time: i64,
	#[serde(default)]
	blocktime: i64,
}

#[derive(Debug, Deserialize)]
struct RawVin {
	#[serde(default)]
	coinbase: Option<String>,
	#[serde(default)]
	txid: Option<String>,
	#[serde(default)]
	vout: u32,
	#[serde(rename = "scriptSig", default)]
	script_sig: Option<RawScriptSig>,
	sequence: u32,
}

#[derive(Debug, Deserialize)]
struct RawScriptSig {
	hex: String,
}

#[derive(Debug, Deserialize)]
struct RawVout {
	value: Value,
	n: u32,
	#[serde(rename = "scriptPubKey")]
	script_pub_key: RawScriptPubKey,
}

#[derive(Debug, Deserialize)]
struct RawScriptPubKey {
	hex: String,
	#[serde(default)]
	addresses: Vec<String>,
	#[serde(default)]
	address: Option<String>,
}
