//! Qtum transaction parser.

use bchain_btc::BitcoinLikeParser;
use bchain_config::RpcConfig;
use bchain_types::{common::BigInt, ChainParams, ChainParser, Result, Tx};
use serde_json::Value;

/// Coinbase and coinstake outputs mature after 500 blocks on Qtum.
pub const QTUM_COINBASE_MATURITY: u32 = 500;

const OP_CREATE: u8 = 0xc1;
const OP_CALL: u8 = 0xc2;

/// Whether an output script creates or calls a contract.
///
/// Contract scripts end with `OP_CREATE` or `OP_CALL`.
pub fn is_contract_script(script_hex: &str) -> bool {
	match hex::decode(script_hex) {
		Ok(script) => matches!(script.last(), Some(&OP_CREATE) | Some(&OP_CALL)),
		Err(_) => false,
	}
}

/// Bitcoin-like parser aware of Qtum contract outputs.
#[derive(Debug, Clone)]
pub struct QtumParser {
	base: BitcoinLikeParser,
}

impl QtumParser {
	/// Creates a parser with a 500-block coinbase maturity unless the
	/// configuration overrides it.
	pub fn new(params: &'static ChainParams, config: &RpcConfig) -> Self {
		Self {
			base: BitcoinLikeParser::with_default_maturity(params, config, QTUM_COINBASE_MATURITY),
		}
	}
}

impl ChainParser for QtumParser {
	fn params(&self) -> &'static ChainParams {
		self.base.params()
	}

	fn amount_decimals(&self) -> u32 {
		self.base.amount_decimals()
	}

	fn minimum_coinbase_confirmations(&self) -> u32 {
		self.base.minimum_coinbase_confirmations()
	}

	fn amount_to_big_int(&self, amount: &Value) -> Result<BigInt> {
		self.base.amount_to_big_int(amount)
	}

	fn amount_to_decimal_string(&self, amount: &BigInt) -> String {
		self.base.amount_to_decimal_string(amount)
	}

	fn parse_tx_json(&self, raw: &Value) -> Result<Tx> {
		let mut tx = self.base.parse_tx_json(raw)?;

		for vout in tx
			.vout
			.iter_mut()
			.filter(|vout| is_contract_script(&vout.script_pub_key.hex))
		{
			vout.script_pub_key.addresses.clear();
		}

		Ok(tx)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::params::get_chain_params;
	use serde_json::json;

	fn config(maturity: Option<u32>) -> RpcConfig {
		let mut config = RpcConfig::from_value(json!({
			"coin_name": "Qtum",
			"rpc_url": "http://localhost:3889"
		}))
		.unwrap();
		config.minimum_coinbase_confirmations = maturity;
		config
	}

	#[test]
	fn test_contract_script_detection() {
		// OP_4 OP_PUSH gasLimit OP_PUSH gasPrice OP_PUSH data OP_PUSH address OP_CALL
		assert!(is_contract_script("540390d003012844a9059cbb14f2703e93f87b1c2b1b1d2d7c8c1b1b1b1b1b1b1bc2"));
		assert!(is_contract_script("01c1"));
		assert!(!is_contract_script(
			"76a914cd8fb3bf2cf5a3a6d8a4b2c5a3b1c2d4e5f6a7b888ac"
		));
		assert!(!is_contract_script(""));
		assert!(!is_contract_script("zz"));
	}

	#[test]
	fn test_qtum_maturity_default() {
		let params = get_chain_params("main").unwrap();
		assert_eq!(
			QtumParser::new(params, &config(None)).minimum_coinbase_confirmations(),
			500
		);
		assert_eq!(
			QtumParser::new(params, &config(Some(2000))).minimum_coinbase_confirmations(),
			2000
		);
	}

	#[test]
	fn test_contract_outputs_carry_no_addresses() {
		let parser = QtumParser::new(get_chain_params("test").unwrap(), &config(None));
		let raw = json!({
			"txid": "bb",
			"version": 2,
			"locktime": 0,
			"vin": [{ "txid": "aa", "vout": 0, "scriptSig": { "hex": "47" }, "sequence": 4294967295u32 }],
			"vout": [
				{
					"value": 0,
					"n": 0,
					"scriptPubKey": {
						"hex": "540390d003012844a9059cbb14f2703e93f87b1c2b1b1d2d7c8c1b1b1b1b1b1b1bc2",
						"type": "call",
						"addresses": ["qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW"]
					}
				},
				{
					"value": 1.5,
					"n": 1,
					"scriptPubKey": {
						"hex": "76a914cd8fb3bf2cf5a3a6d8a4b2c5a3b1c2d4e5f6a7b888ac",
						"type": "pubkeyhash",
						"addresses": ["qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW"]
					}
				}
			],
			"hex": "02"
		});

		let tx = parser.parse_tx_json(&raw).unwrap();

		assert!(tx.vout[0].script_pub_key.addresses.is_empty());
		assert_eq!(tx.vout[1].script_pub_key.addresses.len(), 1);
		assert_eq!(tx.vout[1].value_sat, BigInt::from(150_000_000));
		assert_eq!(parser.params().name, "test");
	}
}
