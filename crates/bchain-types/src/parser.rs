//! Chain parser abstraction.

use crate::{
	common::BigInt,
	errors::Result,
	params::ChainParams,
	transaction::Tx,
};
use serde_json::Value;
use std::fmt;

/// Converts node JSON into domain records for one chain variant.
///
/// A parser is created once per backend during initialization and shared
/// read-only afterwards.
pub trait ChainParser: Send + Sync + fmt::Debug {
	/// Parameters of the network this parser was built for.
	fn params(&self) -> &'static ChainParams;

	/// Number of decimal places between the display unit and the base unit.
	fn amount_decimals(&self) -> u32;

	/// Confirmations a coinbase output needs before it can be spent.
	fn minimum_coinbase_confirmations(&self) -> u32;

	/// Converts a JSON amount in display units (e.g. `0.004`) to base units.
	fn amount_to_big_int(&self, amount: &Value) -> Result<BigInt>;

	/// Formats a base-unit amount in display units.
	fn amount_to_decimal_string(&self, amount: &BigInt) -> String;

	/// Builds a `Tx` from verbose `getrawtransaction` output.
	fn parse_tx_json(&self, raw: &Value) -> Result<Tx>;
}
