//! RPC commands and the request dialects used to encode them.
//!
//! Current bitcoind accepts named parameters; older forks only understand
//! positional arrays and expect some flags as integers. A backend selects the
//! dialect its node speaks by installing the matching `RpcMarshaler`.

use bchain_types::{ChainError, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt;

/// Estimation mode of `estimatesmartfee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateMode {
	Conservative,
	Economical,
}

impl EstimateMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			EstimateMode::Conservative => "CONSERVATIVE",
			EstimateMode::Economical => "ECONOMICAL",
		}
	}
}

impl From<bool> for EstimateMode {
	fn from(conservative: bool) -> Self {
		if conservative {
			EstimateMode::Conservative
		} else {
			EstimateMode::Economical
		}
	}
}

/// Node calls issued by `BitcoinRpc`.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCommand {
	GetBlockchainInfo,
	GetNetworkInfo,
	GetBestBlockHash,
	GetBlockCount,
	GetBlockHash { height: u32 },
	GetBlockHeader { hash: String },
	GetRawMempool,
	GetRawTransaction { txid: String, verbose: bool },
	EstimateSmartFee { conf_target: u16, mode: EstimateMode },
	EstimateFee { blocks: u16 },
	SendRawTransaction { hex: String },
}

impl RpcCommand {
	pub fn method(&self) -> &'static str {
		match self {
			RpcCommand::GetBlockchainInfo => "getblockchaininfo",
			RpcCommand::GetNetworkInfo => "getnetworkinfo",
			RpcCommand::GetBestBlockHash => "getbestblockhash",
			RpcCommand::GetBlockCount => "getblockcount",
			RpcCommand::GetBlockHash { .. } => "getblockhash",
			RpcCommand::GetBlockHeader { .. } => "getblockheader",
			RpcCommand::GetRawMempool => "getrawmempool",
			RpcCommand::GetRawTransaction { .. } => "getrawtransaction",
			RpcCommand::EstimateSmartFee { .. } => "estimatesmartfee",
			RpcCommand::EstimateFee { .. } => "estimatefee",
			RpcCommand::SendRawTransaction { .. } => "sendrawtransaction",
		}
	}

	/// Whether repeating the call after a lost response is harmless.
	///
	/// A resent broadcast would be answered with "already in mempool" or
	/// "already in block chain" even though the first one succeeded.
	pub fn is_idempotent(&self) -> bool {
		!matches!(self, RpcCommand::SendRawTransaction { .. })
	}

	/// Parameters as `(name, value)` pairs in positional order.
	fn params(&self) -> Vec<(&'static str, Value)> {
		match self {
			RpcCommand::GetBlockchainInfo
			| RpcCommand::GetNetworkInfo
			| RpcCommand::GetBestBlockHash
			| RpcCommand::GetBlockCount
			| RpcCommand::GetRawMempool => vec![],
			RpcCommand::GetBlockHash { height } => vec![("height", json!(height))],
			RpcCommand::GetBlockHeader { hash } => {
				vec![("blockhash", json!(hash)), ("verbose", json!(true))]
			}
			RpcCommand::GetRawTransaction { txid, verbose } => {
				vec![("txid", json!(txid)), ("verbose", json!(verbose))]
			}
			RpcCommand::EstimateSmartFee { conf_target, mode } => vec![
				("conf_target", json!(conf_target)),
				("estimate_mode", json!(mode.as_str())),
			],
			RpcCommand::EstimateFee { blocks } => vec![("nblocks", json!(blocks))],
			RpcCommand::SendRawTransaction { hex } => vec![("hexstring", json!(hex))],
		}
	}
}

/// Encodes a command into a JSON-RPC request envelope.
pub trait RpcMarshaler: Send + Sync + fmt::Debug {
	fn marshal(&self, id: u64, command: &RpcCommand) -> Value;

	fn name(&self) -> &'static str;
}

fn envelope(id: u64, method: &str, params: Value) -> Value {
	json!({
		"jsonrpc": "1.0",
		"id": id,
		"method": method,
		"params": params,
	})
}

/// Legacy dialect: positional parameters, verbose flags as integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshalerV1;

impl RpcMarshaler for JsonMarshalerV1 {
	fn marshal(&self, id: u64, command: &RpcCommand) -> Value {
		let params = match command {
			RpcCommand::GetRawTransaction { txid, verbose } => {
				vec![json!(txid), json!(u8::from(*verbose))]
			}
			_ => command.params().into_iter().map(|(_, v)| v).collect(),
		};
		envelope(id, command.method(), Value::Array(params))
	}

	fn name(&self) -> &'static str {
		"v1"
	}
}

/// Current dialect: named parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshalerV2;

impl RpcMarshaler for JsonMarshalerV2 {
	fn marshal(&self, id: u64, command: &RpcCommand) -> Value {
		let params = command.params();
		let params = if params.is_empty() {
			Value::Array(vec![])
		} else {
			Value::Object(
				params
					.into_iter()
					.map(|(k, v)| (k.to_string(), v))
					.collect::<Map<String, Value>>(),
			)
		};
		envelope(id, command.method(), params)
	}

	fn name(&self) -> &'static str {
		"v2"
	}
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
	#[serde(default)]
	result: Value,
	#[serde(default)]
	error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
	code: i64,
	message: String,
}

/// Extracts `result` from a response envelope, or the node's error.
pub fn decode_response(response: Value) -> Result<Value> {
	let response: RpcResponse = serde_json::from_value(response)
		.map_err(|e| ChainError::Transport(format!("Malformed RPC response: {}", e)))?;

	match response.error {
		Some(error) => Err(ChainError::Rpc {
			code: error.code,
			message: error.message,
		}),
		None => Ok(response.result),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_v2_named_params() {
		let request = JsonMarshalerV2.marshal(
			7,
			&RpcCommand::GetRawTransaction {
				txid: "ab".to_string(),
				verbose: true,
			},
		);

		assert_eq!(request["jsonrpc"], "1.0");
		assert_eq!(request["id"], 7);
		assert_eq!(request["method"], "getrawtransaction");
		assert_eq!(request["params"], json!({ "txid": "ab", "verbose": true }));
	}

	#[test]
	fn test_v1_positional_params_with_integer_verbose() {
		let request = JsonMarshalerV1.marshal(
			1,
			&RpcCommand::GetRawTransaction {
				txid: "ab".to_string(),
				verbose: true,
			},
		);
		assert_eq!(request["params"], json!(["ab", 1]));

		let request = JsonMarshalerV1.marshal(
			2,
			&RpcCommand::EstimateSmartFee {
				conf_target: 6,
				mode: EstimateMode::Economical,
			},
		);
		assert_eq!(request["method"], "estimatesmartfee");
		assert_eq!(request["params"], json!([6, "ECONOMICAL"]));
	}

	#[test]
	fn test_parameterless_commands_send_empty_array() {
		for marshaler in [&JsonMarshalerV1 as &dyn RpcMarshaler, &JsonMarshalerV2] {
			let request = marshaler.marshal(1, &RpcCommand::GetBlockchainInfo);
			assert_eq!(request["params"], json!([]));
		}
	}

	#[test]
	fn test_only_broadcast_is_not_idempotent() {
		assert!(!RpcCommand::SendRawTransaction {
			hex: "00".to_string()
		}
		.is_idempotent());
		assert!(RpcCommand::GetBlockCount.is_idempotent());
		assert!(RpcCommand::EstimateFee { blocks: 6 }.is_idempotent());
	}

	#[test]
	fn test_estimate_mode_from_flag() {
		assert_eq!(EstimateMode::from(true), EstimateMode::Conservative);
		assert_eq!(EstimateMode::from(false).as_str(), "ECONOMICAL");
	}

	#[test]
	fn test_decode_response() {
		let result = decode_response(json!({ "result": 42, "error": null, "id": 1 })).unwrap();
		assert_eq!(result, json!(42));

		let err = decode_response(json!({
			"result": null,
			"error": { "code": -5, "message": "No such mempool or blockchain transaction" },
			"id": 1
		}))
		.unwrap_err();
		assert!(matches!(err, ChainError::Rpc { code: -5, .. }));

		let err = decode_response(json!("garbage")).unwrap_err();
		assert!(err.is_transport());
	}
}
