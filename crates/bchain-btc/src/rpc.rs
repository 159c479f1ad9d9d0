//! JSON-RPC client for bitcoind-compatible nodes.
//!
//! `BitcoinRpc` implements the full `BlockChain` surface. Coin adapters own a
//! `BitcoinRpc`, adjust it through the setters below before initialization, and
//! forward every call they do not override.

use crate::{
	marshaler::{decode_response, EstimateMode, JsonMarshalerV2, RpcCommand, RpcMarshaler},
	params::REGISTRY,
	parser::BitcoinLikeParser,
	transport::{HttpTransport, RetryTransport, RpcTransport},
};
use async_trait::async_trait;
use bchain_config::RpcConfig;
use bchain_types::{
	BlockChain, BlockHeader, BlockHeight, BlockchainInfo, ChainError, ChainInfo, ChainParser,
	FeeRate, Result, Tx, TxId,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::{
	fmt,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};
use tracing::{debug, info};

/// Client for a bitcoind-style JSON-RPC interface.
pub struct BitcoinRpc {
	config: RpcConfig,
	transport: Arc<dyn RpcTransport>,
	marshaler: Arc<dyn RpcMarshaler>,
	request_id: AtomicU64,
	parser: Option<Arc<dyn ChainParser>>,
	testnet: bool,
	network: String,
}

#[derive(Debug, Deserialize)]
struct NetworkInfo {
	version: Value,
	#[serde(default)]
	subversion: String,
	#[serde(rename = "protocolversion", default)]
	protocol_version: Value,
	#[serde(rename = "timeoffset", default)]
	time_offset: i64,
	#[serde(default)]
	warnings: Value,
}

#[derive(Debug, Deserialize)]
struct SmartFeeResult {
	#[serde(default)]
	feerate: Option<Value>,
	#[serde(default)]
	errors: Vec<String>,
}

/// Renders a JSON scalar without quotes; objects keep their JSON form.
fn value_to_string(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

impl BitcoinRpc {
	/// Creates a client from an opaque configuration blob.
	///
	/// # Errors
	///
	/// Returns `ChainError::Config` if the blob does not decode or validate,
	/// and `ChainError::Transport` if the HTTP client cannot be built.
	pub fn new(config: Value) -> Result<Self> {
		let config = RpcConfig::from_value(config).map_err(|e| ChainError::Config(e.to_string()))?;

		info!(
			"Creating {} RPC client for {} with max_retries={}",
			config.coin_name, config.rpc_url, config.rpc_max_retries
		);

		let http = HttpTransport::new(&config)?;
		let transport = RetryTransport::new(http).with_max_retries(config.rpc_max_retries);

		Ok(Self::with_transport(config, Arc::new(transport)))
	}

	/// Creates a client over an existing transport.
	pub fn with_transport(config: RpcConfig, transport: Arc<dyn RpcTransport>) -> Self {
		Self {
			config,
			transport,
			marshaler: Arc::new(JsonMarshalerV2),
			request_id: AtomicU64::new(1),
			parser: None,
			testnet: false,
			network: String::new(),
		}
	}

	/// Validated configuration, including capability flags set after construction.
	pub fn config(&self) -> &RpcConfig {
		&self.config
	}

	/// Request dialect currently in use.
	pub fn marshaler(&self) -> &dyn RpcMarshaler {
		self.marshaler.as_ref()
	}

	/// Selects the request dialect spoken by the node.
	pub fn set_marshaler(&mut self, marshaler: Arc<dyn RpcMarshaler>) {
		self.marshaler = marshaler;
	}

	/// Enables or disables `estimatesmartfee`; when disabled the smart
	/// estimate falls back to `estimatefee`.
	pub fn set_supports_estimate_smart_fee(&mut self, supported: bool) {
		self.config.supports_estimate_smart_fee = supported;
	}

	/// Installs the parser used for amounts and transactions.
	pub fn install_parser(&mut self, parser: Arc<dyn ChainParser>) {
		self.parser = Some(parser);
	}

	/// Records the network detected during initialization.
	pub fn set_network(&mut self, testnet: bool, network: impl Into<String>) {
		self.testnet = testnet;
		self.network = network.into();
	}

	fn parser(&self) -> Result<&Arc<dyn ChainParser>> {
		self.parser.as_ref().ok_or(ChainError::NotInitialized)
	}

	/// Sends one command and returns the `result` member of the response.
	pub async fn call(&self, command: RpcCommand) -> Result<Value> {
		let id = self.request_id.fetch_add(1, Ordering::Relaxed);
		debug!(
			"rpc: {} (id {}, dialect {})",
			command.method(),
			id,
			self.marshaler.name()
		);

		let request = self.marshaler.marshal(id, &command);
		let response = if command.is_idempotent() {
			self.transport.send(request).await?
		} else {
			self.transport.send_once(request).await?
		};
		decode_response(response)
	}

	async fn call_as<T: DeserializeOwned>(&self, command: RpcCommand) -> Result<T> {
		let method = command.method();
		let result = self.call(command).await?;
		serde_json::from_value(result)
			.map_err(|e| ChainError::Parse(format!("Unexpected {} result: {}", method, e)))
	}

	/// Reads `getblockchaininfo` in a single round trip.
	pub async fn get_blockchain_info(&self) -> Result<BlockchainInfo> {
		self.call_as(RpcCommand::GetBlockchainInfo).await
	}
}

impl fmt::Debug for BitcoinRpc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BitcoinRpc")
			.field("config", &self.config)
			.field("marshaler", &self.marshaler.name())
			.field("parser", &self.parser)
			.field("testnet", &self.testnet)
			.field("network", &self.network)
			.finish()
	}
}

#[async_trait]
impl BlockChain for BitcoinRpc {
	async fn initialize(&mut self) -> Result<()> {
		let info = self.get_blockchain_info().await?;
		let params = REGISTRY.lookup(&info.chain)?;

		let parser = BitcoinLikeParser::new(params, &self.config);
		self.install_parser(Arc::new(parser));

		if params.name == "main" {
			self.set_network(false, "livenet");
		} else {
			self.set_network(true, "testnet");
		}

		info!("rpc: block chain {}", params.name);

		Ok(())
	}

	fn is_testnet(&self) -> bool {
		self.testnet
	}

	fn network_name(&self) -> &str {
		&self.network
	}

	fn coin_name(&self) -> &str {
		&self.config.coin_name
	}

	fn chain_parser(&self) -> Option<Arc<dyn ChainParser>> {
		self.parser.clone()
	}

	async fn get_chain_info(&self) -> Result<ChainInfo> {
		let chain = self.get_blockchain_info().await?;
		let network: NetworkInfo = self.call_as(RpcCommand::GetNetworkInfo).await?;

		let mut warnings = value_to_string(&chain.warnings);
		if warnings.is_empty() {
			warnings = value_to_string(&network.warnings);
		}

		Ok(ChainInfo {
			chain: chain.chain,
			blocks: chain.blocks,
			headers: chain.headers,
			best_block_hash: chain.best_block_hash,
			difficulty: value_to_string(&chain.difficulty),
			size_on_disk: chain.size_on_disk,
			version: value_to_string(&network.version),
			subversion: network.subversion,
			protocol_version: value_to_string(&network.protocol_version),
			time_offset: network.time_offset,
			warnings,
		})
	}

	async fn get_best_block_hash(&self) -> Result<String> {
		self.call_as(RpcCommand::GetBestBlockHash).await
	}

	async fn get_best_block_height(&self) -> Result<BlockHeight> {
		self.call_as(RpcCommand::GetBlockCount).await
	}

	async fn get_block_hash(&self, height: BlockHeight) -> Result<String> {
		self.call_as(RpcCommand::GetBlockHash { height }).await
	}

	async fn get_block_header(&self, hash: &str) -> Result<BlockHeader> {
		self.call_as(RpcCommand::GetBlockHeader {
			hash: hash.to_string(),
		})
		.await
	}

	async fn get_mempool_transactions(&self) -> Result<Vec<TxId>> {
		self.call_as(RpcCommand::GetRawMempool).await
	}

	async fn get_transaction(&self, txid: &str) -> Result<Tx> {
		let parser = self.parser()?.clone();
		let raw = self.get_transaction_specific(txid).await?;
		parser.parse_tx_json(&raw)
	}

	async fn get_transaction_for_mempool(&self, txid: &str) -> Result<Tx> {
		self.get_transaction(txid).await
	}

	async fn get_transaction_specific(&self, txid: &str) -> Result<Value> {
		self.call(RpcCommand::GetRawTransaction {
			txid: txid.to_string(),
			verbose: true,
		})
		.await
	}

	async fn estimate_smart_fee(&self, blocks: u16, conservative: bool) -> Result<FeeRate> {
		if !self.config.supports_estimate_smart_fee {
			return self.estimate_fee(blocks).await;
		}

		let parser = self.parser()?.clone();
		let result: SmartFeeResult = self
			.call_as(RpcCommand::EstimateSmartFee {
				conf_target: blocks,
				mode: EstimateMode::from(conservative),
			})
			.await?;

		match result.feerate {
			Some(feerate) => parser.amount_to_big_int(&feerate),
			None if result.errors.is_empty() => Err(ChainError::FeeEstimate(
				"node returned no fee rate".to_string(),
			)),
			None => Err(ChainError::FeeEstimate(result.errors.join("; "))),
		}
	}

	async fn estimate_fee(&self, blocks: u16) -> Result<FeeRate> {
		let parser = self.parser()?.clone();
		let feerate = self.call(RpcCommand::EstimateFee { blocks }).await?;
		parser.amount_to_big_int(&feerate)
	}

	async fn send_raw_transaction(&self, tx_hex: &str) -> Result<TxId> {
		self.call_as(RpcCommand::SendRawTransaction {
			hex: tx_hex.to_string(),
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::marshaler::JsonMarshalerV1;
	use bchain_types::common::BigInt;
	use backoff::ExponentialBackoff;
	use serde_json::json;
	use std::{collections::HashMap, sync::atomic::AtomicU32, sync::Mutex, time::Duration};

	/// Answers each method with a scripted result or error and records requests.
	#[derive(Default)]
	struct MockTransport {
		responses: Mutex<HashMap<String, Value>>,
		requests: Mutex<Vec<Value>>,
	}

	impl MockTransport {
		fn respond(&self, method: &str, result: Value) {
			self.responses.lock().unwrap().insert(
				method.to_string(),
				json!({ "result": result, "error": null, "id": 1 }),
			);
		}

		fn fail(&self, method: &str, code: i64, message: &str) {
			self.responses.lock().unwrap().insert(
				method.to_string(),
				json!({ "result": null, "error": { "code": code, "message": message }, "id": 1 }),
			);
		}

		fn requests(&self) -> Vec<Value> {
			self.requests.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl RpcTransport for MockTransport {
		async fn send(&self, request: Value) -> Result<Value> {
			self.requests.lock().unwrap().push(request.clone());
			let method = request["method"].as_str().unwrap_or_default().to_string();
			self.responses
				.lock()
				.unwrap()
				.get(&method)
				.cloned()
				.ok_or_else(|| ChainError::Transport(format!("no response for {}", method)))
		}
	}

	fn config() -> RpcConfig {
		RpcConfig::from_value(json!({
			"coin_name": "Bitcoin",
			"rpc_url": "http://localhost:8332",
			"rpc_user": "rpc",
			"rpc_pass": "rpc"
		}))
		.unwrap()
	}

	fn client() -> (BitcoinRpc, Arc<MockTransport>) {
		let transport = Arc::new(MockTransport::default());
		let rpc = BitcoinRpc::with_transport(config(), transport.clone());
		(rpc, transport)
	}

	fn blockchain_info(chain: &str) -> Value {
		json!({
			"chain": chain,
			"blocks": 100,
			"headers": 100,
			"bestblockhash": "00aa",
			"difficulty": 1.0,
			"size_on_disk": 1024,
			"warnings": ""
		})
	}

	async fn initialized(chain: &str) -> (BitcoinRpc, Arc<MockTransport>) {
		let (mut rpc, transport) = client();
		transport.respond("getblockchaininfo", blockchain_info(chain));
		rpc.initialize().await.unwrap();
		(rpc, transport)
	}

	#[test]
	fn test_new_rejects_invalid_config() {
		let result = BitcoinRpc::new(json!({ "coin_name": "Bitcoin", "rpc_url": "ftp://x" }));
		assert!(matches!(result, Err(ChainError::Config(_))));
	}

	#[test]
	fn test_defaults_to_v2_dialect() {
		let (rpc, _) = client();
		assert_eq!(rpc.marshaler().name(), "v2");
		assert!(rpc.chain_parser().is_none());
		assert_eq!(rpc.network_name(), "");
	}

	#[tokio::test]
	async fn test_initialize_mainnet_and_testnet() {
		let (rpc, _) = initialized("main").await;
		assert!(!rpc.is_testnet());
		assert_eq!(rpc.network_name(), "livenet");
		assert_eq!(rpc.chain_parser().unwrap().params().name, "main");

		let (rpc, _) = initialized("regtest").await;
		assert!(rpc.is_testnet());
		assert_eq!(rpc.network_name(), "testnet");
	}

	#[tokio::test]
	async fn test_initialize_unknown_chain_fails() {
		let (mut rpc, transport) = client();
		transport.respond("getblockchaininfo", blockchain_info("unknownnet"));

		let result = rpc.initialize().await;
		assert!(matches!(result, Err(ChainError::Config(_))));
		assert!(rpc.chain_parser().is_none());
	}

	#[tokio::test]
	async fn test_get_chain_info_merges_network_info() {
		let (rpc, transport) = client();
		transport.respond("getblockchaininfo", blockchain_info("main"));
		transport.respond(
			"getnetworkinfo",
			json!({
				"version": 270000,
				"subversion": "/Satoshi:27.0.0/",
				"protocolversion": 70016,
				"timeoffset": -1,
				"warnings": "pre-release test build"
			}),
		);

		let info = rpc.get_chain_info().await.unwrap();

		assert_eq!(info.chain, "main");
		assert_eq!(info.best_block_hash, "00aa");
		assert_eq!(info.difficulty, "1.0");
		assert_eq!(info.version, "270000");
		assert_eq!(info.subversion, "/Satoshi:27.0.0/");
		assert_eq!(info.protocol_version, "70016");
		assert_eq!(info.time_offset, -1);
		assert_eq!(info.warnings, "pre-release test build");
	}

	#[tokio::test]
	async fn test_simple_queries() {
		let (rpc, transport) = client();
		transport.respond("getbestblockhash", json!("00ff"));
		transport.respond("getblockcount", json!(812_345));
		transport.respond("getblockhash", json!("00ee"));
		transport.respond("getrawmempool", json!(["t1", "t2"]));
		transport.respond("sendrawtransaction", json!("t3"));

		assert_eq!(rpc.get_best_block_hash().await.unwrap(), "00ff");
		assert_eq!(rpc.get_best_block_height().await.unwrap(), 812_345);
		assert_eq!(rpc.get_block_hash(7).await.unwrap(), "00ee");
		assert_eq!(rpc.get_mempool_transactions().await.unwrap(), vec!["t1", "t2"]);
		assert_eq!(rpc.send_raw_transaction("0200").await.unwrap(), "t3");

		let requests = transport.requests();
		assert_eq!(requests[2]["params"], json!({ "height": 7 }));
		assert_eq!(requests[4]["params"], json!({ "hexstring": "0200" }));
	}

	#[tokio::test]
	async fn test_request_ids_increase() {
		let (rpc, transport) = client();
		transport.respond("getblockcount", json!(1));

		rpc.get_best_block_height().await.unwrap();
		rpc.get_best_block_height().await.unwrap();

		let requests = transport.requests();
		assert_eq!(requests[0]["id"], 1);
		assert_eq!(requests[1]["id"], 2);
	}

	#[tokio::test]
	async fn test_rpc_error_is_propagated() {
		let (rpc, transport) = initialized("main").await;
		transport.fail(
			"getrawtransaction",
			-5,
			"No such mempool or blockchain transaction",
		);

		let err = rpc.get_transaction("dead").await.unwrap_err();
		match err {
			ChainError::Rpc { code, message } => {
				assert_eq!(code, -5);
				assert_eq!(message, "No such mempool or blockchain transaction");
			}
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_transaction_fetch_requires_parser() {
		let (rpc, transport) = client();

		let result = rpc.get_transaction("aa").await;

		assert!(matches!(result, Err(ChainError::NotInitialized)));
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn test_get_transaction_and_mempool_variant_agree() {
		let (rpc, transport) = initialized("main").await;
		transport.respond(
			"getrawtransaction",
			json!({
				"txid": "aa",
				"version": 1,
				"locktime": 0,
				"vin": [{ "coinbase": "03", "sequence": 4294967295u32 }],
				"vout": [{ "value": 6.25, "n": 0, "scriptPubKey": { "hex": "00" } }],
				"hex": "01"
			}),
		);

		let tx = rpc.get_transaction("aa").await.unwrap();
		let mempool_tx = rpc.get_transaction_for_mempool("aa").await.unwrap();

		assert_eq!(tx, mempool_tx);
		assert_eq!(tx.vout[0].value_sat, BigInt::from(625_000_000));
	}

	#[tokio::test]
	async fn test_estimate_smart_fee_falls_back_without_capability() {
		let (rpc, transport) = initialized("main").await;
		transport.respond("estimatefee", json!(0.0002));

		let fee = rpc.estimate_smart_fee(2, true).await.unwrap();

		assert_eq!(fee, BigInt::from(20_000));
		let last = transport.requests().pop().unwrap();
		assert_eq!(last["method"], "estimatefee");
	}

	#[tokio::test]
	async fn test_estimate_smart_fee_with_capability() {
		let (mut rpc, transport) = initialized("main").await;
		rpc.set_supports_estimate_smart_fee(true);
		rpc.set_marshaler(Arc::new(JsonMarshalerV1));
		transport.respond("estimatesmartfee", json!({ "feerate": 0.004, "blocks": 2 }));

		let fee = rpc.estimate_smart_fee(2, false).await.unwrap();

		assert_eq!(fee, BigInt::from(400_000));
		let last = transport.requests().pop().unwrap();
		assert_eq!(last["params"], json!([2, "ECONOMICAL"]));
	}

	#[tokio::test]
	async fn test_estimate_smart_fee_without_feerate() {
		let (mut rpc, transport) = initialized("main").await;
		rpc.set_supports_estimate_smart_fee(true);
		transport.respond(
			"estimatesmartfee",
			json!({ "errors": ["Insufficient data or no feerate found"], "blocks": 0 }),
		);

		let err = rpc.estimate_smart_fee(1, true).await.unwrap_err();
		match err {
			ChainError::FeeEstimate(msg) => {
				assert_eq!(msg, "Insufficient data or no feerate found")
			}
			other => panic!("unexpected error: {:?}", other),
		}
	}

	/// Times out on the first request, then answers like a node that already
	/// has the broadcast transaction.
	#[derive(Default)]
	struct TimeoutOnceTransport {
		sends: AtomicU32,
	}

	#[async_trait]
	impl RpcTransport for TimeoutOnceTransport {
		async fn send(&self, request: Value) -> Result<Value> {
			if self.sends.fetch_add(1, Ordering::SeqCst) == 0 {
				return Err(ChainError::Transport("operation timed out".to_string()));
			}
			match request["method"].as_str() {
				Some("sendrawtransaction") => Ok(json!({
					"result": null,
					"error": { "code": -27, "message": "Transaction already in block chain" },
					"id": 1
				})),
				_ => Ok(json!({ "result": 7, "error": null, "id": 1 })),
			}
		}
	}

	fn retrying_client() -> (BitcoinRpc, Arc<RetryTransport<TimeoutOnceTransport>>) {
		let backoff = ExponentialBackoff {
			initial_interval: Duration::from_millis(1),
			max_interval: Duration::from_millis(2),
			..Default::default()
		};
		let transport = Arc::new(
			RetryTransport::new(TimeoutOnceTransport::default()).with_backoff(backoff),
		);
		let rpc = BitcoinRpc::with_transport(config(), transport.clone());
		(rpc, transport)
	}

	#[tokio::test]
	async fn test_broadcast_is_not_resent_after_transport_error() {
		let (rpc, transport) = retrying_client();

		let err = rpc.send_raw_transaction("0200").await.unwrap_err();

		assert!(err.is_transport());
		assert_eq!(transport.inner().sends.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_queries_are_retried_after_transport_error() {
		let (rpc, transport) = retrying_client();

		assert_eq!(rpc.get_best_block_height().await.unwrap(), 7);
		assert_eq!(transport.inner().sends.load(Ordering::SeqCst), 2);
	}
}
