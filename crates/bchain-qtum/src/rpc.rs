//! Qtum RPC backend.
//!
//! `QtumRpc` owns a `BitcoinRpc` and forwards the whole `BlockChain` surface to
//! it, except for three calls:
//!
//! - `estimate_smart_fee` and `estimate_fee` rescale the node's fee rate from a
//!   1000-byte to a 1024-byte kilobyte, which is what wallet integrations
//!   consuming these rates expect;
//! - `get_transaction_for_mempool` is served by the generic transaction fetch.
//!
//! # Lifecycle
//!
//! `new` builds the base client and forces the legacy request dialect and the
//! smart-fee capability. `initialize` must then succeed exactly once before the
//! backend is shared: it reads `getblockchaininfo`, resolves the chain
//! parameters, installs a `QtumParser` and derives the network label. A failed
//! initialization is terminal.

use crate::{
	params::{get_chain_params, MAINNET_MAGIC},
	parser::QtumParser,
};
use async_trait::async_trait;
use bchain_btc::{BitcoinRpc, JsonMarshalerV1};
use bchain_types::{
	common::BigInt, BlockChain, BlockHeader, BlockHeight, ChainError, ChainInfo, ChainParams,
	ChainParser, FeeRate, Result, Tx, TxId,
};
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::{debug, info, warn};

/// Lower bound fee rate in satoshi per kilobyte.
///
/// Exposed through `QtumRpc::min_fee_rate`; the fee estimators do not clamp to it.
pub const MIN_FEE_RATE: i64 = 400_000;

/// Rescales a fee rate from per-1000-byte to per-1024-byte units.
///
/// Integer arithmetic; the division truncates toward zero, so `-1`
/// ("no estimate") stays `-1`.
pub fn correct_fee_rate(raw: &FeeRate) -> FeeRate {
	raw * BigInt::from(1024u32) / BigInt::from(1000u32)
}

/// Values derived from the live node during initialization.
#[derive(Debug, Clone)]
pub struct NetworkState {
	params: &'static ChainParams,
	testnet: bool,
	network: &'static str,
	parser: Arc<QtumParser>,
}

impl NetworkState {
	/// Parameters of the chain the node reported.
	pub fn params(&self) -> &'static ChainParams {
		self.params
	}

	/// `false` only on mainnet.
	pub fn is_testnet(&self) -> bool {
		self.testnet
	}

	/// `livenet` or `testnet`.
	pub fn network(&self) -> &'static str {
		self.network
	}

	/// Parser installed on the base client.
	pub fn parser(&self) -> &Arc<QtumParser> {
		&self.parser
	}
}

#[derive(Debug)]
enum AdapterState {
	Constructed,
	Ready(NetworkState),
	Failed,
}

/// Qtum backend wrapping a `BitcoinRpc` base client.
pub struct QtumRpc {
	base: BitcoinRpc,
	min_fee_rate: FeeRate,
	state: AdapterState,
}

impl QtumRpc {
	/// Creates a Qtum backend from an opaque configuration blob.
	///
	/// # Errors
	///
	/// Returns the base client's error if the configuration is invalid.
	pub fn new(config: Value) -> Result<Self> {
		let base = BitcoinRpc::new(config)?;
		Ok(Self::from_client(base))
	}

	/// Wraps an existing base client, forcing the settings Qtum nodes need.
	pub fn from_client(mut base: BitcoinRpc) -> Self {
		base.set_marshaler(Arc::new(JsonMarshalerV1));
		base.set_supports_estimate_smart_fee(true);

		Self {
			base,
			min_fee_rate: BigInt::from(MIN_FEE_RATE),
			state: AdapterState::Constructed,
		}
	}

	/// Minimum relay fee rate in satoshi per kilobyte.
	pub fn min_fee_rate(&self) -> &FeeRate {
		&self.min_fee_rate
	}

	/// Derived network values, `None` until `initialize` succeeds.
	pub fn network_state(&self) -> Option<&NetworkState> {
		match &self.state {
			AdapterState::Ready(state) => Some(state),
			_ => None,
		}
	}

	/// Whether `initialize` has succeeded.
	pub fn is_ready(&self) -> bool {
		self.network_state().is_some()
	}

	/// The wrapped base client.
	pub fn base(&self) -> &BitcoinRpc {
		&self.base
	}

	fn ready(&self) -> Result<&NetworkState> {
		self.network_state().ok_or(ChainError::NotInitialized)
	}

	async fn detect_network(&self) -> Result<NetworkState> {
		let info = self.base.get_blockchain_info().await?;
		let params = get_chain_params(&info.chain)?;

		// the parser is installed for every network variant
		let parser = Arc::new(QtumParser::new(params, self.base.config()));

		let (testnet, network) = if params.net == MAINNET_MAGIC {
			(false, "livenet")
		} else {
			(true, "testnet")
		};

		Ok(NetworkState {
			params,
			testnet,
			network,
			parser,
		})
	}
}

impl fmt::Debug for QtumRpc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("QtumRpc")
			.field("base", &self.base)
			.field("min_fee_rate", &self.min_fee_rate)
			.field("state", &self.state)
			.finish()
	}
}

#[async_trait]
impl BlockChain for QtumRpc {
	async fn initialize(&mut self) -> Result<()> {
		match self.state {
			AdapterState::Constructed => {}
			AdapterState::Ready(_) => {
				return Err(ChainError::State(
					"Qtum backend is already initialized".to_string(),
				))
			}
			AdapterState::Failed => {
				return Err(ChainError::State(
					"Qtum backend failed to initialize and cannot be reused".to_string(),
				))
			}
		}

		let state = match self.detect_network().await {
			Ok(state) => state,
			Err(e) => {
				warn!("Qtum backend initialization failed: {}", e);
				self.state = AdapterState::Failed;
				return Err(e);
			}
		};

		self.base.install_parser(state.parser.clone());
		self.base.set_network(state.testnet, state.network);

		info!("rpc: block chain {}", state.params.name);

		self.state = AdapterState::Ready(state);
		Ok(())
	}

	fn is_testnet(&self) -> bool {
		self.network_state().is_some_and(|state| state.testnet)
	}

	fn network_name(&self) -> &str {
		self.network_state()
			.map(|state| state.network)
			.unwrap_or_default()
	}

	fn coin_name(&self) -> &str {
		self.base.coin_name()
	}

	fn chain_parser(&self) -> Option<Arc<dyn ChainParser>> {
		self.network_state()
			.map(|state| state.parser.clone() as Arc<dyn ChainParser>)
	}

	async fn get_chain_info(&self) -> Result<ChainInfo> {
		self.base.get_chain_info().await
	}

	async fn get_best_block_hash(&self) -> Result<String> {
		self.base.get_best_block_hash().await
	}

	async fn get_best_block_height(&self) -> Result<BlockHeight> {
		self.base.get_best_block_height().await
	}

	async fn get_block_hash(&self, height: BlockHeight) -> Result<String> {
		self.base.get_block_hash(height).await
	}

	async fn get_block_header(&self, hash: &str) -> Result<BlockHeader> {
		self.base.get_block_header(hash).await
	}

	async fn get_mempool_transactions(&self) -> Result<Vec<TxId>> {
		self.base.get_mempool_transactions().await
	}

	async fn get_transaction(&self, txid: &str) -> Result<Tx> {
		self.base.get_transaction(txid).await
	}

	/// Served by the generic fetch; the record is identical to
	/// `get_transaction`, block time and confirmations included.
	async fn get_transaction_for_mempool(&self, txid: &str) -> Result<Tx> {
		self.ready()?;
		self.base.get_transaction(txid).await
	}

	async fn get_transaction_specific(&self, txid: &str) -> Result<Value> {
		self.base.get_transaction_specific(txid).await
	}

	async fn estimate_smart_fee(&self, blocks: u16, conservative: bool) -> Result<FeeRate> {
		self.ready()?;
		let fee_rate = self.base.estimate_smart_fee(blocks, conservative).await?;
		let corrected = correct_fee_rate(&fee_rate);
		debug!(
			"estimatesmartfee({}, {}): {} -> {}",
			blocks, conservative, fee_rate, corrected
		);
		Ok(corrected)
	}

	async fn estimate_fee(&self, blocks: u16) -> Result<FeeRate> {
		self.ready()?;
		let fee_rate = self.base.estimate_fee(blocks).await?;
		let corrected = correct_fee_rate(&fee_rate);
		debug!("estimatefee({}): {} -> {}", blocks, fee_rate, corrected);
		Ok(corrected)
	}

	async fn send_raw_transaction(&self, tx_hex: &str) -> Result<TxId> {
		self.base.send_raw_transaction(tx_hex).await
	}
}
