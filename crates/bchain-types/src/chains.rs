//! Chain-related types and the backend capability trait.

use crate::{
	common::{BlockHeight, FeeRate, TxId},
	errors::Result,
	parser::ChainParser,
	transaction::Tx,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Subset of `getblockchaininfo` needed to identify the live network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockchainInfo {
	pub chain: String,
	pub blocks: BlockHeight,
	#[serde(default)]
	pub headers: BlockHeight,
	#[serde(rename = "bestblockhash")]
	pub best_block_hash: String,
	#[serde(default)]
	pub difficulty: Value,
	#[serde(rename = "size_on_disk", default)]
	pub size_on_disk: u64,
	#[serde(default)]
	pub warnings: Value,
}

/// Combined blockchain and network information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
	pub chain: String,
	pub blocks: BlockHeight,
	pub headers: BlockHeight,
	pub best_block_hash: String,
	pub difficulty: String,
	pub size_on_disk: u64,
	pub version: String,
	pub subversion: String,
	pub protocol_version: String,
	pub time_offset: i64,
	pub warnings: String,
}

/// Block header as reported by verbose `getblockheader`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
	pub hash: String,
	#[serde(rename = "previousblockhash", default)]
	pub prev: Option<String>,
	#[serde(rename = "nextblockhash", default)]
	pub next: Option<String>,
	pub height: BlockHeight,
	pub confirmations: i64,
	pub time: i64,
}

/// Backend interface exposed to indexing pipelines.
///
/// `initialize` must complete before the backend is shared; afterwards all
/// methods take `&self` and are safe to call concurrently.
#[async_trait]
pub trait BlockChain: Send + Sync {
	/// Detects the live network and prepares the parser.
	async fn initialize(&mut self) -> Result<()>;

	/// Whether the node runs a test network. `false` before initialization.
	fn is_testnet(&self) -> bool;

	/// Network label (`livenet`, `testnet`, ...). Empty before initialization.
	fn network_name(&self) -> &str;

	/// Configured coin name.
	fn coin_name(&self) -> &str;

	/// Parser installed during initialization.
	fn chain_parser(&self) -> Option<Arc<dyn ChainParser>>;

	async fn get_chain_info(&self) -> Result<ChainInfo>;

	async fn get_best_block_hash(&self) -> Result<String>;

	async fn get_best_block_height(&self) -> Result<BlockHeight>;

	async fn get_block_hash(&self, height: BlockHeight) -> Result<String>;

	async fn get_block_header(&self, hash: &str) -> Result<BlockHeader>;

	/// Transaction ids currently in the node's mempool.
	async fn get_mempool_transactions(&self) -> Result<Vec<TxId>>;

	async fn get_transaction(&self, txid: &str) -> Result<Tx>;

	/// Same representation as `get_transaction`, possibly computed more cheaply.
	async fn get_transaction_for_mempool(&self, txid: &str) -> Result<Tx>;

	/// Raw node JSON for a transaction.
	async fn get_transaction_specific(&self, txid: &str) -> Result<Value>;

	/// Fee rate in base units per kilobyte for confirmation within `blocks`.
	async fn estimate_smart_fee(&self, blocks: u16, conservative: bool) -> Result<FeeRate>;

	async fn estimate_fee(&self, blocks: u16) -> Result<FeeRate>;

	/// Broadcasts a serialized transaction and returns its id.
	async fn send_raw_transaction(&self, tx_hex: &str) -> Result<TxId>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_blockchain_info_from_node_json() {
		let info: BlockchainInfo = serde_json::from_value(json!({
			"chain": "main",
			"blocks": 1_200_000,
			"headers": 1_200_001,
			"bestblockhash": "00ab",
			"difficulty": {"proof-of-work": 1.5, "proof-of-stake": 2.5},
			"size_on_disk": 42,
			"warnings": "",
			"verificationprogress": 0.99
		}))
		.unwrap();

		assert_eq!(info.chain, "main");
		assert_eq!(info.blocks, 1_200_000);
		assert_eq!(info.headers, 1_200_001);
		assert_eq!(info.best_block_hash, "00ab");
		assert!(info.difficulty.is_object());
	}

	#[test]
	fn test_block_header_optional_links() {
		let header: BlockHeader = serde_json::from_value(json!({
			"hash": "00ff",
			"height": 0,
			"confirmations": 10,
			"time": 1504695029,
			"nextblockhash": "0011"
		}))
		.unwrap();

		assert!(header.prev.is_none());
		assert_eq!(header.next.as_deref(), Some("0011"));
	}
}
