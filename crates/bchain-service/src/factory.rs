//! Coin factory table.
//!
//! Maps the configured `coin_name` to the constructor of its backend. Each
//! constructor receives the configuration as an opaque blob and returns an
//! uninitialized backend.

use bchain_btc::BitcoinRpc;
use bchain_config::RpcConfig;
use bchain_qtum::QtumRpc;
use bchain_types::{BlockChain, ChainError, Result};
use serde_json::Value;
use tracing::info;

type BlockChainFactory = fn(Value) -> Result<Box<dyn BlockChain>>;

fn bitcoin(config: Value) -> Result<Box<dyn BlockChain>> {
	Ok(Box::new(BitcoinRpc::new(config)?))
}

fn qtum(config: Value) -> Result<Box<dyn BlockChain>> {
	Ok(Box::new(QtumRpc::new(config)?))
}

const FACTORIES: &[(&str, BlockChainFactory)] = &[
	("Bitcoin", bitcoin),
	("Testnet", bitcoin),
	("Qtum", qtum),
	("Qtum Testnet", qtum),
];

/// Coin names with a registered backend.
pub fn supported_coins() -> impl Iterator<Item = &'static str> {
	FACTORIES.iter().map(|(name, _)| *name)
}

/// Builds the backend registered for `config.coin_name`.
///
/// # Errors
///
/// Returns `ChainError::Config` for an unknown coin or a configuration that
/// cannot be serialized, or whatever the backend constructor reports.
pub fn create_blockchain(config: &RpcConfig) -> Result<Box<dyn BlockChain>> {
	let factory = FACTORIES
		.iter()
		.find(|(name, _)| *name == config.coin_name)
		.map(|(_, factory)| *factory)
		.ok_or_else(|| {
			ChainError::Config(format!(
				"Unsupported coin {}; expected one of: {}",
				config.coin_name,
				supported_coins().collect::<Vec<_>>().join(", ")
			))
		})?;

	let blob = config
		.to_value()
		.map_err(|e| ChainError::Config(e.to_string()))?;

	info!("Creating backend for coin {}", config.coin_name);
	factory(blob)
}
