//! Configuration types for chain backends.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

const MAX_AMOUNT_DECIMALS: u32 = 18;

fn default_rpc_timeout() -> u64 {
	25
}

fn default_max_retries() -> u32 {
	3
}

fn default_amount_decimals() -> u32 {
	8
}

/// Connection and behavior settings of a node RPC backend.
#[derive(Clone, Deserialize, Serialize)]
pub struct RpcConfig {
	/// Coin name used to pick the backend (`Bitcoin`, `Qtum`, ...)
	pub coin_name: String,
	/// Ticker symbol
	#[serde(default)]
	pub coin_shortcut: String,
	/// HTTP(S) endpoint of the node
	pub rpc_url: String,
	#[serde(default)]
	pub rpc_user: String,
	#[serde(default)]
	pub rpc_pass: String,
	/// Request timeout in seconds
	#[serde(default = "default_rpc_timeout")]
	pub rpc_timeout: u64,
	/// Retry attempts for failed connections
	#[serde(default = "default_max_retries")]
	pub rpc_max_retries: u32,
	/// Whether the node supports `estimatesmartfee`
	#[serde(default)]
	pub supports_estimate_smart_fee: bool,
	/// Coinbase maturity; the chain's default applies when unset
	#[serde(default)]
	pub minimum_coinbase_confirmations: Option<u32>,
	#[serde(default = "default_amount_decimals")]
	pub amount_decimals: u32,
}

impl RpcConfig {
	/// Decodes and validates a configuration blob.
	pub fn from_value(value: Value) -> Result<Self, ConfigError> {
		let config: RpcConfig =
			serde_json::from_value(value).map_err(|e| ConfigError::ParseError(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.coin_name.trim().is_empty() {
			return Err(ConfigError::ValidationError(
				"coin_name must not be empty".to_string(),
			));
		}

		if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
			return Err(ConfigError::ValidationError(format!(
				"rpc_url must be an http(s) URL, got '{}'",
				self.rpc_url
			)));
		}

		if self.rpc_timeout == 0 {
			return Err(ConfigError::ValidationError(
				"rpc_timeout must be greater than zero".to_string(),
			));
		}

		if self.amount_decimals > MAX_AMOUNT_DECIMALS {
			return Err(ConfigError::ValidationError(format!(
				"amount_decimals must be at most {}, got {}",
				MAX_AMOUNT_DECIMALS, self.amount_decimals
			)));
		}

		Ok(())
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.rpc_timeout)
	}

	/// Serializes back into the blob form accepted by backend factories.
	pub fn to_value(&self) -> Result<Value, ConfigError> {
		serde_json::to_value(self).map_err(|e| ConfigError::ParseError(e.to_string()))
	}
}

impl fmt::Debug for RpcConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RpcConfig")
			.field("coin_name", &self.coin_name)
			.field("coin_shortcut", &self.coin_shortcut)
			.field("rpc_url", &self.rpc_url)
			.field("rpc_user", &self.rpc_user)
			.field("rpc_pass", &"<redacted>")
			.field("rpc_timeout", &self.rpc_timeout)
			.field("rpc_max_retries", &self.rpc_max_retries)
			.field(
				"supports_estimate_smart_fee",
				&self.supports_estimate_smart_fee,
			)
			.field(
				"minimum_coinbase_confirmations",
				&self.minimum_coinbase_confirmations,
			)
			.field("amount_decimals", &self.amount_decimals)
			.finish()
	}
}
