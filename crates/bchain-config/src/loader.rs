//! Configuration loading from files and environment.

use crate::{types::RpcConfig, ConfigError};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration loader with environment variable overrides
#[derive(Debug, Clone)]
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	/// Creates a loader with no file and the `BCHAIN_` environment prefix.
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "BCHAIN_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads the file, applies environment overrides and validates the result.
	pub fn load(&self) -> Result<RpcConfig, ConfigError> {
		let path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		let mut config = Self::from_file(path)?;
		self.apply_env_overrides(&mut config)?;
		config.validate()?;

		Ok(config)
	}

	/// Parses a configuration file, picking the format from its extension.
	pub fn from_file(path: &Path) -> Result<RpcConfig, ConfigError> {
		info!("Loading configuration from {:?}", path);

		if !path.exists() {
			return Err(ConfigError::FileNotFound(path.display().to_string()));
		}

		let contents = std::fs::read_to_string(path)?;

		match path.extension().and_then(|s| s.to_str()) {
			Some("json") => Self::from_json(&contents),
			Some("toml") => Self::from_toml(&contents),
			Some("yaml") | Some("yml") => Self::from_yaml(&contents),
			_ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
		}
	}

	pub fn from_json(contents: &str) -> Result<RpcConfig, ConfigError> {
		serde_json::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	pub fn from_toml(contents: &str) -> Result<RpcConfig, ConfigError> {
		toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	pub fn from_yaml(contents: &str) -> Result<RpcConfig, ConfigError> {
		serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	fn apply_env_overrides(&self, config: &mut RpcConfig) -> Result<(), ConfigError> {
		if let Ok(url) = env::var(format!("{}RPC_URL", self.env_prefix)) {
			debug!("Overriding rpc_url from environment");
			config.rpc_url = url;
		}

		if let Ok(user) = env::var(format!("{}RPC_USER", self.env_prefix)) {
			debug!("Overriding rpc_user from environment");
			config.rpc_user = user;
		}

		if let Ok(pass) = env::var(format!("{}RPC_PASS", self.env_prefix)) {
			debug!("Overriding rpc_pass from environment");
			config.rpc_pass = pass;
		}

		if let Ok(timeout) = env::var(format!("{}RPC_TIMEOUT", self.env_prefix)) {
			config.rpc_timeout = timeout
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid RPC timeout: {}", e)))?;
		}

		Ok(())
	}
}
