// bchain-config/src/lib.rs

use thiserror::Error;

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::RpcConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Unsupported config format: {0}")]
	UnsupportedFormat(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}
