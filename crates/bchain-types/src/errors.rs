//! Error types for the chain backends.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Error, Debug)]
pub enum ChainError {
	/// Error object returned by the node in a JSON-RPC response.
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },

	#[error("Transport error: {0}")]
	Transport(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("Chain backend is not initialized")]
	NotInitialized,

	#[error("State error: {0}")]
	State(String),

	#[error("Fee estimation failed: {0}")]
	FeeEstimate(String),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl ChainError {
	/// Whether the failure happened before the node answered, so repeating
	/// the request may succeed.
	pub fn is_transport(&self) -> bool {
		matches!(self, ChainError::Transport(_))
	}
}
