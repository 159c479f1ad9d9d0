//! Transports carrying JSON-RPC envelopes to the node.
//!
//! `HttpTransport` performs a single HTTP round trip. `RetryTransport` wraps any
//! transport with exponential backoff for connection-level failures; errors the
//! node itself reports are returned on the first attempt. Requests that must
//! not be repeated go through `send_once`, which bypasses the retry loop.

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use bchain_config::RpcConfig;
use bchain_types::{ChainError, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Sends one JSON-RPC request envelope and returns the response envelope.
#[async_trait]
pub trait RpcTransport: Send + Sync {
	async fn send(&self, request: Value) -> Result<Value>;

	/// Sends the request exactly once, for calls that are not safe to repeat.
	async fn send_once(&self, request: Value) -> Result<Value> {
		self.send(request).await
	}
}

/// HTTP transport with basic authentication.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: reqwest::Client,
	url: String,
	user: String,
	pass: String,
}

impl HttpTransport {
	/// Creates a transport for the endpoint, credentials and timeout in `config`.
	pub fn new(config: &RpcConfig) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(config.timeout())
			.build()
			.map_err(|e| ChainError::Transport(format!("Failed to create HTTP client: {}", e)))?;

		Ok(Self {
			client,
			url: config.rpc_url.clone(),
			user: config.rpc_user.clone(),
			pass: config.rpc_pass.clone(),
		})
	}
}

#[async_trait]
impl RpcTransport for HttpTransport {
	async fn send(&self, request: Value) -> Result<Value> {
		let response = self
			.client
			.post(&self.url)
			.basic_auth(&self.user, Some(&self.pass))
			.json(&request)
			.send()
			.await
			.map_err(|e| ChainError::Transport(format!("Request to {} failed: {}", self.url, e)))?;

		let status = response.status();
		let body = response
			.bytes()
			.await
			.map_err(|e| ChainError::Transport(format!("Failed to read response: {}", e)))?;

		// bitcoind answers RPC errors with HTTP 500 and a JSON body
		serde_json::from_slice(&body).map_err(|_| match status {
			StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ChainError::Config(format!(
				"RPC credentials rejected by {}: HTTP status {}",
				self.url, status
			)),
			_ => ChainError::Transport(format!(
				"Unexpected HTTP status {} with non-JSON body",
				status
			)),
		})
	}
}

/// Retry wrapper for automatic retries.
///
/// Only `ChainError::Transport` failures are retried. The backoff gives up
/// after 30 seconds or `max_retries` attempts, whichever comes first.
#[derive(Debug, Clone)]
pub struct RetryTransport<T> {
	inner: T,
	backoff: ExponentialBackoff,
	max_retries: u32,
}

impl<T> RetryTransport<T> {
	/// Wraps `inner` with a 30 second backoff budget and 3 retries.
	pub fn new(inner: T) -> Self {
		let backoff = ExponentialBackoff {
			max_elapsed_time: Some(Duration::from_secs(30)),
			..Default::default()
		};

		Self {
			inner,
			backoff,
			max_retries: 3,
		}
	}

	/// Sets the number of retries after the first attempt.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;
		self
	}

	/// Replaces the backoff policy.
	pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
		self.backoff = backoff;
		self
	}

	/// The wrapped transport.
	pub fn inner(&self) -> &T {
		&self.inner
	}
}

#[async_trait]
impl<T: RpcTransport> RpcTransport for RetryTransport<T> {
	async fn send(&self, request: Value) -> Result<Value> {
		let mut backoff = self.backoff.clone();
		backoff.reset();
		let mut attempts = 0;

		loop {
			match self.inner.send(request.clone()).await {
				Ok(response) => return Ok(response),
				Err(e) if !e.is_transport() => return Err(e),
				Err(e) => {
					attempts += 1;

					if attempts > self.max_retries {
						warn!(
							"RPC request failed after {} attempts, giving up: {}",
							attempts, e
						);
						return Err(e);
					}

					match backoff.next_backoff() {
						Some(delay) => {
							warn!(
								"RPC request failed, attempt {}/{}, retrying in {:?}: {}",
								attempts, self.max_retries, delay, e
							);
							tokio::time::sleep(delay).await;
						}
						None => {
							warn!(
								"RPC request failed, backoff exhausted after {} attempts: {}",
								attempts, e
							);
							return Err(e);
						}
					}
				}
			}
		}
	}

	async fn send_once(&self, request: Value) -> Result<Value> {
		self.inner.send_once(request).await
	}
}
