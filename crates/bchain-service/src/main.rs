use anyhow::{Context, Result};
use bchain_config::{ConfigLoader, RpcConfig};
use bchain_types::BlockChain;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod factory;

#[derive(Parser)]
#[command(name = "bchain")]
#[command(about = "Bitcoin-family chain backend client", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/qtum.toml")]
	config: PathBuf,

	#[arg(long, env = "BCHAIN_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Validate the configuration file
	Validate,
	#[command(flatten)]
	Query(QueryCommand),
}

/// Commands that talk to an initialized backend.
#[derive(Subcommand)]
enum QueryCommand {
	/// Show chain and network information
	Info,
	/// Estimate the fee rate in satoshi per kilobyte
	EstimateFee {
		#[arg(long, default_value_t = 6)]
		blocks: u16,
		/// Use estimatesmartfee
		#[arg(long)]
		smart: bool,
		#[arg(long, requires = "smart")]
		conservative: bool,
	},
	/// Fetch a transaction
	Tx {
		txid: String,
		/// Fetch through the mempool path
		#[arg(long)]
		mempool: bool,
	},
	/// List mempool transaction ids
	Mempool,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	let config = load_config(&cli)?;

	match cli.command {
		Commands::Validate => validate_config(&config),
		Commands::Query(query) => query_backend(&config, query).await,
	}
}

fn validate_config(config: &RpcConfig) -> Result<()> {
	info!("Configuration is valid");
	info!("Coin: {} ({})", config.coin_name, config.coin_shortcut);
	info!("RPC endpoint: {}", config.rpc_url);
	Ok(())
}

async fn query_backend(config: &RpcConfig, query: QueryCommand) -> Result<()> {
	let mut chain = factory::create_blockchain(config).context("Failed to create backend")?;
	chain
		.initialize()
		.await
		.context("Failed to initialize backend")?;

	info!(
		"Connected to {} ({})",
		chain.coin_name(),
		chain.network_name()
	);

	let output = run(chain.as_ref(), query).await?;
	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

fn load_config(cli: &Cli) -> Result<RpcConfig> {
	info!("Loading configuration from: {:?}", cli.config);

	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.context("Failed to load configuration")
}

async fn run(chain: &dyn BlockChain, query: QueryCommand) -> Result<Value> {
	let output = match query {
		QueryCommand::Info => serde_json::to_value(chain.get_chain_info().await?)?,
		QueryCommand::EstimateFee {
			blocks,
			smart,
			conservative,
		} => {
			let fee_rate = if smart {
				chain.estimate_smart_fee(blocks, conservative).await?
			} else {
				chain.estimate_fee(blocks).await?
			};

			let formatted = chain
				.chain_parser()
				.map(|parser| parser.amount_to_decimal_string(&fee_rate));

			json!({
				"blocks": blocks,
				"fee_rate": fee_rate.to_string(),
				"fee_rate_formatted": formatted,
			})
		}
		QueryCommand::Tx { txid, mempool } => {
			let tx = if mempool {
				chain.get_transaction_for_mempool(&txid).await?
			} else {
				chain.get_transaction(&txid).await?
			};
			serde_json::to_value(tx)?
		}
		QueryCommand::Mempool => json!(chain.get_mempool_transactions().await?),
	};

	Ok(output)
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	Ok(())
}
