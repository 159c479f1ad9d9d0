//! Bitcoin network parameters.

use bchain_types::{ChainParams, ChainParamsRegistry};

pub const MAINNET_MAGIC: u32 = 0xd9b4_bef9;
pub const TESTNET_MAGIC: u32 = 0x0709_110b;
pub const REGTEST_MAGIC: u32 = 0xdab5_bffa;
pub const SIGNET_MAGIC: u32 = 0x40cf_030a;

pub const MAIN_NET_PARAMS: ChainParams = ChainParams {
	name: "main",
	net: MAINNET_MAGIC,
	pubkey_hash_addr_id: 0,
	script_hash_addr_id: 5,
	bech32_hrp: "bc",
	default_port: 8333,
};

pub const TEST_NET_PARAMS: ChainParams = ChainParams {
	name: "test",
	net: TESTNET_MAGIC,
	pubkey_hash_addr_id: 111,
	script_hash_addr_id: 196,
	bech32_hrp: "tb",
	default_port: 18333,
};

pub const REGTEST_PARAMS: ChainParams = ChainParams {
	name: "regtest",
	net: REGTEST_MAGIC,
	pubkey_hash_addr_id: 111,
	script_hash_addr_id: 196,
	bech32_hrp: "bcrt",
	default_port: 18444,
};

pub const SIGNET_PARAMS: ChainParams = ChainParams {
	name: "signet",
	net: SIGNET_MAGIC,
	pubkey_hash_addr_id: 111,
	script_hash_addr_id: 196,
	bech32_hrp: "tb",
	default_port: 38333,
};

static BITCOIN_CHAINS: [ChainParams; 4] = [
	MAIN_NET_PARAMS,
	TEST_NET_PARAMS,
	REGTEST_PARAMS,
	SIGNET_PARAMS,
];

pub static REGISTRY: ChainParamsRegistry = ChainParamsRegistry::new("Bitcoin", &BITCOIN_CHAINS);
