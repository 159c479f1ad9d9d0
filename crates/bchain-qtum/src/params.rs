//! Qtum network parameters.

use bchain_types::{ChainParams, ChainParamsRegistry, Result};

pub const MAINNET_MAGIC: u32 = 0xd3a6_cff1;
pub const TESTNET_MAGIC: u32 = 0x0615_220d;
pub const REGTEST_MAGIC: u32 = 0xe1c6_ddfd;

pub const MAIN_NET_PARAMS: ChainParams = ChainParams {
	name: "main",
	net: MAINNET_MAGIC,
	pubkey_hash_addr_id: 58,
	script_hash_addr_id: 50,
	bech32_hrp: "qc",
	default_port: 3888,
};

pub const TEST_NET_PARAMS: ChainParams = ChainParams {
	name: "test",
	net: TESTNET_MAGIC,
	pubkey_hash_addr_id: 120,
	script_hash_addr_id: 110,
	bech32_hrp: "tq",
	default_port: 13888,
};

pub const REGTEST_PARAMS: ChainParams = ChainParams {
	name: "regtest",
	net: REGTEST_MAGIC,
	pubkey_hash_addr_id: 120,
	script_hash_addr_id: 110,
	bech32_hrp: "qcrt",
	default_port: 23888,
};

static QTUM_CHAINS: [ChainParams; 3] = [MAIN_NET_PARAMS, TEST_NET_PARAMS, REGTEST_PARAMS];

pub static REGISTRY: ChainParamsRegistry = ChainParamsRegistry::new("Qtum", &QTUM_CHAINS);

/// Resolves parameters for a chain name reported by a Qtum node.
pub fn get_chain_params(chain: &str) -> Result<&'static ChainParams> {
	REGISTRY.lookup(chain)
}
