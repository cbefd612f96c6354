//! Chain Registry - Static Per-Chain Metadata
//!
//! One immutable `ChainConfig` per supported chain: ordered RPC endpoint
//! list (first entry is primary), DEX router addresses, the flash-loan
//! vault, and the native-token USD rate used for gas cost conversion.
//!
//! The registry is built once at startup and shared by handle; nothing in
//! the scan pipeline mutates it afterward.

use alloy_primitives::{address, Address};
use std::collections::HashMap;
use std::env;

/// Balancer V3 vault - same address on every chain we lend from.
pub const FLASH_LOAN_VAULT: Address = address!("bA1333333333a1BA1108E8412f11850A5C319bA9");

// ============================================
// DEX IDENTIFIERS
// ============================================

/// DEXes the scanner can route a hop through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DexId {
    UniswapV3,
    UniswapV2,
    Sushiswap,
    Quickswap,
    Camelot,
    Pancakeswap,
    TraderJoe,
}

impl DexId {
    /// Concentrated-liquidity DEXes need a fee tier in the hop payload.
    pub fn is_v3(&self) -> bool {
        matches!(self, DexId::UniswapV3)
    }

    /// Protocol code carried in the execution signal (1 = V3-style,
    /// 0 = V2-style constant product).
    pub fn protocol_code(&self) -> u8 {
        if self.is_v3() {
            1
        } else {
            0
        }
    }
}

impl std::fmt::Display for DexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DexId::UniswapV3 => write!(f, "UniV3"),
            DexId::UniswapV2 => write!(f, "UniV2"),
            DexId::Sushiswap => write!(f, "Sushi"),
            DexId::Quickswap => write!(f, "Quickswap"),
            DexId::Camelot => write!(f, "Camelot"),
            DexId::Pancakeswap => write!(f, "Pancake"),
            DexId::TraderJoe => write!(f, "TraderJoe"),
        }
    }
}

// ============================================
// CHAIN CONFIG
// ============================================

/// Immutable metadata for one chain.
///
/// A router mapped to the zero address means "configured but not deployed
/// here" - the evaluator checks for that before building a payload.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub id: u64,
    pub name: &'static str,
    /// Ordered RPC endpoints; first is primary, the rest are failover.
    pub rpc_endpoints: Vec<String>,
    pub routers: HashMap<DexId, Address>,
    /// UniswapV3 QuoterV2, zero where V3 is not deployed.
    pub v3_quoter: Address,
    pub flash_loan_vault: Address,
    pub native_symbol: &'static str,
    /// Fixed USD rate for the native token, used only to convert gas
    /// prices into USD cost estimates.
    pub native_price_usd: f64,
    /// DEX pairs we scan as (first hop, second hop) route combinations.
    pub route_pairs: Vec<(DexId, DexId)>,
}

impl ChainConfig {
    pub fn router(&self, dex: DexId) -> Option<Address> {
        self.routers.get(&dex).copied()
    }
}

// ============================================
// REGISTRY
// ============================================

/// All supported chains, keyed by chain id. Read-only after `bootstrap`.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: HashMap<u64, ChainConfig>,
}

impl ChainRegistry {
    pub fn new(chains: Vec<ChainConfig>) -> Self {
        Self {
            chains: chains.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.chains.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Build the default registry. RPC endpoints come from
    /// `RPC_<CHAIN_NAME>` (comma-separated for failover) with a public
    /// endpoint as fallback so a bare environment still boots.
    pub fn bootstrap() -> Self {
        let quoter_v2 = address!("61fFE014bA17989E743c5F6cB21bF9697530B21e");

        let chains = vec![
            ChainConfig {
                id: 1,
                name: "ethereum",
                rpc_endpoints: rpc_list("RPC_ETHEREUM", "https://eth.llamarpc.com"),
                routers: HashMap::from([
                    (DexId::UniswapV3, address!("E592427A0AEce92De3Edee1F18E0157C05861564")),
                    (DexId::UniswapV2, address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D")),
                    (DexId::Sushiswap, address!("d9e1cE17f2641f24aE83637ab66a2cca9C378B9F")),
                ]),
                v3_quoter: quoter_v2,
                flash_loan_vault: FLASH_LOAN_VAULT,
                native_symbol: "ETH",
                native_price_usd: 2000.0,
                route_pairs: vec![
                    (DexId::UniswapV3, DexId::Sushiswap),
                    (DexId::UniswapV3, DexId::UniswapV2),
                    (DexId::Sushiswap, DexId::UniswapV2),
                ],
            },
            ChainConfig {
                id: 137,
                name: "polygon",
                rpc_endpoints: rpc_list("RPC_POLYGON", "https://polygon-rpc.com"),
                routers: HashMap::from([
                    (DexId::UniswapV3, address!("E592427A0AEce92De3Edee1F18E0157C05861564")),
                    (DexId::Quickswap, address!("a5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff")),
                    (DexId::Sushiswap, address!("1b02dA8Cb0d097eB8D57A175b88c7D8b47997506")),
                ]),
                v3_quoter: quoter_v2,
                flash_loan_vault: FLASH_LOAN_VAULT,
                native_symbol: "MATIC",
                native_price_usd: 0.5,
                route_pairs: vec![
                    (DexId::UniswapV3, DexId::Quickswap),
                    (DexId::UniswapV3, DexId::Sushiswap),
                    (DexId::Quickswap, DexId::Sushiswap),
                ],
            },
            ChainConfig {
                id: 42161,
                name: "arbitrum",
                rpc_endpoints: rpc_list("RPC_ARBITRUM", "https://arb1.arbitrum.io/rpc"),
                routers: HashMap::from([
                    (DexId::UniswapV3, address!("E592427A0AEce92De3Edee1F18E0157C05861564")),
                    (DexId::Sushiswap, address!("1b02dA8Cb0d097eB8D57A175b88c7D8b47997506")),
                    (DexId::Camelot, address!("c873fEcbd354f5A56E00E710B90EF4201db2448d")),
                ]),
                v3_quoter: quoter_v2,
                flash_loan_vault: FLASH_LOAN_VAULT,
                native_symbol: "ETH",
                native_price_usd: 2000.0,
                route_pairs: vec![
                    (DexId::UniswapV3, DexId::Sushiswap),
                    (DexId::UniswapV3, DexId::Camelot),
                    (DexId::Sushiswap, DexId::Camelot),
                ],
            },
            ChainConfig {
                id: 10,
                name: "optimism",
                rpc_endpoints: rpc_list("RPC_OPTIMISM", "https://mainnet.optimism.io"),
                routers: HashMap::from([
                    (DexId::UniswapV3, address!("E592427A0AEce92De3Edee1F18E0157C05861564")),
                    (DexId::Sushiswap, address!("1b02dA8Cb0d097eB8D57A175b88c7D8b47997506")),
                ]),
                v3_quoter: quoter_v2,
                flash_loan_vault: FLASH_LOAN_VAULT,
                native_symbol: "ETH",
                native_price_usd: 2000.0,
                route_pairs: vec![(DexId::UniswapV3, DexId::Sushiswap)],
            },
            ChainConfig {
                id: 8453,
                name: "base",
                rpc_endpoints: rpc_list("RPC_BASE", "https://mainnet.base.org"),
                routers: HashMap::from([
                    (DexId::UniswapV3, address!("2626664c2603336E57B271c5C0b26F421741e481")),
                    (DexId::Sushiswap, address!("6BDED42c6DA8FBf0d2bA55B2fa120C5e0c8D7891")),
                ]),
                v3_quoter: address!("3d4e44Eb1374240CE5F1B871ab261CD16335B76a"),
                flash_loan_vault: FLASH_LOAN_VAULT,
                native_symbol: "ETH",
                native_price_usd: 2000.0,
                route_pairs: vec![(DexId::UniswapV3, DexId::Sushiswap)],
            },
            ChainConfig {
                id: 56,
                name: "bsc",
                rpc_endpoints: rpc_list("RPC_BSC", "https://bsc-dataseed.binance.org"),
                routers: HashMap::from([
                    // Uniswap is not deployed on BSC; kept as an explicit
                    // zero entry so misconfigured routes fail the payload
                    // checkpoint instead of building a bad signal.
                    (DexId::UniswapV3, Address::ZERO),
                    (DexId::Pancakeswap, address!("10ED43C718714eb63d5aA57B78B54704E256024E")),
                    (DexId::Sushiswap, address!("1b02dA8Cb0d097eB8D57A175b88c7D8b47997506")),
                ]),
                v3_quoter: Address::ZERO,
                flash_loan_vault: FLASH_LOAN_VAULT,
                native_symbol: "BNB",
                native_price_usd: 300.0,
                route_pairs: vec![(DexId::Pancakeswap, DexId::Sushiswap)],
            },
            ChainConfig {
                id: 43114,
                name: "avalanche",
                rpc_endpoints: rpc_list("RPC_AVALANCHE", "https://api.avax.network/ext/bc/C/rpc"),
                routers: HashMap::from([
                    (DexId::TraderJoe, address!("60aE616a2155Ee3d9A68541Ba4544862310933d4")),
                    (DexId::Sushiswap, address!("1b02dA8Cb0d097eB8D57A175b88c7D8b47997506")),
                ]),
                v3_quoter: Address::ZERO,
                flash_loan_vault: FLASH_LOAN_VAULT,
                native_symbol: "AVAX",
                native_price_usd: 25.0,
                route_pairs: vec![(DexId::TraderJoe, DexId::Sushiswap)],
            },
        ];

        Self::new(chains)
    }
}

/// Read a comma-separated endpoint list from the environment, falling
/// back to a single public endpoint.
fn rpc_list(var: &str, fallback: &str) -> Vec<String> {
    match env::var(var) {
        Ok(s) if !s.trim().is_empty() => s
            .split(',')
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
        _ => vec![fallback.to_string()],
    }
}
