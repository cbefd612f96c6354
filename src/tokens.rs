//! Static Token Inventory
//!
//! Tokens the scanner watches, grouped per chain. Tiering controls scan
//! cadence: core tokens are scanned every cycle, majors every second
//! cycle, long-tail tokens are sampled every fifth.

use alloy_primitives::{address, Address};
use std::collections::HashMap;

/// Symbols assumed bridgeable between any two chains that both list them.
pub const BRIDGE_ASSETS: [&str; 5] = ["USDC", "USDT", "DAI", "WETH", "WBTC"];

/// Scan cadence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTier {
    /// Deep-liquidity staples, scanned every cycle.
    Core,
    /// Large caps, scanned every second cycle.
    Major,
    /// Everything else, randomly sampled every fifth cycle.
    LongTail,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u8,
    pub tier: TokenTier,
}

impl Token {
    const fn new(symbol: &'static str, address: Address, decimals: u8, tier: TokenTier) -> Self {
        Self {
            symbol,
            address,
            decimals,
            tier,
        }
    }
}

/// Full per-chain inventory. Built once at startup and handed to the
/// graph builder.
pub fn inventory() -> HashMap<u64, Vec<Token>> {
    use TokenTier::{Core, LongTail, Major};

    HashMap::from([
        (
            1u64,
            vec![
                Token::new("WETH", address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18, Core),
                Token::new("USDC", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6, Core),
                Token::new("USDT", address!("dAC17F958D2ee523a2206206994597C13D831ec7"), 6, Core),
                Token::new("DAI", address!("6B175474E89094C44Da98b954EedeAC495271d0F"), 18, Core),
                Token::new("WBTC", address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"), 8, Core),
                Token::new("LINK", address!("514910771AF9Ca656af840dff83E8264EcF986CA"), 18, Major),
                Token::new("UNI", address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984"), 18, Major),
                Token::new("AAVE", address!("7Fc66500c84A76Ad7e9c93437bFc5Ac33E2DDaE9"), 18, Major),
                Token::new("CRV", address!("D533a949740bb3306d119CC777fa900bA034cd52"), 18, LongTail),
                Token::new("LDO", address!("5A98FcBEA516Cf06857215779Fd812CA3beF1B32"), 18, LongTail),
            ],
        ),
        (
            137u64,
            vec![
                Token::new("WETH", address!("7ceB23fD6bC0adD59E62ac25578270cFf1b9f619"), 18, Core),
                Token::new("USDC", address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174"), 6, Core),
                Token::new("USDT", address!("c2132D05D31c914a87C6611C10748AEb04B58e8F"), 6, Core),
                Token::new("DAI", address!("8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063"), 18, Core),
                Token::new("WBTC", address!("1BFD67037B42Cf73acF2047067bd4F2C47D9BfD6"), 8, Core),
                Token::new("WMATIC", address!("0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270"), 18, Major),
                Token::new("LINK", address!("53E0bca35eC356BD5ddDFebbD1Fc0fD03FaBad39"), 18, Major),
                Token::new("AAVE", address!("D6DF932A45C0f255f85145f286eA0b292B21C90B"), 18, LongTail),
            ],
        ),
        (
            42161u64,
            vec![
                Token::new("WETH", address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1"), 18, Core),
                Token::new("USDC", address!("af88d065e77c8cC2239327C5EDb3A432268e5831"), 6, Core),
                Token::new("USDT", address!("Fd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"), 6, Core),
                Token::new("DAI", address!("DA10009cBd5D07dd0CeCc66161FC93D7c9000da1"), 18, Core),
                Token::new("WBTC", address!("2f2a2543B76A4166549F7aaB2e75Bef0aefC5B0f"), 8, Core),
                Token::new("ARB", address!("912CE59144191C1204E64559FE8253a0e49E6548"), 18, Major),
                Token::new("GMX", address!("fc5A1A6EB076a2C7aD06eD22C90d7E710E35ad0a"), 18, LongTail),
            ],
        ),
        (
            10u64,
            vec![
                Token::new("WETH", address!("4200000000000000000000000000000000000006"), 18, Core),
                Token::new("USDC", address!("7F5c764cBc14f9669B88837ca1490cCa17c31607"), 6, Core),
                Token::new("DAI", address!("DA10009cBd5D07dd0CeCc66161FC93D7c9000da1"), 18, Core),
                Token::new("OP", address!("4200000000000000000000000000000000000042"), 18, Major),
            ],
        ),
        (
            8453u64,
            vec![
                Token::new("WETH", address!("4200000000000000000000000000000000000006"), 18, Core),
                Token::new("USDC", address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"), 6, Core),
                Token::new("DAI", address!("50c5725949A6F0c72E6C4a641F24049A917DB0Cb"), 18, Major),
            ],
        ),
        (
            56u64,
            vec![
                Token::new("WETH", address!("2170Ed0880ac9A755fd29B2688956BD959F933F8"), 18, Core),
                Token::new("USDT", address!("55d398326f99059fF775485246999027B3197955"), 18, Core),
                Token::new("USDC", address!("8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"), 18, Core),
                Token::new("WBNB", address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"), 18, Major),
            ],
        ),
        (
            43114u64,
            vec![
                Token::new("WETH", address!("49D5c2BdFfac6CE2BFdB6640F4F80f226bc10bAB"), 18, Core),
                Token::new("USDC", address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"), 6, Core),
                Token::new("USDT", address!("9702230A8Ea53601f5cD2dc00fDBc13d4dF4A8c7"), 6, Core),
                Token::new("WAVAX", address!("B31f66AA3C1e785363F0875A1B74E27b85FD66c7"), 18, Major),
            ],
        ),
    ])
}

/// Find a token on a chain by symbol.
pub fn find(inventory: &HashMap<u64, Vec<Token>>, chain_id: u64, symbol: &str) -> Option<Token> {
    inventory
        .get(&chain_id)
        .and_then(|ts| ts.iter().find(|t| t.symbol == symbol))
        .cloned()
}

/// Tier lookup by symbol alone; tiers are consistent across chains.
pub fn tier_of(inventory: &HashMap<u64, Vec<Token>>, symbol: &str) -> TokenTier {
    inventory
        .values()
        .flatten()
        .find(|t| t.symbol == symbol)
        .map(|t| t.tier)
        .unwrap_or(TokenTier::LongTail)
}
