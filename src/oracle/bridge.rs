//! Flat-Fee Bridge Quoter
//!
//! Static per-route fee table. Good enough for ranking opportunities;
//! routes missing from the table and without a default fee are
//! unpriceable and resolve to `None`.

use alloy_primitives::U256;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::{BridgeQuote, BridgeQuoteProvider};

pub struct FlatFeeBridgeQuoter {
    fees: HashMap<(u64, u64), BridgeQuote>,
    default_fee: Option<BridgeQuote>,
}

impl FlatFeeBridgeQuoter {
    pub fn new(fees: HashMap<(u64, u64), BridgeQuote>, default_fee: Option<BridgeQuote>) -> Self {
        Self { fees, default_fee }
    }

    /// Default table: cheap between L2s, expensive anything touching
    /// mainnet, a flat catch-all for the rest.
    pub fn with_defaults() -> Self {
        let quote = |fee: i64, eta: u32| BridgeQuote {
            fee_usd: Decimal::from(fee),
            eta_minutes: eta,
        };

        let mut fees = HashMap::new();
        let l2s = [137u64, 42161, 10, 8453];
        for &a in &l2s {
            for &b in &l2s {
                if a != b {
                    fees.insert((a, b), quote(1, 3));
                }
            }
            // Mainnet exits wait out the challenge window pricing.
            fees.insert((1, a), quote(8, 10));
            fees.insert((a, 1), quote(8, 10));
        }

        Self::new(fees, Some(quote(3, 5)))
    }
}

#[async_trait]
impl BridgeQuoteProvider for FlatFeeBridgeQuoter {
    async fn estimate(
        &self,
        src_chain: u64,
        dst_chain: u64,
        _token: &str,
        _amount: U256,
    ) -> eyre::Result<Option<BridgeQuote>> {
        Ok(self
            .fees
            .get(&(src_chain, dst_chain))
            .copied()
            .or(self.default_fee))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn route_table_beats_default() {
        let quoter = FlatFeeBridgeQuoter::with_defaults();
        let l2 = quoter.estimate(137, 42161, "USDC", U256::ZERO).await.unwrap().unwrap();
        let mainnet = quoter.estimate(1, 137, "USDC", U256::ZERO).await.unwrap().unwrap();
        assert!(l2.fee_usd < mainnet.fee_usd);
    }

    #[tokio::test]
    async fn unconfigured_route_without_default_is_unpriceable() {
        let quoter = FlatFeeBridgeQuoter::new(HashMap::new(), None);
        let quote = quoter.estimate(1, 137, "USDC", U256::ZERO).await.unwrap();
        assert!(quote.is_none());
    }
}
