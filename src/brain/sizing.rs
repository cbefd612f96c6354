//! Liquidity Gate - Loan Sizing
//!
//! Caps a requested flash loan against the vault's actual depth: never
//! more than a fixed share of pool liquidity, never below the notional
//! floor where fees eat the trade. All math is integer U256; the share
//! is carried in basis points so the cap is exact.

use alloy_primitives::U256;
use eyre::{bail, Result};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

use crate::oracle::LiquidityOracle;

/// Why sizing refused to approve any loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SizingAbort {
    #[error("liquidity oracle unavailable")]
    OracleError,
    #[error("vault holds no liquidity for this asset")]
    EmptyVault,
    #[error("approvable size below profitability floor")]
    BelowFloor,
}

/// Outcome of sizing one loan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanSizing {
    pub requested: U256,
    pub approved: U256,
    pub reason: Option<SizingAbort>,
}

impl LoanSizing {
    pub fn aborted(&self) -> bool {
        self.reason.is_some()
    }

    fn abort(requested: U256, reason: SizingAbort) -> Self {
        Self {
            requested,
            approved: U256::ZERO,
            reason: Some(reason),
        }
    }
}

/// Pure cap math, separated from the oracle call so the invariants are
/// directly testable.
///
/// `cap = liquidity * share_bps / 10_000`, `floor = min_units *
/// 10^decimals`; approved is `min(requested, cap)` unless that falls
/// below the floor.
pub fn apply_caps(
    liquidity: U256,
    requested: U256,
    share_bps: u32,
    min_units: u64,
    decimals: u8,
) -> Result<U256, SizingAbort> {
    if liquidity.is_zero() {
        return Err(SizingAbort::EmptyVault);
    }

    let cap = liquidity * U256::from(share_bps) / U256::from(10_000u64);
    let approved = requested.min(cap);

    let floor = U256::from(min_units) * U256::from(10u64).pow(U256::from(decimals));
    if approved < floor {
        return Err(SizingAbort::BelowFloor);
    }
    Ok(approved)
}

pub struct LiquidityGate {
    oracle: Arc<dyn LiquidityOracle>,
    share_bps: u32,
    min_units: u64,
    call_timeout: Duration,
}

impl LiquidityGate {
    pub fn new(
        oracle: Arc<dyn LiquidityOracle>,
        share_bps: u32,
        min_units: u64,
        call_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            share_bps,
            min_units,
            call_timeout,
        }
    }

    /// Size one loan. Non-positive targets are a caller bug, not a
    /// market condition, and error out instead of aborting.
    pub async fn size_loan(
        &self,
        chain_id: u64,
        token: alloy_primitives::Address,
        vault: alloy_primitives::Address,
        requested: U256,
        decimals: u8,
    ) -> Result<LoanSizing> {
        if requested.is_zero() {
            bail!("loan sizing called with a zero target");
        }

        let liquidity = match timeout(
            self.call_timeout,
            self.oracle.vault_balance(chain_id, token, vault),
        )
        .await
        {
            Ok(Ok(balance)) => balance,
            Ok(Err(e)) => {
                debug!(chain = chain_id, %token, "liquidity oracle error: {e}");
                return Ok(LoanSizing::abort(requested, SizingAbort::OracleError));
            }
            Err(_) => {
                debug!(chain = chain_id, %token, "liquidity oracle timed out");
                return Ok(LoanSizing::abort(requested, SizingAbort::OracleError));
            }
        };

        match apply_caps(liquidity, requested, self.share_bps, self.min_units, decimals) {
            Ok(approved) => Ok(LoanSizing {
                requested,
                approved,
                reason: None,
            }),
            Err(reason) => Ok(LoanSizing::abort(requested, reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::LiquidityOracle;
    use alloy_primitives::Address;
    use async_trait::async_trait;

    struct FixedLiquidity(U256);

    #[async_trait]
    impl LiquidityOracle for FixedLiquidity {
        async fn vault_balance(&self, _: u64, _: Address, _: Address) -> eyre::Result<U256> {
            Ok(self.0)
        }
    }

    struct BrokenOracle;

    #[async_trait]
    impl LiquidityOracle for BrokenOracle {
        async fn vault_balance(&self, _: u64, _: Address, _: Address) -> eyre::Result<U256> {
            eyre::bail!("rpc down")
        }
    }

    fn gate(oracle: Arc<dyn LiquidityOracle>) -> LiquidityGate {
        LiquidityGate::new(oracle, 2000, 500, Duration::from_secs(5))
    }

    #[test]
    fn cap_binds_when_target_exceeds_share() {
        // Pool 100_000, target 50_000, 20% share: approved = 20_000.
        let approved = apply_caps(
            U256::from(100_000u64),
            U256::from(50_000u64),
            2000,
            500,
            0,
        )
        .unwrap();
        assert_eq!(approved, U256::from(20_000u64));
    }

    #[test]
    fn target_under_cap_passes_through() {
        let approved = apply_caps(
            U256::from(100_000u64),
            U256::from(5_000u64),
            2000,
            500,
            0,
        )
        .unwrap();
        assert_eq!(approved, U256::from(5_000u64));
    }

    #[test]
    fn empty_vault_aborts() {
        let err = apply_caps(U256::ZERO, U256::from(1_000u64), 2000, 500, 0);
        assert_eq!(err, Err(SizingAbort::EmptyVault));
    }

    #[test]
    fn capped_size_below_floor_aborts() {
        // Pool 2_000 with 20% share caps at 400, under the 500 floor.
        let err = apply_caps(U256::from(2_000u64), U256::from(10_000u64), 2000, 500, 0);
        assert_eq!(err, Err(SizingAbort::BelowFloor));
    }

    #[test]
    fn floor_scales_with_decimals() {
        let one_token = U256::from(10u64).pow(U256::from(18u8));
        let pool = U256::from(10_000u64) * one_token;
        // 600 tokens requested, cap at 2_000 tokens: passes the
        // 500-token floor.
        let approved = apply_caps(pool, U256::from(600u64) * one_token, 2000, 500, 18).unwrap();
        assert_eq!(approved, U256::from(600u64) * one_token);

        // 400 tokens of pool depth caps at 80, far under the floor.
        let err = apply_caps(
            U256::from(400u64) * one_token,
            U256::from(600u64) * one_token,
            2000,
            500,
            18,
        );
        assert_eq!(err, Err(SizingAbort::BelowFloor));
    }

    #[tokio::test]
    async fn oracle_failure_is_an_abort_not_an_error() {
        let gate = gate(Arc::new(BrokenOracle));
        let sizing = gate
            .size_loan(137, Address::repeat_byte(1), Address::repeat_byte(2), U256::from(1_000u64), 0)
            .await
            .unwrap();
        assert!(sizing.aborted());
        assert_eq!(sizing.reason, Some(SizingAbort::OracleError));
        assert_eq!(sizing.approved, U256::ZERO);
    }

    #[tokio::test]
    async fn zero_target_is_a_caller_bug() {
        let gate = gate(Arc::new(FixedLiquidity(U256::from(1_000u64))));
        let res = gate
            .size_loan(137, Address::repeat_byte(1), Address::repeat_byte(2), U256::ZERO, 0)
            .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn end_to_end_sizing_numbers() {
        let gate = gate(Arc::new(FixedLiquidity(U256::from(100_000u64))));
        let sizing = gate
            .size_loan(
                137,
                Address::repeat_byte(1),
                Address::repeat_byte(2),
                U256::from(50_000u64),
                0,
            )
            .await
            .unwrap();
        assert!(!sizing.aborted());
        assert_eq!(sizing.requested, U256::from(50_000u64));
        assert_eq!(sizing.approved, U256::from(20_000u64));
    }
}
