//! Collaborator Seams
//!
//! The evaluation pipeline talks to markets through these traits only.
//! Each has one operation; implementations live in the submodules and
//! tests swap in mocks.

pub mod advisor;
pub mod bridge;
pub mod forecaster;
pub mod rpc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::registry::DexId;

/// Simulates a single swap on one chain.
///
/// Convention: an unpriceable hop (no pool, revert, thin liquidity)
/// returns `Ok(U256::ZERO)`; `Err` is reserved for transport-level
/// failures the caller may want to distinguish.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn quote(
        &self,
        chain_id: u64,
        dex: DexId,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> eyre::Result<U256>;
}

/// Reports lendable depth: the vault's balance of a token, in raw units.
#[async_trait]
pub trait LiquidityOracle: Send + Sync {
    async fn vault_balance(
        &self,
        chain_id: u64,
        token: Address,
        vault: Address,
    ) -> eyre::Result<U256>;
}

/// Cost estimate for moving value between two chains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeQuote {
    pub fee_usd: Decimal,
    pub eta_minutes: u32,
}

/// `Ok(None)` means the route exists in the graph but cannot be priced;
/// the evaluator treats that as a skip, never as a free bridge.
#[async_trait]
pub trait BridgeQuoteProvider: Send + Sync {
    async fn estimate(
        &self,
        src_chain: u64,
        dst_chain: u64,
        token: &str,
        amount: U256,
    ) -> eyre::Result<Option<BridgeQuote>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
}

/// Execution parameters suggested for current conditions. Advisory only:
/// the evaluator clamps both fields to configured hard limits before
/// they reach a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    pub slippage_bps: u32,
    pub priority_fee_gwei: f64,
}

pub trait ParameterAdvisor: Send + Sync {
    fn recommend(&self, chain_id: u64, volatility: VolatilityLevel, gas_gwei: f64) -> RiskParams;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasTrend {
    RisingFast,
    DroppingFast,
    Stable,
}

/// Short-horizon gas trend over recent samples. Fed by the scheduler
/// once per cycle; consulted during the gating phase.
pub trait GasTrendForecaster: Send + Sync {
    fn ingest(&mut self, gwei: f64);
    fn trend(&self) -> GasTrend;

    /// True when the current trend makes scanning a waste of a cycle.
    fn should_wait(&self) -> bool {
        self.trend() == GasTrend::DroppingFast
    }
}
