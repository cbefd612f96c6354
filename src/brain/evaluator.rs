//! Opportunity Evaluator
//!
//! The gauntlet between a discovered candidate and an emitted signal.
//! Checkpoints run in a fixed order and short-circuit on the first
//! failure: loan sizing, two-hop trade simulation, bridge pricing,
//! profitability, gas ceiling, risk parameters, payload assembly, then
//! a single emit. A skipped candidate produces exactly one reason and
//! no side effects.

use alloy_primitives::{Address, U256};
use eyre::{bail, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::graph::Opportunity;
use crate::oracle::{
    BridgeQuote, BridgeQuoteProvider, ParameterAdvisor, PriceOracle, VolatilityLevel,
};
use crate::registry::{ChainRegistry, DexId};
use crate::signals::{ExecutionSignal, SignalMetrics, SignalRiskParams, SignalSink};
use crate::tokens::{self, Token};

use super::profit::ProfitEngine;
use super::sizing::{LiquidityGate, SizingAbort};

/// Why a candidate was dropped. One variant per checkpoint exit; these
/// are normal outcomes, logged at debug and never propagated as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("chain {0} not in registry")]
    UnknownChain(u64),
    #[error("no bridge pivot asset on chain {0}")]
    NoPivotAsset(u64),
    #[error("loan sizing aborted: {0}")]
    Sizing(SizingAbort),
    #[error("first hop has no viable route")]
    FirstHopNoRoute,
    #[error("second hop has no viable route")]
    SecondHopNoRoute,
    #[error("bridge route cannot be priced")]
    BridgeUnavailable,
    #[error("gas price unknown")]
    GasUnknown,
    #[error("net profit below threshold")]
    Unprofitable,
    #[error("gas price above ceiling")]
    GasAboveCeiling,
    #[error("router unavailable for {0}")]
    RouterUnavailable(DexId),
}

/// Terminal state of one evaluation.
#[derive(Debug)]
pub enum Evaluation {
    Emitted(ExecutionSignal),
    Skipped(SkipReason),
}

impl Evaluation {
    pub fn emitted(&self) -> bool {
        matches!(self, Evaluation::Emitted(_))
    }
}

#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Candidate loan sizes walked in order; first profitable size wins.
    pub trade_sizes_usd: Vec<u64>,
    pub min_profit_usd: Decimal,
    pub max_gas_gwei: f64,
    pub max_slippage_bps: u32,
    /// Gas units assumed per full trade for cost conversion.
    pub gas_units_per_trade: u64,
    pub call_timeout: Duration,
}

pub struct OpportunityEvaluator {
    registry: Arc<ChainRegistry>,
    inventory: Arc<HashMap<u64, Vec<Token>>>,
    gate: LiquidityGate,
    profit: ProfitEngine,
    prices: Arc<dyn PriceOracle>,
    bridge: Arc<dyn BridgeQuoteProvider>,
    advisor: Arc<dyn ParameterAdvisor>,
    sink: Arc<dyn SignalSink>,
    cfg: EvaluatorConfig,
}

impl OpportunityEvaluator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<ChainRegistry>,
        inventory: Arc<HashMap<u64, Vec<Token>>>,
        gate: LiquidityGate,
        profit: ProfitEngine,
        prices: Arc<dyn PriceOracle>,
        bridge: Arc<dyn BridgeQuoteProvider>,
        advisor: Arc<dyn ParameterAdvisor>,
        sink: Arc<dyn SignalSink>,
        cfg: EvaluatorConfig,
    ) -> Self {
        Self {
            registry,
            inventory,
            gate,
            profit,
            prices,
            bridge,
            advisor,
            sink,
            cfg,
        }
    }

    /// Run one candidate through every checkpoint. `gas` is the cycle's
    /// gas snapshot in gwei, keyed by chain.
    ///
    /// `Err` marks a programmer error or a sink failure; market
    /// conditions always come back as `Skipped`.
    pub async fn evaluate(
        &self,
        opp: &Opportunity,
        gas: &HashMap<u64, f64>,
    ) -> Result<Evaluation> {
        if opp.src_chain == opp.dst_chain {
            bail!(
                "same-chain opportunity reached the evaluator: chain {} token {}",
                opp.src_chain,
                opp.token
            );
        }
        if self.cfg.trade_sizes_usd.is_empty() {
            bail!("trade size ladder is empty");
        }

        let Some(chain) = self.registry.get(opp.src_chain) else {
            return Ok(self.skip(opp, SkipReason::UnknownChain(opp.src_chain)));
        };

        // The two-hop simulation pivots through a deep bridge asset.
        let pivot_symbol = if opp.token == "WETH" { "USDC" } else { "WETH" };
        let Some(pivot) = tokens::find(&self.inventory, opp.src_chain, pivot_symbol) else {
            return Ok(self.skip(opp, SkipReason::NoPivotAsset(opp.src_chain)));
        };

        let gwei = gas.get(&opp.src_chain).copied().unwrap_or(0.0);
        let one_token = U256::from(10u64).pow(U256::from(opp.decimals));
        let mut last_skip = SkipReason::Unprofitable;
        let mut candidate: Option<(U256, Decimal, Decimal)> = None;

        for &size_usd in &self.cfg.trade_sizes_usd {
            // Checkpoint 1: liquidity sizing.
            let sizing = self
                .gate
                .size_loan(
                    opp.src_chain,
                    opp.src_address,
                    chain.flash_loan_vault,
                    U256::from(size_usd) * one_token,
                    opp.decimals,
                )
                .await?;
            if let Some(reason) = sizing.reason {
                last_skip = SkipReason::Sizing(reason);
                continue;
            }
            let loan = sizing.approved;

            // Checkpoint 2: simulate both hops; a zero quote means no
            // viable route at this size.
            let pivot_out = self
                .quote(opp.src_chain, opp.route.0, opp.src_address, pivot.address, loan)
                .await;
            if pivot_out.is_zero() {
                last_skip = SkipReason::FirstHopNoRoute;
                continue;
            }
            let token_out = self
                .quote(opp.src_chain, opp.route.1, pivot.address, opp.src_address, pivot_out)
                .await;
            if token_out.is_zero() {
                last_skip = SkipReason::SecondHopNoRoute;
                continue;
            }

            // Checkpoint 3: profitability, all costs included. An
            // unpriceable bridge or unknown gas kills the whole
            // candidate, not just this size.
            let Some(bridge_quote) = self.bridge_quote(opp, loan).await else {
                return Ok(self.skip(opp, SkipReason::BridgeUnavailable));
            };
            if gwei <= 0.0 {
                return Ok(self.skip(opp, SkipReason::GasUnknown));
            }

            let Some(loan_usd) = raw_to_units(loan, opp.decimals) else {
                last_skip = SkipReason::Unprofitable;
                continue;
            };
            let Some(output_usd) = raw_to_units(token_out, opp.decimals) else {
                last_skip = SkipReason::Unprofitable;
                continue;
            };
            let gas_cost = gas_cost_usd(gwei, self.cfg.gas_units_per_trade, chain.native_price_usd);
            let verdict = self
                .profit
                .evaluate(loan_usd, output_usd, bridge_quote.fee_usd, gas_cost);

            if verdict.is_profitable && verdict.net_profit >= self.cfg.min_profit_usd {
                candidate = Some((loan, verdict.net_profit, verdict.total_costs));
                break;
            }
            last_skip = SkipReason::Unprofitable;
        }

        let Some((loan, net_profit, total_costs)) = candidate else {
            return Ok(self.skip(opp, last_skip));
        };

        // Checkpoint 4: gas ceiling.
        if gwei > self.cfg.max_gas_gwei {
            return Ok(self.skip(opp, SkipReason::GasAboveCeiling));
        }

        // Checkpoint 5: risk parameters, clamped to hard limits.
        let advised = self
            .advisor
            .recommend(opp.src_chain, VolatilityLevel::Medium, gwei);
        let risk_params = SignalRiskParams {
            slippage_bps: advised.slippage_bps.min(self.cfg.max_slippage_bps),
            priority_fee_gwei: advised.priority_fee_gwei.min(self.cfg.max_gas_gwei / 2.0),
        };

        // Checkpoint 6: payload assembly from registry state.
        let mut routers = Vec::with_capacity(2);
        let mut protocols = Vec::with_capacity(2);
        let mut extras = Vec::with_capacity(2);
        for dex in [opp.route.0, opp.route.1] {
            let Some(router) = chain.router(dex).filter(|r| !r.is_zero()) else {
                return Ok(self.skip(opp, SkipReason::RouterUnavailable(dex)));
            };
            routers.push(router);
            protocols.push(dex.protocol_code());
            extras.push(if dex.is_v3() {
                encode_fee_extra(500)
            } else {
                "0x".to_string()
            });
        }

        let signal = ExecutionSignal {
            chain_id: opp.src_chain,
            token: opp.src_address,
            token_symbol: opp.token.clone(),
            amount: loan.to_string(),
            protocols,
            routers,
            path: vec![pivot.address, opp.src_address],
            extras,
            risk_params,
            metrics: SignalMetrics {
                profit_usd: net_profit,
                fees_usd: total_costs,
                gas_price_gwei: gwei,
            },
            timestamp: chrono::Utc::now(),
        };

        // Checkpoint 7: emit exactly once. A sink failure is systemic.
        self.sink.emit(&signal).await?;
        info!(
            token = %opp.token,
            src = opp.src_chain,
            dst = opp.dst_chain,
            profit = %net_profit,
            "signal emitted"
        );
        Ok(Evaluation::Emitted(signal))
    }

    fn skip(&self, opp: &Opportunity, reason: SkipReason) -> Evaluation {
        debug!(
            token = %opp.token,
            src = opp.src_chain,
            dst = opp.dst_chain,
            %reason,
            "candidate skipped"
        );
        Evaluation::Skipped(reason)
    }

    /// Timeout-wrapped quote; transport failures collapse to zero, same
    /// as an unpriceable hop.
    async fn quote(
        &self,
        chain_id: u64,
        dex: DexId,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> U256 {
        match timeout(
            self.cfg.call_timeout,
            self.prices.quote(chain_id, dex, token_in, token_out, amount_in),
        )
        .await
        {
            Ok(Ok(out)) => out,
            Ok(Err(e)) => {
                debug!(chain = chain_id, %dex, "quote failed: {e}");
                U256::ZERO
            }
            Err(_) => {
                debug!(chain = chain_id, %dex, "quote timed out");
                U256::ZERO
            }
        }
    }

    async fn bridge_quote(&self, opp: &Opportunity, amount: U256) -> Option<BridgeQuote> {
        match timeout(
            self.cfg.call_timeout,
            self.bridge
                .estimate(opp.src_chain, opp.dst_chain, &opp.token, amount),
        )
        .await
        {
            Ok(Ok(quote)) => quote,
            Ok(Err(e)) => {
                debug!(src = opp.src_chain, dst = opp.dst_chain, "bridge quote failed: {e}");
                None
            }
            Err(_) => None,
        }
    }
}

/// `gwei * units * native_usd / 1e9`.
fn gas_cost_usd(gwei: f64, gas_units: u64, native_price_usd: f64) -> Decimal {
    let gwei = Decimal::from_f64_retain(gwei).unwrap_or_default();
    let native = Decimal::from_f64_retain(native_price_usd).unwrap_or_default();
    gwei * Decimal::from(gas_units) * native / Decimal::from(1_000_000_000u64)
}

/// Raw token amount to whole-unit `Decimal`. `None` when the amount
/// overflows the decimal range.
fn raw_to_units(raw: U256, decimals: u8) -> Option<Decimal> {
    let v: i128 = raw.try_into().ok()?;
    Decimal::try_from_i128_with_scale(v, decimals as u32).ok()
}

/// V3 hops carry their fee tier as an ABI-encoded uint24 word.
fn encode_fee_extra(fee: u32) -> String {
    format!("0x{}", hex::encode(U256::from(fee).to_be_bytes::<32>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{LiquidityOracle, RiskParams};
    use crate::registry::ChainRegistry;
    use crate::signals::MemorySink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLiquidity(U256);

    #[async_trait]
    impl LiquidityOracle for FixedLiquidity {
        async fn vault_balance(&self, _: u64, _: Address, _: Address) -> Result<U256> {
            Ok(self.0)
        }
    }

    /// Quotes keyed by input token, ignoring size.
    struct TableQuotes(HashMap<Address, U256>);

    #[async_trait]
    impl PriceOracle for TableQuotes {
        async fn quote(
            &self,
            _: u64,
            _: DexId,
            token_in: Address,
            _: Address,
            _: U256,
        ) -> Result<U256> {
            Ok(self.0.get(&token_in).copied().unwrap_or(U256::ZERO))
        }
    }

    struct FixedBridge(Option<BridgeQuote>);

    #[async_trait]
    impl BridgeQuoteProvider for FixedBridge {
        async fn estimate(&self, _: u64, _: u64, _: &str, _: U256) -> Result<Option<BridgeQuote>> {
            Ok(self.0)
        }
    }

    /// Deliberately reckless advisor; the evaluator must clamp it.
    #[derive(Default)]
    struct GreedyAdvisor {
        calls: AtomicUsize,
    }

    impl ParameterAdvisor for GreedyAdvisor {
        fn recommend(&self, _: u64, _: VolatilityLevel, _: f64) -> RiskParams {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RiskParams {
                slippage_bps: 500,
                priority_fee_gwei: 80.0,
            }
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn one_e18(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u8))
    }

    struct Fixture {
        evaluator: OpportunityEvaluator,
        advisor: Arc<GreedyAdvisor>,
        sink: Arc<MemorySink>,
        opp: Opportunity,
        weth: Address,
        dai: Address,
    }

    /// Polygon DAI -> mainnet, UniV3 then Quickswap, deep vault. The
    /// quote table makes the trade return `output_dai` for a 1000 DAI
    /// loan.
    fn fixture(output_dai: u64, bridge: Option<BridgeQuote>) -> Fixture {
        let registry = Arc::new(ChainRegistry::bootstrap());
        let inventory = Arc::new(tokens::inventory());
        let weth = tokens::find(&inventory, 137, "WETH").unwrap().address;
        let dai = tokens::find(&inventory, 137, "DAI").unwrap().address;

        let gate = LiquidityGate::new(
            Arc::new(FixedLiquidity(one_e18(1_000_000))),
            2000,
            500,
            Duration::from_secs(5),
        );
        let quotes = TableQuotes(HashMap::from([
            // DAI in -> half a WETH out, WETH in -> final DAI out.
            (dai, one_e18(1) / U256::from(2u64)),
            (weth, one_e18(output_dai)),
        ]));
        let advisor = Arc::new(GreedyAdvisor::default());
        let sink = Arc::new(MemorySink::new());

        let evaluator = OpportunityEvaluator::new(
            registry,
            inventory,
            gate,
            ProfitEngine::new(Decimal::ZERO),
            Arc::new(quotes),
            Arc::new(FixedBridge(bridge)),
            advisor.clone(),
            sink.clone(),
            EvaluatorConfig {
                trade_sizes_usd: vec![1000],
                min_profit_usd: dec("1.5"),
                max_gas_gwei: 100.0,
                max_slippage_bps: 100,
                gas_units_per_trade: 300_000,
                call_timeout: Duration::from_secs(5),
            },
        );

        let opp = Opportunity {
            src_chain: 137,
            dst_chain: 1,
            token: "DAI".to_string(),
            src_address: dai,
            dst_address: Address::repeat_byte(9),
            decimals: 18,
            route: (DexId::UniswapV3, DexId::Quickswap),
        };

        Fixture {
            evaluator,
            advisor,
            sink,
            opp,
            weth,
            dai,
        }
    }

    fn bridge_fee(fee: &str) -> Option<BridgeQuote> {
        Some(BridgeQuote {
            fee_usd: dec(fee),
            eta_minutes: 5,
        })
    }

    #[tokio::test]
    async fn profitable_candidate_emits_a_clamped_signal() {
        let f = fixture(1015, bridge_fee("2"));
        let gas = HashMap::from([(137u64, 30.0)]);

        let result = f.evaluator.evaluate(&f.opp, &gas).await.unwrap();
        assert!(result.emitted());

        let signals = f.sink.signals();
        assert_eq!(signals.len(), 1);
        let signal = &signals[0];

        assert_eq!(signal.chain_id, 137);
        assert_eq!(signal.token, f.dai);
        assert_eq!(signal.amount, "1000000000000000000000");
        assert_eq!(signal.protocols, vec![1, 0]);
        assert_eq!(signal.path, vec![f.weth, f.dai]);
        assert_eq!(signal.extras[0], encode_fee_extra(500));
        assert_eq!(signal.extras[1], "0x");
        // Advisor wanted 500 bps and 80 gwei; hard limits win.
        assert_eq!(signal.risk_params.slippage_bps, 100);
        assert_eq!(signal.risk_params.priority_fee_gwei, 50.0);
        // 1015 - 1000 - 2 - (30 * 300k * 0.5 / 1e9)
        assert_eq!(signal.metrics.profit_usd, dec("12.9955"));
    }

    #[tokio::test]
    async fn unprofitable_candidate_stops_before_risk_params() {
        // Output barely above the loan, eaten by the bridge fee.
        let f = fixture(1001, bridge_fee("2"));
        let gas = HashMap::from([(137u64, 30.0)]);

        let result = f.evaluator.evaluate(&f.opp, &gas).await.unwrap();
        assert!(matches!(
            result,
            Evaluation::Skipped(SkipReason::Unprofitable)
        ));
        assert_eq!(f.advisor.calls.load(Ordering::SeqCst), 0);
        assert!(f.sink.signals().is_empty());
    }

    #[tokio::test]
    async fn unpriceable_bridge_skips() {
        let f = fixture(1015, None);
        let gas = HashMap::from([(137u64, 30.0)]);
        let result = f.evaluator.evaluate(&f.opp, &gas).await.unwrap();
        assert!(matches!(
            result,
            Evaluation::Skipped(SkipReason::BridgeUnavailable)
        ));
        assert!(f.sink.signals().is_empty());
    }

    #[tokio::test]
    async fn missing_gas_sample_skips() {
        let f = fixture(1015, bridge_fee("2"));
        let result = f.evaluator.evaluate(&f.opp, &HashMap::new()).await.unwrap();
        assert!(matches!(result, Evaluation::Skipped(SkipReason::GasUnknown)));
    }

    #[tokio::test]
    async fn zero_sentinel_counts_as_unknown() {
        let f = fixture(1015, bridge_fee("2"));
        let gas = HashMap::from([(137u64, 0.0)]);
        let result = f.evaluator.evaluate(&f.opp, &gas).await.unwrap();
        assert!(matches!(result, Evaluation::Skipped(SkipReason::GasUnknown)));
    }

    #[tokio::test]
    async fn gas_above_ceiling_skips_after_profit_check() {
        // Profitable enough to survive the expensive gas, then refused
        // at the ceiling.
        let f = fixture(1200, bridge_fee("2"));
        let gas = HashMap::from([(137u64, 150.0)]);
        let result = f.evaluator.evaluate(&f.opp, &gas).await.unwrap();
        assert!(matches!(
            result,
            Evaluation::Skipped(SkipReason::GasAboveCeiling)
        ));
        assert!(f.sink.signals().is_empty());
    }

    #[tokio::test]
    async fn same_chain_opportunity_is_a_programmer_error() {
        let f = fixture(1015, bridge_fee("2"));
        let mut opp = f.opp.clone();
        opp.dst_chain = opp.src_chain;
        let gas = HashMap::from([(137u64, 30.0)]);
        assert!(f.evaluator.evaluate(&opp, &gas).await.is_err());
    }

    #[test]
    fn fee_extra_is_a_32_byte_word() {
        let extra = encode_fee_extra(500);
        assert_eq!(extra.len(), 2 + 64);
        assert!(extra.ends_with("01f4"));
    }

    #[test]
    fn gas_cost_conversion() {
        // 30 gwei * 300k units on a 0.5 USD native token.
        assert_eq!(gas_cost_usd(30.0, 300_000, 0.5), dec("0.0045"));
    }
}
