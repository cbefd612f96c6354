//! Static Parameter Advisor
//!
//! Table-driven replacement for a learned policy: execution parameters
//! keyed by gas level (low / normal / high at 20 and 50 gwei) with a
//! volatility bump. Deterministic, so evaluation stays reproducible.

use super::{ParameterAdvisor, RiskParams, VolatilityLevel};

const GAS_LOW_THRESHOLD: f64 = 20.0;
const GAS_NORMAL_THRESHOLD: f64 = 50.0;

#[derive(Debug, Default)]
pub struct StaticParameterAdvisor;

impl StaticParameterAdvisor {
    pub fn new() -> Self {
        Self
    }
}

impl ParameterAdvisor for StaticParameterAdvisor {
    fn recommend(&self, _chain_id: u64, volatility: VolatilityLevel, gas_gwei: f64) -> RiskParams {
        let (mut slippage_bps, priority_fee_gwei) = if gas_gwei < GAS_LOW_THRESHOLD {
            (30, 20.0)
        } else if gas_gwei < GAS_NORMAL_THRESHOLD {
            (50, 30.0)
        } else {
            (80, 50.0)
        };

        // Choppier markets need more room to fill.
        if volatility == VolatilityLevel::High {
            slippage_bps += 20;
        }

        RiskParams {
            slippage_bps,
            priority_fee_gwei,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_buckets() {
        let advisor = StaticParameterAdvisor::new();
        let low = advisor.recommend(137, VolatilityLevel::Medium, 10.0);
        let normal = advisor.recommend(137, VolatilityLevel::Medium, 30.0);
        let high = advisor.recommend(137, VolatilityLevel::Medium, 90.0);

        assert!(low.slippage_bps < normal.slippage_bps);
        assert!(normal.slippage_bps < high.slippage_bps);
        assert!(low.priority_fee_gwei < high.priority_fee_gwei);
    }

    #[test]
    fn high_volatility_widens_slippage() {
        let advisor = StaticParameterAdvisor::new();
        let calm = advisor.recommend(1, VolatilityLevel::Medium, 30.0);
        let choppy = advisor.recommend(1, VolatilityLevel::High, 30.0);
        assert_eq!(choppy.slippage_bps, calm.slippage_bps + 20);
    }
}
