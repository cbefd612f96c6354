//! Profit Engine
//!
//! The one place the money equation lives. Pure `Decimal` arithmetic
//! (28 significant digits), no IO, no floats: two calls with the same
//! inputs give identical verdicts.

use rust_decimal::Decimal;

/// Itemized result of a profitability check. `net_profit` can be
/// negative; `is_profitable` is strictly `net_profit > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitVerdict {
    pub gross_revenue: Decimal,
    pub total_costs: Decimal,
    pub net_profit: Decimal,
    pub is_profitable: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ProfitEngine {
    /// Flash-loan premium as a fraction of the loan (0 for Balancer-style
    /// vaults).
    flash_fee_rate: Decimal,
}

impl ProfitEngine {
    pub fn new(flash_fee_rate: Decimal) -> Self {
        Self { flash_fee_rate }
    }

    /// All amounts in USD. `simulated_output` is the full proceeds of
    /// the simulated trade, loan included.
    pub fn evaluate(
        &self,
        loan: Decimal,
        simulated_output: Decimal,
        bridge_fee: Decimal,
        gas_cost: Decimal,
    ) -> ProfitVerdict {
        let flash_fee = loan * self.flash_fee_rate;
        let total_costs = bridge_fee + gas_cost + flash_fee;
        let net_profit = simulated_output - loan - total_costs;

        ProfitVerdict {
            gross_revenue: simulated_output,
            total_costs,
            net_profit,
            is_profitable: net_profit > Decimal::ZERO,
        }
    }
}
