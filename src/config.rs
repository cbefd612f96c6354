//! Scanner Configuration
//!
//! Every tunable of the decision engine in one struct, loaded from the
//! environment once at startup. Defaults are safe to boot with; the
//! validator catches the combinations that are not.

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration for the scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // ========== Chains ==========
    /// Chain ids scanned each cycle.
    pub active_chains: Vec<u64>,

    /// Chain whose gas sample feeds the trend forecaster.
    pub representative_chain: u64,

    // ========== Loan Sizing ==========
    /// Maximum share of vault liquidity one loan may take, in basis
    /// points (2000 = 20%).
    pub max_tvl_share_bps: u32,

    /// Profitability floor in whole token units; loans below
    /// `floor * 10^decimals` are refused.
    pub min_notional_units: u64,

    /// Candidate loan sizes walked in order, in USD.
    pub trade_sizes_usd: Vec<u64>,

    // ========== Profit Thresholds ==========
    /// Minimum net profit in USD to emit a signal.
    pub min_profit_usd: f64,

    /// Flash-loan premium as a fraction of the loan.
    pub flash_fee_rate: f64,

    /// Gas units assumed per full trade for cost conversion.
    pub gas_units_per_trade: u64,

    // ========== Hard Limits ==========
    /// Gas ceiling in gwei; readings clamp here and pricier chains are
    /// skipped.
    pub max_gas_gwei: f64,

    /// Slippage ceiling in basis points; advisor output clamps here.
    pub max_slippage_bps: u32,

    // ========== Scheduling ==========
    /// Baseline pause between cycles, in seconds.
    pub scan_interval_secs: u64,

    /// Breaker cap for the degraded interval, in seconds.
    pub max_scan_interval_secs: u64,

    /// Systemic failures in a row before the breaker trips.
    pub max_consecutive_failures: u32,

    /// Concurrent evaluation workers.
    pub worker_pool_size: usize,

    /// Deadline for the gas sampling fan-out, in seconds.
    pub gas_batch_timeout_secs: u64,

    /// Deadline for the evaluation fan-out, in seconds.
    pub eval_batch_timeout_secs: u64,

    /// Per-collaborator-call timeout, in seconds.
    pub call_timeout_secs: u64,

    /// Long-tail tokens sampled per eligible cycle.
    pub tier3_sample_size: usize,

    // ========== Signals ==========
    /// Outbox directory for signal files.
    pub signals_dir: String,

    /// Newest signal files kept on disk.
    pub signal_retention: usize,
}

impl Config {
    /// Load from environment variables (after `dotenvy` has pulled in
    /// `.env`), falling back to defaults field by field.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            active_chains: env::var("ACTIVE_CHAINS")
                .map(|s| s.split(',').filter_map(|c| c.trim().parse().ok()).collect())
                .unwrap_or(defaults.active_chains),
            representative_chain: parse_env("REPRESENTATIVE_CHAIN", defaults.representative_chain),

            max_tvl_share_bps: parse_env("MAX_TVL_SHARE_BPS", defaults.max_tvl_share_bps),
            min_notional_units: parse_env("MIN_NOTIONAL_UNITS", defaults.min_notional_units),
            trade_sizes_usd: env::var("TRADE_SIZES_USD")
                .map(|s| s.split(',').filter_map(|c| c.trim().parse().ok()).collect())
                .unwrap_or(defaults.trade_sizes_usd),

            min_profit_usd: parse_env("MIN_PROFIT_USD", defaults.min_profit_usd),
            flash_fee_rate: parse_env("FLASH_FEE_RATE", defaults.flash_fee_rate),
            gas_units_per_trade: parse_env("GAS_UNITS_PER_TRADE", defaults.gas_units_per_trade),

            max_gas_gwei: parse_env("MAX_GAS_GWEI", defaults.max_gas_gwei),
            max_slippage_bps: parse_env("MAX_SLIPPAGE_BPS", defaults.max_slippage_bps),

            scan_interval_secs: parse_env("SCAN_INTERVAL_SECS", defaults.scan_interval_secs),
            max_scan_interval_secs: parse_env(
                "MAX_SCAN_INTERVAL_SECS",
                defaults.max_scan_interval_secs,
            ),
            max_consecutive_failures: parse_env(
                "MAX_CONSECUTIVE_FAILURES",
                defaults.max_consecutive_failures,
            ),
            worker_pool_size: parse_env("WORKER_POOL_SIZE", defaults.worker_pool_size),
            gas_batch_timeout_secs: parse_env(
                "GAS_BATCH_TIMEOUT_SECS",
                defaults.gas_batch_timeout_secs,
            ),
            eval_batch_timeout_secs: parse_env(
                "EVAL_BATCH_TIMEOUT_SECS",
                defaults.eval_batch_timeout_secs,
            ),
            call_timeout_secs: parse_env("CALL_TIMEOUT_SECS", defaults.call_timeout_secs),
            tier3_sample_size: parse_env("TIER3_SAMPLE_SIZE", defaults.tier3_sample_size),

            signals_dir: env::var("SIGNALS_DIR").unwrap_or(defaults.signals_dir),
            signal_retention: parse_env("SIGNAL_RETENTION", defaults.signal_retention),
        })
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Startup-fatal sanity checks.
    pub fn validate(&self) -> Result<()> {
        if self.active_chains.is_empty() {
            return Err(eyre::eyre!("ACTIVE_CHAINS must name at least one chain"));
        }
        if self.max_tvl_share_bps == 0 || self.max_tvl_share_bps > 10_000 {
            return Err(eyre::eyre!(
                "MAX_TVL_SHARE_BPS must be in 1..=10000 (currently {})",
                self.max_tvl_share_bps
            ));
        }
        if self.trade_sizes_usd.is_empty() {
            return Err(eyre::eyre!("TRADE_SIZES_USD must not be empty"));
        }
        if self.max_slippage_bps > 10_000 {
            return Err(eyre::eyre!(
                "MAX_SLIPPAGE_BPS above 10000 would allow total slippage"
            ));
        }
        if self.max_gas_gwei <= 0.0 {
            return Err(eyre::eyre!("MAX_GAS_GWEI must be positive"));
        }
        if self.worker_pool_size == 0 {
            return Err(eyre::eyre!("WORKER_POOL_SIZE must be at least 1"));
        }
        if self.scan_interval_secs > self.max_scan_interval_secs {
            return Err(eyre::eyre!(
                "SCAN_INTERVAL_SECS ({}) exceeds MAX_SCAN_INTERVAL_SECS ({})",
                self.scan_interval_secs,
                self.max_scan_interval_secs
            ));
        }
        if self.max_consecutive_failures == 0 {
            return Err(eyre::eyre!("MAX_CONSECUTIVE_FAILURES must be at least 1"));
        }
        if self.flash_fee_rate < 0.0 || self.flash_fee_rate >= 1.0 {
            return Err(eyre::eyre!(
                "FLASH_FEE_RATE must be in [0, 1) (currently {})",
                self.flash_fee_rate
            ));
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn max_scan_interval(&self) -> Duration {
        Duration::from_secs(self.max_scan_interval_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Print configuration summary.
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║               OMNIARB - CONFIGURATION                      ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Active Chains:     {:^40} ║", self.active_chains.len());
        println!("║ Rep. Chain:        {:^40} ║", self.representative_chain);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ LOAN SIZING                                                ║");
        println!("║ • TVL Share:       {:>37.1}% ║", self.max_tvl_share_bps as f64 / 100.0);
        println!("║ • Notional Floor:  {:>33} units ║", self.min_notional_units);
        println!("║ • Size Ladder:     {:^40} ║", format!("{:?} USD", self.trade_sizes_usd));
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ PROFIT & LIMITS                                            ║");
        println!("║ • Min Net Profit:  ${:<38.2} ║", self.min_profit_usd);
        println!("║ • Max Gas:         {:>35.0} gwei ║", self.max_gas_gwei);
        println!("║ • Max Slippage:    {:>36} bps ║", self.max_slippage_bps);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ SCHEDULING                                                 ║");
        println!("║ • Scan Interval:   {:>37}s ║", self.scan_interval_secs);
        println!("║ • Breaker Cap:     {:>37}s ║", self.max_scan_interval_secs);
        println!("║ • Breaker Trip:    {:>29} failures ║", self.max_consecutive_failures);
        println!("║ • Workers:         {:^40} ║", self.worker_pool_size);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ SIGNALS                                                    ║");
        println!("║ • Outbox:          {:^40} ║", self.signals_dir);
        println!("║ • Retention:       {:^40} ║", self.signal_retention);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_chains: vec![1, 137, 42161, 10, 8453, 56, 43114],
            representative_chain: 137,
            max_tvl_share_bps: 2000,
            min_notional_units: 500,
            trade_sizes_usd: vec![500, 1000, 2000, 5000],
            min_profit_usd: 1.5,
            flash_fee_rate: 0.0,
            gas_units_per_trade: 300_000,
            max_gas_gwei: 100.0,
            max_slippage_bps: 100,
            scan_interval_secs: 5,
            max_scan_interval_secs: 30,
            max_consecutive_failures: 10,
            worker_pool_size: 20,
            gas_batch_timeout_secs: 10,
            eval_batch_timeout_secs: 30,
            call_timeout_secs: 5,
            tier3_sample_size: 20,
            signals_dir: "signals/outgoing".to_string(),
            signal_retention: 100,
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
