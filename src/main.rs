//! OmniArb - Multi-Chain Flash-Loan Arbitrage Scanner
//!
//! Run with: cargo run -- run
//!
//! Discovers cross-chain price dislocations on bridgeable assets, sizes
//! a flash loan against real vault depth, simulates the two-hop trade,
//! and drops executable signals into an outbox. Signing and execution
//! live elsewhere; this binary only decides.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use console::style;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod brain;
mod config;
mod gas_oracle;
mod graph;
mod oracle;
mod registry;
mod scheduler;
mod signals;
mod tokens;

use brain::evaluator::{EvaluatorConfig, OpportunityEvaluator};
use brain::profit::ProfitEngine;
use brain::sizing::LiquidityGate;
use config::Config;
use gas_oracle::GasMonitor;
use graph::AssetGraph;
use oracle::advisor::StaticParameterAdvisor;
use oracle::bridge::FlatFeeBridgeQuoter;
use oracle::forecaster::SlopeForecaster;
use oracle::rpc::{RpcLiquidityOracle, RpcPriceOracle};
use registry::ChainRegistry;
use rust_decimal::Decimal;
use scheduler::{CircuitBreaker, ScanScheduler, SchedulerConfig};
use signals::DirectorySink;

#[derive(Parser)]
#[command(name = "omniarb", about = "Multi-chain flash-loan arbitrage scanner")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scan loop until interrupted
    Run,
    /// Run a single scan cycle and exit
    ScanOnce,
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" 🌉 OMNIARB - Cross-Chain Flash-Loan Arbitrage Scanner").cyan().bold()
    );
    println!(
        "{}",
        style("    7 Chains | Bridge-Aware Discovery | Signal Outbox").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("omniarb=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    print_banner();

    // Load and validate configuration
    let config = Config::from_env()?;
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        error!("Please check your .env file");
        return Err(e);
    }
    config.print_summary();
    println!();

    // =============================================
    // PHASE 1: TOPOLOGY
    // =============================================
    println!("{}", style("═══ PHASE 1: TOPOLOGY ═══").blue().bold());
    println!();

    let registry = Arc::new(ChainRegistry::bootstrap());
    let inventory = Arc::new(tokens::inventory());

    let mut graph = AssetGraph::from_inventory(&inventory)?;
    let edges = graph.build_bridge_edges(&tokens::BRIDGE_ASSETS);
    println!(
        "{} Asset graph: {} nodes, {} bridge edges across {} chains",
        style("✓").green(),
        graph.node_count(),
        edges,
        registry.len()
    );
    let graph = Arc::new(graph);

    // =============================================
    // PHASE 2: COLLABORATORS
    // =============================================
    println!();
    println!("{}", style("═══ PHASE 2: COLLABORATORS ═══").blue().bold());
    println!();

    let call_timeout = config.call_timeout();
    let prices = Arc::new(RpcPriceOracle::new(Arc::clone(&registry), call_timeout));
    let liquidity = Arc::new(RpcLiquidityOracle::new(Arc::clone(&registry), call_timeout));
    let bridge = Arc::new(FlatFeeBridgeQuoter::with_defaults());
    let advisor = Arc::new(StaticParameterAdvisor::new());
    let sink = Arc::new(DirectorySink::new(
        &config.signals_dir,
        config.signal_retention,
    )?);
    println!(
        "{} Oracles online, signal outbox at {}",
        style("✓").green(),
        config.signals_dir
    );

    let gate = LiquidityGate::new(
        liquidity,
        config.max_tvl_share_bps,
        config.min_notional_units,
        call_timeout,
    );
    let profit = ProfitEngine::new(
        Decimal::try_from(config.flash_fee_rate).unwrap_or(Decimal::ZERO),
    );
    let evaluator = Arc::new(OpportunityEvaluator::new(
        Arc::clone(&registry),
        Arc::clone(&inventory),
        gate,
        profit,
        prices,
        bridge,
        advisor,
        sink,
        EvaluatorConfig {
            trade_sizes_usd: config.trade_sizes_usd.clone(),
            min_profit_usd: Decimal::try_from(config.min_profit_usd)
                .unwrap_or(Decimal::ONE),
            max_gas_gwei: config.max_gas_gwei,
            max_slippage_bps: config.max_slippage_bps,
            gas_units_per_trade: config.gas_units_per_trade,
            call_timeout,
        },
    ));

    let gas = Arc::new(GasMonitor::new(
        Arc::clone(&registry),
        config.max_gas_gwei,
        call_timeout,
    ));

    // =============================================
    // PHASE 3: THE SCAN LOOP
    // =============================================
    println!();
    println!("{}", style("═══ PHASE 3: THE SCAN LOOP ═══").blue().bold());
    println!();

    let breaker = CircuitBreaker::new(
        config.scan_interval(),
        config.max_scan_interval(),
        config.max_consecutive_failures,
    );
    let mut scheduler = ScanScheduler::new(
        registry,
        graph,
        inventory,
        evaluator,
        gas,
        Box::new(SlopeForecaster::default()),
        breaker,
        SchedulerConfig {
            active_chains: config.active_chains.clone(),
            representative_chain: config.representative_chain,
            worker_pool_size: config.worker_pool_size,
            gas_batch_timeout: std::time::Duration::from_secs(config.gas_batch_timeout_secs),
            eval_batch_timeout: std::time::Duration::from_secs(config.eval_batch_timeout_secs),
            gate_wait: config.scan_interval(),
            tier3_sample_size: config.tier3_sample_size,
        },
    );

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => scheduler.run().await?,
        Command::ScanOnce => {
            let outcome = scheduler.scan_once().await;
            println!("{} Cycle outcome: {:?}", style("✓").green(), outcome);
        }
    }

    println!();
    println!("{}", style("OmniArb stopped.").cyan());
    Ok(())
}
