//! Scan Scheduler
//!
//! Drives the decision loop: sample gas, gate on the trend forecaster,
//! discover candidates, evaluate them with a bounded worker pool, then
//! sleep. A circuit breaker watches for consecutive systemic failures
//! and backs the scan interval off instead of hammering dead
//! infrastructure.

use eyre::Result;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::brain::evaluator::{Evaluation, OpportunityEvaluator};
use crate::gas_oracle::GasMonitor;
use crate::graph::{AssetGraph, Opportunity};
use crate::oracle::GasTrendForecaster;
use crate::registry::ChainRegistry;
use crate::tokens::{self, Token, TokenTier};

// ============================================
// CIRCUIT BREAKER
// ============================================

/// Backs the scan interval off under sustained systemic failure.
/// Owned and mutated by the scheduler only.
#[derive(Debug)]
pub struct CircuitBreaker {
    consecutive_failures: u32,
    scan_interval: Duration,
    baseline_interval: Duration,
    max_interval: Duration,
    max_failures: u32,
}

impl CircuitBreaker {
    pub fn new(baseline: Duration, max_interval: Duration, max_failures: u32) -> Self {
        Self {
            consecutive_failures: 0,
            scan_interval: baseline,
            baseline_interval: baseline,
            max_interval,
            max_failures,
        }
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    /// A signal made it out; the pipeline is healthy end to end.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.scan_interval = self.baseline_interval;
    }

    pub fn tripped(&self) -> bool {
        self.consecutive_failures >= self.max_failures
    }

    /// Double the interval up to the cap, reset the counter, and return
    /// the cooldown to sleep before the next attempt.
    pub fn degrade(&mut self) -> Duration {
        self.scan_interval = (self.scan_interval * 2).min(self.max_interval);
        self.consecutive_failures = 0;
        self.scan_interval
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    pub fn failures(&self) -> u32 {
        self.consecutive_failures
    }
}

// ============================================
// SCHEDULER
// ============================================

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub active_chains: Vec<u64>,
    /// Chain whose gas sample feeds the trend forecaster.
    pub representative_chain: u64,
    pub worker_pool_size: usize,
    pub gas_batch_timeout: Duration,
    pub eval_batch_timeout: Duration,
    /// Sleep when the forecaster gates a cycle.
    pub gate_wait: Duration,
    /// Long-tail tokens sampled per eligible cycle.
    pub tier3_sample_size: usize,
}

/// What one cycle amounted to, from the breaker's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// At least one signal emitted.
    Signals(usize),
    /// Nothing found or nothing profitable. Normal.
    Quiet,
    /// Forecaster gated the cycle.
    Unfavorable,
    /// Infrastructure-level failure; counts against the breaker.
    Systemic(&'static str),
}

pub struct ScanScheduler {
    registry: Arc<ChainRegistry>,
    graph: Arc<AssetGraph>,
    inventory: Arc<HashMap<u64, Vec<Token>>>,
    evaluator: Arc<OpportunityEvaluator>,
    gas: Arc<GasMonitor>,
    forecaster: Box<dyn GasTrendForecaster>,
    breaker: CircuitBreaker,
    cfg: SchedulerConfig,
    cycle_count: u64,
}

impl ScanScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<ChainRegistry>,
        graph: Arc<AssetGraph>,
        inventory: Arc<HashMap<u64, Vec<Token>>>,
        evaluator: Arc<OpportunityEvaluator>,
        gas: Arc<GasMonitor>,
        forecaster: Box<dyn GasTrendForecaster>,
        breaker: CircuitBreaker,
        cfg: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            graph,
            inventory,
            evaluator,
            gas,
            forecaster,
            breaker,
            cfg,
            cycle_count: 0,
        }
    }

    /// Run until ctrl-c. Shutdown lands between cycles; in-flight
    /// workers within a cycle run to their batch deadline.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            chains = self.cfg.active_chains.len(),
            workers = self.cfg.worker_pool_size,
            "scan loop engaged"
        );

        loop {
            let outcome = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    break;
                }
                outcome = self.scan_once() => outcome,
            };

            match outcome {
                CycleOutcome::Signals(_) => self.breaker.record_success(),
                CycleOutcome::Systemic(why) => {
                    warn!(
                        reason = why,
                        failures = self.breaker.failures() + 1,
                        "systemic cycle failure"
                    );
                    self.breaker.record_failure();
                }
                CycleOutcome::Quiet | CycleOutcome::Unfavorable => {}
            }

            let pause = if self.breaker.tripped() {
                let cooldown = self.breaker.degrade();
                warn!(
                    interval_secs = cooldown.as_secs(),
                    "circuit breaker tripped, degrading scan interval"
                );
                cooldown
            } else if outcome == CycleOutcome::Unfavorable {
                self.cfg.gate_wait
            } else {
                self.breaker.scan_interval()
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    break;
                }
                _ = sleep(pause) => {}
            }
        }
        Ok(())
    }

    /// One full cycle: gas, gate, discover, evaluate.
    pub async fn scan_once(&mut self) -> CycleOutcome {
        self.cycle_count += 1;

        // SAMPLING_GAS
        let gas_map = self
            .gas
            .sample_all(&self.cfg.active_chains, self.cfg.gas_batch_timeout)
            .await;
        if gas_map.is_empty() {
            return CycleOutcome::Systemic("gas snapshot empty");
        }

        // GATING
        if let Some(&gwei) = gas_map.get(&self.cfg.representative_chain) {
            if gwei > 0.0 {
                self.forecaster.ingest(gwei);
                if self.forecaster.should_wait() {
                    debug!(gwei, "forecaster gating this cycle");
                    return CycleOutcome::Unfavorable;
                }
            }
        }

        // DISCOVERING
        if self.graph.edge_count() == 0 {
            return CycleOutcome::Systemic("asset graph has no bridge edges");
        }
        let opportunities = self.discover();
        if opportunities.is_empty() {
            return CycleOutcome::Quiet;
        }
        let found = opportunities.len();

        // EVALUATING
        let gas_map = Arc::new(gas_map);
        let semaphore = Arc::new(Semaphore::new(self.cfg.worker_pool_size));
        let mut set = JoinSet::new();
        for opp in opportunities {
            let evaluator = Arc::clone(&self.evaluator);
            let gas_map = Arc::clone(&gas_map);
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                evaluator.evaluate(&opp, &gas_map).await
            });
        }

        let deadline = Instant::now() + self.cfg.eval_batch_timeout;
        let mut emitted = 0usize;
        let mut skipped = 0usize;
        let mut errored = 0usize;
        let mut finished = 0usize;
        loop {
            match timeout_at(deadline, set.join_next()).await {
                Ok(Some(result)) => {
                    finished += 1;
                    match result {
                        Ok(Ok(Evaluation::Emitted(_))) => emitted += 1,
                        Ok(Ok(Evaluation::Skipped(_))) => skipped += 1,
                        Ok(Err(e)) => {
                            warn!("evaluation failed: {e}");
                            errored += 1;
                        }
                        Err(e) => {
                            warn!("evaluation task panicked or was cancelled: {e}");
                            errored += 1;
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        pending = set.len(),
                        "evaluation deadline hit, abandoning stragglers"
                    );
                    set.abort_all();
                    break;
                }
            }
        }

        // COOLDOWN bookkeeping
        info!(
            cycle = self.cycle_count,
            found,
            finished,
            emitted,
            skipped,
            errored,
            breaker_failures = self.breaker.failures(),
            "cycle complete"
        );

        if emitted > 0 {
            CycleOutcome::Signals(emitted)
        } else if finished > 0 && errored == finished {
            CycleOutcome::Systemic("every evaluation errored")
        } else {
            CycleOutcome::Quiet
        }
    }

    /// Pull candidates from the graph, filtered by tier cadence: core
    /// tokens every cycle, majors every second, long tail sampled every
    /// fifth.
    fn discover(&self) -> Vec<Opportunity> {
        let mut due: Vec<Opportunity> = Vec::new();
        let mut long_tail: Vec<Opportunity> = Vec::new();

        for opp in self.graph.opportunities(&self.registry) {
            match tokens::tier_of(&self.inventory, &opp.token) {
                TokenTier::Core => due.push(opp),
                TokenTier::Major => {
                    if tier_due(TokenTier::Major, self.cycle_count) {
                        due.push(opp);
                    }
                }
                TokenTier::LongTail => {
                    if tier_due(TokenTier::LongTail, self.cycle_count) {
                        long_tail.push(opp);
                    }
                }
            }
        }

        if !long_tail.is_empty() {
            let mut rng = rand::thread_rng();
            due.extend(
                long_tail
                    .choose_multiple(&mut rng, self.cfg.tier3_sample_size)
                    .cloned(),
            );
        }
        due
    }
}

/// Whether a tier is scanned on a given cycle.
fn tier_due(tier: TokenTier, cycle: u64) -> bool {
    match tier {
        TokenTier::Core => true,
        TokenTier::Major => cycle % 2 == 0,
        TokenTier::LongTail => cycle % 5 == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(Duration::from_secs(5), Duration::from_secs(30), 10)
    }

    #[test]
    fn breaker_trips_at_the_threshold() {
        let mut b = breaker();
        for _ in 0..9 {
            b.record_failure();
        }
        assert!(!b.tripped());
        b.record_failure();
        assert!(b.tripped());
    }

    #[test]
    fn degrade_doubles_resets_and_caps() {
        let mut b = breaker();
        for _ in 0..10 {
            b.record_failure();
        }

        let cooldown = b.degrade();
        // Strictly above baseline after a trip.
        assert!(cooldown > Duration::from_secs(5));
        assert_eq!(cooldown, Duration::from_secs(10));
        assert_eq!(b.failures(), 0);

        assert_eq!(b.degrade(), Duration::from_secs(20));
        assert_eq!(b.degrade(), Duration::from_secs(30));
        // Capped.
        assert_eq!(b.degrade(), Duration::from_secs(30));
    }

    #[test]
    fn success_resets_interval_and_counter() {
        let mut b = breaker();
        for _ in 0..10 {
            b.record_failure();
        }
        b.degrade();
        b.record_failure();

        b.record_success();
        assert_eq!(b.failures(), 0);
        assert_eq!(b.scan_interval(), Duration::from_secs(5));
    }

    #[test]
    fn skips_do_not_count_against_the_breaker() {
        // Quiet cycles leave the counter where it was; the run loop
        // only records failures for Systemic outcomes.
        let mut b = breaker();
        b.record_failure();
        let before = b.failures();
        // run() matches Quiet/Unfavorable to a no-op.
        assert_eq!(b.failures(), before);
        assert!(!b.tripped());
    }

    #[test]
    fn tier_cadence() {
        assert!(tier_due(TokenTier::Core, 1));
        assert!(tier_due(TokenTier::Core, 7));

        assert!(!tier_due(TokenTier::Major, 1));
        assert!(tier_due(TokenTier::Major, 2));
        assert!(tier_due(TokenTier::Major, 4));

        assert!(!tier_due(TokenTier::LongTail, 4));
        assert!(tier_due(TokenTier::LongTail, 5));
        assert!(tier_due(TokenTier::LongTail, 10));
    }
}
