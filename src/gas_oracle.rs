//! Gas Monitor
//!
//! Per-chain gas price sampling in gwei. Endpoints are tried in registry
//! order with a per-call timeout; when every endpoint fails the sample
//! is the 0 sentinel ("unknown"), which downstream treats as unsafe to
//! trade on. Readings above the configured ceiling are clamped, never
//! discarded.

use alloy_provider::{Provider, ProviderBuilder};
use eyre::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use crate::registry::ChainRegistry;

pub struct GasMonitor {
    registry: Arc<ChainRegistry>,
    max_gas_gwei: f64,
    call_timeout: Duration,
}

impl GasMonitor {
    pub fn new(registry: Arc<ChainRegistry>, max_gas_gwei: f64, call_timeout: Duration) -> Self {
        Self {
            registry,
            max_gas_gwei,
            call_timeout,
        }
    }

    /// Sample one chain. Never fails: exhausted endpoints yield the 0
    /// sentinel.
    pub async fn sample(&self, chain_id: u64) -> f64 {
        let Some(chain) = self.registry.get(chain_id) else {
            warn!(chain = chain_id, "gas sample requested for unknown chain");
            return 0.0;
        };

        for url in &chain.rpc_endpoints {
            match timeout(self.call_timeout, fetch_gas_gwei(url)).await {
                Ok(Ok(gwei)) => return apply_ceiling(gwei, self.max_gas_gwei),
                Ok(Err(e)) => {
                    debug!(chain = chain_id, url = %url, "gas endpoint failed: {e}");
                }
                Err(_) => {
                    debug!(chain = chain_id, url = %url, "gas endpoint timed out");
                }
            }
        }

        warn!(chain = chain_id, "all gas endpoints failed, sampling 0");
        0.0
    }

    /// Fan out over all chains with a batch deadline. Chains that miss
    /// the deadline are simply absent from the snapshot.
    pub async fn sample_all(
        self: &Arc<Self>,
        chains: &[u64],
        batch_timeout: Duration,
    ) -> HashMap<u64, f64> {
        let deadline = Instant::now() + batch_timeout;
        let mut set = JoinSet::new();
        for &chain_id in chains {
            let monitor = Arc::clone(self);
            set.spawn(async move { (chain_id, monitor.sample(chain_id).await) });
        }

        let mut snapshot = HashMap::new();
        loop {
            match timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((chain_id, gwei)))) => {
                    snapshot.insert(chain_id, gwei);
                }
                Ok(Some(Err(e))) => warn!("gas sampling task failed: {e}"),
                Ok(None) => break,
                Err(_) => {
                    warn!(pending = set.len(), "gas batch deadline hit, abandoning stragglers");
                    set.abort_all();
                    break;
                }
            }
        }
        snapshot
    }
}

async fn fetch_gas_gwei(url: &str) -> Result<f64> {
    let provider = ProviderBuilder::new().connect_http(url.parse()?);
    let wei = provider.get_gas_price().await?;
    Ok(wei as f64 / 1e9)
}

/// Clamp a reading to the ceiling; a capped-but-present sample is more
/// useful than a hole in the snapshot.
fn apply_ceiling(gwei: f64, max_gwei: f64) -> f64 {
    if !gwei.is_finite() || gwei < 0.0 {
        return 0.0;
    }
    if gwei > max_gwei {
        warn!(gwei, max_gwei, "gas reading above ceiling, clamping");
        max_gwei
    } else {
        gwei
    }
}
