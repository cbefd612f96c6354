//! Execution Signals
//!
//! The decision layer's only output: a JSON artifact describing a trade
//! worth taking, dropped into an outbox directory for whatever executes
//! it. Emission is append-only; the sink never mutates a written file.

use alloy_primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalRiskParams {
    pub slippage_bps: u32,
    pub priority_fee_gwei: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalMetrics {
    pub profit_usd: Decimal,
    pub fees_usd: Decimal,
    pub gas_price_gwei: f64,
}

/// One executable trade. `amount` is the approved loan in raw token
/// units, as a decimal string so downstream parsers never touch floats.
/// `protocols[i]` / `routers[i]` / `extras[i]` describe hop i; `path` is
/// the token sequence the hops traverse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSignal {
    pub chain_id: u64,
    pub token: Address,
    pub token_symbol: String,
    pub amount: String,
    pub protocols: Vec<u8>,
    pub routers: Vec<Address>,
    pub path: Vec<Address>,
    pub extras: Vec<String>,
    pub risk_params: SignalRiskParams,
    pub metrics: SignalMetrics,
    pub timestamp: DateTime<Utc>,
}

/// Where finished signals go. Implementations must tolerate concurrent
/// appends from evaluation workers.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn emit(&self, signal: &ExecutionSignal) -> Result<()>;
}

// ============================================
// DIRECTORY SINK
// ============================================

/// One JSON file per signal in an outbox directory, pruned to the most
/// recent `retention` files.
pub struct DirectorySink {
    dir: PathBuf,
    retention: usize,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>, retention: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("creating signal outbox {}", dir.display()))?;
        Ok(Self { dir, retention })
    }

    fn prune(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension().is_some_and(|ext| ext == "json")
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("signal_"))
            })
            .collect();

        if files.len() <= self.retention {
            return;
        }

        // Epoch-millisecond filenames sort chronologically.
        files.sort();
        let excess = files.len() - self.retention;
        for stale in &files[..excess] {
            if let Err(e) = fs::remove_file(stale) {
                warn!(file = %stale.display(), "failed to prune stale signal: {e}");
            }
        }
    }
}

#[async_trait]
impl SignalSink for DirectorySink {
    async fn emit(&self, signal: &ExecutionSignal) -> Result<()> {
        let filename = format!(
            "signal_{}_{}.json",
            signal.timestamp.timestamp_millis(),
            signal.token_symbol
        );
        let path = self.dir.join(filename);

        let body = serde_json::to_string_pretty(signal)?;
        let mut file = fs::File::create(&path)
            .wrap_err_with(|| format!("creating {}", path.display()))?;
        file.write_all(body.as_bytes())?;
        // The executor may pick the file up the moment it appears.
        file.sync_all()?;

        debug!(file = %path.display(), "signal written");
        self.prune();
        Ok(())
    }
}

/// In-memory sink for tests.
#[cfg(test)]
pub struct MemorySink(pub std::sync::Mutex<Vec<ExecutionSignal>>);

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self(std::sync::Mutex::new(Vec::new()))
    }

    pub fn signals(&self) -> Vec<ExecutionSignal> {
        self.0.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl SignalSink for MemorySink {
    async fn emit(&self, signal: &ExecutionSignal) -> Result<()> {
        self.0.lock().unwrap().push(signal.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn sample_signal(ts_millis: i64, symbol: &str) -> ExecutionSignal {
        ExecutionSignal {
            chain_id: 137,
            token: address!("8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063"),
            token_symbol: symbol.to_string(),
            amount: "1000000000000000000000".to_string(),
            protocols: vec![1, 0],
            routers: vec![
                address!("E592427A0AEce92De3Edee1F18E0157C05861564"),
                address!("a5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff"),
            ],
            path: vec![
                address!("7ceB23fD6bC0adD59E62ac25578270cFf1b9f619"),
                address!("8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063"),
            ],
            extras: vec!["0x00000000000000000000000000000000000000000000000000000000000001f4".into(), "0x".into()],
            risk_params: SignalRiskParams {
                slippage_bps: 100,
                priority_fee_gwei: 30.0,
            },
            metrics: SignalMetrics {
                profit_usd: Decimal::from_str_exact("12.99").unwrap(),
                fees_usd: Decimal::from_str_exact("2.00").unwrap(),
                gas_price_gwei: 30.0,
            },
            timestamp: DateTime::from_timestamp_millis(ts_millis).unwrap(),
        }
    }

    #[test]
    fn json_shape_is_camel_case() {
        let json = serde_json::to_value(sample_signal(1_700_000_000_000, "DAI")).unwrap();
        assert!(json.get("chainId").is_some());
        assert!(json.get("tokenSymbol").is_some());
        assert!(json["riskParams"].get("slippageBps").is_some());
        assert!(json["riskParams"].get("priorityFeeGwei").is_some());
        assert!(json["metrics"].get("profitUsd").is_some());
        // Amount travels as a string.
        assert!(json["amount"].is_string());
    }

    #[test]
    fn round_trips_through_json() {
        let signal = sample_signal(1_700_000_000_000, "DAI");
        let json = serde_json::to_string(&signal).unwrap();
        let back: ExecutionSignal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signal);
    }

    #[tokio::test]
    async fn directory_sink_writes_and_prunes() {
        let dir = std::env::temp_dir().join(format!("omniarb-sink-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let sink = DirectorySink::new(&dir, 3).unwrap();

        for i in 0..5 {
            sink.emit(&sample_signal(1_700_000_000_000 + i, "DAI")).await.unwrap();
        }

        let mut files: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();

        assert_eq!(files.len(), 3, "retention should keep newest 3");
        assert!(files[0].contains("1700000000002"), "oldest kept: {files:?}");
        assert!(files[2].contains("1700000000004"));

        let _ = fs::remove_dir_all(&dir);
    }
}
