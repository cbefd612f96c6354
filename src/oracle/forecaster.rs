//! Gas Trend Forecaster
//!
//! Least-squares slope over a sliding window of gas samples. The
//! scheduler waits out a fast drop rather than paying a price that will
//! be cheaper in a minute.

use std::collections::VecDeque;

use super::{GasTrend, GasTrendForecaster};

const DEFAULT_WINDOW: usize = 50;
/// Minimum samples before the slope means anything.
const MIN_SAMPLES: usize = 10;
/// Gwei-per-sample slope beyond which the trend counts as "fast".
const SLOPE_THRESHOLD: f64 = 0.5;

#[derive(Debug)]
pub struct SlopeForecaster {
    window: usize,
    samples: VecDeque<f64>,
}

impl Default for SlopeForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl SlopeForecaster {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(MIN_SAMPLES),
            samples: VecDeque::new(),
        }
    }

    fn slope(&self) -> f64 {
        let n = self.samples.len();
        if n < 2 {
            return 0.0;
        }

        let xs_mean = (n - 1) as f64 / 2.0;
        let ys_mean = self.samples.iter().sum::<f64>() / n as f64;

        let mut num = 0.0;
        let mut den = 0.0;
        for (i, y) in self.samples.iter().enumerate() {
            let dx = i as f64 - xs_mean;
            num += dx * (y - ys_mean);
            den += dx * dx;
        }

        if den == 0.0 {
            0.0
        } else {
            num / den
        }
    }
}

impl GasTrendForecaster for SlopeForecaster {
    fn ingest(&mut self, gwei: f64) {
        if !gwei.is_finite() || gwei <= 0.0 {
            return;
        }
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(gwei);
    }

    fn trend(&self) -> GasTrend {
        if self.samples.len() < MIN_SAMPLES {
            return GasTrend::Stable;
        }
        let slope = self.slope();
        if slope > SLOPE_THRESHOLD {
            GasTrend::RisingFast
        } else if slope < -SLOPE_THRESHOLD {
            GasTrend::DroppingFast
        } else {
            GasTrend::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_until_enough_samples() {
        let mut f = SlopeForecaster::default();
        for _ in 0..(MIN_SAMPLES - 1) {
            f.ingest(100.0);
        }
        assert_eq!(f.trend(), GasTrend::Stable);
        assert!(!f.should_wait());
    }

    #[test]
    fn detects_fast_drop_and_waits() {
        let mut f = SlopeForecaster::default();
        // 2 gwei per sample downhill.
        for i in 0..20 {
            f.ingest(100.0 - 2.0 * i as f64);
        }
        assert_eq!(f.trend(), GasTrend::DroppingFast);
        assert!(f.should_wait());
    }

    #[test]
    fn detects_fast_rise_without_waiting() {
        let mut f = SlopeForecaster::default();
        for i in 0..20 {
            f.ingest(10.0 + 2.0 * i as f64);
        }
        assert_eq!(f.trend(), GasTrend::RisingFast);
        assert!(!f.should_wait());
    }

    #[test]
    fn flat_series_is_stable() {
        let mut f = SlopeForecaster::default();
        for _ in 0..30 {
            f.ingest(42.0);
        }
        assert_eq!(f.trend(), GasTrend::Stable);
    }

    #[test]
    fn rejects_garbage_samples() {
        let mut f = SlopeForecaster::default();
        f.ingest(f64::NAN);
        f.ingest(-5.0);
        f.ingest(0.0);
        assert_eq!(f.samples.len(), 0);
    }

    #[test]
    fn window_evicts_oldest() {
        let mut f = SlopeForecaster::new(10);
        // Old steep drop falls out of the window; recent samples flat.
        for i in 0..10 {
            f.ingest(200.0 - 10.0 * i as f64);
        }
        for _ in 0..10 {
            f.ingest(50.0);
        }
        assert_eq!(f.trend(), GasTrend::Stable);
    }
}
