//! Multi-timeframe directional bias.
//!
//! Re-samples the close series into four fixed horizons and computes a
//! coarse bias per horizon; recomputed wholesale after a seed, after every
//! completed bar, and on the slow-cadence refresh.

use crate::rolling;
use chrono::Utc;
use quantdesk_core::{config::BiasConfig, Bar, Bias, BiasMatrix, TimeframeBias};
use statrs::statistics::Statistics;

/// Bias matrix builder.
pub struct BiasMatrixBuilder {
    cfg: BiasConfig,
}

impl BiasMatrixBuilder {
    /// Create a new builder.
    pub fn new(cfg: BiasConfig) -> Self {
        Self { cfg }
    }

    /// Compute the bias for all four horizons.
    ///
    /// `bar_interval_minutes` converts horizon minutes to bar counts; each
    /// horizon keeps a floor so thin history never produces a degenerate
    /// window.
    pub fn compute(&self, bars: &[Bar], bar_interval_minutes: u32) -> BiasMatrix {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let interval = bar_interval_minutes.max(1) as usize;

        let horizon = |idx: usize| -> TimeframeBias {
            let minutes = self.cfg.horizon_minutes[idx] as usize;
            let floor = self.cfg.horizon_floors[idx];
            let window = (minutes / interval).max(floor);
            self.horizon_bias(&closes, window)
        };

        BiasMatrix {
            daily: horizon(0),
            h4: horizon(1),
            h1: horizon(2),
            scalp: horizon(3),
        }
    }

    /// Bias over a single window of closes.
    fn horizon_bias(&self, closes: &[f64], window: usize) -> TimeframeBias {
        let tail = &closes[closes.len().saturating_sub(window)..];
        if tail.is_empty() {
            return TimeframeBias::neutral();
        }

        let last = tail[tail.len() - 1];
        let mean = tail.mean();
        let rsi = rolling::rsi(tail, self.cfg.rsi_period);

        let bias = if last > mean && rsi > self.cfg.rsi_bull {
            Bias::Bull
        } else if last < mean && rsi < self.cfg.rsi_bear {
            Bias::Bear
        } else {
            Bias::Neutral
        };

        let spark_start = tail.len().saturating_sub(self.cfg.sparkline_len);
        TimeframeBias {
            bias,
            sparkline: tail[spark_start..].to_vec(),
            last_updated: Utc::now(),
        }
    }
}
