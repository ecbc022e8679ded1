//! Price-by-volume profile.
//!
//! Buckets the full visible price range and spreads each bar's volume
//! evenly across every bucket its high-low span touches, then classifies
//! buckets against the point of control.

use ordered_float::OrderedFloat;
use quantdesk_core::{config::ProfileConfig, Bar, BucketKind, VolumeBucket};
use tracing::warn;

/// Volume profile builder.
pub struct VolumeProfileBuilder {
    cfg: ProfileConfig,
}

impl VolumeProfileBuilder {
    /// Create a new builder.
    pub fn new(cfg: ProfileConfig) -> Self {
        Self { cfg }
    }

    /// Build the profile over all bars, ordered highest price first.
    ///
    /// `steps` of 0 falls back to the configured default. An empty history
    /// yields an empty profile; a zero price range collapses to a single
    /// all-volume bucket.
    pub fn build(&self, bars: &[Bar], steps: usize) -> Vec<VolumeBucket> {
        if bars.is_empty() {
            return Vec::new();
        }
        let steps = if steps == 0 {
            self.cfg.default_steps
        } else {
            steps
        };

        let min_price = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let max_price = bars
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let range = max_price - min_price;

        if range <= 0.0 {
            warn!(price = min_price, "degenerate price range in volume profile");
            let total: f64 = bars.iter().map(|b| b.volume).sum();
            return vec![VolumeBucket {
                price_low: min_price,
                price_high: max_price,
                volume: total,
                classification: BucketKind::Poc,
            }];
        }

        let width = range / steps as f64;
        let mut volumes = vec![0.0_f64; steps];

        for bar in bars {
            let lo = self.bucket_index(bar.low, min_price, width, steps);
            let hi = self.bucket_index(bar.high, min_price, width, steps);
            let share = bar.volume / (hi - lo + 1) as f64;
            for v in &mut volumes[lo..=hi] {
                *v += share;
            }
        }

        let poc_volume = volumes.iter().copied().map(OrderedFloat).max();
        let poc_volume = match poc_volume {
            Some(v) => v.0,
            None => return Vec::new(),
        };
        let nonzero: Vec<f64> = volumes.iter().copied().filter(|&v| v > 0.0).collect();
        let mean_nonzero = if nonzero.is_empty() {
            0.0
        } else {
            nonzero.iter().sum::<f64>() / nonzero.len() as f64
        };

        let mut poc_assigned = false;
        let mut out: Vec<VolumeBucket> = volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| {
                let classification = if !poc_assigned && volume == poc_volume {
                    poc_assigned = true;
                    BucketKind::Poc
                } else if volume > self.cfg.hvn_fraction * poc_volume {
                    BucketKind::Hvn
                } else if volume < self.cfg.lvn_fraction * mean_nonzero {
                    BucketKind::Lvn
                } else {
                    BucketKind::Normal
                };
                VolumeBucket {
                    price_low: min_price + i as f64 * width,
                    price_high: min_price + (i + 1) as f64 * width,
                    volume,
                    classification,
                }
            })
            .collect();

        out.reverse();
        out
    }

    fn bucket_index(&self, price: f64, min_price: f64, width: f64, steps: usize) -> usize {
        (((price - min_price) / width) as usize).min(steps - 1)
    }
}
