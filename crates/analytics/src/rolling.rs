//! Rolling statistics over the close series.
//!
//! Every statistic is computed from a finite trailing window and degrades to
//! a neutral default on thin history; this engine feeds a live display and
//! must never block the pipeline with an error.

use quantdesk_core::{config::StatsConfig, Bar, RollingStats, ZScoreBands};
use statrs::statistics::Statistics;

/// Rolling statistics calculator.
///
/// Stateless apart from its configuration: both entry points are pure
/// functions of the bar slice (plus, for the fast path, the previous
/// snapshot whose slow fields are carried forward).
pub struct StatsEngine {
    cfg: StatsConfig,
}

impl StatsEngine {
    /// Create a new statistics engine.
    pub fn new(cfg: StatsConfig) -> Self {
        Self { cfg }
    }

    /// Full recompute, run on bar close.
    pub fn compute_full(&self, bars: &[Bar]) -> RollingStats {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let rsi = rsi(&closes, self.cfg.rsi_period);
        let (skewness, kurtosis) = moments(&closes, self.cfg.moment_window);
        let flow_imbalance = flow_imbalance(bars, self.cfg.flow_window);

        RollingStats {
            z_score: z_score(&closes, self.cfg.zscore_window),
            skewness,
            kurtosis,
            rsi,
            toxicity: toxicity(bars, self.cfg.flow_window),
            flow_imbalance,
            bayes_posterior: bayes_posterior(rsi, flow_imbalance),
        }
    }

    /// Mid-bar recompute: only the cheap per-tick statistics.
    ///
    /// Skewness, kurtosis, and RSI are carried from the last bar close so
    /// the open-bar update path stays O(window) over small windows.
    pub fn compute_fast(&self, bars: &[Bar], prev: &RollingStats) -> RollingStats {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let flow_imbalance = flow_imbalance(bars, self.cfg.flow_window);

        RollingStats {
            z_score: z_score(&closes, self.cfg.zscore_window),
            skewness: prev.skewness,
            kurtosis: prev.kurtosis,
            rsi: prev.rsi,
            toxicity: toxicity(bars, self.cfg.flow_window),
            flow_imbalance,
            bayes_posterior: bayes_posterior(prev.rsi, flow_imbalance),
        }
    }

    /// Band price levels around the z-score window mean.
    pub fn bands(&self, bars: &[Bar]) -> Option<ZScoreBands> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        z_score_bands(&closes, self.cfg.zscore_window)
    }
}

/// Z-score of the last close against the trailing window (sample stdev).
///
/// Returns 0 when the window is degenerate (fewer than two closes, or zero
/// variance) so downstream classification never sees a non-finite value.
pub fn z_score(closes: &[f64], window: usize) -> f64 {
    let tail = trailing(closes, window);
    if tail.len() < 2 {
        return 0.0;
    }
    let mean = tail.mean();
    let sd = tail.std_dev();
    if !sd.is_finite() || sd == 0.0 {
        return 0.0;
    }
    (tail[tail.len() - 1] - mean) / sd
}

/// Standardized third moment and excess kurtosis over the trailing window.
///
/// Population moments; both report 0 when the window variance is 0.
pub fn moments(closes: &[f64], window: usize) -> (f64, f64) {
    let tail = trailing(closes, window);
    let n = tail.len();
    if n < 3 {
        return (0.0, 0.0);
    }
    let n_f = n as f64;
    let mean = tail.mean();
    let m2: f64 = tail.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n_f;
    if m2 == 0.0 {
        return (0.0, 0.0);
    }
    let m3: f64 = tail.iter().map(|x| (x - mean).powi(3)).sum::<f64>() / n_f;
    let m4: f64 = tail.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / n_f;
    let skew = m3 / m2.powf(1.5);
    let kurt = m4 / (m2 * m2) - 3.0;
    (skew, kurt)
}

/// Relative strength index over closes.
///
/// With fewer than `period + 1` closes the averages run over however many
/// close-to-close changes exist; fewer than two closes returns neutral 50.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if closes.len() < 2 || period == 0 {
        return 50.0;
    }
    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let used = &changes[changes.len().saturating_sub(period)..];
    let n = used.len() as f64;

    let avg_gain: f64 = used.iter().filter(|&&c| c > 0.0).sum::<f64>() / n;
    let avg_loss: f64 = -used.iter().filter(|&&c| c < 0.0).sum::<f64>() / n;

    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// VPIN-like toxicity proxy: mean of |delta| / volume over the trailing
/// window, scaled to 0-100. Zero-volume bars contribute 0.
pub fn toxicity(bars: &[Bar], window: usize) -> f64 {
    let tail = &bars[bars.len().saturating_sub(window)..];
    if tail.is_empty() {
        return 0.0;
    }
    let sum: f64 = tail
        .iter()
        .map(|b| {
            if b.volume > 0.0 {
                b.delta.abs() / b.volume
            } else {
                0.0
            }
        })
        .sum();
    (sum / tail.len() as f64 * 100.0).clamp(0.0, 100.0)
}

/// Net signed volume over total volume across the trailing window, -100..100.
pub fn flow_imbalance(bars: &[Bar], window: usize) -> f64 {
    let tail = &bars[bars.len().saturating_sub(window)..];
    let total: f64 = tail.iter().map(|b| b.volume).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let net: f64 = tail.iter().map(|b| b.delta).sum();
    (net / total * 100.0).clamp(-100.0, 100.0)
}

/// One-step Bayesian update for the probability of bullish continuation.
///
/// The final division is kept in its full posterior form even though it
/// reduces to the likelihood under the flat prior: consumers depend on this
/// exact numeric path (clamping order included), not the simplified
/// equivalent.
pub fn bayes_posterior(rsi: f64, flow_imbalance: f64) -> f64 {
    let base = if rsi > 55.0 {
        0.65
    } else if rsi < 45.0 {
        0.35
    } else {
        0.50
    };
    let nudge = (flow_imbalance / 100.0).clamp(-0.1, 0.1);
    let l = (base + nudge).clamp(0.05, 0.95);
    l / (l + (1.0 - l))
}

/// Band levels at one and two sample standard deviations around the window
/// SMA. Unlike the other statistics this requires a full window: band
/// overlays on thin history would be misleading, so `None` is returned
/// instead of a degraded value.
pub fn z_score_bands(closes: &[f64], window: usize) -> Option<ZScoreBands> {
    if window < 2 || closes.len() < window {
        return None;
    }
    let tail = trailing(closes, window);
    let sma = tail.mean();
    let std_dev = tail.std_dev();
    if !std_dev.is_finite() {
        return None;
    }
    Some(ZScoreBands {
        sma,
        std_dev,
        upper_1: sma + std_dev,
        lower_1: sma - std_dev,
        upper_2: sma + 2.0 * std_dev,
        lower_2: sma - 2.0 * std_dev,
    })
}

fn trailing(closes: &[f64], window: usize) -> &[f64] {
    &closes[closes.len().saturating_sub(window)..]
}
