//! Market regime classification from volatility and range statistics.

use quantdesk_core::{config::RegimeConfig, Bar, Bias, Regime, RegimeType};

/// Regime classifier.
///
/// Fully recomputed each call; its only state is the output the caller
/// chooses to retain when history is too thin.
pub struct RegimeClassifier {
    cfg: RegimeConfig,
}

impl RegimeClassifier {
    /// Create a new classifier.
    pub fn new(cfg: RegimeConfig) -> Self {
        Self { cfg }
    }

    /// Classify the current regime, or `None` below the minimum history.
    ///
    /// Thresholds: a volatility percentile at or above
    /// `high_vol_percentile` reads directional when the net move over the
    /// range window covers at least `persistence_ratio` of that window's
    /// high-low range (Trending), and noisy otherwise (HighVolatility); a
    /// percentile at or below `low_vol_percentile` reads MeanReverting;
    /// the band between stays Uncertain.
    pub fn classify(&self, bars: &[Bar]) -> Option<Regime> {
        if bars.len() < self.cfg.min_bars {
            return None;
        }

        let atr = self.atr_at(bars, bars.len() - 1);
        let volatility_percentile = self.volatility_percentile(bars, atr);

        let range_window = &bars[bars.len() - self.cfg.range_window..];
        let hi = range_window
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let lo = range_window
            .iter()
            .map(|b| b.low)
            .fold(f64::INFINITY, f64::min);
        let range_size = hi - lo;

        let net = range_window[range_window.len() - 1].close - range_window[0].close;
        let persistent = range_size > 0.0 && net.abs() / range_size >= self.cfg.persistence_ratio;
        let direction = if net > 0.0 {
            Bias::Bull
        } else if net < 0.0 {
            Bias::Bear
        } else {
            Bias::Neutral
        };

        let (regime_type, trend_direction) = if volatility_percentile >= self.cfg.high_vol_percentile
        {
            if persistent {
                (RegimeType::Trending, direction)
            } else {
                (RegimeType::HighVolatility, Bias::Neutral)
            }
        } else if volatility_percentile <= self.cfg.low_vol_percentile {
            (RegimeType::MeanReverting, Bias::Neutral)
        } else {
            (RegimeType::Uncertain, Bias::Neutral)
        };

        Some(Regime {
            regime_type,
            trend_direction,
            atr,
            range_size,
            volatility_percentile,
        })
    }

    /// Average true range ending at `end` (inclusive).
    fn atr_at(&self, bars: &[Bar], end: usize) -> f64 {
        let period = self.cfg.atr_period.min(end);
        if period == 0 {
            return bars[end].high - bars[end].low;
        }
        let start = end + 1 - period;
        let sum: f64 = (start..=end)
            .map(|i| bars[i].true_range(bars[i - 1].close))
            .sum();
        sum / period as f64
    }

    /// Midrank percentile of the current ATR within its own recent history.
    ///
    /// Midrank keeps a flat-volatility series at 50 instead of pinning it to
    /// 100, so constant-range tape does not read as a volatility spike.
    fn volatility_percentile(&self, bars: &[Bar], current: f64) -> f64 {
        let first = bars
            .len()
            .saturating_sub(self.cfg.percentile_window)
            .max(self.cfg.atr_period);
        let mut below = 0usize;
        let mut equal = 0usize;
        let mut count = 0usize;
        for end in first..bars.len() {
            let atr = self.atr_at(bars, end);
            if atr < current {
                below += 1;
            } else if (atr - current).abs() < 1e-12 {
                equal += 1;
            }
            count += 1;
        }
        if count == 0 {
            return 50.0;
        }
        100.0 * (below as f64 + 0.5 * equal as f64) / count as f64
    }
}
