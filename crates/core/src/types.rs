//! Core data types for the QuantDesk signal engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp in seconds since Unix epoch (UTC). Bar granularity.
pub type TimestampSec = i64;

/// Timestamp in milliseconds since Unix epoch (UTC). Tick granularity.
pub type TimestampMs = i64;

/// Convert a millisecond tick timestamp to a bar timestamp (seconds).
#[inline]
pub fn ms_to_bar_time(ts_ms: TimestampMs) -> TimestampSec {
    ts_ms.div_euclid(1000)
}

/// A kline tick from the feed: the current state of the open bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    /// Timestamp in milliseconds.
    pub ts_ms: TimestampMs,
    /// Open price of the bar this tick belongs to.
    pub open: f64,
    /// Running high.
    pub high: f64,
    /// Running low.
    pub low: f64,
    /// Latest traded price.
    pub close: f64,
    /// Running volume for the bar.
    pub volume: f64,
}

/// An OHLCV bar with per-bar order-flow fields.
///
/// `time` values are strictly increasing once a bar is finalized; only the
/// last bar in a sequence may still be mutated while it is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    /// Bar timestamp in seconds.
    pub time: TimestampSec,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Total volume.
    pub volume: f64,
    /// Signed net aggressor volume for this bar.
    pub delta: f64,
    /// Cumulative volume delta up to and including this bar.
    pub cvd: f64,
}

impl Bar {
    /// Check OHLC relationships and numeric sanity.
    pub fn is_valid(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite();
        finite
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
    }

    /// True range against the previous close.
    #[inline]
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Aggressor side of a liquidity sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Wick above a swing high (buy-side stops taken).
    Buy,
    /// Wick below a swing low (sell-side stops taken).
    Sell,
}

/// Direction of a structural event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

/// Coarse directional bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Bias {
    Bull,
    Bear,
    #[default]
    Neutral,
}

impl Bias {
    /// Get the sign: +1 for bull, -1 for bear, 0 for neutral.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Bias::Bull => 1,
            Bias::Bear => -1,
            Bias::Neutral => 0,
        }
    }
}

/// A stop-sweep: price wicked through a swing extreme without closing beyond it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sweep {
    /// Swing price that was swept.
    pub price: f64,
    /// Side of the liquidity taken.
    pub side: Side,
    /// Timestamp of the sweeping bar.
    pub bar_time: TimestampSec,
}

/// A break of structure: a close beyond a prior swing extreme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureBreak {
    /// Swing price that was broken.
    pub price: f64,
    /// Break direction.
    pub direction: Direction,
    /// Timestamp of the breaking bar.
    pub bar_time: TimestampSec,
}

/// A fair value gap: a three-bar price imbalance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairValueGap {
    /// Lower boundary of the gap.
    pub start_price: f64,
    /// Upper boundary of the gap.
    pub end_price: f64,
    /// Gap direction.
    pub direction: Direction,
    /// Whether the current last close has filled the gap.
    pub resolved: bool,
    /// Timestamp of the bar that created the gap.
    pub bar_time: TimestampSec,
}

/// Liquidity structure snapshot, replaced wholesale on each detection pass.
///
/// Each list keeps at most the 8 most recently detected events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiquiditySnapshot {
    pub sweeps: Vec<Sweep>,
    pub breaks: Vec<StructureBreak>,
    pub gaps: Vec<FairValueGap>,
}

impl LiquiditySnapshot {
    /// Whether any retained sweep took liquidity on the given side.
    pub fn has_sweep(&self, side: Side) -> bool {
        self.sweeps.iter().any(|s| s.side == side)
    }
}

/// Directional bias for a single timeframe horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeBias {
    /// Coarse bias label.
    pub bias: Bias,
    /// The last closes (at most 20) the bias was computed from.
    pub sparkline: Vec<f64>,
    /// When this bias was last recomputed.
    pub last_updated: DateTime<Utc>,
}

impl TimeframeBias {
    /// A neutral bias with no history behind it.
    pub fn neutral() -> Self {
        Self {
            bias: Bias::Neutral,
            sparkline: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

/// Bias across the four fixed horizons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasMatrix {
    /// Daily-equivalent horizon (1440 minutes).
    pub daily: TimeframeBias,
    /// 4-hour horizon (240 minutes).
    pub h4: TimeframeBias,
    /// 1-hour horizon (60 minutes).
    pub h1: TimeframeBias,
    /// Short scalp horizon (~5 bars).
    pub scalp: TimeframeBias,
}

impl BiasMatrix {
    /// The three structural horizons the scenario scorer weighs.
    pub fn structural(&self) -> [&TimeframeBias; 3] {
        [&self.daily, &self.h4, &self.h1]
    }
}

/// Market regime label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegimeType {
    Trending,
    MeanReverting,
    HighVolatility,
    #[default]
    Uncertain,
}

/// Market regime, recomputed wholesale each refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regime {
    /// Regime label.
    pub regime_type: RegimeType,
    /// Trend direction when the regime is directional, neutral otherwise.
    pub trend_direction: Bias,
    /// Average true range.
    pub atr: f64,
    /// Recent high-low range size.
    pub range_size: f64,
    /// Percentile rank of current volatility vs its own recent history (0-100).
    pub volatility_percentile: f64,
}

/// Rolling statistics over the close series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingStats {
    /// Z-score of the last close against the 20-close window.
    pub z_score: f64,
    /// Standardized third moment over the 50-close window.
    pub skewness: f64,
    /// Excess kurtosis over the 50-close window.
    pub kurtosis: f64,
    /// RSI(14) over closes.
    pub rsi: f64,
    /// VPIN-like toxicity proxy, 0-100.
    pub toxicity: f64,
    /// Net signed volume over total volume across the stats window, -100..100.
    pub flow_imbalance: f64,
    /// Posterior probability of bullish continuation.
    pub bayes_posterior: f64,
}

impl Default for RollingStats {
    fn default() -> Self {
        Self {
            z_score: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
            rsi: 50.0,
            toxicity: 0.0,
            flow_imbalance: 0.0,
            bayes_posterior: 0.5,
        }
    }
}

/// Price levels at one and two standard deviations around the rolling mean.
///
/// Unlike the other rolling statistics these are absolute price levels, not
/// normalized values; chart overlays consume them directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZScoreBands {
    /// Simple moving average of the window closes.
    pub sma: f64,
    /// Sample standard deviation of the window closes.
    pub std_dev: f64,
    /// `sma + std_dev`.
    pub upper_1: f64,
    /// `sma - std_dev`.
    pub lower_1: f64,
    /// `sma + 2 * std_dev`.
    pub upper_2: f64,
    /// `sma - 2 * std_dev`.
    pub lower_2: f64,
}

/// Inputs that drove a scenario score, surfaced for display and alerting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    /// Number of structural horizons aligned with the winning side.
    pub bias_alignment: u32,
    /// Whether an opposing-side sweep supported the winning side.
    pub liquidity_agreement: bool,
    /// Whether a trending regime supported the winning side.
    pub regime_agreement: bool,
    /// Externally supplied AI score, passed through unweighted.
    pub ai_score: f64,
}

/// Composite probabilistic trade scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacticalScenario {
    /// Probability of the scenario, 0-95.
    pub probability: u8,
    /// Scenario direction.
    pub scenario: Bias,
    /// Suggested entry level (current price).
    pub entry_level: f64,
    /// Suggested stop level.
    pub stop_level: f64,
    /// Suggested target level.
    pub exit_level: f64,
    /// The inputs that drove the score.
    pub confidence: ConfidenceFactors,
}

/// Volume-profile bucket classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketKind {
    /// Point of control: the maximum-volume bucket.
    Poc,
    /// High-volume node.
    Hvn,
    /// Low-volume node.
    Lvn,
    Normal,
}

/// One bucket of the price-by-volume profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeBucket {
    /// Lower price edge.
    pub price_low: f64,
    /// Upper price edge.
    pub price_high: f64,
    /// Accumulated volume.
    pub volume: f64,
    /// Bucket classification.
    pub classification: BucketKind,
}
