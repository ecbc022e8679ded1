//! Configuration structures for the signal engine.

use serde::{Deserialize, Serialize};

/// Main configuration for the signal engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Instrument configuration.
    pub instrument: InstrumentConfig,
    /// Rolling statistics configuration.
    pub stats: StatsConfig,
    /// Liquidity structure detection configuration.
    pub liquidity: LiquidityConfig,
    /// Regime classification configuration.
    pub regime: RegimeConfig,
    /// Multi-timeframe bias configuration.
    pub bias: BiasConfig,
    /// Tactical scenario scoring configuration.
    pub scenario: ScenarioConfig,
    /// Volume profile configuration.
    pub profile: ProfileConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instrument: InstrumentConfig::default(),
            stats: StatsConfig::default(),
            liquidity: LiquidityConfig::default(),
            regime: RegimeConfig::default(),
            bias: BiasConfig::default(),
            scenario: ScenarioConfig::default(),
            profile: ProfileConfig::default(),
        }
    }
}

/// Instrument-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Trading symbol (e.g., "BTCUSDT").
    pub symbol: String,
    /// Feed bar interval in minutes.
    pub bar_interval_minutes: u32,
    /// Maximum bars retained in the store.
    pub max_history_bars: usize,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            bar_interval_minutes: 1,
            max_history_bars: 500,
        }
    }
}

/// Rolling statistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Z-score window over closes.
    pub zscore_window: usize,
    /// Skewness/kurtosis window over closes.
    pub moment_window: usize,
    /// RSI period.
    pub rsi_period: usize,
    /// Toxicity and flow-imbalance window over bars.
    pub flow_window: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            zscore_window: 20,
            moment_window: 50,
            rsi_period: 14,
            flow_window: 20,
        }
    }
}

/// Liquidity structure detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityConfig {
    /// Trailing bars scanned for fair value gaps.
    pub gap_scan_bars: usize,
    /// Bars of context required on each side of a swing point.
    pub swing_strength: usize,
    /// Most recent swing highs/lows evaluated for breaks and sweeps.
    pub max_tracked_swings: usize,
    /// Most recent events retained per category.
    pub max_events: usize,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            gap_scan_bars: 60,
            swing_strength: 5,
            max_tracked_swings: 5,
            max_events: 8,
        }
    }
}

/// Regime classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeConfig {
    /// Minimum bars before the classifier produces output.
    pub min_bars: usize,
    /// ATR period.
    pub atr_period: usize,
    /// Window for the high-low range and trend persistence.
    pub range_window: usize,
    /// Bar positions used to rank current volatility.
    pub percentile_window: usize,
    /// Volatility percentile at or above which the market is directional.
    pub high_vol_percentile: f64,
    /// Volatility percentile at or below which the market is range-bound.
    pub low_vol_percentile: f64,
    /// Minimum |net move| / range for directional persistence.
    pub persistence_ratio: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            min_bars: 50,
            atr_period: 14,
            range_window: 20,
            percentile_window: 50,
            high_vol_percentile: 70.0,
            low_vol_percentile: 40.0,
            persistence_ratio: 0.5,
        }
    }
}

/// Multi-timeframe bias configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasConfig {
    /// Horizon lengths in minutes: daily, 4h, 1h, scalp.
    pub horizon_minutes: [u32; 4],
    /// Minimum bar-count window per horizon.
    pub horizon_floors: [usize; 4],
    /// RSI period within each horizon window.
    pub rsi_period: usize,
    /// Closes retained for the sparkline.
    pub sparkline_len: usize,
    /// RSI above which a horizon can read bullish.
    pub rsi_bull: f64,
    /// RSI below which a horizon can read bearish.
    pub rsi_bear: f64,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            horizon_minutes: [1440, 240, 60, 5],
            horizon_floors: [20, 14, 14, 5],
            rsi_period: 14,
            sparkline_len: 20,
            rsi_bull: 55.0,
            rsi_bear: 45.0,
        }
    }
}

/// Tactical scenario scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Weight per aligned structural horizon.
    pub bias_weight: u32,
    /// Weight for a matching trending regime.
    pub regime_weight: u32,
    /// Weight for flow imbalance beyond the gate.
    pub flow_weight: u32,
    /// Absolute flow imbalance required for the flow weight.
    pub flow_gate: f64,
    /// Weight for an opposing-side sweep.
    pub sweep_weight: u32,
    /// Probability ceiling.
    pub max_probability: u32,
    /// Stop distance in ATR multiples.
    pub stop_atr_mult: f64,
    /// Target distance in ATR multiples.
    pub target_atr_mult: f64,
    /// ATR fallback as a fraction of price when the regime ATR is unset.
    pub atr_fallback_pct: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            bias_weight: 10,
            regime_weight: 30,
            flow_weight: 20,
            flow_gate: 20.0,
            sweep_weight: 15,
            max_probability: 95,
            stop_atr_mult: 1.5,
            target_atr_mult: 3.0,
            atr_fallback_pct: 0.005,
        }
    }
}

/// Volume profile configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Default bucket count.
    pub default_steps: usize,
    /// Fraction of the POC volume above which a bucket is a high-volume node.
    pub hvn_fraction: f64,
    /// Fraction of the mean non-zero volume below which a bucket is a low-volume node.
    pub lvn_fraction: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            default_steps: 40,
            hvn_fraction: 0.6,
            lvn_fraction: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.stats.zscore_window, 20);
        assert_eq!(config.liquidity.max_events, 8);
        assert_eq!(config.bias.horizon_minutes, [1440, 240, 60, 5]);
        assert_eq!(config.scenario.max_probability, 95);
        assert_eq!(config.profile.default_steps, 40);
    }
}
