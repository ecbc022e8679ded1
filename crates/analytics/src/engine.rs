//! The owning signal engine.
//!
//! Single-writer facade over the bar store and every derived computation.
//! Fast per-tick updates touch only the cheap rolling statistics; completed
//! bars and the slow-cadence refresh recompute the structural outputs.

use crate::{
    bias::BiasMatrixBuilder,
    liquidity::LiquidityDetector,
    profile::VolumeProfileBuilder,
    regime::RegimeClassifier,
    rolling::StatsEngine,
    scenario::{ScenarioInputs, ScenarioScorer},
};
use quantdesk_core::{
    config::EngineConfig, Bar, BiasMatrix, LiquiditySnapshot, Regime, Result, RollingStats,
    TacticalScenario, Tick, VolumeBucket, ZScoreBands,
};
use quantdesk_ingestion::{BarStore, TickOutcome};
use tracing::{debug, info};

/// Signal engine: bar storage plus all derived analytics for one instrument.
///
/// Derived outputs are replaced wholesale on recompute, never patched
/// field-by-field, so accessors always see an internally consistent
/// snapshot.
pub struct SignalEngine {
    cfg: EngineConfig,
    store: BarStore,
    stats_engine: StatsEngine,
    liquidity_detector: LiquidityDetector,
    regime_classifier: RegimeClassifier,
    bias_builder: BiasMatrixBuilder,
    scenario_scorer: ScenarioScorer,
    profile_builder: VolumeProfileBuilder,

    stats: RollingStats,
    bands: Option<ZScoreBands>,
    liquidity: LiquiditySnapshot,
    regime: Option<Regime>,
    bias: Option<BiasMatrix>,
    scenario: Option<TacticalScenario>,
    ai_score: f64,
}

impl SignalEngine {
    /// Create an engine with no history.
    pub fn new(cfg: EngineConfig) -> Self {
        let store = BarStore::new(cfg.instrument.max_history_bars);
        Self {
            stats_engine: StatsEngine::new(cfg.stats.clone()),
            liquidity_detector: LiquidityDetector::new(cfg.liquidity.clone()),
            regime_classifier: RegimeClassifier::new(cfg.regime.clone()),
            bias_builder: BiasMatrixBuilder::new(cfg.bias.clone()),
            scenario_scorer: ScenarioScorer::new(cfg.scenario.clone()),
            profile_builder: VolumeProfileBuilder::new(cfg.profile.clone()),
            cfg,
            store,
            stats: RollingStats::default(),
            bands: None,
            liquidity: LiquiditySnapshot::default(),
            regime: None,
            bias: None,
            scenario: None,
            ai_score: 0.0,
        }
    }

    /// Seed historical bars and run a full recompute.
    pub fn seed_history(&mut self, bars: Vec<Bar>, initial_cvd: f64) -> Result<()> {
        self.store.seed_history(bars, initial_cvd)?;
        info!(
            symbol = %self.cfg.instrument.symbol,
            bars = self.store.len(),
            "engine seeded"
        );
        self.recompute_all();
        Ok(())
    }

    /// Apply one tick and update whatever the outcome warrants.
    ///
    /// A stale tick is dropped; an in-place update runs only the fast
    /// statistics path; a completed bar triggers a full recompute.
    pub fn handle_tick(&mut self, tick: &Tick, signed_delta: f64) -> TickOutcome {
        let outcome = self.store.apply_tick(tick, signed_delta);
        match outcome {
            TickOutcome::Stale => {}
            TickOutcome::Updated => {
                self.stats = self.stats_engine.compute_fast(self.store.bars(), &self.stats);
                self.bands = self.stats_engine.bands(self.store.bars());
            }
            TickOutcome::NewBar => {
                debug!(
                    symbol = %self.cfg.instrument.symbol,
                    time = self.store.last().map(|b| b.time).unwrap_or_default(),
                    "bar completed"
                );
                self.recompute_all();
            }
        }
        outcome
    }

    /// Slow-cadence refresh: regime, bias matrix, and scenario only.
    ///
    /// Callers drive this from a timer so the structural outputs stay
    /// current even through quiet tape.
    pub fn refresh(&mut self) {
        self.recompute_structural();
    }

    /// Store the externally supplied AI score.
    ///
    /// Surfaced in scenario confidence on the next scoring pass.
    pub fn set_ai_score(&mut self, score: f64) {
        self.ai_score = score;
    }

    /// Re-anchor the CVD chain at zero.
    pub fn reset_cvd_baseline(&mut self) {
        self.store.reset_cvd_baseline();
    }

    /// All stored bars, oldest first.
    pub fn bars(&self) -> &[Bar] {
        self.store.bars()
    }

    /// Latest rolling statistics.
    pub fn rolling_stats(&self) -> &RollingStats {
        &self.stats
    }

    /// Latest z-score band levels, once a full stats window exists.
    pub fn zscore_bands(&self) -> Option<&ZScoreBands> {
        self.bands.as_ref()
    }

    /// Latest liquidity structure snapshot.
    pub fn liquidity(&self) -> &LiquiditySnapshot {
        &self.liquidity
    }

    /// Current regime, if history has ever been deep enough to classify.
    pub fn regime(&self) -> Option<&Regime> {
        self.regime.as_ref()
    }

    /// Current multi-timeframe bias matrix.
    pub fn bias_matrix(&self) -> Option<&BiasMatrix> {
        self.bias.as_ref()
    }

    /// Current tactical scenario.
    pub fn scenario(&self) -> Option<&TacticalScenario> {
        self.scenario.as_ref()
    }

    /// Build a volume profile over the stored bars, computed per request.
    pub fn volume_profile(&self, steps: usize) -> Vec<VolumeBucket> {
        self.profile_builder.build(self.store.bars(), steps)
    }

    /// Full recompute after history changes shape.
    fn recompute_all(&mut self) {
        let bars = self.store.bars();
        self.stats = self.stats_engine.compute_full(bars);
        self.bands = self.stats_engine.bands(bars);
        self.liquidity = self.liquidity_detector.detect(bars);
        self.recompute_structural();
    }

    /// Regime, bias matrix, and scenario from current store contents.
    ///
    /// A classifier miss (thin history) retains the previous regime rather
    /// than clearing it.
    fn recompute_structural(&mut self) {
        if let Some(next) = self.regime_classifier.classify(self.store.bars()) {
            let changed = self
                .regime
                .as_ref()
                .map(|r| r.regime_type != next.regime_type)
                .unwrap_or(true);
            if changed {
                info!(
                    symbol = %self.cfg.instrument.symbol,
                    regime = ?next.regime_type,
                    direction = ?next.trend_direction,
                    "regime transition"
                );
            }
            self.regime = Some(next);
        }

        let bias = self
            .bias_builder
            .compute(self.store.bars(), self.cfg.instrument.bar_interval_minutes);

        self.scenario = self.store.last().map(|last| {
            self.scenario_scorer.score(&ScenarioInputs {
                last_close: last.close,
                bias: &bias,
                liquidity: &self.liquidity,
                regime: self.regime.as_ref(),
                flow_imbalance: self.stats.flow_imbalance,
                ai_score: self.ai_score,
            })
        });
        self.bias = Some(bias);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantdesk_core::{Bias, RegimeType};

    fn quiet_bar(i: i64) -> Bar {
        Bar {
            time: (i + 1) * 60,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 100.0,
            delta: 0.0,
            cvd: 0.0,
        }
    }

    fn pump_bar(i: i64, k: f64) -> Bar {
        let close = 100.0 + k;
        Bar {
            time: (i + 1) * 60,
            open: close - 1.0,
            high: close + 2.0,
            low: close - 2.0,
            close,
            volume: 100.0,
            delta: 80.0,
            cvd: 0.0,
        }
    }

    /// 50 quiet bars followed by a 10-bar pump with strong positive delta.
    fn pump_history() -> Vec<Bar> {
        let mut bars: Vec<Bar> = (0..50).map(quiet_bar).collect();
        for k in 1..=10 {
            bars.push(pump_bar(49 + k, k as f64));
        }
        bars
    }

    fn seeded_engine(bars: Vec<Bar>) -> SignalEngine {
        let mut engine = SignalEngine::new(EngineConfig::default());
        engine.seed_history(bars, 0.0).unwrap();
        engine
    }

    #[test]
    fn test_seed_runs_full_recompute() {
        let engine = seeded_engine(pump_history());
        assert_eq!(engine.bars().len(), 60);
        assert!(engine.regime().is_some());
        assert!(engine.bias_matrix().is_some());
        assert!(engine.scenario().is_some());
    }

    #[test]
    fn test_pump_reads_bullish_everywhere() {
        let engine = seeded_engine(pump_history());

        // Flow: last 20 bars hold 10 quiet and 10 pump bars, so
        // 100 * 800 / 2000 = 40.
        assert!((engine.rolling_stats().flow_imbalance - 40.0).abs() < 1e-10);
        assert!((engine.rolling_stats().rsi - 100.0).abs() < 1e-10);

        let regime = engine.regime().unwrap();
        assert_eq!(regime.regime_type, RegimeType::Trending);
        assert_eq!(regime.trend_direction, Bias::Bull);

        let bias = engine.bias_matrix().unwrap();
        assert_eq!(bias.daily.bias, Bias::Bull);
        assert_eq!(bias.h4.bias, Bias::Bull);
        assert_eq!(bias.h1.bias, Bias::Bull);

        // 3 aligned horizons + trending regime + flow beyond the gate:
        // 30 + 30 + 20 = 80 -> probability 90.
        let scenario = engine.scenario().unwrap();
        assert_eq!(scenario.scenario, Bias::Bull);
        assert_eq!(scenario.probability, 90);
        assert_eq!(scenario.confidence.bias_alignment, 3);
        assert!(scenario.confidence.regime_agreement);
        assert!(!scenario.confidence.liquidity_agreement);
    }

    #[test]
    fn test_mid_bar_update_runs_only_fast_stats() {
        let mut engine = seeded_engine(pump_history());
        let rsi_before = engine.rolling_stats().rsi;
        let z_before = engine.rolling_stats().z_score;
        let scenario_before = engine.scenario().unwrap().probability;

        // Same bar time as the last seeded bar, sharply lower close.
        let tick = Tick {
            ts_ms: 60 * 60 * 1000,
            open: 109.0,
            high: 112.0,
            low: 100.0,
            close: 101.0,
            volume: 150.0,
        };
        let outcome = engine.handle_tick(&tick, -30.0);
        assert_eq!(outcome, TickOutcome::Updated);

        // Fast path: z-score moves, RSI is carried.
        assert!((engine.rolling_stats().z_score - z_before).abs() > 1e-6);
        assert!((engine.rolling_stats().rsi - rsi_before).abs() < 1e-10);
        // Structural outputs untouched until the next bar or refresh.
        assert_eq!(engine.scenario().unwrap().probability, scenario_before);
    }

    #[test]
    fn test_new_bar_triggers_full_recompute() {
        let mut engine = seeded_engine(pump_history());
        let tick = Tick {
            ts_ms: 61 * 60 * 1000,
            open: 110.0,
            high: 113.0,
            low: 109.0,
            close: 111.0,
            volume: 100.0,
        };
        let outcome = engine.handle_tick(&tick, 80.0);
        assert_eq!(outcome, TickOutcome::NewBar);
        assert_eq!(engine.bars().len(), 61);

        // CVD chain stays anchored: last cvd = baseline + last delta.
        let last = engine.bars().last().unwrap();
        let expected = engine.bars()[..60].iter().map(|b| b.delta).sum::<f64>() + last.delta;
        assert!((last.cvd - expected).abs() < 1e-10);
    }

    #[test]
    fn test_stale_tick_changes_nothing() {
        let mut engine = seeded_engine(pump_history());
        let stats_before = engine.rolling_stats().clone();
        let tick = Tick {
            ts_ms: 10 * 60 * 1000,
            open: 50.0,
            high: 55.0,
            low: 45.0,
            close: 50.0,
            volume: 5.0,
        };
        let outcome = engine.handle_tick(&tick, 5.0);
        assert_eq!(outcome, TickOutcome::Stale);
        assert_eq!(engine.bars().len(), 60);
        assert!((engine.rolling_stats().z_score - stats_before.z_score).abs() < 1e-10);
    }

    #[test]
    fn test_ai_score_surfaces_on_refresh() {
        let mut engine = seeded_engine(pump_history());
        assert!((engine.scenario().unwrap().confidence.ai_score).abs() < 1e-10);

        engine.set_ai_score(0.72);
        engine.refresh();
        let scenario = engine.scenario().unwrap();
        assert!((scenario.confidence.ai_score - 0.72).abs() < 1e-10);
    }

    #[test]
    fn test_zscore_bands_surface_and_track_ticks() {
        let mut engine = seeded_engine(pump_history());
        let bands = engine.zscore_bands().unwrap().clone();
        assert!(bands.std_dev > 0.0);
        assert!(bands.upper_2 > bands.upper_1);
        assert!(bands.upper_1 > bands.sma);
        assert!(bands.sma > bands.lower_1);
        assert!(bands.lower_1 > bands.lower_2);

        // A mid-bar tick moves the window mean along with the open close.
        let tick = Tick {
            ts_ms: 60 * 60 * 1000,
            open: 109.0,
            high: 130.0,
            low: 109.0,
            close: 130.0,
            volume: 150.0,
        };
        engine.handle_tick(&tick, 50.0);
        let updated = engine.zscore_bands().unwrap();
        assert!(updated.sma > bands.sma);
    }

    #[test]
    fn test_zscore_bands_absent_below_full_window() {
        let bars: Vec<Bar> = (0..10).map(quiet_bar).collect();
        let engine = seeded_engine(bars);
        assert!(engine.zscore_bands().is_none());
    }

    #[test]
    fn test_thin_history_retains_no_regime() {
        let bars: Vec<Bar> = (0..10).map(quiet_bar).collect();
        let engine = seeded_engine(bars);
        assert!(engine.regime().is_none());
        // Bias and scenario still produced from what little exists.
        assert!(engine.bias_matrix().is_some());
        assert!(engine.scenario().is_some());
    }

    #[test]
    fn test_volume_profile_on_demand() {
        let engine = seeded_engine(pump_history());
        let profile = engine.volume_profile(30);
        assert_eq!(profile.len(), 30);
        let total: f64 = profile.iter().map(|b| b.volume).sum();
        assert!((total - 6000.0).abs() < 1e-6);
    }
}
