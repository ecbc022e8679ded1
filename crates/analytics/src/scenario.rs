//! Tactical scenario scoring.
//!
//! Combines the bias matrix, regime, liquidity events, and order flow into
//! a single directional scenario with a capped probability and ATR-scaled
//! trade levels.

use quantdesk_core::{
    config::ScenarioConfig, Bias, BiasMatrix, ConfidenceFactors, LiquiditySnapshot, Regime,
    RegimeType, Side, TacticalScenario,
};

/// Everything the scorer reads; borrowed from the engine's current state.
pub struct ScenarioInputs<'a> {
    /// Close of the most recent bar; becomes the entry level.
    pub last_close: f64,
    pub bias: &'a BiasMatrix,
    pub liquidity: &'a LiquiditySnapshot,
    pub regime: Option<&'a Regime>,
    /// Net signed volume over total volume, -100..100.
    pub flow_imbalance: f64,
    /// Externally supplied AI score, passed through unweighted.
    pub ai_score: f64,
}

/// Additive evidence scorer for the next tactical move.
pub struct ScenarioScorer {
    cfg: ScenarioConfig,
}

impl ScenarioScorer {
    /// Create a new scorer.
    pub fn new(cfg: ScenarioConfig) -> Self {
        Self { cfg }
    }

    /// Score both directions and emit the winning scenario.
    ///
    /// Each aligned structural horizon, a matching trending regime, flow
    /// beyond the gate, and an opposing-side sweep add their configured
    /// weights to a side. A tie reads Neutral with long-oriented levels.
    pub fn score(&self, inputs: &ScenarioInputs<'_>) -> TacticalScenario {
        let bull_alignment = self.structural_alignment(inputs.bias, Bias::Bull);
        let bear_alignment = self.structural_alignment(inputs.bias, Bias::Bear);

        let bull_regime = self.regime_agrees(inputs.regime, Bias::Bull);
        let bear_regime = self.regime_agrees(inputs.regime, Bias::Bear);

        let bull_flow = inputs.flow_imbalance > self.cfg.flow_gate;
        let bear_flow = inputs.flow_imbalance < -self.cfg.flow_gate;

        // A sweep of sell-side liquidity (stops below) fuels the long case
        // and vice versa.
        let bull_sweep = inputs.liquidity.has_sweep(Side::Sell);
        let bear_sweep = inputs.liquidity.has_sweep(Side::Buy);

        let bull_score = self.side_score(bull_alignment, bull_regime, bull_flow, bull_sweep);
        let bear_score = self.side_score(bear_alignment, bear_regime, bear_flow, bear_sweep);

        let (scenario, winning_score) = if bull_score > bear_score {
            (Bias::Bull, bull_score)
        } else if bear_score > bull_score {
            (Bias::Bear, bear_score)
        } else {
            (Bias::Neutral, bull_score)
        };

        let (alignment, liquidity_agreement, regime_agreement) = match scenario {
            Bias::Bear => (bear_alignment, bear_sweep, bear_regime),
            // Neutral keeps the long-side reading of the factors.
            Bias::Bull | Bias::Neutral => (bull_alignment, bull_sweep, bull_regime),
        };

        let probability = (50 + winning_score / 2).min(self.cfg.max_probability) as u8;

        let atr = match inputs.regime {
            Some(r) if r.atr > 0.0 => r.atr,
            _ => inputs.last_close * self.cfg.atr_fallback_pct,
        };
        let sign = match scenario {
            Bias::Bear => -1.0,
            Bias::Bull | Bias::Neutral => 1.0,
        };
        let entry_level = inputs.last_close;
        let stop_level = entry_level - sign * atr * self.cfg.stop_atr_mult;
        let exit_level = entry_level + sign * atr * self.cfg.target_atr_mult;

        TacticalScenario {
            probability,
            scenario,
            entry_level,
            stop_level,
            exit_level,
            confidence: ConfidenceFactors {
                bias_alignment: alignment,
                liquidity_agreement,
                regime_agreement,
                ai_score: inputs.ai_score,
            },
        }
    }

    /// Count of structural horizons (daily, 4h, 1h) aligned with a side.
    fn structural_alignment(&self, bias: &BiasMatrix, side: Bias) -> u32 {
        bias.structural()
            .iter()
            .filter(|tf| tf.bias == side)
            .count() as u32
    }

    fn regime_agrees(&self, regime: Option<&Regime>, side: Bias) -> bool {
        regime
            .map(|r| r.regime_type == RegimeType::Trending && r.trend_direction == side)
            .unwrap_or(false)
    }

    fn side_score(&self, alignment: u32, regime: bool, flow: bool, sweep: bool) -> u32 {
        let mut score = alignment * self.cfg.bias_weight;
        if regime {
            score += self.cfg.regime_weight;
        }
        if flow {
            score += self.cfg.flow_weight;
        }
        if sweep {
            score += self.cfg.sweep_weight;
        }
        score
    }
}
