//! Derived analytics for the QuantDesk signal engine.
//!
//! This crate computes every signal layered on top of the bar store:
//! - Rolling statistics over the close and order-flow series
//! - Liquidity structure (fair value gaps, sweeps, breaks of structure)
//! - Regime classification from volatility and range persistence
//! - Multi-timeframe directional bias
//! - Tactical scenario scoring with ATR-scaled trade levels
//! - Price-by-volume profiles
//!
//! [`engine::SignalEngine`] owns all of the above behind a single facade.

pub mod bias;
pub mod engine;
pub mod liquidity;
pub mod profile;
pub mod regime;
pub mod rolling;
pub mod scenario;

pub use bias::BiasMatrixBuilder;
pub use engine::SignalEngine;
pub use liquidity::LiquidityDetector;
pub use profile::VolumeProfileBuilder;
pub use regime::RegimeClassifier;
pub use rolling::StatsEngine;
pub use scenario::{ScenarioInputs, ScenarioScorer};
