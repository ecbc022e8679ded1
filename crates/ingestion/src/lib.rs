//! Bar ingestion for the QuantDesk signal engine.
//!
//! This crate handles:
//! - Seeding historical bars with validation
//! - Merging live kline ticks into the open bar
//! - Cumulative volume delta (CVD) baseline accounting

pub mod bar_store;

pub use bar_store::{BarStore, TickOutcome};
