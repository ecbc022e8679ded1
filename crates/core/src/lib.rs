//! Core types and configuration for the QuantDesk signal engine.
//!
//! This crate provides shared types used across all other crates:
//! - Market data types (ticks, bars, liquidity events)
//! - Derived signal snapshots (stats, regime, bias, scenario, profile)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use types::*;
