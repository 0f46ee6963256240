//! Core domain types and logic. Nothing in here performs I/O.

pub mod ohlcv;
pub mod indicator;
pub mod params;
pub mod sizing;
pub mod signal;
pub mod position;
pub mod execution;
pub mod portfolio;
pub mod trade;
pub mod decision;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod config_validation;
pub mod error;
