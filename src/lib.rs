//! trendtrader: a trend-following signal engine with a backtester and a
//! paper-trading monitor.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The async drive loop lives in
//! [`monitor`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod monitor;
pub mod cli;
