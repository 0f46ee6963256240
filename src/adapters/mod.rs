//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod env_overrides;
pub mod file_config_adapter;
pub mod paper_venue;
pub mod trade_log;
