//! Port traits: every collaborator the core talks to.

pub mod config_port;
pub mod execution_port;
pub mod market_data_port;
pub mod trade_log_port;
