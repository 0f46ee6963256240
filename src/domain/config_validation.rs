//! Validation of resolved parameters and run settings.
//!
//! Runs once after resolution so that nothing downstream has to re-check
//! ranges.

use crate::domain::backtest::{BACKTEST_SECTION, BacktestConfig};
use crate::domain::error::TraderError;
use crate::domain::params::{RISK_SECTION, STRATEGY_SECTION, StrategyParams};

pub fn validate_strategy_params(params: &StrategyParams) -> Result<(), TraderError> {
    validate_windows(params)?;
    validate_rsi_thresholds(params)?;
    validate_multipliers(params)?;
    validate_partial_tp_ratio(params.partial_tp_ratio)?;
    validate_risk(params)?;
    Ok(())
}

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), TraderError> {
    if !(config.initial_capital > 0.0) {
        return Err(TraderError::invalid(
            BACKTEST_SECTION,
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    check_fraction(BACKTEST_SECTION, "commission", config.costs.commission_rate)?;
    check_fraction(BACKTEST_SECTION, "slippage", config.costs.slippage_rate)?;
    check_fraction(BACKTEST_SECTION, "risk_free_rate", config.risk_free_rate)?;
    if !(config.periods_per_year > 0.0) {
        return Err(TraderError::invalid(
            BACKTEST_SECTION,
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    if config.candles == 0 {
        return Err(TraderError::invalid(
            BACKTEST_SECTION,
            "candles",
            "candles must be at least 1",
        ));
    }
    Ok(())
}

fn validate_windows(params: &StrategyParams) -> Result<(), TraderError> {
    let windows = [
        ("ema_fast", params.ema_fast),
        ("ema_slow", params.ema_slow),
        ("ema_trend", params.ema_trend),
        ("rsi_len", params.rsi_len),
        ("adx_len", params.adx_len),
        ("atr_len", params.atr_len),
        ("vol_len", params.vol_len),
    ];
    for (key, len) in windows {
        if len == 0 {
            return Err(TraderError::invalid(
                STRATEGY_SECTION,
                key,
                format!("{key} must be at least 1"),
            ));
        }
    }
    Ok(())
}

fn validate_rsi_thresholds(params: &StrategyParams) -> Result<(), TraderError> {
    for (key, value) in [
        ("rsi_entry_long", params.rsi_entry_long),
        ("rsi_entry_short", params.rsi_entry_short),
        ("adx_threshold", params.adx_threshold),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(TraderError::invalid(
                STRATEGY_SECTION,
                key,
                format!("{key} must be between 0 and 100"),
            ));
        }
    }
    Ok(())
}

fn validate_multipliers(params: &StrategyParams) -> Result<(), TraderError> {
    for (key, value) in [
        ("atr_mult_stop", params.atr_mult_stop),
        ("atr_mult_trail", params.atr_mult_trail),
        ("tp_rr", params.tp_rr),
    ] {
        if !(value > 0.0) {
            return Err(TraderError::invalid(
                STRATEGY_SECTION,
                key,
                format!("{key} must be positive"),
            ));
        }
    }
    if !(params.vol_mult >= 0.0) {
        return Err(TraderError::invalid(
            STRATEGY_SECTION,
            "vol_mult",
            "vol_mult must be non-negative",
        ));
    }
    Ok(())
}

fn validate_partial_tp_ratio(ratio: f64) -> Result<(), TraderError> {
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(TraderError::invalid(
            STRATEGY_SECTION,
            "partial_tp_ratio",
            "partial_tp_ratio must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_risk(params: &StrategyParams) -> Result<(), TraderError> {
    if !(params.max_risk_per_trade > 0.0 && params.max_risk_per_trade <= 1.0) {
        return Err(TraderError::invalid(
            RISK_SECTION,
            "max_risk_per_trade",
            "max_risk_per_trade must be in (0, 1]",
        ));
    }
    if !(params.min_order_usdt >= 0.0) {
        return Err(TraderError::invalid(
            RISK_SECTION,
            "min_order_usdt",
            "min_order_usdt must be non-negative",
        ));
    }
    Ok(())
}

fn check_fraction(section: &str, key: &str, value: f64) -> Result<(), TraderError> {
    if !(0.0..1.0).contains(&value) {
        return Err(TraderError::invalid(
            section,
            key,
            format!("{key} must be in [0, 1)"),
        ));
    }
    Ok(())
}
