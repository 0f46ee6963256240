//! Strategy parameters, resolved once and immutable afterwards.
//!
//! Each key is looked up as an explicit override under its upper-cased name,
//! then in its config section, then falls back to the built-in default.

use std::str::FromStr;

use crate::domain::error::TraderError;
use crate::ports::config_port::{ConfigPort, OverridePort};

pub const STRATEGY_SECTION: &str = "strategy";
pub const RISK_SECTION: &str = "risk";

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub ema_trend: usize,
    pub rsi_len: usize,
    pub rsi_entry_long: f64,
    pub rsi_entry_short: f64,
    pub adx_len: usize,
    pub adx_threshold: f64,
    pub atr_len: usize,
    pub atr_mult_stop: f64,
    pub atr_mult_trail: f64,
    pub vol_len: usize,
    pub vol_mult: f64,
    pub partial_tp_ratio: f64,
    pub tp_rr: f64,
    pub max_risk_per_trade: f64,
    pub min_order_usdt: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            ema_fast: 20,
            ema_slow: 50,
            ema_trend: 200,
            rsi_len: 14,
            rsi_entry_long: 35.0,
            rsi_entry_short: 65.0,
            adx_len: 14,
            adx_threshold: 20.0,
            atr_len: 14,
            atr_mult_stop: 1.5,
            atr_mult_trail: 2.0,
            vol_len: 20,
            vol_mult: 1.0,
            partial_tp_ratio: 0.5,
            tp_rr: 1.0,
            max_risk_per_trade: 0.01,
            min_order_usdt: 10.0,
        }
    }
}

struct Resolver<'a> {
    config: &'a dyn ConfigPort,
    overrides: &'a dyn OverridePort,
}

impl Resolver<'_> {
    fn get<T: FromStr>(&self, section: &str, key: &str, default: T) -> Result<T, TraderError> {
        let raw = self
            .overrides
            .lookup(&key.to_uppercase())
            .or_else(|| self.config.get_string(section, key));

        parse_or_default(raw, section, key, default)
    }
}

fn parse_or_default<T: FromStr>(
    raw: Option<String>,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, TraderError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| TraderError::invalid(section, key, format!("cannot parse {:?}", value))),
    }
}

/// Reads `[section] key`, falling back to `default` when absent.
/// A present value that does not parse is an error.
pub fn config_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, TraderError> {
    parse_or_default(config.get_string(section, key), section, key, default)
}

impl StrategyParams {
    pub fn resolve(
        config: &dyn ConfigPort,
        overrides: &dyn OverridePort,
    ) -> Result<Self, TraderError> {
        let r = Resolver { config, overrides };
        let d = StrategyParams::default();
        let s = STRATEGY_SECTION;

        Ok(StrategyParams {
            ema_fast: r.get(s, "ema_fast", d.ema_fast)?,
            ema_slow: r.get(s, "ema_slow", d.ema_slow)?,
            ema_trend: r.get(s, "ema_trend", d.ema_trend)?,
            rsi_len: r.get(s, "rsi_len", d.rsi_len)?,
            rsi_entry_long: r.get(s, "rsi_entry_long", d.rsi_entry_long)?,
            rsi_entry_short: r.get(s, "rsi_entry_short", d.rsi_entry_short)?,
            adx_len: r.get(s, "adx_len", d.adx_len)?,
            adx_threshold: r.get(s, "adx_threshold", d.adx_threshold)?,
            atr_len: r.get(s, "atr_len", d.atr_len)?,
            atr_mult_stop: r.get(s, "atr_mult_stop", d.atr_mult_stop)?,
            atr_mult_trail: r.get(s, "atr_mult_trail", d.atr_mult_trail)?,
            vol_len: r.get(s, "vol_len", d.vol_len)?,
            vol_mult: r.get(s, "vol_mult", d.vol_mult)?,
            partial_tp_ratio: r.get(s, "partial_tp_ratio", d.partial_tp_ratio)?,
            tp_rr: r.get(s, "tp_rr", d.tp_rr)?,
            max_risk_per_trade: r.get(RISK_SECTION, "max_risk_per_trade", d.max_risk_per_trade)?,
            min_order_usdt: r.get(RISK_SECTION, "min_order_usdt", d.min_order_usdt)?,
        })
    }

    /// Leading bar count whose features are unreliable: the longest configured window.
    pub fn warmup(&self) -> usize {
        [
            self.ema_fast,
            self.ema_slow,
            self.ema_trend,
            self.rsi_len,
            self.adx_len,
            self.atr_len,
            self.vol_len,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::ports::config_port::NoOverrides;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_nothing_configured() {
        let config = FileConfigAdapter::from_string("[strategy]\n").unwrap();
        let params = StrategyParams::resolve(&config, &NoOverrides).unwrap();
        assert_eq!(params, StrategyParams::default());
    }

    #[test]
    fn config_section_beats_default() {
        let config =
            FileConfigAdapter::from_string("[strategy]\nema_fast = 9\n[risk]\nmin_order_usdt = 25\n")
                .unwrap();
        let params = StrategyParams::resolve(&config, &NoOverrides).unwrap();
        assert_eq!(params.ema_fast, 9);
        assert_eq!(params.min_order_usdt, 25.0);
    }

    #[test]
    fn upper_cased_override_beats_config() {
        let config = FileConfigAdapter::from_string("[strategy]\nadx_threshold = 30\n").unwrap();
        let overrides: HashMap<String, String> =
            [("ADX_THRESHOLD".to_string(), "18.5".to_string())].into();
        let params = StrategyParams::resolve(&config, &overrides).unwrap();
        assert_eq!(params.adx_threshold, 18.5);
    }

    #[test]
    fn lower_cased_override_is_ignored() {
        let config = FileConfigAdapter::from_string("[strategy]\n").unwrap();
        let overrides: HashMap<String, String> =
            [("tp_rr".to_string(), "3".to_string())].into();
        let params = StrategyParams::resolve(&config, &overrides).unwrap();
        assert_eq!(params.tp_rr, 1.0);
    }

    #[test]
    fn unparseable_value_is_an_error() {
        let config = FileConfigAdapter::from_string("[strategy]\nrsi_len = fourteen\n").unwrap();
        let err = StrategyParams::resolve(&config, &NoOverrides).unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { ref key, .. } if key == "rsi_len"));
    }

    #[test]
    fn warmup_is_longest_window() {
        let params = StrategyParams::default();
        assert_eq!(params.warmup(), 200);

        let short = StrategyParams {
            ema_trend: 30,
            ema_slow: 25,
            vol_len: 40,
            ..StrategyParams::default()
        };
        assert_eq!(short.warmup(), 40);
    }
}
