//! Technical indicator implementations and the feature pipeline.
//!
//! Each indicator produces an `IndicatorSeries` with exactly one point per
//! input bar. Points inside an indicator's warm-up are flagged `valid: false`;
//! [`compute_features`] replaces them with neutral defaults so the enriched
//! sequence keeps the length and order of its input:
//! - EMA: the bar's own close
//! - RSI: 50
//! - ADX, ATR, volume SMA: 0
//!
//! Every value at index `i` is computed from bars `0..=i` only.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod rsi;
pub mod volume;

use chrono::{DateTime, Utc};

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;

pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    VolumeSma(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn invalid(indicator_type: IndicatorType, bars: &[OhlcvBar]) -> Self {
        IndicatorSeries {
            indicator_type,
            values: bars.iter().map(|b| IndicatorPoint::invalid(b.timestamp)).collect(),
        }
    }

    /// Value at `index`, or `fallback` while the indicator is warming up.
    pub fn value_or(&self, index: usize, fallback: f64) -> f64 {
        match self.values.get(index) {
            Some(point) if point.valid => point.value,
            _ => fallback,
        }
    }
}

impl IndicatorPoint {
    pub(crate) fn invalid(timestamp: DateTime<Utc>) -> Self {
        IndicatorPoint {
            timestamp,
            valid: false,
            value: 0.0,
        }
    }

    pub(crate) fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        IndicatorPoint {
            timestamp,
            valid: true,
            value,
        }
    }
}

/// A bar enriched with the strategy's feature set.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBar {
    pub bar: OhlcvBar,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub ema_trend: f64,
    pub rsi: f64,
    pub adx: f64,
    pub atr: f64,
    pub vol_sma: f64,
}

impl FeatureBar {
    pub fn close(&self) -> f64 {
        self.bar.close
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.bar.timestamp
    }
}

/// Enrich `bars` with every feature the signal generator reads.
///
/// An empty input yields an empty output.
pub fn compute_features(bars: &[OhlcvBar], params: &StrategyParams) -> Vec<FeatureBar> {
    if bars.is_empty() {
        return Vec::new();
    }

    let ema_fast = ema::calculate_ema(bars, params.ema_fast);
    let ema_slow = ema::calculate_ema(bars, params.ema_slow);
    let ema_trend = ema::calculate_ema(bars, params.ema_trend);
    let rsi = rsi::calculate_rsi(bars, params.rsi_len);
    let adx = adx::calculate_adx(bars, params.adx_len);
    let atr = atr::calculate_atr(bars, params.atr_len);
    let vol_sma = volume::calculate_volume_sma(bars, params.vol_len);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| FeatureBar {
            bar: bar.clone(),
            ema_fast: ema_fast.value_or(i, bar.close),
            ema_slow: ema_slow.value_or(i, bar.close),
            ema_trend: ema_trend.value_or(i, bar.close),
            rsi: rsi.value_or(i, NEUTRAL_RSI),
            adx: adx.value_or(i, 0.0),
            atr: atr.value_or(i, 0.0),
            vol_sma: vol_sma.value_or(i, 0.0),
        })
        .collect()
}
