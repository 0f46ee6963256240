//! Entry signal generation.
//!
//! Reads only the last bar of an indicator-enriched window, so the same
//! window and equity always yield the same signal.

use std::fmt;

use serde::Serialize;

use crate::domain::indicator::FeatureBar;
use crate::domain::params::StrategyParams;
use crate::domain::sizing::size_from_risk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HoldReason {
    NoData,
    LowAdx { adx: f64 },
    LowVolume { volume: f64, vol_sma: f64 },
    NoSetup { rsi: f64 },
    BadStop,
}

impl HoldReason {
    pub fn code(&self) -> &'static str {
        match self {
            HoldReason::NoData => "no_data",
            HoldReason::LowAdx { .. } => "low_adx",
            HoldReason::LowVolume { .. } => "low_vol",
            HoldReason::NoSetup { .. } => "no_setup",
            HoldReason::BadStop => "bad_stop",
        }
    }
}

/// Values behind an entry decision, kept for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDiagnostics {
    pub adx: f64,
    pub atr: f64,
    pub rsi: f64,
    pub vol_sma: f64,
    pub stop_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignal {
    pub side: Side,
    pub entry_price: f64,
    pub stop_price: f64,
    pub tp_price: f64,
    pub stop_distance: f64,
    /// Quote-currency size from the risk sizer.
    pub notional: f64,
    pub reason: &'static str,
    pub diagnostics: SignalDiagnostics,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Hold(HoldReason),
    Enter(EntrySignal),
}

impl Signal {
    pub fn as_entry(&self) -> Option<&EntrySignal> {
        match self {
            Signal::Enter(entry) => Some(entry),
            Signal::Hold(_) => None,
        }
    }
}

pub fn trend_direction(close: f64, ema_trend: f64) -> Trend {
    if close > ema_trend {
        Trend::Up
    } else if close < ema_trend {
        Trend::Down
    } else {
        Trend::Flat
    }
}

pub fn generate_signal(window: &[FeatureBar], equity: f64, params: &StrategyParams) -> Signal {
    let Some(row) = window.last() else {
        return Signal::Hold(HoldReason::NoData);
    };
    let price = row.close();
    let volume = row.bar.volume;

    if row.adx < params.adx_threshold {
        return Signal::Hold(HoldReason::LowAdx { adx: row.adx });
    }

    if row.vol_sma > 0.0 && volume < row.vol_sma * params.vol_mult {
        return Signal::Hold(HoldReason::LowVolume {
            volume,
            vol_sma: row.vol_sma,
        });
    }

    let trend = trend_direction(price, row.ema_trend);

    let (side, stop, stop_distance, tp) = if trend == Trend::Up
        && row.ema_fast > row.ema_slow
        && row.rsi > params.rsi_entry_long
    {
        let stop = price - row.atr * params.atr_mult_stop;
        let distance = price - stop;
        (Side::Long, stop, distance, price + distance * params.tp_rr)
    } else if trend == Trend::Down
        && row.ema_fast < row.ema_slow
        && row.rsi < params.rsi_entry_short
    {
        let stop = price + row.atr * params.atr_mult_stop;
        let distance = stop - price;
        (Side::Short, stop, distance, price - distance * params.tp_rr)
    } else {
        return Signal::Hold(HoldReason::NoSetup { rsi: row.rsi });
    };

    if stop <= 0.0 || stop_distance <= 0.0 {
        return Signal::Hold(HoldReason::BadStop);
    }

    let notional = size_from_risk(
        equity,
        price,
        stop_distance,
        params.max_risk_per_trade,
        params.min_order_usdt,
    );

    Signal::Enter(EntrySignal {
        side,
        entry_price: price,
        stop_price: stop,
        tp_price: tp,
        stop_distance,
        notional,
        reason: "trend+ema+rsi",
        diagnostics: SignalDiagnostics {
            adx: row.adx,
            atr: row.atr,
            rsi: row.rsi,
            vol_sma: row.vol_sma,
            stop_pct: stop_distance / price,
        },
    })
}
