#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use trendtrader::domain::error::TraderError;
pub use trendtrader::domain::ohlcv::OhlcvBar;
use trendtrader::domain::params::StrategyParams;
use trendtrader::domain::signal::Side;
use trendtrader::domain::universe::Instrument;
use trendtrader::ports::execution_port::{ExecutionPort, OrderOutcome};
use trendtrader::ports::market_data_port::MarketDataPort;

/// Bar `i` of a 15-minute series starting 2024-01-01.
pub fn bar_at(i: usize, high: f64, low: f64, close: f64, volume: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::minutes(15 * i as i64),
        open: close,
        high,
        low,
        close,
        volume,
    }
}

/// Short windows so a handful of bars clears the warm-up (8 bars).
pub fn small_params() -> StrategyParams {
    StrategyParams {
        ema_fast: 3,
        ema_slow: 5,
        ema_trend: 8,
        rsi_len: 5,
        adx_len: 3,
        atr_len: 3,
        vol_len: 3,
        ..StrategyParams::default()
    }
}

/// Steady climb with a wobble every third bar. Every bar past the warm-up
/// is a long setup.
pub fn rising(n: usize) -> Vec<OhlcvBar> {
    (0..n).map(rising_bar).collect()
}

pub fn rising_bar(i: usize) -> OhlcvBar {
    let close = 100.0 + i as f64 + if i % 3 == 0 { -0.4 } else { 0.0 };
    bar_at(i, close + 0.5, close - 0.5, close, 1_000.0)
}

/// Bar `i` far below anything `rising` produced.
pub fn crash_bar(i: usize, close: f64) -> OhlcvBar {
    bar_at(i, close + 0.5, close - 0.5, close, 1_000.0)
}

/// Compounds per-bar returns from a start of 100.
pub fn random_walk(steps: &[(f64, f64)]) -> Vec<OhlcvBar> {
    let mut close = 100.0;
    steps
        .iter()
        .enumerate()
        .map(|(i, &(ret, volume))| {
            let prev = close;
            close *= 1.0 + ret;
            let high = prev.max(close) * 1.002;
            let low = prev.min(close) * 0.998;
            bar_at(i, high, low, close, volume)
        })
        .collect()
}

pub fn write_bars_csv(path: &std::path::Path, bars: &[OhlcvBar]) {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.timestamp_millis(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(path, out).unwrap();
}

/// In-memory bars keyed by instrument. Unknown instruments are `NoData`.
#[derive(Default)]
pub struct MockMarketData {
    bars: Mutex<HashMap<Instrument, Vec<OhlcvBar>>>,
    fetches: AtomicUsize,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(self, instrument: &Instrument, bars: Vec<OhlcvBar>) -> Self {
        self.set_bars(instrument, bars);
        self
    }

    pub fn set_bars(&self, instrument: &Instrument, bars: Vec<OhlcvBar>) {
        self.bars.lock().unwrap().insert(instrument.clone(), bars);
    }

    pub fn push_bar(&self, instrument: &Instrument, bar: OhlcvBar) {
        self.bars
            .lock()
            .unwrap()
            .entry(instrument.clone())
            .or_default()
            .push(bar);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, TraderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let key = Instrument::new(symbol, timeframe);
        match self.bars.lock().unwrap().get(&key) {
            Some(bars) => {
                let skip = bars.len().saturating_sub(limit);
                Ok(bars[skip..].to_vec())
            }
            None => Err(TraderError::NoData {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            }),
        }
    }
}

/// Replays queued outcomes in order; rejects once the script runs out.
#[derive(Default)]
pub struct ScriptedVenue {
    outcomes: Mutex<VecDeque<OrderOutcome>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl ScriptedVenue {
    pub fn new(outcomes: Vec<OrderOutcome>) -> Self {
        ScriptedVenue {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn next(&self) -> OrderOutcome {
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(OrderOutcome::Rejected {
                reason: "script exhausted".to_string(),
            })
    }
}

#[async_trait]
impl ExecutionPort for ScriptedVenue {
    async fn open(
        &self,
        _instrument: &Instrument,
        _side: Side,
        _notional: f64,
    ) -> Result<OrderOutcome, TraderError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.next())
    }

    async fn close(
        &self,
        _instrument: &Instrument,
        _side: Side,
        _quantity: f64,
    ) -> Result<OrderOutcome, TraderError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(self.next())
    }
}
