//! CSV file market data adapter.
//!
//! One file per (symbol, timeframe): `<dir>/<SYMBOL>_<TF>.csv` with header
//! `timestamp,open,high,low,close,volume`. The symbol's `/` is dropped, so
//! `BTC/USDT` on `15m` reads `BTCUSDT_15m.csv`. Timestamps are epoch
//! milliseconds or RFC 3339.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::error::TraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::market_data_port::MarketDataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        let file_symbol: String = symbol.chars().filter(|c| *c != '/').collect();
        self.base_path
            .join(format!("{}_{}.csv", file_symbol.to_uppercase(), timeframe))
    }

    /// Bars sorted ascending, duplicate timestamps collapsed to the last row
    /// seen, trimmed to the most recent `limit`.
    pub fn load(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, TraderError> {
        let path = self.csv_path(symbol, timeframe);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TraderError::NoData {
                    symbol: symbol.to_string(),
                    timeframe: timeframe.to_string(),
                });
            }
            Err(e) => return Err(TraderError::Io(e)),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| TraderError::Data {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;
            let bar = row_to_bar(row).map_err(|reason| TraderError::Data {
                reason: format!("{} row {}: {}", path.display(), line + 1, reason),
            })?;
            bars.push(bar);
        }

        // stable sort keeps file order among equal timestamps; dedup keeps the later row
        bars.sort_by_key(|b| b.timestamp);
        bars.reverse();
        bars.dedup_by_key(|b| b.timestamp);
        bars.reverse();

        if bars.len() > limit {
            bars.drain(..bars.len() - limit);
        }
        Ok(bars)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| format!("timestamp {ms} out of range"));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
}

fn row_to_bar(row: CsvRow) -> Result<OhlcvBar, String> {
    let timestamp = parse_timestamp(&row.timestamp)?;
    for (name, value) in [
        ("open", row.open),
        ("high", row.high),
        ("low", row.low),
        ("close", row.close),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(format!("{name} must be a positive number, got {value}"));
        }
    }
    if !(row.volume.is_finite() && row.volume >= 0.0) {
        return Err(format!("volume must be non-negative, got {}", row.volume));
    }
    Ok(OhlcvBar {
        timestamp,
        open: row.open,
        high: row.high,
        low: row.low,
        close: row.close,
        volume: row.volume,
    })
}

#[async_trait]
impl MarketDataPort for CsvAdapter {
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, TraderError> {
        self.load(symbol, timeframe, limit)
    }
}
