//! Trade log sinks: structured log lines, CSV rows, or memory.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::info;

use crate::domain::error::TraderError;
use crate::domain::trade::TradeEvent;
use crate::ports::trade_log_port::TradeLogPort;

/// One `info` line per fill.
#[derive(Debug, Default)]
pub struct TracingTradeLog;

impl TradeLogPort for TracingTradeLog {
    fn record(&self, event: &TradeEvent) -> Result<(), TraderError> {
        info!(
            symbol = %event.symbol,
            side = %event.side,
            action = %event.action,
            qty = event.quantity,
            price = event.price,
            notional = event.notional,
            fee = event.fee,
            pnl = ?event.pnl,
            reason = %event.reason,
            "trade"
        );
        Ok(())
    }
}

/// Appends one CSV row per fill; the header is written only to a new file.
pub struct CsvTradeLog {
    writer: Mutex<csv::Writer<File>>,
}

impl CsvTradeLog {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        let is_new = !path.exists() || path.metadata().map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        Ok(CsvTradeLog {
            writer: Mutex::new(writer),
        })
    }
}

fn csv_error(e: csv::Error) -> TraderError {
    TraderError::Io(std::io::Error::other(e))
}

impl TradeLogPort for CsvTradeLog {
    fn record(&self, event: &TradeEvent) -> Result<(), TraderError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| TraderError::Io(std::io::Error::other("trade log lock poisoned")))?;
        writer.serialize(event).map_err(csv_error)?;
        writer.flush()?;
        Ok(())
    }
}

/// Keeps events in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryTradeLog {
    events: Mutex<Vec<TradeEvent>>,
}

impl MemoryTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TradeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TradeLogPort for MemoryTradeLog {
    fn record(&self, event: &TradeEvent) -> Result<(), TraderError> {
        self.events
            .lock()
            .map_err(|_| TraderError::Io(std::io::Error::other("trade log lock poisoned")))?
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::Fill;
    use crate::domain::signal::Side;
    use crate::domain::trade::Origin;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample() -> TradeEvent {
        TradeEvent::opened(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 15, 0).unwrap(),
            "BTC/USDT",
            Side::Long,
            &Fill {
                quantity: 0.5,
                price: 60_000.0,
                fee: 22.5,
            },
            Origin::Monitor,
        )
    }

    #[test]
    fn memory_log_keeps_order() {
        let log = MemoryTradeLog::new();
        log.record(&sample()).unwrap();
        let mut second = sample();
        second.symbol = "ETH/USDT".into();
        log.record(&second).unwrap();

        let events = log.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].symbol, "ETH/USDT");
    }

    #[test]
    fn csv_log_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");

        CsvTradeLog::create(&path).unwrap().record(&sample()).unwrap();
        CsvTradeLog::create(&path).unwrap().record(&sample()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,symbol,side,action"));
        assert!(lines[1].contains("BTC/USDT,long,open,0.5,60000"));
        assert!(lines[1].ends_with(",entry"));
    }

    #[test]
    fn tracing_log_never_fails() {
        assert!(TracingTradeLog.record(&sample()).is_ok());
    }
}
