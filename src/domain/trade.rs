//! Fill events emitted to the trade log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::execution::Fill;
use crate::domain::position::{ExitKind, ExitReport};
use crate::domain::signal::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Open,
    PartialClose,
    Close,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Open => write!(f, "open"),
            TradeAction::PartialClose => write!(f, "partial_close"),
            TradeAction::Close => write!(f, "close"),
        }
    }
}

/// Which driver produced a fill; only the reason codes differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Backtest,
    Monitor,
}

impl Origin {
    pub fn entry_reason(self) -> &'static str {
        match self {
            Origin::Backtest => "bt_entry",
            Origin::Monitor => "entry",
        }
    }

    pub fn exit_reason(self, kind: ExitKind) -> &'static str {
        match (self, kind) {
            (Origin::Backtest, ExitKind::StopHit) => "bt_exit",
            (Origin::Backtest, ExitKind::PartialTakeProfit) => "bt_partial_tp",
            (Origin::Backtest, ExitKind::EndOfData) => "bt_final",
            (Origin::Monitor, ExitKind::PartialTakeProfit) => "partial_tp",
            (Origin::Monitor, _) => "stop_exit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: Side,
    pub action: TradeAction,
    pub quantity: f64,
    pub price: f64,
    pub notional: f64,
    pub fee: f64,
    pub pnl: Option<f64>,
    pub reason: String,
}

impl TradeEvent {
    pub fn opened(
        timestamp: DateTime<Utc>,
        symbol: &str,
        side: Side,
        fill: &Fill,
        origin: Origin,
    ) -> Self {
        TradeEvent {
            timestamp,
            symbol: symbol.to_string(),
            side,
            action: TradeAction::Open,
            quantity: fill.quantity,
            price: fill.price,
            notional: fill.notional(),
            fee: fill.fee,
            pnl: None,
            reason: origin.entry_reason().to_string(),
        }
    }

    pub fn exited(
        timestamp: DateTime<Utc>,
        symbol: &str,
        side: Side,
        report: &ExitReport,
        origin: Origin,
    ) -> Self {
        let action = if report.closed {
            TradeAction::Close
        } else {
            TradeAction::PartialClose
        };
        TradeEvent {
            timestamp,
            symbol: symbol.to_string(),
            side,
            action,
            quantity: report.fill.quantity,
            price: report.fill.price,
            notional: report.fill.notional(),
            fee: report.fill.fee,
            pnl: Some(report.pnl),
            reason: origin.exit_reason(report.kind).to_string(),
        }
    }
}
