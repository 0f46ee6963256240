//! Cash account and equity tracking.
//!
//! Short positions use an escrow approximation: the entry notional leaves
//! cash on open and `quantity * (2 * entry - exit)` returns on close. This
//! nets to the short's price PnL but is not a margin model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::execution::Fill;
use crate::domain::position::Position;
use crate::domain::signal::Side;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub cash: f64,
    pub initial_capital: f64,
    pub equity_curve: Vec<EquityPoint>,
}

impl Account {
    pub fn new(initial_capital: f64) -> Self {
        Account {
            cash: initial_capital,
            initial_capital,
            equity_curve: Vec::new(),
        }
    }

    /// Entry cost plus commission leaves cash, for either side.
    pub fn debit_entry(&mut self, fill: &Fill) {
        self.cash -= fill.notional() + fill.fee;
    }

    /// Credits an exit fill against `position` (as it was before the fill).
    pub fn credit_exit(&mut self, position: &Position, fill: &Fill) {
        let proceeds = match position.side {
            Side::Long => fill.quantity * fill.price,
            Side::Short => fill.quantity * (2.0 * position.entry_price - fill.price),
        };
        self.cash += proceeds - fill.fee;
    }

    pub fn equity(&self, position: Option<&Position>, price: f64) -> f64 {
        self.cash + position.map_or(0.0, |p| p.market_value(price))
    }

    pub fn record_equity(&mut self, timestamp: DateTime<Utc>, equity: f64) {
        self.equity_curve.push(EquityPoint { timestamp, equity });
    }

    /// Replaces the last sample, or appends one to an empty curve.
    pub fn overwrite_last_equity(&mut self, timestamp: DateTime<Utc>, equity: f64) {
        match self.equity_curve.last_mut() {
            Some(point) => point.equity = equity,
            None => self.record_equity(timestamp, equity),
        }
    }
}
