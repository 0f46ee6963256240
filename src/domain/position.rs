//! Open position lifecycle: trailing stop, one partial take-profit, full exit.
//!
//! States run `OpenFull -> OpenPartial -> closed`; a position whose quantity
//! reaches zero is dropped by its owner.

use chrono::{DateTime, Utc};

use crate::domain::execution::Fill;
use crate::domain::signal::{EntrySignal, Side};

/// Remaining quantity below this is treated as fully closed.
pub const QUANTITY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    OpenFull,
    OpenPartial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    StopHit,
    PartialTakeProfit,
    EndOfData,
}

/// An exit the lifecycle wants filled. Nothing is mutated until the fill
/// comes back and is applied with [`Position::apply_exit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitOrder {
    pub kind: ExitKind,
    pub quantity: f64,
    pub reference_price: f64,
}

/// Outcome of applying one exit fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitReport {
    pub kind: ExitKind,
    pub fill: Fill,
    /// Price PnL on the filled quantity minus the exit fee.
    pub pnl: f64,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_fee: f64,
    pub stop_price: f64,
    pub tp_price: f64,
    pub state: PositionState,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Stop and target are taken from the signal; the entry price is the fill's.
    pub fn open(signal: &EntrySignal, fill: &Fill, opened_at: DateTime<Utc>) -> Self {
        Position {
            side: signal.side,
            quantity: fill.quantity,
            entry_price: fill.price,
            entry_fee: fill.fee,
            stop_price: signal.stop_price,
            tp_price: signal.tp_price,
            state: PositionState::OpenFull,
            opened_at,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.quantity <= QUANTITY_EPSILON
    }

    /// Stop after trailing by `atr * mult` from `price`; never looser than now.
    pub fn trailed_stop(&self, price: f64, atr: f64, mult: f64) -> f64 {
        match self.side {
            Side::Long => self.stop_price.max(price - atr * mult),
            Side::Short => self.stop_price.min(price + atr * mult),
        }
    }

    /// Moves the stop to `candidate` only when that tightens it.
    pub fn ratchet_stop(&mut self, candidate: f64) {
        self.stop_price = match self.side {
            Side::Long => self.stop_price.max(candidate),
            Side::Short => self.stop_price.min(candidate),
        };
    }

    pub fn stop_hit(&self, price: f64) -> bool {
        match self.side {
            Side::Long => price <= self.stop_price,
            Side::Short => price >= self.stop_price,
        }
    }

    /// The target fires once; after the partial exit it is never re-armed.
    pub fn target_hit(&self, price: f64) -> bool {
        if self.state != PositionState::OpenFull {
            return false;
        }
        match self.side {
            Side::Long => price >= self.tp_price,
            Side::Short => price <= self.tp_price,
        }
    }

    /// At most one exit per bar; a stop hit wins over the target.
    pub fn evaluate(&self, price: f64, partial_ratio: f64) -> Option<ExitOrder> {
        if self.stop_hit(price) {
            return Some(ExitOrder {
                kind: ExitKind::StopHit,
                quantity: self.quantity,
                reference_price: price,
            });
        }
        if self.target_hit(price) {
            return Some(ExitOrder {
                kind: ExitKind::PartialTakeProfit,
                quantity: self.quantity * partial_ratio.clamp(0.0, 1.0),
                reference_price: price,
            });
        }
        None
    }

    pub fn end_of_data(&self, price: f64) -> ExitOrder {
        ExitOrder {
            kind: ExitKind::EndOfData,
            quantity: self.quantity,
            reference_price: price,
        }
    }

    /// Mark-to-market value held in the account. Shorts are valued at
    /// `2 * entry - price`, matching how their entry notional is escrowed.
    pub fn market_value(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => self.quantity * price,
            Side::Short => self.quantity * (2.0 * self.entry_price - price),
        }
    }

    /// Reduces quantity by the filled amount. Filling the full remainder (or
    /// more) closes the position; a partial fill moves it to `OpenPartial`.
    pub fn apply_exit(&mut self, kind: ExitKind, fill: Fill) -> ExitReport {
        let quantity = fill.quantity.min(self.quantity).max(0.0);
        let fill = Fill { quantity, ..fill };
        let pnl = self.side.sign() * (fill.price - self.entry_price) * quantity - fill.fee;

        self.quantity -= quantity;
        if self.is_closed() {
            self.quantity = 0.0;
        } else if kind == ExitKind::PartialTakeProfit {
            self.state = PositionState::OpenPartial;
        }

        ExitReport {
            kind,
            fill,
            pnl,
            closed: self.is_closed(),
        }
    }
}
