//! Simulated venue for paper trading.
//!
//! Fills at the latest close of the instrument's own bars, priced with the
//! same [`CostModel`] the backtest uses. Opening quantities are floored to
//! the configured lot step; closes fill the requested quantity.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::error::TraderError;
use crate::domain::execution::CostModel;
use crate::domain::signal::Side;
use crate::domain::universe::Instrument;
use crate::ports::execution_port::{ExecutionPort, OrderOutcome};
use crate::ports::market_data_port::MarketDataPort;

pub struct PaperVenue {
    data: Arc<dyn MarketDataPort>,
    costs: CostModel,
    lot_step: f64,
}

impl PaperVenue {
    pub fn new(data: Arc<dyn MarketDataPort>, costs: CostModel, lot_step: f64) -> Self {
        PaperVenue {
            data,
            costs,
            lot_step,
        }
    }

    /// Latest close, or 0 when no bar is available.
    async fn reference_price(&self, instrument: &Instrument) -> Result<f64, TraderError> {
        match self
            .data
            .fetch_bars(&instrument.symbol, &instrument.timeframe, 1)
            .await
        {
            Ok(bars) => Ok(bars.last().map_or(0.0, |b| b.close)),
            Err(e) if e.is_data_unavailable() => Ok(0.0),
            Err(e) => Err(TraderError::Execution {
                symbol: instrument.symbol.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn floor_to_lot(&self, quantity: f64) -> f64 {
        if self.lot_step <= 0.0 {
            return quantity;
        }
        // tolerate representation error such as 0.3 / 0.1 = 2.9999999999999996
        ((quantity / self.lot_step) + 1e-9).floor() * self.lot_step
    }
}

fn rejected(reason: &str) -> OrderOutcome {
    OrderOutcome::Rejected {
        reason: reason.to_string(),
    }
}

#[async_trait]
impl ExecutionPort for PaperVenue {
    async fn open(
        &self,
        instrument: &Instrument,
        side: Side,
        notional: f64,
    ) -> Result<OrderOutcome, TraderError> {
        let price = self.reference_price(instrument).await?;
        if !(price > 0.0) {
            return Ok(rejected("bad price"));
        }
        let quantity = self.floor_to_lot(notional / price);
        if !(quantity > 0.0) {
            return Ok(rejected("amount too small"));
        }
        let fill = self.costs.entry_fill(side, price, quantity);
        debug!(%instrument, %side, qty = fill.quantity, price = fill.price, "paper open");
        Ok(OrderOutcome::Filled(fill))
    }

    async fn close(
        &self,
        instrument: &Instrument,
        side: Side,
        quantity: f64,
    ) -> Result<OrderOutcome, TraderError> {
        let price = self.reference_price(instrument).await?;
        if !(price > 0.0) {
            return Ok(rejected("bad price"));
        }
        if !(quantity > 0.0) {
            return Ok(rejected("amount too small"));
        }
        let fill = self.costs.exit_fill(side, price, quantity);
        debug!(%instrument, %side, qty = fill.quantity, price = fill.price, "paper close");
        Ok(OrderOutcome::Filled(fill))
    }
}
