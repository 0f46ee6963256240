//! Deterministic fill pricing: proportional slippage and commission.
//!
//! Used for every simulated fill (open, partial close, full close) so the
//! backtest and the paper venue price fills identically.

use crate::domain::signal::Side;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Fraction of fill notional charged per fill.
    pub commission_rate: f64,
    /// Fraction of price the fill moves against the trader.
    pub slippage_rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            commission_rate: 0.00075,
            slippage_rate: 0.0005,
        }
    }
}

/// A priced fill, before it is applied to any position or account.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub quantity: f64,
    pub price: f64,
    pub fee: f64,
}

impl Fill {
    pub fn notional(&self) -> f64 {
        self.quantity * self.price
    }
}

impl CostModel {
    pub fn frictionless() -> Self {
        CostModel {
            commission_rate: 0.0,
            slippage_rate: 0.0,
        }
    }

    pub fn commission(&self, notional: f64) -> f64 {
        notional.abs() * self.commission_rate
    }

    /// Buying (long entry) fills higher, selling short fills lower.
    pub fn entry_price(&self, side: Side, market_price: f64) -> f64 {
        match side {
            Side::Long => market_price * (1.0 + self.slippage_rate),
            Side::Short => market_price * (1.0 - self.slippage_rate),
        }
    }

    /// Selling a long fills lower, buying to cover a short fills higher.
    pub fn exit_price(&self, side: Side, market_price: f64) -> f64 {
        match side {
            Side::Long => market_price * (1.0 - self.slippage_rate),
            Side::Short => market_price * (1.0 + self.slippage_rate),
        }
    }

    pub fn entry_fill(&self, side: Side, market_price: f64, quantity: f64) -> Fill {
        let price = self.entry_price(side, market_price);
        Fill {
            quantity,
            price,
            fee: self.commission(quantity * price),
        }
    }

    pub fn exit_fill(&self, side: Side, market_price: f64, quantity: f64) -> Fill {
        let price = self.exit_price(side, market_price);
        Fill {
            quantity,
            price,
            fee: self.commission(quantity * price),
        }
    }

    /// Exit at the given price with commission but no slippage.
    pub fn unslipped_fill(&self, market_price: f64, quantity: f64) -> Fill {
        Fill {
            quantity,
            price: market_price,
            fee: self.commission(quantity * market_price),
        }
    }

    /// Entry fill for `notional` at `market_price`, shrunk so that
    /// cost plus commission never exceeds `cash`.
    ///
    /// Returns `None` when nothing can be bought.
    pub fn affordable_entry(
        &self,
        side: Side,
        market_price: f64,
        notional: f64,
        cash: f64,
    ) -> Option<Fill> {
        if market_price <= 0.0 || cash <= 0.0 || notional <= 0.0 {
            return None;
        }
        let notional = notional.min(cash);
        let mut fill = self.entry_fill(side, market_price, notional / market_price);
        if fill.notional() + fill.fee > cash {
            let quantity = cash / (fill.price * (1.0 + self.commission_rate));
            fill = self.entry_fill(side, market_price, quantity);
        }
        if fill.quantity > 0.0 { Some(fill) } else { None }
    }
}
