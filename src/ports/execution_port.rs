//! Order execution port trait.

use async_trait::async_trait;

use crate::domain::error::TraderError;
use crate::domain::execution::Fill;
use crate::domain::signal::Side;
use crate::domain::universe::Instrument;

/// A venue's answer to an order. Rejection is a normal outcome and leaves
/// the caller's position untouched; transport failures are errors instead.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Filled(Fill),
    Rejected { reason: String },
}

#[async_trait]
pub trait ExecutionPort: Send + Sync {
    /// Opens `side` for roughly `notional` quote currency.
    async fn open(
        &self,
        instrument: &Instrument,
        side: Side,
        notional: f64,
    ) -> Result<OrderOutcome, TraderError>;

    /// Reduces an open `side` position by `quantity` base units.
    async fn close(
        &self,
        instrument: &Instrument,
        side: Side,
        quantity: f64,
    ) -> Result<OrderOutcome, TraderError>;
}
