//! Trade log port trait.

use crate::domain::error::TraderError;
use crate::domain::trade::TradeEvent;

/// Sink for fill events. Callers do not depend on whether or how the event
/// is persisted.
pub trait TradeLogPort: Send + Sync {
    fn record(&self, event: &TradeEvent) -> Result<(), TraderError>;
}
