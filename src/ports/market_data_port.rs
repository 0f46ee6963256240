//! Market data port trait.

use async_trait::async_trait;

use crate::domain::error::TraderError;
use crate::domain::ohlcv::OhlcvBar;

#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Up to `limit` most recent bars, oldest first.
    ///
    /// An empty result or a data-unavailability error means "no decision
    /// this cycle", never a fatal condition for a monitor.
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, TraderError>;
}
