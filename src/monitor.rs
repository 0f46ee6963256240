//! Live/paper monitoring: one task per instrument, coordinated by a supervisor.
//!
//! Each [`InstrumentMonitor`] owns its position outright. Nothing is shared
//! between units except the read-only ports, so no locking is needed. The
//! stop ratchet is applied before any venue I/O and fills are applied only
//! after the venue accepts them, so cancelling at an await point never
//! leaves a half-updated position.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::decision::{Management, TradingCore};
use crate::domain::error::TraderError;
use crate::domain::indicator::compute_features;
use crate::domain::params::config_value;
use crate::domain::position::Position;
use crate::domain::signal::{EntrySignal, Signal};
use crate::domain::trade::{Origin, TradeEvent};
use crate::domain::universe::{Instrument, parse_pairs};
use crate::ports::config_port::ConfigPort;
use crate::ports::execution_port::{ExecutionPort, OrderOutcome};
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::trade_log_port::TradeLogPort;

pub const MONITOR_SECTION: &str = "monitor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Paper,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub poll: Duration,
    /// Delay after a cycle that found no data.
    pub retry: Duration,
    pub bar_limit: usize,
    /// Equity used for sizing every entry.
    pub equity: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        MonitorSettings {
            poll: Duration::from_secs(30),
            retry: Duration::from_secs(10),
            bar_limit: 500,
            equity: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub mode: Mode,
    pub pairs: Vec<Instrument>,
    pub settings: MonitorSettings,
    pub lot_step: f64,
}

impl MonitorConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let s = MONITOR_SECTION;
        let d = MonitorSettings::default();

        let mode = match config
            .get_string(s, "mode")
            .map(|m| m.trim().to_lowercase())
            .as_deref()
        {
            None | Some("paper") => Mode::Paper,
            Some("live") => {
                return Err(TraderError::invalid(
                    s,
                    "mode",
                    "live venue is not available in this build; use paper",
                ));
            }
            Some(other) => {
                return Err(TraderError::invalid(
                    s,
                    "mode",
                    format!("unknown mode {other:?} (expected paper or live)"),
                ));
            }
        };

        let pairs = parse_pairs(&config.get_string(s, "pairs").unwrap_or_default())
            .map_err(|e| TraderError::invalid(s, "pairs", e.to_string()))?;

        let poll_secs: u64 = config_value(config, s, "poll_secs", d.poll.as_secs())?;
        let retry_secs: u64 = config_value(config, s, "retry_secs", d.retry.as_secs())?;
        let bar_limit: usize = config_value(config, s, "bar_limit", d.bar_limit)?;
        let equity: f64 = config_value(config, s, "equity", d.equity)?;
        let lot_step: f64 = config_value(config, s, "lot_step", 0.000001)?;

        if bar_limit == 0 {
            return Err(TraderError::invalid(s, "bar_limit", "bar_limit must be at least 1"));
        }
        if !(equity > 0.0) {
            return Err(TraderError::invalid(s, "equity", "equity must be positive"));
        }
        if !(lot_step >= 0.0) {
            return Err(TraderError::invalid(s, "lot_step", "lot_step must be non-negative"));
        }

        Ok(MonitorConfig {
            mode,
            pairs,
            settings: MonitorSettings {
                poll: Duration::from_secs(poll_secs),
                retry: Duration::from_secs(retry_secs),
                bar_limit,
                equity,
            },
            lot_step,
        })
    }
}

/// What one cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoData,
    WarmingUp { bars: usize },
    Held(&'static str),
    Opened,
    Managed,
    Exited { closed: bool },
    /// Closed the position and opened a new one on the same bar.
    Reopened,
    Rejected(String),
}

pub struct InstrumentMonitor {
    instrument: Instrument,
    core: TradingCore,
    data: Arc<dyn MarketDataPort>,
    venue: Arc<dyn ExecutionPort>,
    log: Arc<dyn TradeLogPort>,
    settings: MonitorSettings,
    position: Option<Position>,
}

impl InstrumentMonitor {
    pub fn new(
        instrument: Instrument,
        core: TradingCore,
        data: Arc<dyn MarketDataPort>,
        venue: Arc<dyn ExecutionPort>,
        log: Arc<dyn TradeLogPort>,
        settings: MonitorSettings,
    ) -> Self {
        InstrumentMonitor {
            instrument,
            core,
            data,
            venue,
            log,
            settings,
            position: None,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Cycles until `cancel` fires; returns whatever position is still open.
    pub async fn run(mut self, cancel: CancellationToken) -> Option<Position> {
        let poll = self.settings.poll;
        let retry = self.settings.retry;
        let name = self.instrument.to_string();
        info!(instrument = %name, "monitor started");

        loop {
            let delay = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.cycle() => match result {
                    Ok(CycleOutcome::NoData) => retry,
                    Ok(outcome) => {
                        debug!(instrument = %name, ?outcome, "cycle done");
                        poll
                    }
                    Err(e) => {
                        error!(instrument = %name, error = %e, "monitor cycle failed");
                        poll
                    }
                },
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(instrument = %name, open = self.position.is_some(), "monitor stopped");
        self.position
    }

    /// Fetch, decide, execute, apply, log.
    pub async fn cycle(&mut self) -> Result<CycleOutcome, TraderError> {
        let bars = match self
            .data
            .fetch_bars(
                &self.instrument.symbol,
                &self.instrument.timeframe,
                self.settings.bar_limit,
            )
            .await
        {
            Ok(bars) => bars,
            Err(e) if e.is_data_unavailable() => {
                warn!(instrument = %self.instrument, error = %e, "no data, retrying later");
                return Ok(CycleOutcome::NoData);
            }
            Err(e) => return Err(e),
        };

        if bars.is_empty() {
            warn!(instrument = %self.instrument, "empty bar fetch, retrying later");
            return Ok(CycleOutcome::NoData);
        }
        if bars.len() <= self.core.warmup() {
            debug!(instrument = %self.instrument, bars = bars.len(), warmup = self.core.warmup(), "warming up");
            return Ok(CycleOutcome::WarmingUp { bars: bars.len() });
        }

        let features = compute_features(&bars, self.core.params());

        let plan = self
            .core
            .decide(self.position.as_ref(), &features, self.settings.equity);

        let managed = match plan.management {
            Some(management) => Some(self.manage(management).await?),
            None => None,
        };
        let exited = match managed {
            None => false,
            Some(CycleOutcome::Exited { closed: true }) => true,
            Some(outcome) => return Ok(outcome),
        };

        let entry = plan.entry_if_flat(self.position.as_ref()).cloned();
        match entry {
            Some(signal) => match self.open(signal).await? {
                CycleOutcome::Opened if exited => Ok(CycleOutcome::Reopened),
                outcome => Ok(outcome),
            },
            None if exited => Ok(CycleOutcome::Exited { closed: true }),
            None => {
                let reason = match &plan.entry {
                    Signal::Hold(reason) => reason.code(),
                    Signal::Enter(_) => "position_open",
                };
                debug!(instrument = %self.instrument, reason, "hold");
                Ok(CycleOutcome::Held(reason))
            }
        }
    }

    async fn open(&mut self, signal: EntrySignal) -> Result<CycleOutcome, TraderError> {
        let outcome = self
            .venue
            .open(&self.instrument, signal.side, signal.notional)
            .await?;

        match outcome {
            OrderOutcome::Rejected { reason } => {
                warn!(instrument = %self.instrument, side = %signal.side, %reason, "open rejected");
                Ok(CycleOutcome::Rejected(reason))
            }
            OrderOutcome::Filled(fill) => {
                let now = Utc::now();
                info!(
                    instrument = %self.instrument,
                    side = %signal.side,
                    qty = fill.quantity,
                    price = fill.price,
                    stop = signal.stop_price,
                    tp = signal.tp_price,
                    "position opened"
                );
                self.position = Some(Position::open(&signal, &fill, now));
                self.record(TradeEvent::opened(
                    now,
                    &self.instrument.symbol,
                    signal.side,
                    &fill,
                    Origin::Monitor,
                ));
                Ok(CycleOutcome::Opened)
            }
        }
    }

    async fn manage(&mut self, management: Management) -> Result<CycleOutcome, TraderError> {
        let Some(pos) = self.position.as_mut() else {
            return Ok(CycleOutcome::Managed);
        };
        management.apply_stop(pos);
        let side = pos.side;
        let Some(order) = management.exit else {
            return Ok(CycleOutcome::Managed);
        };

        let outcome = self
            .venue
            .close(&self.instrument, side, order.quantity)
            .await?;

        let fill = match outcome {
            OrderOutcome::Rejected { reason } => {
                warn!(instrument = %self.instrument, %side, %reason, "close rejected");
                return Ok(CycleOutcome::Rejected(reason));
            }
            OrderOutcome::Filled(fill) => fill,
        };

        let Some(pos) = self.position.as_mut() else {
            return Ok(CycleOutcome::Managed);
        };
        let report = pos.apply_exit(order.kind, fill);
        if report.closed {
            self.position = None;
        }

        let now = Utc::now();
        info!(
            instrument = %self.instrument,
            %side,
            qty = report.fill.quantity,
            price = report.fill.price,
            pnl = report.pnl,
            closed = report.closed,
            "position reduced"
        );
        self.record(TradeEvent::exited(
            now,
            &self.instrument.symbol,
            side,
            &report,
            Origin::Monitor,
        ));
        Ok(CycleOutcome::Exited {
            closed: report.closed,
        })
    }

    fn record(&self, event: TradeEvent) {
        if let Err(e) = self.log.record(&event) {
            warn!(instrument = %self.instrument, error = %e, "trade log write failed");
        }
    }
}

struct Unit {
    cancel: CancellationToken,
    handle: JoinHandle<Option<Position>>,
}

/// Starts and stops one cancellable monitor task per instrument.
pub struct Supervisor {
    core: TradingCore,
    data: Arc<dyn MarketDataPort>,
    venue: Arc<dyn ExecutionPort>,
    log: Arc<dyn TradeLogPort>,
    settings: MonitorSettings,
    units: BTreeMap<Instrument, Unit>,
}

impl Supervisor {
    pub fn new(
        core: TradingCore,
        data: Arc<dyn MarketDataPort>,
        venue: Arc<dyn ExecutionPort>,
        log: Arc<dyn TradeLogPort>,
        settings: MonitorSettings,
    ) -> Self {
        Supervisor {
            core,
            data,
            venue,
            log,
            settings,
            units: BTreeMap::new(),
        }
    }

    /// Spawns a unit for every pair not already running. Returns how many
    /// were started.
    pub fn start(&mut self, pairs: &[Instrument]) -> usize {
        if pairs.is_empty() {
            warn!("no pairs to monitor");
            return 0;
        }

        let mut started = 0;
        for instrument in pairs {
            if self
                .units
                .get(instrument)
                .is_some_and(|unit| !unit.handle.is_finished())
            {
                debug!(%instrument, "already running");
                continue;
            }

            let cancel = CancellationToken::new();
            let monitor = InstrumentMonitor::new(
                instrument.clone(),
                self.core.clone(),
                Arc::clone(&self.data),
                Arc::clone(&self.venue),
                Arc::clone(&self.log),
                self.settings,
            );
            let handle = tokio::spawn(monitor.run(cancel.clone()));
            self.units.insert(instrument.clone(), Unit { cancel, handle });
            started += 1;
        }

        info!(started, total = self.units.len(), "monitors started");
        started
    }

    /// Cancels one unit and waits for it. Returns false if it was not known.
    pub async fn stop(&mut self, instrument: &Instrument) -> bool {
        match self.units.remove(instrument) {
            Some(unit) => {
                unit.cancel.cancel();
                Self::join(instrument, unit.handle).await;
                true
            }
            None => false,
        }
    }

    pub async fn stop_all(&mut self) {
        for unit in self.units.values() {
            unit.cancel.cancel();
        }
        let units = std::mem::take(&mut self.units);
        for (instrument, unit) in units {
            Self::join(&instrument, unit.handle).await;
        }
        info!("all monitors stopped");
    }

    pub fn is_running(&self) -> bool {
        self.units.values().any(|unit| !unit.handle.is_finished())
    }

    pub fn active_pairs(&self) -> Vec<Instrument> {
        self.units
            .iter()
            .filter(|(_, unit)| !unit.handle.is_finished())
            .map(|(instrument, _)| instrument.clone())
            .collect()
    }

    async fn join(instrument: &Instrument, handle: JoinHandle<Option<Position>>) {
        match handle.await {
            Ok(Some(position)) => warn!(
                %instrument,
                side = %position.side,
                qty = position.quantity,
                held_mins = (Utc::now() - position.opened_at).num_minutes(),
                "stopped with an open position"
            ),
            Ok(None) => {}
            Err(e) => error!(%instrument, error = %e, "monitor task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn config_defaults() {
        let config =
            FileConfigAdapter::from_string("[monitor]\npairs = BTC/USDT:15m\n").unwrap();
        let mc = MonitorConfig::from_config(&config).unwrap();
        assert_eq!(mc.mode, Mode::Paper);
        assert_eq!(mc.pairs, vec![Instrument::new("BTC/USDT", "15m")]);
        assert_eq!(mc.settings, MonitorSettings::default());
        assert_eq!(mc.lot_step, 0.000001);
    }

    #[test]
    fn config_reads_timings() {
        let config = FileConfigAdapter::from_string(
            "[monitor]\npairs = ETH/USDT:1h\npoll_secs = 5\nretry_secs = 2\nbar_limit = 300\nequity = 2500\n",
        )
        .unwrap();
        let mc = MonitorConfig::from_config(&config).unwrap();
        assert_eq!(mc.settings.poll, Duration::from_secs(5));
        assert_eq!(mc.settings.retry, Duration::from_secs(2));
        assert_eq!(mc.settings.bar_limit, 300);
        assert_eq!(mc.settings.equity, 2500.0);
    }

    #[test]
    fn live_mode_is_rejected() {
        let config = FileConfigAdapter::from_string("[monitor]\nmode = live\n").unwrap();
        assert!(matches!(
            MonitorConfig::from_config(&config),
            Err(TraderError::ConfigInvalid { ref key, .. }) if key == "mode"
        ));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let config = FileConfigAdapter::from_string("[monitor]\nmode = yolo\n").unwrap();
        assert!(MonitorConfig::from_config(&config).is_err());
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        let config = FileConfigAdapter::from_string("[monitor]\npairs = BTCUSDT\n").unwrap();
        assert!(matches!(
            MonitorConfig::from_config(&config),
            Err(TraderError::ConfigInvalid { ref key, .. }) if key == "pairs"
        ));
    }
}
