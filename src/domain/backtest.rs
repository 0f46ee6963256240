//! Historical simulation over a fixed bar array.
//!
//! Fills come from the [`CostModel`] at the bar's close. The rules
//! themselves live in [`TradingCore`] and are the same ones the monitor runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::decision::TradingCore;
use crate::domain::error::TraderError;
use crate::domain::execution::CostModel;
use crate::domain::indicator::compute_features;
use crate::domain::metrics::{Metrics, MetricsContext};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::{StrategyParams, config_value};
use crate::domain::portfolio::{Account, EquityPoint};
use crate::domain::position::Position;
use crate::domain::trade::{Origin, TradeEvent};
use crate::ports::config_port::ConfigPort;

pub const BACKTEST_SECTION: &str = "backtest";

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub costs: CostModel,
    /// Annual rate, spread evenly over `periods_per_year`.
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
    /// Most recent bars to load for a run.
    pub candles: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            costs: CostModel::default(),
            risk_free_rate: 0.0,
            periods_per_year: 365.0,
            candles: 2000,
        }
    }
}

impl BacktestConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let d = BacktestConfig::default();
        let s = BACKTEST_SECTION;
        Ok(BacktestConfig {
            initial_capital: config_value(config, s, "initial_capital", d.initial_capital)?,
            costs: CostModel {
                commission_rate: config_value(config, s, "commission", d.costs.commission_rate)?,
                slippage_rate: config_value(config, s, "slippage", d.costs.slippage_rate)?,
            },
            risk_free_rate: config_value(config, s, "risk_free_rate", d.risk_free_rate)?,
            periods_per_year: config_value(config, s, "periods_per_year", d.periods_per_year)?,
            candles: config_value(config, s, "candles", d.candles)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub timeframe: String,
    pub trades: Vec<TradeEvent>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_cash: f64,
    pub metrics: Metrics,
}

pub fn run_backtest(
    symbol: &str,
    timeframe: &str,
    bars: &[OhlcvBar],
    params: &StrategyParams,
    config: &BacktestConfig,
) -> Result<BacktestResult, TraderError> {
    let core = TradingCore::new(params.clone());
    let warmup = core.warmup();

    if bars.is_empty() {
        return Err(TraderError::NoData {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
        });
    }
    if bars.len() <= warmup {
        return Err(TraderError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum: warmup,
        });
    }

    info!(
        symbol,
        timeframe,
        bars = bars.len(),
        warmup,
        capital = config.initial_capital,
        "starting backtest"
    );

    let features = compute_features(bars, params);
    let costs = config.costs;
    let mut account = Account::new(config.initial_capital);
    let mut position: Option<Position> = None;
    let mut trades = Vec::new();

    for i in warmup..features.len() {
        let window = &features[..=i];
        let row = &features[i];
        let price = row.close();
        let ts = row.timestamp();

        let plan = core.decide(position.as_ref(), window, account.cash);

        if let (Some(pos), Some(management)) = (position.as_mut(), plan.management.as_ref()) {
            management.apply_stop(pos);

            if let Some(order) = management.exit {
                let fill = costs.exit_fill(pos.side, order.reference_price, order.quantity);
                let report = pos.apply_exit(order.kind, fill);
                account.credit_exit(pos, &report.fill);
                debug!(symbol, side = %pos.side, qty = report.fill.quantity, price = report.fill.price, pnl = report.pnl, "backtest exit");
                trades.push(TradeEvent::exited(ts, symbol, pos.side, &report, Origin::Backtest));
                if report.closed {
                    position = None;
                }
            }
        }

        if let Some(signal) = plan.entry_if_flat(position.as_ref()) {
            if let Some(fill) =
                costs.affordable_entry(signal.side, price, signal.notional, account.cash)
            {
                account.debit_entry(&fill);
                debug!(symbol, side = %signal.side, qty = fill.quantity, price = fill.price, stop = signal.stop_price, "backtest entry");
                trades.push(TradeEvent::opened(ts, symbol, signal.side, &fill, Origin::Backtest));
                position = Some(Position::open(signal, &fill, ts));
            }
        }

        let equity = account.equity(position.as_ref(), price);
        account.record_equity(ts, equity);
    }

    if let (Some(mut pos), Some(last)) = (position.take(), features.last()) {
        let order = pos.end_of_data(last.close());
        let fill = costs.unslipped_fill(order.reference_price, order.quantity);
        let report = pos.apply_exit(order.kind, fill);
        account.credit_exit(&pos, &report.fill);
        trades.push(TradeEvent::exited(
            last.timestamp(),
            symbol,
            pos.side,
            &report,
            Origin::Backtest,
        ));
        account.overwrite_last_equity(last.timestamp(), account.cash);
    }

    let final_cash = account.cash;
    let mut curve: Vec<f64> = account.equity_curve.iter().map(|p| p.equity).collect();
    if curve.is_empty() {
        curve = vec![config.initial_capital, final_cash];
    }

    let metrics = Metrics::compute(
        &curve,
        &trades,
        &MetricsContext {
            initial_equity: config.initial_capital,
            final_equity: final_cash,
            days: elapsed_days(bars[0].timestamp, bars[bars.len() - 1].timestamp),
            risk_free_rate: config.risk_free_rate,
            periods_per_year: config.periods_per_year,
        },
    );

    info!(
        symbol,
        timeframe,
        fills = trades.len(),
        final_cash,
        total_return = metrics.total_return,
        "backtest finished"
    );

    Ok(BacktestResult {
        symbol: symbol.to_string(),
        timeframe: timeframe.to_string(),
        trades,
        equity_curve: account.equity_curve,
        final_cash,
        metrics,
    })
}

fn elapsed_days(first: DateTime<Utc>, last: DateTime<Utc>) -> f64 {
    (last - first).num_seconds() as f64 / 86_400.0
}
