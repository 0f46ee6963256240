//! Performance metrics over an equity curve.

use serde::Serialize;

use crate::domain::trade::{TradeAction, TradeEvent};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub initial_equity: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub cagr: f64,
    pub fills: usize,
    pub closed_positions: usize,
    pub win_rate: f64,
}

/// Inputs that are not part of the curve itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsContext {
    pub initial_equity: f64,
    pub final_equity: f64,
    /// Elapsed calendar days, fractional.
    pub days: f64,
    /// Annual risk-free rate.
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
}

impl Metrics {
    pub fn compute(equity: &[f64], trades: &[TradeEvent], ctx: &MetricsContext) -> Self {
        let total_return = if ctx.initial_equity > 0.0 {
            (ctx.final_equity - ctx.initial_equity) / ctx.initial_equity
        } else {
            0.0
        };

        let per_period_rf = if ctx.periods_per_year > 0.0 {
            ctx.risk_free_rate / ctx.periods_per_year
        } else {
            0.0
        };

        let outcomes = position_outcomes(trades);
        let wins = outcomes.iter().filter(|&&pnl| pnl > 0.0).count();
        let win_rate = if outcomes.is_empty() {
            0.0
        } else {
            wins as f64 / outcomes.len() as f64
        };

        Metrics {
            initial_equity: ctx.initial_equity,
            final_equity: ctx.final_equity,
            total_return,
            max_drawdown: max_drawdown(equity),
            sharpe_ratio: sharpe_ratio(equity, per_period_rf, ctx.periods_per_year),
            cagr: cagr(ctx.initial_equity, ctx.final_equity, ctx.days),
            fills: trades.len(),
            closed_positions: outcomes.len(),
            win_rate,
        }
    }
}

/// Largest peak-to-trough fall as a fraction of the running peak.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let Some(&first) = equity.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in equity {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

/// Annualised Sharpe of per-step returns, population standard deviation.
pub fn sharpe_ratio(equity: &[f64], per_period_rf: f64, periods_per_year: f64) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }

    let excess: Vec<f64> = equity
        .windows(2)
        .map(|w| {
            let ret = if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 };
            ret - per_period_rf
        })
        .collect();

    let n = excess.len() as f64;
    let mean = excess.iter().sum::<f64>() / n;
    let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 && stddev.is_finite() {
        mean / stddev * periods_per_year.max(0.0).sqrt()
    } else {
        0.0
    }
}

/// `(final / initial)^(365 / days) - 1`. A wiped-out account reports -1.
pub fn cagr(initial: f64, final_value: f64, days: f64) -> f64 {
    if initial <= 0.0 || days <= 0.0 {
        return 0.0;
    }
    if final_value <= 0.0 {
        return -1.0;
    }
    (final_value / initial).powf(365.0 / days) - 1.0
}

/// Net PnL of every closed position: entry fee, partial closes and the final close.
pub fn position_outcomes(trades: &[TradeEvent]) -> Vec<f64> {
    let mut outcomes = Vec::new();
    let mut running = 0.0;
    for event in trades {
        match event.action {
            TradeAction::Open => running = -event.fee,
            TradeAction::PartialClose => running += event.pnl.unwrap_or(0.0),
            TradeAction::Close => {
                running += event.pnl.unwrap_or(0.0);
                outcomes.push(running);
                running = 0.0;
            }
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Side;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn event(action: TradeAction, fee: f64, pnl: Option<f64>) -> TradeEvent {
        TradeEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            symbol: "BTC/USDT".into(),
            side: Side::Long,
            action,
            quantity: 1.0,
            price: 100.0,
            notional: 100.0,
            fee,
            pnl,
            reason: String::new(),
        }
    }

    #[test]
    fn drawdown_example() {
        let dd = max_drawdown(&[10_000.0, 11_000.0, 9_000.0, 12_000.0]);
        assert_relative_eq!(dd, 2_000.0 / 11_000.0);
        assert!((dd - 0.1818).abs() < 1e-4);
    }

    #[test]
    fn drawdown_deepest_trough() {
        let dd = max_drawdown(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        assert_relative_eq!(dd, 30.0 / 110.0);
    }

    #[test]
    fn drawdown_empty_and_rising() {
        assert_eq!(max_drawdown(&[]), 0.0);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn sharpe_needs_two_samples_and_variance() {
        assert_eq!(sharpe_ratio(&[100.0], 0.0, 365.0), 0.0);
        assert_eq!(sharpe_ratio(&[100.0, 100.0, 100.0], 0.0, 365.0), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // returns +10%, -10%: mean 0, so Sharpe is zero
        assert_relative_eq!(sharpe_ratio(&[100.0, 110.0, 99.0], 0.0, 365.0), 0.0, epsilon = 1e-9);

        // returns 0.1 and 0.2 around mean 0.15, population stdev 0.05
        let s = sharpe_ratio(&[100.0, 110.0, 132.0], 0.0, 4.0);
        assert_relative_eq!(s, 0.15 / 0.05 * 2.0, epsilon = 1e-9);
    }

    #[test]
    fn sharpe_positive_for_rising_noisy_curve() {
        let curve: Vec<f64> = (0..100)
            .map(|i| 100.0 + i as f64 + if i % 2 == 0 { 0.5 } else { 0.0 })
            .collect();
        assert!(sharpe_ratio(&curve, 0.0, 365.0) > 0.0);
    }

    #[test]
    fn cagr_one_year_doubling() {
        assert_relative_eq!(cagr(100.0, 200.0, 365.0), 1.0);
    }

    #[test]
    fn cagr_degenerate_inputs() {
        assert_eq!(cagr(0.0, 200.0, 365.0), 0.0);
        assert_eq!(cagr(100.0, 200.0, 0.0), 0.0);
        assert_eq!(cagr(100.0, 0.0, 30.0), -1.0);
    }

    #[test]
    fn outcomes_group_partial_and_final_fills() {
        let trades = vec![
            event(TradeAction::Open, 1.0, None),
            event(TradeAction::PartialClose, 0.5, Some(10.0)),
            event(TradeAction::Close, 0.5, Some(-4.0)),
            event(TradeAction::Open, 1.0, None),
            event(TradeAction::Close, 0.5, Some(-3.0)),
        ];
        let outcomes = position_outcomes(&trades);
        assert_eq!(outcomes.len(), 2);
        assert_relative_eq!(outcomes[0], 5.0);
        assert_relative_eq!(outcomes[1], -4.0);
    }

    #[test]
    fn compute_summary() {
        let trades = vec![
            event(TradeAction::Open, 0.0, None),
            event(TradeAction::Close, 0.0, Some(100.0)),
            event(TradeAction::Open, 0.0, None),
            event(TradeAction::Close, 0.0, Some(-50.0)),
        ];
        let ctx = MetricsContext {
            initial_equity: 1_000.0,
            final_equity: 1_050.0,
            days: 10.0,
            risk_free_rate: 0.0,
            periods_per_year: 365.0,
        };
        let m = Metrics::compute(&[1_000.0, 1_100.0, 1_050.0], &trades, &ctx);
        assert_relative_eq!(m.total_return, 0.05);
        assert_eq!(m.fills, 4);
        assert_eq!(m.closed_positions, 2);
        assert_relative_eq!(m.win_rate, 0.5);
        assert!(m.cagr > 0.0);
    }
}
