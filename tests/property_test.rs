//! Property tests over random price walks.

mod common;

use common::*;
use proptest::prelude::*;
use trendtrader::domain::backtest::{BacktestConfig, run_backtest};
use trendtrader::domain::decision::TradingCore;
use trendtrader::domain::indicator::compute_features;
use trendtrader::domain::metrics::max_drawdown;
use trendtrader::domain::position::{Position, PositionState};
use trendtrader::domain::signal::Side;
use trendtrader::domain::trade::TradeAction;

/// Per-bar returns within ±2% and volumes around the average.
fn walk() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-0.02f64..0.02, 500.0f64..1_500.0), 20..150)
}

fn open_position(side: Side, entry: f64, stop: f64, tp: f64) -> Position {
    Position {
        side,
        quantity: 1.0,
        entry_price: entry,
        entry_fee: 0.0,
        stop_price: stop,
        tp_price: tp,
        state: PositionState::OpenFull,
        opened_at: bar_at(0, entry, entry, entry, 1.0).timestamp,
    }
}

proptest! {
    #[test]
    fn backtest_is_deterministic(steps in walk()) {
        let bars = random_walk(&steps);
        let config = BacktestConfig::default();
        let a = run_backtest("X", "15m", &bars, &small_params(), &config);
        let b = run_backtest("X", "15m", &bars, &small_params(), &config);
        match (a, b) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "runs disagree"),
        }
    }

    #[test]
    fn features_never_look_ahead(steps in walk(), cut in 1usize..150) {
        let bars = random_walk(&steps);
        let cut = cut.min(bars.len());
        let params = small_params();
        let full = compute_features(&bars, &params);
        let prefix = compute_features(&bars[..cut], &params);
        prop_assert_eq!(&full[..cut], &prefix[..]);
    }

    #[test]
    fn backtest_prefix_matches_until_its_last_bar(steps in walk(), cut in 10usize..150) {
        let bars = random_walk(&steps);
        let cut = cut.min(bars.len());
        let config = BacktestConfig::default();
        let (Ok(full), Ok(prefix)) = (
            run_backtest("X", "15m", &bars, &small_params(), &config),
            run_backtest("X", "15m", &bars[..cut], &small_params(), &config),
        ) else {
            return Ok(());
        };

        // the prefix run's last sample is replaced by its end-of-data close
        let settled = prefix.equity_curve.len() - 1;
        prop_assert_eq!(&full.equity_curve[..settled], &prefix.equity_curve[..settled]);

        let last_ts = bars[cut - 1].timestamp;
        let before = |t: &&trendtrader::domain::trade::TradeEvent| t.timestamp < last_ts;
        let full_early: Vec<_> = full.trades.iter().filter(before).collect();
        let prefix_early: Vec<_> = prefix.trades.iter().filter(before).collect();
        prop_assert_eq!(full_early, prefix_early);
    }

    #[test]
    fn trailing_stop_only_tightens(steps in walk(), short in any::<bool>()) {
        let bars = random_walk(&steps);
        let core = TradingCore::new(small_params());
        let features = compute_features(&bars, core.params());
        let entry = bars[0].close;
        let mut pos = if short {
            open_position(Side::Short, entry, entry * 1.05, entry * 0.9)
        } else {
            open_position(Side::Long, entry, entry * 0.95, entry * 1.1)
        };

        for row in &features {
            let before = pos.stop_price;
            core.manage(&pos, row).apply_stop(&mut pos);
            match pos.side {
                Side::Long => prop_assert!(pos.stop_price >= before),
                Side::Short => prop_assert!(pos.stop_price <= before),
            }
        }
    }

    #[test]
    fn every_unit_opened_is_closed(steps in walk()) {
        let bars = random_walk(&steps);
        let Ok(result) = run_backtest("X", "15m", &bars, &small_params(), &BacktestConfig::default()) else {
            return Ok(());
        };
        let mut open = 0.0;
        for t in &result.trades {
            prop_assert!(t.quantity > 0.0);
            match t.action {
                TradeAction::Open => open += t.quantity,
                TradeAction::PartialClose | TradeAction::Close => open -= t.quantity,
            }
            prop_assert!(open > -1e-9);
        }
        prop_assert!(open.abs() < 1e-9);
    }

    #[test]
    fn cash_and_equity_stay_non_negative(steps in walk()) {
        let bars = random_walk(&steps);
        let Ok(result) = run_backtest("X", "15m", &bars, &small_params(), &BacktestConfig::default()) else {
            return Ok(());
        };
        prop_assert!(result.final_cash >= 0.0);
        for point in &result.equity_curve {
            prop_assert!(point.equity >= 0.0);
        }
    }

    #[test]
    fn drawdown_is_a_fraction(curve in prop::collection::vec(1.0f64..1e6, 0..200)) {
        let dd = max_drawdown(&curve);
        prop_assert!((0.0..=1.0).contains(&dd));
    }
}
