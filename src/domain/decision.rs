//! The trading rules shared by the backtest and the live/paper monitor.
//!
//! Deciding never mutates anything and never prices a fill. Drivers apply
//! the returned stop immediately, then price any exit or entry their own
//! way (cost model or venue) and apply accepted fills to the position.

use crate::domain::indicator::FeatureBar;
use crate::domain::params::StrategyParams;
use crate::domain::position::{ExitOrder, Position};
use crate::domain::signal::{EntrySignal, Signal, generate_signal};

/// What to do with an open position on the latest bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Management {
    /// Ratcheted stop, already used to evaluate `exit`.
    pub stop_price: f64,
    pub exit: Option<ExitOrder>,
}

impl Management {
    pub fn apply_stop(&self, position: &mut Position) {
        position.ratchet_stop(self.stop_price);
    }
}

/// Everything the rules want done on one bar, in order: manage the position
/// held at the start of the bar, then enter if the book is flat afterwards.
///
/// Both are evaluated up front from the same window, so a position closed on
/// this bar can be replaced on this bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPlan {
    /// Present when a position was open at the start of the bar.
    pub management: Option<Management>,
    pub entry: Signal,
}

impl BarPlan {
    /// The entry to place given the position after management was applied.
    /// `None` while a position is still held or the signal says hold.
    pub fn entry_if_flat(&self, position: Option<&Position>) -> Option<&EntrySignal> {
        match position {
            Some(_) => None,
            None => self.entry.as_entry(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradingCore {
    params: StrategyParams,
}

impl TradingCore {
    pub fn new(params: StrategyParams) -> Self {
        TradingCore { params }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn warmup(&self) -> usize {
        self.params.warmup()
    }

    /// Plans the latest bar of `window`. `equity` sizes the entry.
    pub fn decide(&self, position: Option<&Position>, window: &[FeatureBar], equity: f64) -> BarPlan {
        let management = match (position, window.last()) {
            (None, _) => None,
            (Some(pos), Some(row)) => Some(self.manage(pos, row)),
            (Some(pos), None) => Some(Management {
                stop_price: pos.stop_price,
                exit: None,
            }),
        };
        BarPlan {
            management,
            entry: self.entry(window, equity),
        }
    }

    pub fn entry(&self, window: &[FeatureBar], equity: f64) -> Signal {
        generate_signal(window, equity, &self.params)
    }

    /// Trails the stop from the bar's close, then checks exits against it.
    pub fn manage(&self, position: &Position, row: &FeatureBar) -> Management {
        let price = row.close();
        let mut next = position.clone();
        next.ratchet_stop(position.trailed_stop(price, row.atr, self.params.atr_mult_trail));
        Management {
            stop_price: next.stop_price,
            exit: next.evaluate(price, self.params.partial_tp_ratio),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::Fill;
    use crate::domain::position::ExitKind;
    use crate::domain::position::test_support::position;
    use crate::domain::signal::Side;
    use crate::domain::signal::test_support::long_row;
    use approx::assert_relative_eq;

    fn core() -> TradingCore {
        TradingCore::new(StrategyParams::default())
    }

    #[test]
    fn flat_defers_to_signal() {
        let plan = core().decide(None, &[long_row()], 10_000.0);
        assert!(plan.management.is_none());
        assert_eq!(plan.entry_if_flat(None).unwrap().side, Side::Long);
    }

    #[test]
    fn manage_trails_before_evaluating() {
        // close 100, atr 2, trail mult 2 -> candidate stop 96
        let pos = position(Side::Long, 1.0, 90.0, 92.0, 150.0);
        let m = core()
            .decide(Some(&pos), &[long_row()], 10_000.0)
            .management
            .unwrap();
        assert_relative_eq!(m.stop_price, 96.0);
        assert!(m.exit.is_none());
    }

    #[test]
    fn deciding_does_not_mutate() {
        let pos = position(Side::Long, 1.0, 90.0, 92.0, 150.0);
        let before = pos.clone();
        let _ = core().decide(Some(&pos), &[long_row()], 10_000.0);
        assert_eq!(pos, before);
    }

    #[test]
    fn apply_stop_never_loosens() {
        let mut pos = position(Side::Long, 1.0, 90.0, 99.0, 150.0);
        let m = core().manage(&pos, &long_row());
        m.apply_stop(&mut pos);
        assert_relative_eq!(pos.stop_price, 99.0);
    }

    #[test]
    fn stop_through_price_exits_fully() {
        let pos = position(Side::Long, 2.0, 105.0, 101.0, 110.0);
        let m = core().manage(&pos, &long_row());
        let exit = m.exit.unwrap();
        assert_eq!(exit.kind, ExitKind::StopHit);
        assert_relative_eq!(exit.quantity, 2.0);
    }

    #[test]
    fn open_position_on_empty_window_keeps_stop() {
        let pos = position(Side::Short, 1.0, 100.0, 103.0, 97.0);
        assert_eq!(
            core().decide(Some(&pos), &[], 10_000.0).management,
            Some(Management {
                stop_price: 103.0,
                exit: None
            })
        );
    }

    #[test]
    fn entry_waits_while_a_position_is_held() {
        let pos = position(Side::Long, 1.0, 90.0, 92.0, 150.0);
        let plan = core().decide(Some(&pos), &[long_row()], 10_000.0);
        assert!(plan.entry.as_entry().is_some());
        assert!(plan.entry_if_flat(Some(&pos)).is_none());
    }

    #[test]
    fn stopped_out_position_can_be_replaced_on_the_same_bar() {
        let mut pos = position(Side::Long, 2.0, 105.0, 101.0, 110.0);
        let plan = core().decide(Some(&pos), &[long_row()], 10_000.0);
        let exit = plan.management.unwrap().exit.unwrap();
        assert_eq!(exit.kind, ExitKind::StopHit);

        let report = pos.apply_exit(exit.kind, Fill { quantity: 2.0, price: 100.0, fee: 0.0 });
        assert!(report.closed);
        assert_eq!(plan.entry_if_flat(None).unwrap().side, Side::Long);
    }
}
