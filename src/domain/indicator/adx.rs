//! Average Directional Index (Wilder).
//!
//! +DM/-DM and TR are Wilder-smoothed over n bars starting at bar 1, giving
//! +DI/-DI and DX from bar n onwards. ADX is seeded with the mean of the first
//! n DX values and smoothed like ATR afterwards, so the first valid point is
//! bar 2n-1.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

fn directional_movement(bar: &OhlcvBar, prev: &OhlcvBar) -> (f64, f64) {
    let up = bar.high - prev.high;
    let down = prev.low - bar.low;
    let plus = if up > down && up > 0.0 { up } else { 0.0 };
    let minus = if down > up && down > 0.0 { down } else { 0.0 };
    (plus, minus)
}

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries::invalid(IndicatorType::Adx(period), bars);
    }

    let n = period as f64;
    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint::invalid(bars[0].timestamp));

    let mut s_tr = 0.0;
    let mut s_plus = 0.0;
    let mut s_minus = 0.0;
    let mut dx_sum = 0.0;
    let mut adx = 0.0;

    for i in 1..bars.len() {
        let bar = &bars[i];
        let tr = bar.true_range(bars[i - 1].close);
        let (plus_dm, minus_dm) = directional_movement(bar, &bars[i - 1]);

        if i <= period {
            s_tr += tr;
            s_plus += plus_dm;
            s_minus += minus_dm;
        } else {
            s_tr = s_tr - s_tr / n + tr;
            s_plus = s_plus - s_plus / n + plus_dm;
            s_minus = s_minus - s_minus / n + minus_dm;
        }

        if i < period {
            values.push(IndicatorPoint::invalid(bar.timestamp));
            continue;
        }

        let (plus_di, minus_di) = if s_tr > 0.0 {
            (100.0 * s_plus / s_tr, 100.0 * s_minus / s_tr)
        } else {
            (0.0, 0.0)
        };
        let di_sum = plus_di + minus_di;
        let dx = if di_sum > 0.0 {
            100.0 * (plus_di - minus_di).abs() / di_sum
        } else {
            0.0
        };

        let seed_end = 2 * period - 1;
        if i < seed_end {
            dx_sum += dx;
            values.push(IndicatorPoint::invalid(bar.timestamp));
            continue;
        }
        adx = if i == seed_end {
            (dx_sum + dx) / n
        } else {
            (adx * (n - 1.0) + dx) / n
        };

        values.push(IndicatorPoint::new(bar.timestamp, adx));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values,
    }
}
