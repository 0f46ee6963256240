//! Average True Range with Wilder smoothing.
//!
//! TR[0] = high - low; seed = mean of the first n true ranges,
//! then ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n. First (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::invalid(IndicatorType::Atr(period), bars);
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut tr_sum = 0.0;
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };

        if i < period - 1 {
            tr_sum += tr;
            values.push(IndicatorPoint::invalid(bar.timestamp));
        } else if i == period - 1 {
            atr = (tr_sum + tr) / period as f64;
            values.push(IndicatorPoint::new(bar.timestamp, atr));
        } else {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
            values.push(IndicatorPoint::new(bar.timestamp, atr));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
