//! Rolling simple mean of bar volume.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::invalid(IndicatorType::VolumeSma(period), bars);
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        window_sum += bar.volume;
        if i >= period {
            window_sum -= bars[i - period].volume;
        }

        if i + 1 < period {
            values.push(IndicatorPoint::invalid(bar.timestamp));
        } else {
            values.push(IndicatorPoint::new(bar.timestamp, window_sum / period as f64));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::VolumeSma(period),
        values,
    }
}
