//! Risk-based position sizing.

/// Notional (quote currency) such that hitting the stop loses
/// `equity * risk_fraction`, floored at `min_notional`.
///
/// Without a usable price or stop distance the percentage risk is undefined
/// and the minimum notional is returned instead.
pub fn size_from_risk(
    equity: f64,
    price: f64,
    stop_distance: f64,
    risk_fraction: f64,
    min_notional: f64,
) -> f64 {
    if price <= 0.0 || stop_distance <= 0.0 {
        return min_notional;
    }
    let stop_pct = stop_distance / price;
    if stop_pct <= 0.0 {
        return min_notional;
    }
    let at_risk = equity * risk_fraction;
    (at_risk / stop_pct).max(min_notional)
}
