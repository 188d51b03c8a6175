//! Rolling averages over the daily metric series
//!
//! Each metric field is averaged independently over the most recent N
//! days. When fewer than N days of history exist, the effective window is
//! the available count (a 3-day average for a nominal 7-day window),
//! never a zero-padded divisor.

use rust_decimal::Decimal;
use tracing::warn;
use types::metrics::{DailyMetrics, MovingAverage};

/// Average the trailing `window` days of the series.
///
/// `history` must be ordered oldest to newest. Monetary fields average the
/// USD variants of the daily metrics.
pub fn moving_average(history: &[DailyMetrics], window: u32) -> MovingAverage {
    let nominal = window as usize;
    let effective = nominal.min(history.len());

    if effective == 0 {
        return MovingAverage::zero();
    }
    if effective < nominal {
        warn!(
            nominal = nominal,
            available = history.len(),
            "history shorter than nominal window; averaging available days"
        );
    }

    let recent = &history[history.len() - effective..];
    let divisor = Decimal::from(effective as u64);

    let mut gmv = Decimal::ZERO;
    let mut orders = Decimal::ZERO;
    let mut aov = Decimal::ZERO;
    let mut unique_buyers = Decimal::ZERO;
    let mut frequency = Decimal::ZERO;
    let mut gmv_per_vendor = Decimal::ZERO;

    for day in recent {
        gmv += day.metrics.total_gmv_usd;
        orders += Decimal::from(day.metrics.orders);
        aov += day.metrics.aov_usd;
        unique_buyers += Decimal::from(day.metrics.unique_buyers);
        frequency += day.metrics.frequency;
        gmv_per_vendor += day.metrics.gmv_per_vendor_usd;
    }

    MovingAverage {
        window_days: effective as u32,
        gmv: gmv / divisor,
        orders: orders / divisor,
        aov: aov / divisor,
        unique_buyers: unique_buyers / divisor,
        frequency: frequency / divisor,
        gmv_per_vendor: gmv_per_vendor / divisor,
    }
}
