//! Metric reduction over canonical record sets
//!
//! All arithmetic is `Decimal` and unrounded; every ratio checks its
//! denominator and substitutes zero, so empty windows produce valid
//! all-zero metrics rather than errors or NaN.

use chrono::{FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use types::metrics::{DailyMetrics, MetricsSummary};
use types::order::OrderRecord;

/// `numerator / denominator`, or zero when the denominator is zero.
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Reduce a record set to scalar metrics.
///
/// `currency_per_usd` is the market's static conversion rate (units of
/// local currency per dollar).
pub fn summarize(records: &[&OrderRecord], currency_per_usd: Decimal) -> MetricsSummary {
    if records.is_empty() {
        return MetricsSummary::zero();
    }

    let mut total_gmv = Decimal::ZERO;
    let mut order_ids = BTreeSet::new();
    let mut buyers = BTreeSet::new();
    let mut vendors = BTreeSet::new();

    for record in records {
        total_gmv += record.gross_value;
        order_ids.insert(&record.order_id);
        buyers.insert(&record.buyer_id);
        vendors.insert(&record.vendor_id);
    }

    let orders = order_ids.len() as u64;
    let unique_buyers = buyers.len() as u64;
    let unique_vendors = vendors.len() as u64;

    let aov = ratio(total_gmv, Decimal::from(orders));
    let frequency = ratio(Decimal::from(orders), Decimal::from(unique_buyers));
    let gmv_per_vendor = ratio(total_gmv, Decimal::from(unique_vendors));

    MetricsSummary {
        total_gmv,
        total_gmv_usd: ratio(total_gmv, currency_per_usd),
        orders,
        unique_buyers,
        unique_vendors,
        aov,
        aov_usd: ratio(aov, currency_per_usd),
        frequency,
        gmv_per_vendor,
        gmv_per_vendor_usd: ratio(gmv_per_vendor, currency_per_usd),
    }
}

/// Owned-slice convenience over [`summarize`].
pub fn summarize_all(records: &[OrderRecord], currency_per_usd: Decimal) -> MetricsSummary {
    let refs: Vec<&OrderRecord> = records.iter().collect();
    summarize(&refs, currency_per_usd)
}

/// Per-day rollup over an inclusive date range.
///
/// Zero-fill policy: every calendar date in `start..=end` appears in the
/// output, with all-zero metrics when no orders fell on it. Dates are the
/// market's local calendar days.
pub fn daily_rollup(
    records: &[OrderRecord],
    start: NaiveDate,
    end: NaiveDate,
    offset: FixedOffset,
    currency_per_usd: Decimal,
) -> Vec<DailyMetrics> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&OrderRecord>> = BTreeMap::new();
    for record in records {
        by_day.entry(record.local_date(offset)).or_default().push(record);
    }

    start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| match by_day.get(&date) {
            Some(day_records) => DailyMetrics {
                date,
                metrics: summarize(day_records, currency_per_usd),
            },
            None => DailyMetrics::zero(date),
        })
        .collect()
}
