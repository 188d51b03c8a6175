//! Derived metric documents
//!
//! Everything in this module is recomputed from the canonical record set on
//! every run; nothing is mutated incrementally. `MetricsSnapshot` is the
//! sole contract with the display layer; the previous snapshot is
//! superseded wholesale.
//!
//! All arithmetic upstream of these types is unrounded `Decimal`; rounding
//! happens exactly once, at snapshot assembly (2 decimal places for money
//! and ratios, 1 for percentage shares).

use crate::ids::MarketCode;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar business metrics for one set of canonical records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Sum of gross values in local currency
    pub total_gmv: Decimal,
    /// Local GMV divided by the market's static currency rate
    pub total_gmv_usd: Decimal,
    /// Count of distinct order identifiers
    pub orders: u64,
    pub unique_buyers: u64,
    pub unique_vendors: u64,
    /// GMV / orders; zero when there are no orders
    pub aov: Decimal,
    pub aov_usd: Decimal,
    /// Orders / unique buyers; zero when there are no buyers
    pub frequency: Decimal,
    /// GMV / unique vendors; zero when there are no vendors
    pub gmv_per_vendor: Decimal,
    pub gmv_per_vendor_usd: Decimal,
}

impl MetricsSummary {
    /// All-zero metrics, the valid result for an empty record set.
    pub fn zero() -> Self {
        Self {
            total_gmv: Decimal::ZERO,
            total_gmv_usd: Decimal::ZERO,
            orders: 0,
            unique_buyers: 0,
            unique_vendors: 0,
            aov: Decimal::ZERO,
            aov_usd: Decimal::ZERO,
            frequency: Decimal::ZERO,
            gmv_per_vendor: Decimal::ZERO,
            gmv_per_vendor_usd: Decimal::ZERO,
        }
    }

    /// Copy with monetary and ratio fields rounded to 2 decimal places.
    pub fn rounded(&self) -> Self {
        Self {
            total_gmv: self.total_gmv.round_dp(2),
            total_gmv_usd: self.total_gmv_usd.round_dp(2),
            orders: self.orders,
            unique_buyers: self.unique_buyers,
            unique_vendors: self.unique_vendors,
            aov: self.aov.round_dp(2),
            aov_usd: self.aov_usd.round_dp(2),
            frequency: self.frequency.round_dp(2),
            gmv_per_vendor: self.gmv_per_vendor.round_dp(2),
            gmv_per_vendor_usd: self.gmv_per_vendor_usd.round_dp(2),
        }
    }
}

/// Metrics for one calendar day in one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub metrics: MetricsSummary,
}

impl DailyMetrics {
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            metrics: MetricsSummary::zero(),
        }
    }

    pub fn rounded(&self) -> Self {
        Self {
            date: self.date,
            metrics: self.metrics.rounded(),
        }
    }
}

/// Month-to-date metrics block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtdMetrics {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub metrics: MetricsSummary,
}

impl MtdMetrics {
    pub fn rounded(&self) -> Self {
        Self {
            start_date: self.start_date,
            end_date: self.end_date,
            metrics: self.metrics.rounded(),
        }
    }
}

/// Trailing per-field averages over the daily series
///
/// Monetary fields average the USD variants of the daily metrics.
/// `window_days` is the effective window: the count of days actually
/// averaged, which is smaller than the nominal window while history is
/// still shorter than it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverage {
    pub window_days: u32,
    pub gmv: Decimal,
    pub orders: Decimal,
    pub aov: Decimal,
    pub unique_buyers: Decimal,
    pub frequency: Decimal,
    pub gmv_per_vendor: Decimal,
}

impl MovingAverage {
    /// The average over an empty history.
    pub fn zero() -> Self {
        Self {
            window_days: 0,
            gmv: Decimal::ZERO,
            orders: Decimal::ZERO,
            aov: Decimal::ZERO,
            unique_buyers: Decimal::ZERO,
            frequency: Decimal::ZERO,
            gmv_per_vendor: Decimal::ZERO,
        }
    }

    pub fn rounded(&self) -> Self {
        Self {
            window_days: self.window_days,
            gmv: self.gmv.round_dp(2),
            orders: self.orders.round_dp(2),
            aov: self.aov.round_dp(2),
            unique_buyers: self.unique_buyers.round_dp(2),
            frequency: self.frequency.round_dp(2),
            gmv_per_vendor: self.gmv_per_vendor.round_dp(2),
        }
    }
}

/// Buyer count and percentage share for one channel segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentShare {
    pub buyers: u64,
    pub share_pct: Decimal,
}

impl SegmentShare {
    pub fn zero() -> Self {
        Self {
            buyers: 0,
            share_pct: Decimal::ZERO,
        }
    }
}

/// Mutually-exclusive buyer segmentation by acquisition channel
///
/// Invariant: `primary.buyers + secondary.buyers == total_buyers`, and the
/// two unrounded shares sum to exactly 100 whenever `total_buyers > 0`.
/// After rounding to one decimal the sum may drift by ±0.1; that drift is
/// an accepted presentation artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBreakdown {
    pub primary: SegmentShare,
    pub secondary: SegmentShare,
    pub total_buyers: u64,
}

impl ChannelBreakdown {
    pub fn zero() -> Self {
        Self {
            primary: SegmentShare::zero(),
            secondary: SegmentShare::zero(),
            total_buyers: 0,
        }
    }

    /// Copy with shares rounded to 1 decimal place.
    pub fn rounded(&self) -> Self {
        Self {
            primary: SegmentShare {
                buyers: self.primary.buyers,
                share_pct: self.primary.share_pct.round_dp(1),
            },
            secondary: SegmentShare {
                buyers: self.secondary.buyers,
                share_pct: self.secondary.share_pct.round_dp(1),
            },
            total_buyers: self.total_buyers,
        }
    }
}

/// The published per-market document
///
/// One file per market; superseded atomically by each successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Completion instant of the run that produced this document
    pub last_updated: DateTime<Utc>,
    pub market: MarketCode,
    pub today: DailyMetrics,
    pub same_day_last_week: DailyMetrics,
    pub mtd: MtdMetrics,
    /// Oldest to newest, covering the configured trailing window
    pub daily_history: Vec<DailyMetrics>,
    /// Keyed by nominal window label, e.g. "ma_7d", "ma_30d"
    pub moving_averages: BTreeMap<String, MovingAverage>,
    pub channel_breakdown: ChannelBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_zero_summary_is_all_zero() {
        let z = MetricsSummary::zero();
        assert_eq!(z.total_gmv, Decimal::ZERO);
        assert_eq!(z.orders, 0);
        assert_eq!(z.aov, Decimal::ZERO);
    }

    #[test]
    fn test_rounding_is_presentation_only() {
        let mut s = MetricsSummary::zero();
        s.total_gmv = dec("1234.5678");
        s.frequency = dec("1.005");

        let r = s.rounded();
        assert_eq!(r.total_gmv, dec("1234.57"));
        // rust_decimal rounds half to even at the midpoint
        assert_eq!(r.frequency, dec("1.00"));
        // Original is untouched
        assert_eq!(s.total_gmv, dec("1234.5678"));
    }

    #[test]
    fn test_breakdown_share_rounding() {
        let b = ChannelBreakdown {
            primary: SegmentShare {
                buyers: 2,
                share_pct: dec("66.6666666"),
            },
            secondary: SegmentShare {
                buyers: 1,
                share_pct: dec("33.3333333"),
            },
            total_buyers: 3,
        };
        let r = b.rounded();
        assert_eq!(r.primary.share_pct, dec("66.7"));
        assert_eq!(r.secondary.share_pct, dec("33.3"));
        // Accepted ±0.1 drift after rounding
        assert_eq!(r.primary.share_pct + r.secondary.share_pct, dec("100.0"));
    }

    #[test]
    fn test_snapshot_serializes_with_flattened_metrics() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let daily = DailyMetrics::zero(date);
        let json = serde_json::to_value(&daily).unwrap();

        assert_eq!(json["date"], "2026-08-23");
        // Flattened, not nested under a "metrics" key
        assert_eq!(json["total_gmv"], "0");
        assert!(json.get("metrics").is_none());
    }

    #[test]
    fn test_moving_average_map_ordering() {
        let mut snapshot_mas = BTreeMap::new();
        snapshot_mas.insert("ma_7d".to_string(), MovingAverage::zero());
        snapshot_mas.insert("ma_30d".to_string(), MovingAverage::zero());

        // BTreeMap keeps key order deterministic across runs
        let keys: Vec<&str> = snapshot_mas.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["ma_30d", "ma_7d"]);
    }
}
