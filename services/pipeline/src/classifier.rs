//! Mutually-exclusive buyer segmentation by acquisition channel
//!
//! A buyer who placed any order through a channel outside the designated
//! secondary-only set is labeled primary, no matter how many
//! secondary-channel orders they also placed; only buyers with exclusively
//! secondary-channel orders are labeled secondary. Every buyer lands in
//! exactly one label.
//!
//! The secondary share is computed as `100 - primary share`, so the two
//! unrounded shares sum to exactly 100 whenever there are buyers at all.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use types::metrics::{ChannelBreakdown, SegmentShare};
use types::order::{Channel, OrderRecord};

/// Partition the buyers observed in `records`.
///
/// `records` must already be restricted to the same filter set used for
/// the metrics (excluded statuses/vendors, channel policy).
pub fn classify(records: &[OrderRecord], secondary_channels: &BTreeSet<Channel>) -> ChannelBreakdown {
    // buyer -> has any non-secondary channel
    let mut buyers: BTreeMap<&types::ids::BuyerId, bool> = BTreeMap::new();

    for record in records {
        let is_primary_order = !secondary_channels.contains(&record.channel);
        let entry = buyers.entry(&record.buyer_id).or_insert(false);
        *entry = *entry || is_primary_order;
    }

    let total_buyers = buyers.len() as u64;
    let primary_count = buyers.values().filter(|primary| **primary).count() as u64;
    let secondary_count = total_buyers - primary_count;

    if total_buyers == 0 {
        return ChannelBreakdown::zero();
    }

    let hundred = Decimal::from(100u64);
    let primary_pct = Decimal::from(primary_count) * hundred / Decimal::from(total_buyers);
    let secondary_pct = hundred - primary_pct;

    ChannelBreakdown {
        primary: SegmentShare {
            buyers: primary_count,
            share_pct: primary_pct,
        },
        secondary: SegmentShare {
            buyers: secondary_count,
            share_pct: secondary_pct,
        },
        total_buyers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::prelude::FromStr;
    use types::ids::{BuyerId, MarketCode, OrderId, VendorId};
    use types::order::{OrderStatus, SourceKind};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn secondary_set() -> BTreeSet<Channel> {
        BTreeSet::from([Channel::cx_tlp()])
    }

    fn order(id: &str, buyer: &str, channel: Channel) -> OrderRecord {
        let placed = Utc.with_ymd_and_hms(2026, 8, 23, 4, 0, 0).unwrap();
        OrderRecord {
            order_id: OrderId::new(id),
            placed_at: placed,
            updated_at: placed,
            gross_value: Decimal::from(100),
            buyer_id: BuyerId::new(buyer),
            vendor_id: VendorId::new("v1"),
            status: OrderStatus::Delivered,
            channel,
            market: MarketCode::new("PH"),
            source: SourceKind::RecentActivity,
        }
    }

    #[test]
    fn test_any_primary_order_makes_buyer_primary() {
        // b1 orders through CX_TLP five times and B2B_APP once: primary
        let mut records = vec![order("O0", "b1", Channel::b2b_app())];
        for i in 1..=5 {
            records.push(order(&format!("O{i}"), "b1", Channel::cx_tlp()));
        }

        let breakdown = classify(&records, &secondary_set());
        assert_eq!(breakdown.primary.buyers, 1);
        assert_eq!(breakdown.secondary.buyers, 0);
    }

    #[test]
    fn test_exclusively_secondary_buyer_is_secondary() {
        let records = vec![
            order("O1", "b1", Channel::cx_tlp()),
            order("O2", "b1", Channel::cx_tlp()),
        ];
        let breakdown = classify(&records, &secondary_set());
        assert_eq!(breakdown.secondary.buyers, 1);
        assert_eq!(breakdown.primary.buyers, 0);
    }

    #[test]
    fn test_counts_partition_total() {
        let records = vec![
            order("O1", "b1", Channel::b2b_app()),
            order("O2", "b2", Channel::cx_tlp()),
            order("O3", "b3", Channel::b2b_web()),
            order("O4", "b3", Channel::cx_tlp()),
        ];
        let breakdown = classify(&records, &secondary_set());

        assert_eq!(breakdown.total_buyers, 3);
        assert_eq!(
            breakdown.primary.buyers + breakdown.secondary.buyers,
            breakdown.total_buyers
        );
    }

    #[test]
    fn test_shares_sum_to_exactly_100_before_rounding() {
        // 1 primary of 3 buyers: 33.33...% / 66.66...%
        let records = vec![
            order("O1", "b1", Channel::b2b_app()),
            order("O2", "b2", Channel::cx_tlp()),
            order("O3", "b3", Channel::cx_tlp()),
        ];
        let breakdown = classify(&records, &secondary_set());

        assert_eq!(
            breakdown.primary.share_pct + breakdown.secondary.share_pct,
            dec("100")
        );

        // After rounding, drift of ±0.1 is accepted
        let rounded = breakdown.rounded();
        let sum = rounded.primary.share_pct + rounded.secondary.share_pct;
        assert!((sum - dec("100")).abs() <= dec("0.1"), "sum was {sum}");
    }

    #[test]
    fn test_no_buyers_yields_zero_breakdown() {
        let breakdown = classify(&[], &secondary_set());
        assert_eq!(breakdown, ChannelBreakdown::zero());
    }
}
