//! Deduplication and source merging
//!
//! The recent-activity source is append-only: one order identifier may
//! appear several times as the order moves through intermediate states.
//! Within that source the latest warehouse load timestamp wins, with ties
//! kept stable on input order. Where both sources carry the same
//! identifier (the day boundary), the reconciled-history row wins
//! unconditionally; it is the settled state.
//!
//! Output order is deterministic: records come back sorted by order
//! identifier (BTreeMap iteration), so identical inputs always produce an
//! identical canonical set.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::info;
use types::ids::OrderId;
use types::order::{OrderRecord, SourceKind};

/// Counters describing one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub recent_rows: u64,
    pub history_rows: u64,
    /// Same-source repeats collapsed by the latest-timestamp rule
    pub duplicates_collapsed: u64,
    /// Identifiers where a history row superseded a recent-activity row
    pub history_overrides: u64,
    pub canonical_records: u64,
}

/// Merge both sources into one canonical record per order identifier.
pub fn reconcile(
    recent: Vec<OrderRecord>,
    history: Vec<OrderRecord>,
) -> (Vec<OrderRecord>, ReconcileStats) {
    let mut stats = ReconcileStats {
        recent_rows: recent.len() as u64,
        history_rows: history.len() as u64,
        ..ReconcileStats::default()
    };

    let mut merged: BTreeMap<OrderId, OrderRecord> = BTreeMap::new();

    for record in recent {
        match merged.entry(record.order_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                stats.duplicates_collapsed += 1;
                // Strict comparison keeps the first-seen row on a tie
                if record.updated_at > slot.get().updated_at {
                    slot.insert(record);
                }
            }
        }
    }

    for record in history {
        match merged.entry(record.order_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().source == SourceKind::ReconciledHistory {
                    // Repeat within the history source itself
                    stats.duplicates_collapsed += 1;
                    if record.updated_at > slot.get().updated_at {
                        slot.insert(record);
                    }
                } else {
                    stats.history_overrides += 1;
                    slot.insert(record);
                }
            }
        }
    }

    stats.canonical_records = merged.len() as u64;
    info!(
        recent_rows = stats.recent_rows,
        history_rows = stats.history_rows,
        duplicates_collapsed = stats.duplicates_collapsed,
        history_overrides = stats.history_overrides,
        canonical_records = stats.canonical_records,
        "reconciliation complete"
    );

    (merged.into_values().collect(), stats)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;
    use types::ids::{BuyerId, MarketCode, VendorId};
    use types::order::{Channel, OrderStatus};

    fn make(id: u8, value: u32, updated_secs: u32, source: SourceKind) -> OrderRecord {
        OrderRecord {
            order_id: format!("ORD-{id}").as_str().into(),
            placed_at: Utc.with_ymd_and_hms(2026, 8, 23, 0, 0, 0).unwrap(),
            updated_at: Utc.timestamp_opt(1_787_000_000 + i64::from(updated_secs), 0).unwrap(),
            gross_value: Decimal::from(value),
            buyer_id: BuyerId::new("b"),
            vendor_id: VendorId::new("v"),
            status: OrderStatus::Delivered,
            channel: Channel::b2b_app(),
            market: MarketCode::new("PH"),
            source,
        }
    }

    proptest! {
        #[test]
        fn prop_no_duplicate_identifiers(
            recent in prop::collection::vec((0u8..8, 0u32..1000, 0u32..100_000), 0..40),
            history in prop::collection::vec((0u8..8, 0u32..1000, 0u32..100_000), 0..40),
        ) {
            let recent: Vec<_> = recent
                .into_iter()
                .map(|(id, v, ts)| make(id, v, ts, SourceKind::RecentActivity))
                .collect();
            let history: Vec<_> = history
                .into_iter()
                .map(|(id, v, ts)| make(id, v, ts, SourceKind::ReconciledHistory))
                .collect();

            let (canonical, _) = reconcile(recent, history);

            let ids: BTreeSet<_> = canonical.iter().map(|r| r.order_id.clone()).collect();
            prop_assert_eq!(ids.len(), canonical.len(), "identifiers must be unique");
        }

        #[test]
        fn prop_history_precedence_under_any_input_order(
            recent in prop::collection::vec((0u8..8, 0u32..1000, 0u32..100_000), 0..40),
            history_ids in prop::collection::btree_set(0u8..8, 0..8),
        ) {
            let recent: Vec<_> = recent
                .into_iter()
                .map(|(id, v, ts)| make(id, v, ts, SourceKind::RecentActivity))
                .collect();
            let history: Vec<_> = history_ids
                .iter()
                .map(|id| make(*id, 999, 0, SourceKind::ReconciledHistory))
                .collect();

            let (canonical, _) = reconcile(recent, history);

            for record in &canonical {
                let in_history = history_ids
                    .iter()
                    .any(|id| record.order_id.as_str() == format!("ORD-{id}"));
                if in_history {
                    prop_assert_eq!(record.source, SourceKind::ReconciledHistory);
                    prop_assert_eq!(record.gross_value, Decimal::from(999u32));
                }
            }
        }
    }
}
