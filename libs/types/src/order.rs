//! Canonical order records and source taxonomies
//!
//! Both upstream sources (the append-only recent-activity feed and the
//! reconciled-history fact table) are normalized into `OrderRecord` at the
//! fetch boundary; nothing downstream of the fetcher ever sees a
//! source-specific row shape.

use crate::ids::{BuyerId, MarketCode, OrderId, VendorId};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized order status shared by both sources
///
/// Each source carries its own spelling of these states; the fetch
/// adapters translate into this taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Confirmed,
    Delivered,
    Invoiced,
    Pending,
    PendingCancellation,
    Cancelled,
    Denied,
    /// Status string not present in either known taxonomy
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Statuses that never count toward business metrics.
    pub fn default_exclusions() -> Vec<OrderStatus> {
        vec![
            OrderStatus::Denied,
            OrderStatus::Cancelled,
            OrderStatus::PendingCancellation,
        ]
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Invoiced => "INVOICED",
            OrderStatus::Pending => "PENDING",
            OrderStatus::PendingCancellation => "PENDING_CANCELLATION",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Denied => "DENIED",
            OrderStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", label)
    }
}

/// Acquisition channel tag
///
/// Open-ended across markets, so modeled as a normalized (trimmed,
/// uppercased) string rather than a closed enum. Well-known tags get
/// constructors for call-site clarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Self-service mobile app orders
    pub fn b2b_app() -> Self {
        Self::new("B2B_APP")
    }

    /// Self-service web portal orders
    pub fn b2b_web() -> Self {
        Self::new("B2B_WEB")
    }

    /// Telesales-assisted orders
    pub fn cx_tlp() -> Self {
        Self::new("CX_TLP")
    }

    /// Field-rep-entered orders (excluded from analysis by default)
    pub fn salesman() -> Self {
        Self::new("SALESMAN")
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Which upstream source a record was normalized from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Append-only feed covering today (and stragglers from yesterday);
    /// may carry several rows per order id.
    RecentActivity,
    /// Periodically reconciled fact table; the settled state for any day
    /// strictly before today.
    ReconciledHistory,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::RecentActivity => write!(f, "recent_activity"),
            SourceKind::ReconciledHistory => write!(f, "reconciled_history"),
        }
    }
}

/// One transaction, normalized from either source
///
/// Immutable once constructed: created by the fetch adapters, collapsed by
/// the reconciler, consumed by the aggregator, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    /// Placement instant (UTC as stored upstream)
    pub placed_at: DateTime<Utc>,
    /// Warehouse load/update instant; dedup key within the append-only source
    pub updated_at: DateTime<Utc>,
    /// Gross value in the market's local currency
    pub gross_value: Decimal,
    pub buyer_id: BuyerId,
    pub vendor_id: VendorId,
    pub status: OrderStatus,
    pub channel: Channel,
    pub market: MarketCode,
    pub source: SourceKind,
}

impl OrderRecord {
    /// Calendar date of placement in the market's local timezone.
    pub fn local_date(&self, offset: FixedOffset) -> NaiveDate {
        self.placed_at.with_timezone(&offset).date_naive()
    }
}
