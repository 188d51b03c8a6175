//! Source row adapters
//!
//! The two upstream sources describe the same orders with different field
//! names, status spellings and channel tags. Everything source-specific
//! lives here: normalizing raw rows into `OrderRecord`, and translating
//! the shared taxonomy back into each source's SQL literals for query
//! filters. The reconciler never sees a source-specific shape.

use crate::warehouse::Row;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;
use types::ids::{BuyerId, MarketCode, OrderId, VendorId};
use types::order::{Channel, OrderRecord, OrderStatus, SourceKind};

/// A row that cannot be normalized into an `OrderRecord`
///
/// Malformed rows are dropped and counted by the fetcher, not fatal on
/// their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("missing required field {0}")]
    Missing(&'static str),

    #[error("field {field} has unusable value: {value}")]
    Invalid { field: &'static str, value: String },
}

// ── Status taxonomy mapping ─────────────────────────────────────────

/// Normalize a recent-activity status string.
pub fn recent_status(raw: &str) -> OrderStatus {
    match raw.trim().to_uppercase().as_str() {
        "PLACED" => OrderStatus::Placed,
        "CONFIRMED" => OrderStatus::Confirmed,
        "DELIVERED" => OrderStatus::Delivered,
        "INVOICED" => OrderStatus::Invoiced,
        "PENDING" => OrderStatus::Pending,
        "PENDING_CANCELLATION" => OrderStatus::PendingCancellation,
        "CANCELLED" => OrderStatus::Cancelled,
        "DENIED" => OrderStatus::Denied,
        _ => OrderStatus::Unknown,
    }
}

/// SQL literal for a status in the recent-activity source.
pub fn recent_status_literal(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Placed => "PLACED",
        OrderStatus::Confirmed => "CONFIRMED",
        OrderStatus::Delivered => "DELIVERED",
        OrderStatus::Invoiced => "INVOICED",
        OrderStatus::Pending => "PENDING",
        OrderStatus::PendingCancellation => "PENDING_CANCELLATION",
        OrderStatus::Cancelled => "CANCELLED",
        OrderStatus::Denied => "DENIED",
        OrderStatus::Unknown => "UNKNOWN",
    }
}

/// Normalize a reconciled-history state string.
pub fn history_status(raw: &str) -> OrderStatus {
    match raw.trim().to_uppercase().as_str() {
        "CREATED" => OrderStatus::Placed,
        "ACKNOWLEDGED" => OrderStatus::Confirmed,
        "FULFILLED" => OrderStatus::Delivered,
        "BILLED" => OrderStatus::Invoiced,
        "OPEN" => OrderStatus::Pending,
        "VOID_REQUESTED" => OrderStatus::PendingCancellation,
        "VOID" => OrderStatus::Cancelled,
        "REJECTED" => OrderStatus::Denied,
        _ => OrderStatus::Unknown,
    }
}

/// SQL literal for a status in the reconciled-history source.
pub fn history_status_literal(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Placed => "CREATED",
        OrderStatus::Confirmed => "ACKNOWLEDGED",
        OrderStatus::Delivered => "FULFILLED",
        OrderStatus::Invoiced => "BILLED",
        OrderStatus::Pending => "OPEN",
        OrderStatus::PendingCancellation => "VOID_REQUESTED",
        OrderStatus::Cancelled => "VOID",
        OrderStatus::Denied => "REJECTED",
        OrderStatus::Unknown => "UNKNOWN",
    }
}

// ── Channel taxonomy mapping ────────────────────────────────────────

/// Normalize a reconciled-history channel tag into the shared taxonomy.
///
/// Tags outside the known mapping pass through normalized as-is.
pub fn history_channel(raw: &str) -> Channel {
    match raw.trim().to_uppercase().as_str() {
        "MOBILE_APP" => Channel::b2b_app(),
        "WEB_PORTAL" => Channel::b2b_web(),
        "TELESALES" => Channel::cx_tlp(),
        "FIELD_SALES" => Channel::salesman(),
        other => Channel::new(other),
    }
}

/// SQL literal for a shared-taxonomy channel in the history source.
pub fn history_channel_literal(channel: &Channel) -> String {
    match channel.as_str() {
        "B2B_APP" => "MOBILE_APP".to_string(),
        "B2B_WEB" => "WEB_PORTAL".to_string(),
        "CX_TLP" => "TELESALES".to_string(),
        "SALESMAN" => "FIELD_SALES".to_string(),
        other => other.to_string(),
    }
}

// ── Row normalization ───────────────────────────────────────────────

/// Normalize one recent-activity row.
///
/// Columns: `order_number`, `placement_date`, `load_timestamp_utc`,
/// `total`, `buyer_account_id`, `vendor_account_id`, `status`, `channel`.
pub fn parse_recent_row(row: &Row, market: &MarketCode) -> Result<OrderRecord, RowError> {
    Ok(OrderRecord {
        order_id: OrderId::new(str_field(row, "order_number")?),
        placed_at: timestamp_field(row, "placement_date")?,
        updated_at: timestamp_field(row, "load_timestamp_utc")?,
        gross_value: decimal_field(row, "total")?,
        buyer_id: BuyerId::new(str_field(row, "buyer_account_id")?),
        vendor_id: VendorId::new(str_field(row, "vendor_account_id")?),
        status: recent_status(str_field(row, "status")?),
        channel: Channel::new(str_field(row, "channel")?),
        market: market.clone(),
        source: SourceKind::RecentActivity,
    })
}

/// Normalize one reconciled-history row.
///
/// Columns: `order_ref`, `placed_ts`, `settled_ts`, `gross_total`,
/// `buyer_ref`, `seller_ref`, `state`, `sales_channel`.
pub fn parse_history_row(row: &Row, market: &MarketCode) -> Result<OrderRecord, RowError> {
    Ok(OrderRecord {
        order_id: OrderId::new(str_field(row, "order_ref")?),
        placed_at: timestamp_field(row, "placed_ts")?,
        updated_at: timestamp_field(row, "settled_ts")?,
        gross_value: decimal_field(row, "gross_total")?,
        buyer_id: BuyerId::new(str_field(row, "buyer_ref")?),
        vendor_id: VendorId::new(str_field(row, "seller_ref")?),
        status: history_status(str_field(row, "state")?),
        channel: history_channel(str_field(row, "sales_channel")?),
        market: market.clone(),
        source: SourceKind::ReconciledHistory,
    })
}

fn str_field<'a>(row: &'a Row, field: &'static str) -> Result<&'a str, RowError> {
    match row.get(field) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(serde_json::Value::Null) | None => Err(RowError::Missing(field)),
        Some(other) => Err(RowError::Invalid {
            field,
            value: other.to_string(),
        }),
    }
}

/// Numeric columns may arrive as JSON numbers or strings depending on the
/// warehouse driver; accept both.
fn decimal_field(row: &Row, field: &'static str) -> Result<Decimal, RowError> {
    let value = row.get(field).ok_or(RowError::Missing(field))?;
    let parsed = match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        serde_json::Value::Null => return Err(RowError::Missing(field)),
        _ => None,
    };
    parsed.ok_or_else(|| RowError::Invalid {
        field,
        value: value.to_string(),
    })
}

fn timestamp_field(row: &Row, field: &'static str) -> Result<DateTime<Utc>, RowError> {
    let raw = str_field(row, field)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RowError::Invalid {
            field,
            value: raw.to_string(),
        })
}
