//! Parameterized range queries against the two source tables
//!
//! Builds and executes the recent-activity and reconciled-history queries,
//! then normalizes raw rows through the source adapters. Malformed rows
//! are dropped and counted; the run aborts only when the drop rate exceeds
//! the configured threshold, so a corrupted extract can never publish
//! misleading near-zero metrics.

use crate::adapter;
use crate::config::{ChannelPolicy, MarketConfig};
use crate::warehouse::{Row, WarehouseSession};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};
use types::errors::PipelineError;
use types::ids::MarketCode;
use types::order::OrderRecord;

/// Inclusive date range plus the optional hour ceiling
#[derive(Debug, Clone)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Truncate to this local wall-clock instant (same-time-last-week
    /// comparisons)
    pub hour_ceiling: Option<NaiveDateTime>,
}

impl FetchWindow {
    pub fn days(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            hour_ceiling: None,
        }
    }

    pub fn with_ceiling(mut self, ceiling: NaiveDateTime) -> Self {
        self.hour_ceiling = Some(ceiling);
        self
    }
}

/// Result of one source fetch
#[derive(Debug)]
pub struct FetchOutcome {
    pub records: Vec<OrderRecord>,
    pub rows_seen: u64,
    pub rows_dropped: u64,
}

impl FetchOutcome {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            rows_seen: 0,
            rows_dropped: 0,
        }
    }
}

/// Issues the two query categories against an established session
pub struct RecordFetcher<'a> {
    session: &'a dyn WarehouseSession,
    max_malformed_pct: u32,
}

impl<'a> RecordFetcher<'a> {
    pub fn new(session: &'a dyn WarehouseSession, max_malformed_pct: u32) -> Self {
        Self {
            session,
            max_malformed_pct,
        }
    }

    /// Fetch from the append-only recent-activity source.
    ///
    /// Rows may repeat per order identifier; the reconciler collapses them.
    pub async fn fetch_recent(
        &self,
        market: &MarketConfig,
        window: &FetchWindow,
    ) -> Result<FetchOutcome, PipelineError> {
        if window.start > window.end {
            return Ok(FetchOutcome::empty());
        }

        let statement = recent_query(market, window);
        let rows = self.execute(&market.recent_table, &statement).await?;
        self.decode(&market.recent_table, &market.code, rows, adapter::parse_recent_row)
    }

    /// Fetch from the reconciled-history source.
    ///
    /// The caller is responsible for bounding the window strictly before
    /// today; an inverted window yields an empty outcome without a query.
    pub async fn fetch_history(
        &self,
        market: &MarketConfig,
        window: &FetchWindow,
    ) -> Result<FetchOutcome, PipelineError> {
        if window.start > window.end {
            return Ok(FetchOutcome::empty());
        }

        let statement = history_query(market, window);
        let rows = self.execute(&market.history_table, &statement).await?;
        self.decode(&market.history_table, &market.code, rows, adapter::parse_history_row)
    }

    async fn execute(&self, table: &str, statement: &str) -> Result<Vec<Row>, PipelineError> {
        debug!(table, statement, "executing source query");
        self.session
            .execute(statement)
            .await
            .map_err(|err| PipelineError::Query {
                table: table.to_string(),
                message: err.to_string(),
            })
    }

    fn decode(
        &self,
        table: &str,
        market: &MarketCode,
        rows: Vec<Row>,
        parse: fn(&Row, &MarketCode) -> Result<OrderRecord, adapter::RowError>,
    ) -> Result<FetchOutcome, PipelineError> {
        let rows_seen = rows.len() as u64;
        let mut records = Vec::with_capacity(rows.len());
        let mut rows_dropped = 0u64;

        for row in &rows {
            match parse(row, market) {
                Ok(record) => records.push(record),
                Err(err) => {
                    rows_dropped += 1;
                    warn!(table, error = %err, "dropping malformed row");
                }
            }
        }

        // Integer comparison: dropped/seen > threshold/100
        if rows_dropped * 100 > rows_seen * u64::from(self.max_malformed_pct) {
            return Err(PipelineError::MalformedRowRate {
                dropped: rows_dropped,
                total: rows_seen,
                threshold_pct: self.max_malformed_pct,
            });
        }

        info!(table, rows_seen, rows_dropped, "source fetch decoded");
        Ok(FetchOutcome {
            records,
            rows_seen,
            rows_dropped,
        })
    }
}

// ── Query construction ──────────────────────────────────────────────

fn local_day(column: &str, offset_hours: i32) -> String {
    format!("TO_DATE({column} + INTERVAL {offset_hours} HOUR)")
}

fn quoted(values: impl IntoIterator<Item = String>) -> String {
    values
        .into_iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Recent-activity query: market column filter, local-day range, status and
/// vendor exclusions, channel policy, optional hour ceiling.
pub(crate) fn recent_query(market: &MarketConfig, window: &FetchWindow) -> String {
    let day = local_day("placement_date", market.utc_offset_hours);
    let mut q = format!(
        "SELECT order_number, placement_date, load_timestamp_utc, total, \
         buyer_account_id, vendor_account_id, status, channel \
         FROM {table} \
         WHERE country = '{code}' \
         AND {day} >= '{start}' AND {day} <= '{end}'",
        table = market.recent_table,
        code = market.code,
        start = window.start,
        end = window.end,
    );

    if !market.excluded_statuses.is_empty() {
        let list = quoted(
            market
                .excluded_statuses
                .iter()
                .map(|s| adapter::recent_status_literal(*s).to_string()),
        );
        q.push_str(&format!(" AND status NOT IN ({list})"));
    }

    for pattern in &market.excluded_vendor_patterns {
        q.push_str(&format!(" AND vendor_account_id NOT LIKE '{pattern}'"));
    }

    match &market.channel_policy {
        ChannelPolicy::Deny(set) if !set.is_empty() => {
            let list = quoted(set.iter().map(|c| c.as_str().to_string()));
            q.push_str(&format!(" AND channel NOT IN ({list})"));
        }
        ChannelPolicy::Allow(set) => {
            let list = quoted(set.iter().map(|c| c.as_str().to_string()));
            q.push_str(&format!(" AND channel IN ({list})"));
        }
        ChannelPolicy::Deny(_) => {}
    }

    if let Some(ceiling) = window.hour_ceiling {
        q.push_str(&format!(
            " AND placement_date + INTERVAL {offset} HOUR <= '{cutoff}'",
            offset = market.utc_offset_hours,
            cutoff = ceiling.format("%Y-%m-%d %H:%M:%S"),
        ));
    }

    q
}

/// Reconciled-history query: the gold table is per-market with its own
/// field names and taxonomies, so filters are spelled in that vocabulary.
pub(crate) fn history_query(market: &MarketConfig, window: &FetchWindow) -> String {
    let day = local_day("placed_ts", market.utc_offset_hours);
    let mut q = format!(
        "SELECT order_ref, placed_ts, settled_ts, gross_total, \
         buyer_ref, seller_ref, state, sales_channel \
         FROM {table} \
         WHERE {day} >= '{start}' AND {day} <= '{end}'",
        table = market.history_table,
        start = window.start,
        end = window.end,
    );

    if !market.excluded_statuses.is_empty() {
        let list = quoted(
            market
                .excluded_statuses
                .iter()
                .map(|s| adapter::history_status_literal(*s).to_string()),
        );
        q.push_str(&format!(" AND state NOT IN ({list})"));
    }

    for pattern in &market.excluded_vendor_patterns {
        q.push_str(&format!(" AND seller_ref NOT LIKE '{pattern}'"));
    }

    match &market.channel_policy {
        ChannelPolicy::Deny(set) if !set.is_empty() => {
            let list = quoted(set.iter().map(adapter::history_channel_literal));
            q.push_str(&format!(" AND sales_channel NOT IN ({list})"));
        }
        ChannelPolicy::Allow(set) => {
            let list = quoted(set.iter().map(adapter::history_channel_literal));
            q.push_str(&format!(" AND sales_channel IN ({list})"));
        }
        ChannelPolicy::Deny(_) => {}
    }

    if let Some(ceiling) = window.hour_ceiling {
        q.push_str(&format!(
            " AND placed_ts + INTERVAL {offset} HOUR <= '{cutoff}'",
            offset = market.utc_offset_hours,
            cutoff = ceiling.format("%Y-%m-%d %H:%M:%S"),
        ));
    }

    q
}
