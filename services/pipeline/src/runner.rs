//! Per-market run orchestration
//!
//! One run per market: resolve windows, open a session, fetch both
//! sources, reconcile, aggregate, publish. Every failure before the final
//! rename is fatal for the market and leaves the previously published
//! snapshot in place; markets are isolated, so one market failing never
//! blocks another.

use crate::aggregator::{daily_rollup, summarize_all};
use crate::classifier::classify;
use crate::config::{MarketConfig, PipelineConfig};
use crate::connector::{connect_with_retry, RetrySchedule};
use crate::fetcher::{FetchWindow, RecordFetcher};
use crate::moving_average::moving_average;
use crate::reconciler::reconcile;
use crate::snapshot::{build_snapshot, SnapshotWriter};
use crate::warehouse::Warehouse;
use crate::window::{self, DateWindows};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use types::errors::PipelineError;
use types::metrics::{DailyMetrics, MtdMetrics};
use types::order::OrderRecord;
use uuid::Uuid;

/// Counters describing one completed market run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub market: types::ids::MarketCode,
    pub recent_rows_seen: u64,
    pub recent_rows_dropped: u64,
    pub history_rows_seen: u64,
    pub history_rows_dropped: u64,
    pub duplicates_collapsed: u64,
    pub history_overrides: u64,
    pub canonical_records: u64,
    pub snapshot_path: PathBuf,
}

/// One recent-activity fetch covers the whole trailing window; the today,
/// MTD and daily slices are all cut from the same canonical set.
fn recent_window(windows: &DateWindows) -> FetchWindow {
    FetchWindow::days(windows.history_start, windows.today)
}

/// History covers the trailing window up to and including yesterday. The
/// overlap with the recent span is deliberate: any day both sources carry
/// is settled in history's favor by the reconciler.
fn history_window(windows: &DateWindows) -> FetchWindow {
    let yesterday = windows.today - Duration::days(1);
    FetchWindow::days(windows.history_start, yesterday)
}

/// Same weekday last week, truncated at the same local wall-clock hour as
/// "now" so partial-day totals stay comparable.
fn last_week_window(windows: &DateWindows) -> FetchWindow {
    FetchWindow::days(windows.same_day_last_week, windows.same_day_last_week)
        .with_ceiling(windows.last_week_cutoff)
}

/// Execute the full pipeline for one market and publish its snapshot.
pub async fn run_market(
    warehouse: &dyn Warehouse,
    config: &PipelineConfig,
    market: &MarketConfig,
    now: DateTime<Utc>,
) -> Result<RunReport, PipelineError> {
    let run_id = Uuid::now_v7();
    let offset = market.offset();
    let windows = window::resolve(now, offset, config.history_days);

    info!(
        run_id = %run_id,
        market = market.code.as_str(),
        today = %windows.today,
        history_start = %windows.history_start,
        "starting market run"
    );

    let session = connect_with_retry(warehouse, &RetrySchedule::default()).await?;
    let fetcher = RecordFetcher::new(session.as_ref(), config.max_malformed_pct);

    let recent = fetcher.fetch_recent(market, &recent_window(&windows)).await?;
    let history = fetcher.fetch_history(market, &history_window(&windows)).await?;
    let last_week = fetcher.fetch_history(market, &last_week_window(&windows)).await?;

    let (canonical, stats) = reconcile(recent.records, history.records);
    // The last-week set comes from a single source but may still carry
    // repeats; run it through the same collapse.
    let (last_week_canonical, _) = reconcile(Vec::new(), last_week.records);

    let rate = market.currency_per_usd;

    let today_records: Vec<OrderRecord> = canonical
        .iter()
        .filter(|r| r.local_date(offset) == windows.today)
        .cloned()
        .collect();
    let mtd_records: Vec<OrderRecord> = canonical
        .iter()
        .filter(|r| {
            let date = r.local_date(offset);
            date >= windows.mtd_start && date <= windows.today
        })
        .cloned()
        .collect();

    let daily = daily_rollup(&canonical, windows.history_start, windows.today, offset, rate);

    let mut moving_averages = BTreeMap::new();
    for window_days in &config.ma_windows {
        moving_averages.insert(
            format!("ma_{window_days}d"),
            moving_average(&daily, *window_days),
        );
    }

    let breakdown = classify(&canonical, &market.secondary_channels);

    let snapshot = build_snapshot(
        Utc::now(),
        market.code.clone(),
        DailyMetrics {
            date: windows.today,
            metrics: summarize_all(&today_records, rate),
        },
        DailyMetrics {
            date: windows.same_day_last_week,
            metrics: summarize_all(&last_week_canonical, rate),
        },
        MtdMetrics {
            start_date: windows.mtd_start,
            end_date: windows.today,
            metrics: summarize_all(&mtd_records, rate),
        },
        daily,
        moving_averages,
        breakdown,
    );

    let writer = SnapshotWriter::new(&config.data_dir);
    let snapshot_path = writer.write(&snapshot)?;

    let report = RunReport {
        market: market.code.clone(),
        recent_rows_seen: recent.rows_seen,
        recent_rows_dropped: recent.rows_dropped,
        history_rows_seen: history.rows_seen,
        history_rows_dropped: history.rows_dropped,
        duplicates_collapsed: stats.duplicates_collapsed,
        history_overrides: stats.history_overrides,
        canonical_records: stats.canonical_records,
        snapshot_path,
    };

    info!(
        run_id = %run_id,
        market = report.market.as_str(),
        recent_rows = report.recent_rows_seen,
        history_rows = report.history_rows_seen,
        canonical_records = report.canonical_records,
        path = %report.snapshot_path.display(),
        "market run complete"
    );

    Ok(report)
}
