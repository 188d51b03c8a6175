//! Snapshot assembly and atomic publication
//!
//! Assembly is where rounding happens: every block of the document is
//! passed through its `rounded()` form exactly once, so upstream math
//! stays exact and the published JSON is presentation-ready.
//!
//! Publication is all-or-nothing per market. The document is written to a
//! temporary file in the target directory, fsynced, then renamed over the
//! previous snapshot, so a reader never observes a partial file and a
//! failed run leaves the previous snapshot in place.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use types::errors::PipelineError;
use types::metrics::{
    ChannelBreakdown, DailyMetrics, MetricsSnapshot, MovingAverage, MtdMetrics,
};

/// Assemble the published document from unrounded inputs.
pub fn build_snapshot(
    last_updated: DateTime<Utc>,
    market: types::ids::MarketCode,
    today: DailyMetrics,
    same_day_last_week: DailyMetrics,
    mtd: MtdMetrics,
    daily_history: Vec<DailyMetrics>,
    moving_averages: BTreeMap<String, MovingAverage>,
    channel_breakdown: ChannelBreakdown,
) -> MetricsSnapshot {
    MetricsSnapshot {
        last_updated,
        market,
        today: today.rounded(),
        same_day_last_week: same_day_last_week.rounded(),
        mtd: mtd.rounded(),
        daily_history: daily_history.iter().map(DailyMetrics::rounded).collect(),
        moving_averages: moving_averages
            .into_iter()
            .map(|(label, ma)| (label, ma.rounded()))
            .collect(),
        channel_breakdown: channel_breakdown.rounded(),
    }
}

/// Writes per-market snapshot files atomically.
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Publish `snapshot` as `<market>.json`, superseding any previous file.
    ///
    /// Write to tmp, fsync, rename. Nothing under `dir` changes if any
    /// step fails.
    pub fn write(&self, snapshot: &MetricsSnapshot) -> Result<PathBuf, PipelineError> {
        fs::create_dir_all(&self.dir)?;

        let data = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;

        let filename = format!("{}.json", snapshot.market.file_stem());
        let path = self.dir.join(&filename);
        let tmp_path = self.dir.join(format!("{filename}.tmp"));

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        info!(
            market = snapshot.market.as_str(),
            path = %path.display(),
            bytes = data.len(),
            "snapshot published"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::prelude::FromStr;
    use rust_decimal::Decimal;
    use tempfile::TempDir;
    use types::ids::MarketCode;
    use types::metrics::{MetricsSummary, SegmentShare};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn sample_snapshot() -> MetricsSnapshot {
        let mut metrics = MetricsSummary::zero();
        metrics.total_gmv = dec("12345.6789");
        metrics.orders = 10;
        metrics.aov = dec("1234.56789");

        let today = DailyMetrics {
            date: date(23),
            metrics: metrics.clone(),
        };

        let mut mas = BTreeMap::new();
        mas.insert(
            "ma_7d".to_string(),
            MovingAverage {
                window_days: 7,
                gmv: dec("100.123456"),
                orders: dec("3.14159"),
                aov: Decimal::ZERO,
                unique_buyers: Decimal::ZERO,
                frequency: Decimal::ZERO,
                gmv_per_vendor: Decimal::ZERO,
            },
        );

        build_snapshot(
            Utc.with_ymd_and_hms(2026, 8, 23, 2, 30, 0).unwrap(),
            MarketCode::new("PH"),
            today.clone(),
            DailyMetrics::zero(date(16)),
            MtdMetrics {
                start_date: date(1),
                end_date: date(23),
                metrics,
            },
            vec![DailyMetrics::zero(date(22)), today],
            mas,
            ChannelBreakdown {
                primary: SegmentShare {
                    buyers: 2,
                    share_pct: dec("66.666666"),
                },
                secondary: SegmentShare {
                    buyers: 1,
                    share_pct: dec("33.333334"),
                },
                total_buyers: 3,
            },
        )
    }

    #[test]
    fn test_assembly_rounds_every_block() {
        let snapshot = sample_snapshot();

        assert_eq!(snapshot.today.metrics.total_gmv, dec("12345.68"));
        assert_eq!(snapshot.mtd.metrics.aov, dec("1234.57"));
        assert_eq!(snapshot.daily_history[1].metrics.total_gmv, dec("12345.68"));
        assert_eq!(snapshot.moving_averages["ma_7d"].gmv, dec("100.12"));
        // Shares round to one decimal place
        assert_eq!(snapshot.channel_breakdown.primary.share_pct, dec("66.7"));
        assert_eq!(snapshot.channel_breakdown.secondary.share_pct, dec("33.3"));
    }

    #[test]
    fn test_write_then_read_back() {
        let tmp = TempDir::new().unwrap();
        let writer = SnapshotWriter::new(tmp.path());
        let snapshot = sample_snapshot();

        let path = writer.write(&snapshot).unwrap();
        assert_eq!(path.file_name().unwrap(), "ph.json");

        let raw = fs::read_to_string(&path).unwrap();
        let loaded: MetricsSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_write_supersedes_previous_snapshot() {
        let tmp = TempDir::new().unwrap();
        let writer = SnapshotWriter::new(tmp.path());

        let first = sample_snapshot();
        writer.write(&first).unwrap();

        let mut second = sample_snapshot();
        second.last_updated = Utc.with_ymd_and_hms(2026, 8, 24, 2, 30, 0).unwrap();
        let path = writer.write(&second).unwrap();

        let loaded: MetricsSnapshot =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.last_updated, second.last_updated);
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let tmp = TempDir::new().unwrap();
        let writer = SnapshotWriter::new(tmp.path());
        writer.write(&sample_snapshot()).unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["ph.json".to_string()]);
    }

    #[test]
    fn test_json_field_contract() {
        let snapshot = sample_snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();

        assert!(json.get("last_updated").is_some());
        assert_eq!(json["market"], "PH");
        assert!(json["today"].get("total_gmv").is_some());
        assert!(json["same_day_last_week"].get("date").is_some());
        assert!(json["mtd"].get("start_date").is_some());
        assert!(json["daily_history"].is_array());
        assert!(json["moving_averages"].get("ma_7d").is_some());
        assert!(json["channel_breakdown"]["primary"].get("share_pct").is_some());
    }

    #[test]
    fn test_markets_write_to_distinct_files() {
        let tmp = TempDir::new().unwrap();
        let writer = SnapshotWriter::new(tmp.path());

        let ph = sample_snapshot();
        let mut vn = sample_snapshot();
        vn.market = MarketCode::new("VN");

        writer.write(&ph).unwrap();
        writer.write(&vn).unwrap();

        assert!(tmp.path().join("ph.json").exists());
        assert!(tmp.path().join("vn.json").exists());
    }
}
