//! Pipeline configuration
//!
//! Run-level settings come from environment variables with defaults;
//! per-market settings (offset, currency rate, table names, filter policy)
//! are immutable configuration handed explicitly to the components that
//! need them, never ambient global state, so markets can carry different
//! rates and channel policies without coupling.

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use types::ids::MarketCode;
use types::order::{Channel, OrderStatus};

/// Channel filter applied to both source queries
///
/// Deny-listed markets exclude the named channels and keep everything
/// else; allow-listed markets keep only the named channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelPolicy {
    Deny(BTreeSet<Channel>),
    Allow(BTreeSet<Channel>),
}

impl ChannelPolicy {
    pub fn permits(&self, channel: &Channel) -> bool {
        match self {
            ChannelPolicy::Deny(set) => !set.contains(channel),
            ChannelPolicy::Allow(set) => set.contains(channel),
        }
    }
}

/// Static per-market configuration
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub code: MarketCode,
    /// Whole-hour UTC offset of the market's local time
    pub utc_offset_hours: i32,
    /// Units of local currency per 1 USD (static, not fetched)
    pub currency_per_usd: Decimal,
    /// Append-only recent-activity table
    pub recent_table: String,
    /// Periodically reconciled history (gold) table
    pub history_table: String,
    pub channel_policy: ChannelPolicy,
    pub excluded_statuses: Vec<OrderStatus>,
    /// SQL LIKE patterns marking test/dummy vendor accounts
    pub excluded_vendor_patterns: Vec<String>,
    /// Channels whose exclusive use marks a buyer as "secondary"
    pub secondary_channels: BTreeSet<Channel>,
}

impl MarketConfig {
    pub fn offset(&self) -> chrono::FixedOffset {
        chrono::FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .expect("market UTC offset is within a day")
    }

    /// Philippines: UTC+8, PHP pegged at the static reporting rate.
    pub fn philippines() -> Self {
        Self {
            code: MarketCode::new("PH"),
            utc_offset_hours: 8,
            currency_per_usd: Decimal::from_str_exact("56.017").unwrap(),
            recent_table: "silver.ph_daily_orders_consolidated".to_string(),
            history_table: "gold.ph_orders_reconciled".to_string(),
            channel_policy: ChannelPolicy::Deny(BTreeSet::from([Channel::salesman()])),
            excluded_statuses: OrderStatus::default_exclusions(),
            excluded_vendor_patterns: vec!["%TEST%".to_string(), "%DUMMY%".to_string()],
            secondary_channels: BTreeSet::from([Channel::cx_tlp()]),
        }
    }

    /// Vietnam: UTC+7, VND at the static reporting rate.
    pub fn vietnam() -> Self {
        Self {
            code: MarketCode::new("VN"),
            utc_offset_hours: 7,
            currency_per_usd: Decimal::from_str_exact("26416").unwrap(),
            recent_table: "silver.vn_daily_orders_consolidated".to_string(),
            history_table: "gold.vn_orders_reconciled".to_string(),
            channel_policy: ChannelPolicy::Deny(BTreeSet::from([Channel::salesman()])),
            excluded_statuses: OrderStatus::default_exclusions(),
            excluded_vendor_patterns: vec!["%TEST%".to_string(), "%DUMMY%".to_string()],
            secondary_channels: BTreeSet::from([Channel::cx_tlp()]),
        }
    }
}

/// Run-level configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory the per-market snapshot files are published into
    pub data_dir: PathBuf,
    /// Inclusive length of the trailing daily-history window
    pub history_days: u32,
    /// Nominal moving-average windows, in days
    pub ma_windows: Vec<u32>,
    /// Abort a run when more than this percentage of rows is malformed
    pub max_malformed_pct: u32,
    pub warehouse_url: String,
    pub warehouse_token: String,
    pub markets: Vec<MarketConfig>,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `METRICS_DATA_DIR` (default: data)
    /// - `METRICS_HISTORY_DAYS` (default: 60)
    /// - `METRICS_MA_WINDOWS` (default: 7,30)
    /// - `METRICS_MAX_MALFORMED_PCT` (default: 5)
    /// - `WAREHOUSE_URL` (default: http://localhost:8787)
    /// - `WAREHOUSE_TOKEN` (default: empty)
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("METRICS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),

            history_days: env::var("METRICS_HISTORY_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),

            ma_windows: env::var("METRICS_MA_WINDOWS")
                .ok()
                .map(|s| parse_windows(&s))
                .filter(|w| !w.is_empty())
                .unwrap_or_else(|| vec![7, 30]),

            max_malformed_pct: env::var("METRICS_MAX_MALFORMED_PCT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),

            warehouse_url: env::var("WAREHOUSE_URL")
                .unwrap_or_else(|_| "http://localhost:8787".to_string()),

            warehouse_token: env::var("WAREHOUSE_TOKEN").unwrap_or_default(),

            markets: vec![MarketConfig::philippines(), MarketConfig::vietnam()],
        }
    }
}

fn parse_windows(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .filter(|w| *w > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        env::remove_var("METRICS_DATA_DIR");
        env::remove_var("METRICS_HISTORY_DAYS");
        env::remove_var("METRICS_MA_WINDOWS");
        env::remove_var("METRICS_MAX_MALFORMED_PCT");

        let config = PipelineConfig::from_env();

        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.history_days, 60);
        assert_eq!(config.ma_windows, vec![7, 30]);
        assert_eq!(config.max_malformed_pct, 5);
        assert_eq!(config.markets.len(), 2);
    }

    #[test]
    fn test_window_list_parsing() {
        assert_eq!(parse_windows("7,30"), vec![7, 30]);
        assert_eq!(parse_windows(" 7 , 15 "), vec![7, 15]);
        assert_eq!(parse_windows("0,7"), vec![7]);
        assert!(parse_windows("junk").is_empty());
    }

    #[test]
    fn test_deny_policy_permits() {
        let policy = ChannelPolicy::Deny(BTreeSet::from([Channel::salesman()]));
        assert!(policy.permits(&Channel::b2b_app()));
        assert!(!policy.permits(&Channel::salesman()));
    }

    #[test]
    fn test_allow_policy_permits() {
        let policy = ChannelPolicy::Allow(BTreeSet::from([Channel::b2b_app(), Channel::cx_tlp()]));
        assert!(policy.permits(&Channel::cx_tlp()));
        assert!(!policy.permits(&Channel::salesman()));
    }

    #[test]
    fn test_markets_hold_independent_rates_and_offsets() {
        let ph = MarketConfig::philippines();
        let vn = MarketConfig::vietnam();
        assert_ne!(ph.currency_per_usd, vn.currency_per_usd);
        assert_eq!(ph.utc_offset_hours, 8);
        assert_eq!(vn.utc_offset_hours, 7);
        assert_ne!(ph.recent_table, vn.recent_table);
    }
}
