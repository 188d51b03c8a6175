//! Order Metrics Pipeline
//!
//! Single-pass batch job that reconciles order records from two
//! inconsistent upstream sources into per-market business metrics and
//! publishes them as atomically-replaced JSON snapshots.
//!
//! # Architecture
//!
//! ```text
//!       DateWindowResolver
//!              │
//!       SourceConnector (bounded retry)
//!              │
//!        RecordFetcher ── source adapters normalize both row shapes
//!              │
//!         Reconciler ── dedup + history-wins merge
//!              │
//!       MetricsAggregator
//!         │          │
//!  MovingAverageEngine  ChannelClassifier
//!         │          │
//!        SnapshotBuilder (write-then-rename)
//! ```
//!
//! Markets are processed independently; a failed run leaves the previously
//! published snapshot untouched.

pub mod adapter;
pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod connector;
pub mod fetcher;
pub mod moving_average;
pub mod reconciler;
pub mod runner;
pub mod snapshot;
pub mod warehouse;
pub mod window;

// Service version
pub const SERVICE_VERSION: &str = "0.1.0";
