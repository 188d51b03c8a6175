//! Error taxonomy for pipeline runs
//!
//! Failures are fatal only for the market whose run raised them; the
//! previously published snapshot for that market always stands. Empty
//! query results and zero denominators are not errors anywhere in the
//! pipeline.

use thiserror::Error;

/// Top-level error for a single market's pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Every connection attempt to the warehouse failed.
    #[error("connection exhausted after {attempts} attempts")]
    ConnectionExhausted { attempts: u32 },

    /// A warehouse statement failed after the session was established.
    #[error("query against {table} failed: {message}")]
    Query { table: String, message: String },

    /// Too many source rows were missing required fields; publishing
    /// near-zero metrics would be misleading, so the run aborts.
    #[error("malformed row rate too high: dropped {dropped} of {total} rows (threshold {threshold_pct}%)")]
    MalformedRowRate {
        dropped: u64,
        total: u64,
        threshold_pct: u32,
    },

    /// Snapshot serialization failed before any write happened.
    #[error("snapshot serialization failed: {0}")]
    Serialization(String),

    /// Snapshot publish failed (temp write or rename).
    #[error("snapshot write failed: {0}")]
    Snapshot(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_exhausted_display() {
        let err = PipelineError::ConnectionExhausted { attempts: 3 };
        assert_eq!(err.to_string(), "connection exhausted after 3 attempts");
    }

    #[test]
    fn test_malformed_rate_display() {
        let err = PipelineError::MalformedRowRate {
            dropped: 12,
            total: 100,
            threshold_pct: 5,
        };
        assert!(err.to_string().contains("12 of 100"));
        assert!(err.to_string().contains("5%"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::Snapshot(_)));
    }
}
