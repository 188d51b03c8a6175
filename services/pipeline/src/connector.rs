//! Warehouse session establishment with bounded retry
//!
//! Fixed, non-exponential schedule: 3 attempts with delays of 0s, 10s and
//! 20s between them (30s total retry budget). Exhausting the schedule is
//! fatal for the market's run; earlier failures are counted and logged but
//! never surfaced as a run failure.

use crate::warehouse::{Warehouse, WarehouseSession};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use types::errors::PipelineError;

/// Retry schedule for session establishment
///
/// One entry per attempt; each entry is the delay observed before that
/// attempt is made.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    pub delays_secs: Vec<u64>,
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self {
            delays_secs: vec![0, 10, 20],
        }
    }
}

impl RetrySchedule {
    pub fn attempts(&self) -> u32 {
        self.delays_secs.len() as u32
    }
}

/// Open a warehouse session, retrying on the fixed schedule.
///
/// Returns `ConnectionExhausted` once every attempt has failed; no partial
/// state is left behind, so the caller's previously published snapshot
/// stands untouched.
pub async fn connect_with_retry(
    warehouse: &dyn Warehouse,
    schedule: &RetrySchedule,
) -> Result<Box<dyn WarehouseSession>, PipelineError> {
    let attempts = schedule.attempts();

    for (index, delay_secs) in schedule.delays_secs.iter().enumerate() {
        if *delay_secs > 0 {
            sleep(Duration::from_secs(*delay_secs)).await;
        }

        let attempt = index as u32 + 1;
        info!(attempt, attempts, "connecting to warehouse");

        match warehouse.connect().await {
            Ok(session) => {
                info!(attempt, failed_attempts = attempt - 1, "warehouse session established");
                return Ok(session);
            }
            Err(err) => {
                warn!(attempt, attempts, error = %err, "connection attempt failed");
            }
        }
    }

    error!(attempts, "all connection attempts failed");
    Err(PipelineError::ConnectionExhausted { attempts })
}
