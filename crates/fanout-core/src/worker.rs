use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock, TimeFormat};
use crate::error::WorkerError;
use crate::pool;
use crate::record::ResultRecord;

pub const BASE_DELAY_MS: u64 = 100;
pub const DELAY_STEP_MS: u64 = 50;

/// Simulated workload for the unit at `index`: `100 + 50 * index` ms.
pub fn delay_for(index: usize) -> Duration {
    Duration::from_millis(BASE_DELAY_MS + index as u64 * DELAY_STEP_MS)
}

/// One independently scheduled computation producing a single record.
pub trait WorkUnit: Send + Sync + 'static {
    fn execute(
        &self,
        index: usize,
    ) -> impl Future<Output = Result<ResultRecord, WorkerError>> + Send;
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Sleeps for its index's delay, then stamps the running context's name and
/// the precise time.
#[derive(Clone)]
pub struct Worker {
    clock: Arc<dyn Clock>,
    format: TimeFormat,
}

impl Worker {
    pub fn new(clock: Arc<dyn Clock>, format: TimeFormat) -> Self {
        Self { clock, format }
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), TimeFormat::precise())
    }
}

impl WorkUnit for Worker {
    async fn execute(&self, index: usize) -> Result<ResultRecord, WorkerError> {
        let delay = delay_for(index);
        tracing::debug!(index, delay_ms = delay.as_millis() as u64, "unit running");

        pool::suspend(delay)
            .await
            .map_err(|interrupted| WorkerError::Interrupted {
                index,
                reason: interrupted.reason,
            })?;

        // Read identity and time only after the sleep, from inside the unit.
        let identity = pool::context_name();
        let snapshot = self.clock.now(&self.format);
        tracing::debug!(index, identity = %identity, "unit completed");

        Ok(ResultRecord::success(index, identity, snapshot.formatted_time))
    }
}
