use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::{FanoutError, Result};
use crate::pool::{ExecutionPool, UnitHandle};
use crate::record::ResultRecord;
use crate::worker::{WorkUnit, Worker};

/// Submits N units to the pool and joins their outcomes in index order.
pub struct Orchestrator<W: WorkUnit = Worker> {
    pool: ExecutionPool,
    unit: Arc<W>,
}

impl<W: WorkUnit> Clone for Orchestrator<W> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            unit: Arc::clone(&self.unit),
        }
    }
}

impl Orchestrator<Worker> {
    /// The production orchestrator: system clock, precise timestamps and the
    /// configured context-name prefix.
    pub fn from_config(config: &Config) -> Result<Self> {
        let worker = Worker::new(Arc::new(SystemClock), config.time.precise()?);
        let pool = ExecutionPool::new(config.worker.name_prefix.clone());
        Ok(Self::new(pool, worker))
    }
}

impl<W: WorkUnit> Orchestrator<W> {
    pub fn new(pool: ExecutionPool, unit: W) -> Self {
        Self {
            pool,
            unit: Arc::new(unit),
        }
    }

    pub fn pool(&self) -> &ExecutionPool {
        &self.pool
    }

    /// Run `task_count` units concurrently and return one record per unit,
    /// ordered by submission index.
    ///
    /// A failed unit becomes the canonical error record in its slot. The only
    /// error returned is a submission failure, in which case every unit
    /// already submitted for this batch is aborted and nothing partial is
    /// returned.
    pub async fn run_all(&self, task_count: usize) -> Result<Vec<ResultRecord>> {
        if task_count == 0 {
            return Err(FanoutError::InvalidTaskCount(task_count));
        }

        let started = Instant::now();
        tracing::info!(task_count, "fan-out started");

        let mut handles: Vec<UnitHandle> = Vec::with_capacity(task_count);
        for index in 0..task_count {
            let unit = Arc::clone(&self.unit);
            match self.pool.submit(index, async move { unit.execute(index).await }) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::error!(
                        index,
                        submitted = handles.len(),
                        error = %e,
                        "submission failed, aborting batch"
                    );
                    // Dropping the handles aborts the units already running.
                    return Err(e);
                }
            }
        }

        let outcomes = join_all(handles.into_iter().map(UnitHandle::join)).await;

        let mut failed = 0usize;
        let records: Vec<ResultRecord> = outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Ok(record) => record,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(index = e.index(), error = %e, "unit failed");
                    ResultRecord::from(e)
                }
            })
            .collect();

        tracing::info!(
            task_count,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fan-out finished"
        );
        Ok(records)
    }
}
