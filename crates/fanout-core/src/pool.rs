use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use crate::error::{FanoutError, Result, WorkerError};
use crate::record::ResultRecord;

pub const DEFAULT_NAME_PREFIX: &str = "virtual-worker-";

// ---------------------------------------------------------------------------
// Execution context (task-local)
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct UnitContext {
    name: Arc<str>,
    interrupt: watch::Receiver<bool>,
}

tokio::task_local! {
    static UNIT_CONTEXT: UnitContext;
}

/// Name of the execution context running the caller.
///
/// Inside a pool task this is the name the pool gave the task. Outside one it
/// falls back to the OS thread name.
pub fn context_name() -> String {
    UNIT_CONTEXT
        .try_with(|ctx| ctx.name.to_string())
        .ok()
        .or_else(|| std::thread::current().name().map(str::to_string))
        .unwrap_or_else(|| "unnamed".to_string())
}

/// Returned by [`suspend`] when the pool interrupts its units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interrupted {
    pub reason: String,
}

/// Sleep for `duration`, waking early if the owning pool is shut down.
///
/// Outside a pool task this is a plain sleep.
pub async fn suspend(duration: Duration) -> std::result::Result<(), Interrupted> {
    let Ok(mut interrupt) = UNIT_CONTEXT.try_with(|ctx| ctx.interrupt.clone()) else {
        tokio::time::sleep(duration).await;
        return Ok(());
    };

    // A dropped sender disables the second branch; the sleep still runs out.
    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        Ok(_) = interrupt.wait_for(|flag| *flag) => Err(Interrupted {
            reason: "execution pool shut down".to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// PoolStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub submitted: u64,
    pub in_flight: usize,
    pub closed: bool,
}

// ---------------------------------------------------------------------------
// ExecutionPool
// ---------------------------------------------------------------------------

/// Spawns each submitted unit as its own tokio task, with no queue and no
/// limit on how many run at once.
///
/// Cloning is cheap; clones share counters and the closed flag.
#[derive(Clone)]
pub struct ExecutionPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    name_prefix: String,
    sequence: AtomicU64,
    in_flight: AtomicUsize,
    closed: AtomicBool,
    interrupt: watch::Sender<bool>,
}

/// Decrements the in-flight counter when the unit's future is dropped,
/// whether it completed, panicked or was aborted.
struct InFlightGuard(Arc<PoolInner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ExecutionPool {
    /// A pool that spawns onto whichever runtime the submitter is running in.
    pub fn new(name_prefix: impl Into<String>) -> Self {
        let (interrupt, _) = watch::channel(false);
        Self {
            inner: Arc::new(PoolInner {
                name_prefix: name_prefix.into(),
                sequence: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                interrupt,
            }),
        }
    }

    /// Start `unit` immediately as a named task.
    ///
    /// Fails only when the pool is closed or there is no runtime to spawn on.
    pub fn submit<F>(&self, index: usize, unit: F) -> Result<UnitHandle>
    where
        F: Future<Output = std::result::Result<ResultRecord, WorkerError>> + Send + 'static,
    {
        if self.is_closed() {
            return Err(FanoutError::PoolClosed(index));
        }
        let runtime = Handle::try_current().map_err(|_| FanoutError::NoRuntime(index))?;

        let seq = self.inner.sequence.fetch_add(1, Ordering::AcqRel);
        let context = UnitContext {
            name: format!("{}{seq}", self.inner.name_prefix).into(),
            interrupt: self.inner.interrupt.subscribe(),
        };

        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(Arc::clone(&self.inner));
        let join = runtime.spawn(UNIT_CONTEXT.scope(context, async move {
            let _guard = guard;
            unit.await
        }));

        Ok(UnitHandle { index, join })
    }

    /// Stop accepting submissions. Running units are left to finish.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            tracing::info!("execution pool closed");
        }
    }

    /// Stop accepting submissions and interrupt every suspended unit.
    pub fn shutdown_now(&self) {
        self.close();
        self.inner.interrupt.send_replace(true);
        tracing::info!(
            in_flight = self.inner.in_flight.load(Ordering::Acquire),
            "execution pool interrupting running units"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            submitted: self.inner.sequence.load(Ordering::Acquire),
            in_flight: self.inner.in_flight.load(Ordering::Acquire),
            closed: self.is_closed(),
        }
    }
}

impl Default for ExecutionPool {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_PREFIX)
    }
}

impl std::fmt::Debug for ExecutionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPool")
            .field("name_prefix", &self.inner.name_prefix)
            .field("stats", &self.stats())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// UnitHandle
// ---------------------------------------------------------------------------

/// Handle to one submitted unit. Dropping it before the unit finishes aborts
/// the unit.
#[derive(Debug)]
pub struct UnitHandle {
    index: usize,
    join: JoinHandle<std::result::Result<ResultRecord, WorkerError>>,
}

impl UnitHandle {
    /// Interrupt the unit from outside. Its outcome becomes
    /// [`WorkerError::Cancelled`].
    pub fn abort(&self) {
        self.join.abort();
    }

    /// Wait for the unit's outcome. Panics and aborts become per-unit errors.
    pub async fn join(mut self) -> std::result::Result<ResultRecord, WorkerError> {
        match (&mut self.join).await {
            Ok(outcome) => outcome,
            Err(err) => Err(join_error(self.index, err)),
        }
    }
}

impl Drop for UnitHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

fn join_error(index: usize, err: JoinError) -> WorkerError {
    if err.is_cancelled() {
        return WorkerError::Cancelled(index);
    }
    let payload = err.into_panic();
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    WorkerError::Panicked { index, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_after(
        index: usize,
        ms: u64,
    ) -> impl Future<Output = std::result::Result<ResultRecord, WorkerError>> {
        async move {
            suspend(Duration::from_millis(ms))
                .await
                .map_err(|i| WorkerError::Interrupted {
                    index,
                    reason: i.reason,
                })?;
            Ok(ResultRecord::success(index, context_name(), "t"))
        }
    }

    async fn explode() -> std::result::Result<ResultRecord, WorkerError> {
        panic!("disk on fire")
    }

    #[tokio::test]
    async fn units_get_sequential_context_names() {
        let pool = ExecutionPool::new("unit-");
        let a = pool.submit(0, record_after(0, 1)).unwrap();
        let b = pool.submit(1, record_after(1, 1)).unwrap();
        assert_eq!(a.join().await.unwrap().identity(), "unit-0");
        assert_eq!(b.join().await.unwrap().identity(), "unit-1");
        assert_eq!(pool.stats().submitted, 2);
    }

    #[tokio::test]
    async fn closed_pool_rejects_submission() {
        let pool = ExecutionPool::default();
        pool.close();
        let err = pool.submit(4, record_after(4, 1)).unwrap_err();
        assert!(matches!(err, FanoutError::PoolClosed(4)));
        assert!(pool.stats().closed);
    }

    #[test]
    fn submission_without_runtime_fails() {
        let pool = ExecutionPool::default();
        let err = pool.submit(0, record_after(0, 1)).unwrap_err();
        assert!(matches!(err, FanoutError::NoRuntime(0)));
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_unit_reports_cancelled() {
        let pool = ExecutionPool::default();
        let handle = pool.submit(2, record_after(2, 1_000)).unwrap();
        handle.abort();
        assert_eq!(handle.join().await, Err(WorkerError::Cancelled(2)));
    }

    #[tokio::test]
    async fn panicking_unit_reports_message() {
        let pool = ExecutionPool::default();
        let handle = pool.submit(1, explode()).unwrap();
        let err = handle.join().await.unwrap_err();
        assert_eq!(
            err,
            WorkerError::Panicked {
                index: 1,
                message: "disk on fire".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_suspended_units() {
        let pool = ExecutionPool::default();
        let handle = pool.submit(0, record_after(0, 10_000)).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        pool.shutdown_now();
        let err = handle.join().await.unwrap_err();
        assert!(matches!(err, WorkerError::Interrupted { index: 0, .. }));
        assert!(pool.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_aborts_unit() {
        let pool = ExecutionPool::default();
        let handle = pool.submit(0, record_after(0, 10_000)).unwrap();
        assert_eq!(pool.stats().in_flight, 1);
        drop(handle);
        for _ in 0..10 {
            if pool.stats().in_flight == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(pool.stats().in_flight, 0);
    }

    #[test]
    fn context_name_outside_pool_uses_thread_name() {
        let name = std::thread::Builder::new()
            .name("carrier-7".into())
            .spawn(context_name)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(name, "carrier-7");
    }
}
