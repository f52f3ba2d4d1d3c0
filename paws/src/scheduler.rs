//! Deferred and periodic work
//!
//! Removal commit/settle and the time-label ticker run as tokio tasks. Hosts
//! call in over FFI from threads without a runtime, so tasks go to the current
//! runtime when there is one and to a shared fallback runtime otherwise.
//! Every task stops when the owning panel's `CancellationToken` fires.

use std::future::Future;
use std::time::Duration;

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;

/// Global fallback Tokio runtime for when the panel is driven outside any runtime context.
/// Shared across all panels and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("paws-timers")
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

pub(crate) fn runtime_handle() -> tokio::runtime::Handle {
    tokio::runtime::Handle::try_current().unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
}

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs a job once after a delay
pub(crate) trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, job: Job);
}

/// Cancels every task spawned for a panel when dropped
pub(crate) struct DropGuard {
    token: CancellationToken,
}

impl DropGuard {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub(crate) struct TokioScheduler {
    token: CancellationToken,
}

impl TokioScheduler {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Spawn a future that is dropped as soon as the panel goes away
    pub(crate) fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        runtime_handle().spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = fut => {}
            }
        });
    }

    /// Call `tick` every `period` (first call after one period) until it
    /// returns false or the panel is dropped.
    pub(crate) fn every<F>(&self, period: Duration, mut tick: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !tick() {
                    break;
                }
            }
        });
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, job: Job) {
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        });
    }
}
