//! Progress reporting and cooperative cancellation.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rayon::prelude::*;

use crate::error::{Error, Result};

/// A progress/cancellation listener supplied by the caller.
///
/// Long-running loops poll `is_cancelled` between record batches, on the
/// calling thread only, so implementations need not be `Sync`.
pub trait Monitor {
    fn started(&self) {}

    /// Fraction of work done, in `[0, 100]`.
    fn progress(&self, _pct: f32) {}

    fn is_cancelled(&self) -> bool { false }

    fn complete(&self) {}

    fn dispose(&self) {}
}

/// Monitor that ignores everything and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitor;

impl Monitor for NullMonitor {}

/// A cloneable cancellation flag that can be tripped from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) { self.cancelled.store(true, Ordering::Relaxed) }
}

impl Monitor for CancellationToken {
    fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::Relaxed) }
}

/// Scoped use of a monitor: `started` on creation, `dispose` on drop.
pub(crate) struct MonitorSession<'a> {
    monitor: &'a dyn Monitor,
}

impl<'a> MonitorSession<'a> {
    pub(crate) fn start(monitor: &'a dyn Monitor) -> Self {
        monitor.started();
        Self { monitor }
    }

    /// Fail with `Error::Cancelled` if the caller asked to stop.
    #[inline]
    pub(crate) fn checkpoint(&self) -> Result<()> {
        if self.monitor.is_cancelled() { Err(Error::Cancelled) } else { Ok(()) }
    }

    /// Report `done` out of `total` units of work.
    pub(crate) fn progress(&self, done: usize, total: usize) {
        let pct = if total == 0 { 100.0 } else { 100.0 * done as f32 / total as f32 };
        self.monitor.progress(pct.min(100.0));
    }

    pub(crate) fn complete(self) {
        self.monitor.complete();
    }

    /// Map `f` over `0..n` in parallel, one batch at a time, polling for
    /// cancellation before each batch. Output order matches input order.
    /// `done` and `total` place this pass within the overall progress.
    pub(crate) fn run_batched<T, F>(&self, n: usize, batch_size: usize, done: usize, total: usize, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        let mut out = Vec::with_capacity(n);
        for start in (0..n).step_by(batch_size.max(1)) {
            self.checkpoint()?;
            let end = (start + batch_size).min(n);
            out.par_extend((start..end).into_par_iter().map(&f));
            self.progress(done + end, total);
            tracing::trace!(done = end, total = n, "batch finished");
        }
        self.checkpoint()?;
        Ok(out)
    }
}

impl Drop for MonitorSession<'_> {
    fn drop(&mut self) {
        self.monitor.dispose();
    }
}
