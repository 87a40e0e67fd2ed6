use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::ParbzError;

/// Collects per-block failure signals from concurrent workers.
///
/// Recording a failure never halts other in-flight work; the counter is read
/// after the join barrier to gate whether output is written at all. The
/// counter is atomic, so concurrent increments from any number of workers
/// lose no updates; the diagnostic list keeps the per-block causes for
/// reporting.
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    failures: AtomicUsize,
    details: Mutex<Vec<ParbzError>>,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one failed block and retains its cause.
    pub fn record(&self, error: ParbzError) {
        self.failures.fetch_add(1, Ordering::AcqRel);
        tracing::warn!(block = ?error.block_index(), error = %error, "block failed");
        lock_unpoisoned(&self.details).push(error);
    }

    pub fn count(&self) -> usize {
        self.failures.load(Ordering::Acquire)
    }

    pub fn has_failures(&self) -> bool {
        self.count() > 0
    }

    /// Drains the retained diagnostics. The counter is left untouched.
    pub fn take_failures(&self) -> Vec<ParbzError> {
        std::mem::take(&mut *lock_unpoisoned(&self.details))
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
