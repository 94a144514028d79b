use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide count of failed backend queries.
///
/// Independent of the snapshot; never reset.
#[derive(Debug, Default)]
pub struct ErrorCounter {
    failures: AtomicU64,
}

impl ErrorCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
