use std::sync::Arc;

use parking_lot::Mutex;

/// Counters for one copy run.
#[derive(Debug, Default, Clone)]
pub struct CopyStats {
    pub files_copied: u64,
    pub bytes_copied: u64,
    pub errors: Vec<String>,
}

/// Shared handle to the run counters.
///
/// Workers update under a single lock held only for the increment; the
/// final value is snapshotted once, after the pool has drained.
#[derive(Clone, Default)]
pub struct SharedStats {
    inner: Arc<Mutex<CopyStats>>,
}

impl SharedStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successfully copied file.
    pub fn record_file(&self, bytes: u64) {
        let mut stats = self.inner.lock();
        stats.files_copied += 1;
        stats.bytes_copied += bytes;
    }

    /// Record a failed copy.
    pub fn record_error(&self, message: String) {
        self.inner.lock().errors.push(message);
    }

    pub fn snapshot(&self) -> CopyStats {
        self.inner.lock().clone()
    }
}
