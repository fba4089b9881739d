//! Loader statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every load performed through one loader
#[derive(Debug, Default)]
pub struct LoaderMetrics {
    /// Files read successfully
    pub files_loaded: AtomicU64,

    /// Total bytes read
    pub bytes_read: AtomicU64,

    /// Total records decoded
    pub records_decoded: AtomicU64,

    /// Files rejected as malformed
    pub decode_errors: AtomicU64,
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decoded file
    pub fn record_load(&self, bytes: usize, records: usize) {
        self.files_loaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
        self.records_decoded
            .fetch_add(records as u64, Ordering::Relaxed);
        metrics::counter!("bela_syncer_log_bytes_read_total").increment(bytes as u64);
        metrics::counter!("bela_syncer_log_records_total").increment(records as u64);
    }

    /// Record a malformed file
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("bela_syncer_log_decode_errors_total").increment(1);
    }

    pub fn snapshot(&self) -> LoaderSnapshot {
        LoaderSnapshot {
            files_loaded: self.files_loaded.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            records_decoded: self.records_decoded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `LoaderMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderSnapshot {
    pub files_loaded: u64,
    pub bytes_read: u64,
    pub records_decoded: u64,
    pub decode_errors: u64,
}
