//! Binary Log Loader
//!
//! Bela logs are headerless streams of fixed-width records, each a run of
//! little-endian `f32` fields described by a `RecordLayout`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::codec::decode_f32_le;
use tracing::{debug, instrument, warn};

use crate::error::{IngestionError, Result};
use crate::layout::RecordLayout;
use crate::stats::LoaderMetrics;

/// Decoded records of one log file, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    layout: RecordLayout,
    values: Vec<f32>,
}

impl RecordBatch {
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.values.len() / self.layout.field_count().max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let width = self.layout.field_count();
        self.values.get(index * width..(index + 1) * width)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.values.chunks_exact(self.layout.field_count().max(1))
    }

    /// All values of the named field
    pub fn column(&self, name: &str) -> Result<Vec<f32>> {
        let idx = self
            .layout
            .index_of(name)
            .ok_or_else(|| IngestionError::MissingField {
                field: name.to_string(),
            })?;
        Ok(self.rows().map(|r| r[idx]).collect())
    }
}

/// Reads and decodes Bela binary log files
#[derive(Debug, Clone, Default)]
pub struct BinaryLogLoader {
    metrics: Arc<LoaderMetrics>,
}

impl BinaryLogLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share counters with other loaders
    pub fn with_metrics(metrics: Arc<LoaderMetrics>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &Arc<LoaderMetrics> {
        &self.metrics
    }

    /// Read `path` and decode it with `layout`
    #[instrument(name = "log_load", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(&self, path: impl AsRef<Path>, layout: &RecordLayout) -> Result<RecordBatch> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| IngestionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode_from(path, &bytes, layout)
    }

    /// Decode an in-memory buffer with `layout`
    pub fn decode(&self, bytes: &[u8], layout: &RecordLayout) -> Result<RecordBatch> {
        self.decode_from(Path::new("<memory>"), bytes, layout)
    }

    fn decode_from(&self, path: &Path, bytes: &[u8], layout: &RecordLayout) -> Result<RecordBatch> {
        let record_width = layout.record_width();
        if record_width == 0 || bytes.len() % record_width != 0 {
            self.metrics.record_decode_error();
            warn!(
                len = bytes.len(),
                record_width,
                "log length is not a whole number of records"
            );
            return Err(IngestionError::Decode {
                path: PathBuf::from(path),
                len: bytes.len(),
                record_width,
            });
        }

        let values = decode_f32_le(bytes, record_width, &path.display().to_string())?;
        let batch = RecordBatch {
            layout: layout.clone(),
            values,
        };
        self.metrics.record_load(bytes.len(), batch.len());
        debug!(records = batch.len(), bytes = bytes.len(), "decoded log");
        Ok(batch)
    }
}
