//! Paired loader for streams persisted by `FileSink`

use std::fs;
use std::path::Path;

use contracts::codec::{decode_f32_le, F32_WIDTH};
use contracts::{ChannelMatrix, ContractError, SyncedStream};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::DispatcherError;

/// JSON metadata written next to each `<device_id>-synced.bin`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedSidecar {
    pub device_id: String,
    pub synced_to: Option<String>,
    pub channel_count: usize,
    pub rows: usize,
    pub channel_names: Vec<String>,
}

impl SyncedSidecar {
    pub fn from_stream(stream: &SyncedStream) -> Self {
        Self {
            device_id: stream.device_id.to_string(),
            synced_to: stream.synced_to.as_ref().map(|id| id.to_string()),
            channel_count: stream.channel_count(),
            rows: stream.len(),
            channel_names: stream.channel_names.clone(),
        }
    }
}

/// Reads synced streams back from disk
pub struct SyncedDataLoader;

impl SyncedDataLoader {
    /// Load a raw row-major f32 file of `channel_count` channels
    #[instrument(name = "synced_load", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>, channel_count: usize) -> Result<ChannelMatrix, DispatcherError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let values = decode_f32_le(
            &bytes,
            channel_count * F32_WIDTH,
            &path.display().to_string(),
        )?;
        let matrix = ChannelMatrix::new(channel_count, values)?;
        debug!(rows = matrix.len(), "Synced stream loaded");
        Ok(matrix)
    }

    /// Load a data file using the channel count from its JSON sidecar
    pub fn load_with_meta(
        bin_path: impl AsRef<Path>,
    ) -> Result<(SyncedSidecar, ChannelMatrix), DispatcherError> {
        let bin_path = bin_path.as_ref();
        let meta_path = bin_path.with_extension("json");
        let meta = fs::read(&meta_path)?;
        let sidecar: SyncedSidecar = serde_json::from_slice(&meta).map_err(|e| {
            ContractError::decode(meta_path.display().to_string(), e.to_string())
        })?;

        let matrix = Self::load(bin_path, sidecar.channel_count)?;
        if matrix.len() != sidecar.rows {
            return Err(ContractError::decode(
                bin_path.display().to_string(),
                format!("sidecar lists {} rows, file holds {}", sidecar.rows, matrix.len()),
            )
            .into());
        }
        Ok((sidecar, matrix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::codec::encode_f32_le;

    #[test]
    fn test_partial_row_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RX1-synced.bin");
        fs::write(&path, encode_f32_le(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();

        let err = SyncedDataLoader::load(&path, 2).unwrap_err();
        assert!(matches!(
            err,
            DispatcherError::Contract(ContractError::Decode { .. })
        ));
        assert!(SyncedDataLoader::load(&path, 5).is_ok());
    }

    #[test]
    fn test_missing_sidecar_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RX1-synced.bin");
        fs::write(&path, encode_f32_le(&[1.0])).unwrap();
        assert!(matches!(
            SyncedDataLoader::load_with_meta(&path),
            Err(DispatcherError::Io(_))
        ));
    }

    #[test]
    fn test_zero_channels_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();
        assert!(SyncedDataLoader::load(&path, 0).is_err());
    }
}
