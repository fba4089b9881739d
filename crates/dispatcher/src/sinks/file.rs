//! FileSink - writes each stream as raw LE f32 with a JSON sidecar

use contracts::codec::encode_f32_le;
use contracts::{ContractError, DataSink, SyncedStream};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

use crate::loader::SyncedSidecar;

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// Sink that writes `<device_id>-synced.bin` plus `<device_id>-synced.json`
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
}

impl FileSink {
    /// Create a new FileSink, creating the base directory
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// Data file path for `device_id`
    pub fn data_path(&self, device_id: &str) -> PathBuf {
        self.config
            .base_path
            .join(format!("{device_id}-synced.bin"))
    }

    fn write_stream_to_disk(&self, stream: &SyncedStream) -> std::io::Result<()> {
        let data_path = self.data_path(&stream.device_id);

        let mut writer = BufWriter::new(File::create(&data_path)?);
        writer.write_all(&encode_f32_le(stream.data.values()))?;
        writer.flush()?;

        let sidecar = SyncedSidecar::from_stream(stream);
        let meta_file = File::create(data_path.with_extension("json"))?;
        serde_json::to_writer_pretty(meta_file, &sidecar)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        debug!(
            path = %data_path.display(),
            rows = stream.len(),
            "Stream written"
        );
        Ok(())
    }

    fn persist_stream(&self, stream: &SyncedStream) -> Result<(), ContractError> {
        self.write_stream_to_disk(stream).map_err(|e| {
            error!(sink = %self.name, device_id = %stream.device_id, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, stream),
        fields(sink = %self.name, device_id = %stream.device_id)
    )]
    async fn write(&mut self, stream: &SyncedStream) -> Result<(), ContractError> {
        self.persist_stream(stream)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
