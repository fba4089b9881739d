//! Device loading: log files -> sync/sensor tracks

use std::path::Path;

use contracts::{DeviceConfig, DeviceId, SensorTrack, SyncTick, SyncTrack, TransmitterConfig};
use tracing::{info, instrument};

use crate::error::{IngestionError, Result};
use crate::layout::RecordLayout;
use crate::loader::{BinaryLogLoader, RecordBatch};

/// Everything recorded by one device
#[derive(Debug, Clone)]
pub struct DeviceRecording {
    pub id: DeviceId,

    /// Clock ticks (`None` for standalone devices)
    pub sync: Option<SyncTrack>,

    pub sensor: SensorTrack,

    pub sample_rate: Option<f64>,
}

/// Loads a device's sync and sensor logs into tracks
#[derive(Debug, Clone, Default)]
pub struct DeviceLoader {
    loader: BinaryLogLoader,
}

impl DeviceLoader {
    pub fn new(loader: BinaryLogLoader) -> Self {
        Self { loader }
    }

    pub fn log_loader(&self) -> &BinaryLogLoader {
        &self.loader
    }

    #[instrument(name = "device_load", skip_all, fields(device_id = %config.id))]
    pub fn load(&self, config: &DeviceConfig) -> Result<DeviceRecording> {
        let sync = config
            .sync_log
            .as_deref()
            .map(|path| self.load_sync(path))
            .transpose()?;
        let sensor = self.load_sensor(&config.sensor_log, &config.id, config.num_sensors)?;

        info!(
            ticks = sync.as_ref().map(SyncTrack::len),
            samples = sensor.len(),
            channels = sensor.channel_count(),
            "device loaded"
        );

        Ok(DeviceRecording {
            id: config.device_id(),
            sync,
            sensor,
            sample_rate: config.sample_rate,
        })
    }

    pub fn load_transmitter(&self, config: &TransmitterConfig) -> Result<DeviceRecording> {
        self.load(&config.as_device())
    }

    /// Decode a sync log into a `SyncTrack`
    pub fn load_sync(&self, path: &Path) -> Result<SyncTrack> {
        let batch = self.loader.load(path, &RecordLayout::sync())?;
        sync_track_from_batch(path, &batch)
    }

    /// Decode a sensor log into a `SensorTrack`
    pub fn load_sensor(&self, path: &Path, device_id: &str, num_sensors: usize) -> Result<SensorTrack> {
        let batch = self
            .loader
            .load(path, &RecordLayout::sensor(device_id, num_sensors))?;
        sensor_track_from_batch(path, &batch)
    }
}

/// Frame counters are stored as integral floats; reject anything that cannot be one
fn frame_counter(path: &Path, row: usize, value: f32) -> Result<u64> {
    if !value.is_finite() || value < 0.0 {
        return Err(IngestionError::InvalidRecord {
            path: path.to_path_buf(),
            row,
            message: format!("frame counter {value} is not a non-negative number"),
        });
    }
    Ok(value.trunc() as u64)
}

pub(crate) fn sync_track_from_batch(path: &Path, batch: &RecordBatch) -> Result<SyncTrack> {
    let ticks = batch
        .rows()
        .enumerate()
        .map(|(row, r)| Ok(SyncTick::new(frame_counter(path, row, r[0])?, r[1])))
        .collect::<Result<Vec<_>>>()?;
    Ok(SyncTrack::new(ticks)?)
}

pub(crate) fn sensor_track_from_batch(path: &Path, batch: &RecordBatch) -> Result<SensorTrack> {
    let channel_count = batch.layout().field_count().saturating_sub(1);
    let mut track = SensorTrack::with_capacity(channel_count, batch.len());
    for (row, r) in batch.rows().enumerate() {
        let frame = frame_counter(path, row, r[0])?;
        track.push(frame as f64, &r[1..])?;
    }
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::codec::encode_f32_le;
    use std::path::PathBuf;

    fn write_log(dir: &Path, name: &str, values: &[f32]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, encode_f32_le(values)).unwrap();
        path
    }

    fn device(dir: &Path, sync: Option<&[f32]>, sensor: &[f32]) -> DeviceConfig {
        DeviceConfig {
            id: "RX1".into(),
            sync_log: sync.map(|s| write_log(dir, "RX1-sync.log", s)),
            sensor_log: write_log(dir, "RX1-data.log", sensor),
            num_sensors: 2,
            sample_rate: Some(22050.0),
        }
    }

    #[test]
    fn test_load_receiver() {
        let dir = tempfile::tempdir().unwrap();
        let config = device(
            dir.path(),
            Some(&[0.0, 1.0, 2.0, 1.0]),
            &[0.0, 0.1, 0.2, 1.0, 1.1, 1.2, 2.0, 2.1, 2.2],
        );

        let recording = DeviceLoader::default().load(&config).unwrap();
        assert_eq!(recording.id, "RX1");
        assert_eq!(recording.sample_rate, Some(22050.0));

        let sync = recording.sync.unwrap();
        assert_eq!(sync.len(), 2);
        assert_eq!(sync.last().unwrap().frame, 2);

        assert_eq!(recording.sensor.len(), 3);
        assert_eq!(recording.sensor.channel_count(), 2);
        assert_eq!(recording.sensor.channels(1), Some(&[1.1, 1.2][..]));
    }

    #[test]
    fn test_standalone_has_no_sync() {
        let dir = tempfile::tempdir().unwrap();
        let config = device(dir.path(), None, &[0.0, 0.5, 0.5]);
        let recording = DeviceLoader::default().load(&config).unwrap();
        assert!(recording.sync.is_none());
        assert_eq!(recording.sensor.len(), 1);
    }

    #[test]
    fn test_negative_frame_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = device(dir.path(), Some(&[-1.0, 0.0, 3.0, 0.0]), &[]);
        let err = DeviceLoader::default().load(&config).unwrap_err();
        assert!(matches!(err, IngestionError::InvalidRecord { row: 0, .. }));
    }

    #[test]
    fn test_nan_frame_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = device(dir.path(), None, &[0.0, 1.0, 1.0, f32::NAN, 1.0, 1.0]);
        let err = DeviceLoader::default().load(&config).unwrap_err();
        assert!(matches!(err, IngestionError::InvalidRecord { row: 1, .. }));
    }

    #[test]
    fn test_repeated_tick_is_contract_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = device(dir.path(), Some(&[5.0, 0.0, 5.0, 0.0]), &[]);
        let err = DeviceLoader::default().load(&config).unwrap_err();
        assert!(matches!(err, IngestionError::Contract(_)));
    }
}
