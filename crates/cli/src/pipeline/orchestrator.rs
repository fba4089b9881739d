//! Pipeline orchestrator - coordinates all components.
//!
//! Transmitter reference first, then every receiver in parallel on the
//! blocking pool, then standalone export and dispatch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{
    ChannelMatrix, DeviceConfig, ReferenceTrack, SessionBlueprint, SinkConfig, SinkType,
    SyncOutcome, SyncedStream, TransmitterConfig,
};
use dispatcher::DispatchSummary;
use ingestion::DeviceLoader;
use observability::{
    record_correction_metrics, record_device_loaded, record_streams_dispatched,
    record_sync_duration_ms,
};
use sync_engine::{build_reference, DriftCorrector};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::{PipelineStats, StreamStats};
use crate::error::{self, CliError};

/// Queue capacity of the file sink added by `--output`
const OUTPUT_SINK_QUEUE: usize = 16;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The session blueprint
    pub blueprint: SessionBlueprint,

    /// Output directory override (adds or retargets a file sink)
    pub output_dir: Option<PathBuf>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    ///
    /// Fails on the first device that cannot be loaded or synchronized, and
    /// when any stream did not reach every sink.
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let loader = DeviceLoader::default();
        let corrector = DriftCorrector::new(blueprint.to_sync_engine_config());

        info!(transmitter = %blueprint.transmitter.id, "Building reference track...");
        let reference = Arc::new(load_reference(&loader, &blueprint.transmitter)?);

        info!(receivers = blueprint.receivers.len(), "Synchronizing receivers...");
        let outcomes =
            synchronize_receivers(&loader, &corrector, &blueprint.receivers, &reference).await?;

        let standalone = export_standalone(&loader, &blueprint.standalone)?;

        let mut stats = PipelineStats {
            reference_len: reference.len(),
            reference_blocks: reference.block_count,
            receivers_synced: outcomes.len(),
            standalone_exported: standalone.len(),
            ..Default::default()
        };

        let mut streams = Vec::with_capacity(1 + outcomes.len() + standalone.len());
        streams.push(reference.to_stream());
        for (outcome, elapsed) in outcomes {
            record_correction_metrics(&outcome.report);
            record_sync_duration_ms(
                outcome.report.receiver.as_str(),
                elapsed.as_secs_f64() * 1000.0,
            );
            stats.corrections.update(&outcome.report);
            streams.push(outcome.stream);
        }
        streams.extend(standalone);

        stats.streams = streams.iter().map(stream_stats).collect();
        for mismatch in stats.length_mismatches() {
            warn!(
                device_id = %mismatch.device_id,
                rows = mismatch.rows,
                reference_len = stats.reference_len,
                "Synced stream length differs from the reference"
            );
        }

        info!(streams = streams.len(), "Dispatching streams...");
        let summary = dispatch_streams(self.sink_configs(), streams).await?;
        for sink in &summary.sinks {
            record_streams_dispatched(&sink.name, sink.writes, sink.failures);
        }
        if !summary.is_clean() {
            return Err(CliError::Dispatch {
                failures: summary.failures_total(),
            }
            .into());
        }

        stats.dispatch = summary;
        stats.loader = loader.log_loader().metrics().snapshot();
        stats.duration = start_time.elapsed();

        Ok(stats)
    }

    /// Session sinks with the `--output` override applied
    ///
    /// Every file sink is retargeted to the output directory; one is added
    /// when the session has none.
    fn sink_configs(&self) -> Vec<SinkConfig> {
        let mut sinks = self.config.blueprint.sinks.clone();
        let Some(dir) = &self.config.output_dir else {
            return sinks;
        };

        let base_path = dir.display().to_string();
        let mut retargeted = false;
        for sink in sinks.iter_mut().filter(|s| s.sink_type == SinkType::File) {
            info!(sink = %sink.name, base_path = %base_path, "Overriding file sink output directory");
            sink.params.insert("base_path".to_string(), base_path.clone());
            retargeted = true;
        }

        if !retargeted {
            info!(base_path = %base_path, "Adding file sink for output directory");
            sinks.push(SinkConfig {
                name: "output".to_string(),
                sink_type: SinkType::File,
                queue_capacity: OUTPUT_SINK_QUEUE,
                params: HashMap::from([("base_path".to_string(), base_path)]),
            });
        }
        sinks
    }
}

/// Load the transmitter's logs and trim its track into the reference grid
fn load_reference(
    loader: &DeviceLoader,
    transmitter: &TransmitterConfig,
) -> error::Result<ReferenceTrack> {
    let recording = loader
        .load_transmitter(transmitter)
        .map_err(|e| CliError::device_load(&transmitter.id, e))?;
    record_device_loaded(&transmitter.id, "transmitter", recording.sensor.len());

    let sync = recording.sync.as_ref().ok_or_else(|| CliError::MissingSyncLog {
        device_id: transmitter.id.clone(),
    })?;
    build_reference(recording.id.clone(), sync, &recording.sensor, transmitter.d_clock)
        .map_err(|e| CliError::synchronization(&transmitter.id, e))
}

/// Load and align every receiver, one blocking task each
///
/// Outcomes are returned in session order.
async fn synchronize_receivers(
    loader: &DeviceLoader,
    corrector: &DriftCorrector,
    receivers: &[DeviceConfig],
    reference: &Arc<ReferenceTrack>,
) -> error::Result<Vec<(SyncOutcome, Duration)>> {
    let mut tasks = JoinSet::new();

    for (index, receiver) in receivers.iter().cloned().enumerate() {
        let loader = loader.clone();
        let corrector = corrector.clone();
        let reference = Arc::clone(reference);

        tasks.spawn_blocking(move || -> error::Result<(usize, SyncOutcome, Duration)> {
            let started = Instant::now();
            let recording = loader
                .load(&receiver)
                .map_err(|e| CliError::device_load(&receiver.id, e))?;
            record_device_loaded(&receiver.id, "receiver", recording.sensor.len());

            let sync = recording.sync.as_ref().ok_or_else(|| CliError::MissingSyncLog {
                device_id: receiver.id.clone(),
            })?;
            let outcome = corrector
                .synchronize(recording.id.clone(), sync, &recording.sensor, &reference)
                .map_err(|e| CliError::synchronization(&receiver.id, e))?;

            Ok((index, outcome, started.elapsed()))
        });
    }

    let mut outcomes = Vec::with_capacity(receivers.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, outcome, elapsed) = joined??;
        outcomes.push((index, outcome, elapsed));
    }
    outcomes.sort_by_key(|(index, _, _)| *index);

    Ok(outcomes
        .into_iter()
        .map(|(_, outcome, elapsed)| (outcome, elapsed))
        .collect())
}

/// Devices without a sync log, exported as recorded
fn export_standalone(
    loader: &DeviceLoader,
    devices: &[DeviceConfig],
) -> error::Result<Vec<SyncedStream>> {
    devices
        .iter()
        .map(|device| {
            let sensor = loader
                .load_sensor(&device.sensor_log, &device.id, device.num_sensors)
                .map_err(|e| CliError::device_load(&device.id, e))?;
            record_device_loaded(&device.id, "standalone", sensor.len());

            let data = ChannelMatrix::new(sensor.channel_count(), sensor.into_values())
                .map_err(|e| CliError::synchronization(&device.id, e))?;
            info!(device_id = %device.id, rows = data.len(), "Standalone device exported");
            Ok(SyncedStream::standalone(device.device_id(), data))
        })
        .collect()
}

/// Send every stream through a dispatcher and wait for all sinks to drain
async fn dispatch_streams(
    sinks: Vec<SinkConfig>,
    streams: Vec<SyncedStream>,
) -> Result<DispatchSummary> {
    if sinks.is_empty() {
        warn!("No sinks configured - synced streams will not be exported");
    }

    let (stream_tx, stream_rx) = mpsc::channel::<Arc<SyncedStream>>(streams.len().max(1));
    let dispatcher = dispatcher::create_dispatcher(sinks, stream_rx)
        .await
        .context("Failed to create dispatcher")?;
    let dispatcher_handle = dispatcher.spawn();

    for stream in streams {
        if stream_tx.send(Arc::new(stream)).await.is_err() {
            warn!("Dispatcher channel closed");
            break;
        }
    }
    drop(stream_tx);

    let summary = dispatcher_handle.await.map_err(CliError::from)?;
    Ok(summary)
}

fn stream_stats(stream: &SyncedStream) -> StreamStats {
    StreamStats {
        device_id: stream.device_id.to_string(),
        synced_to: stream.synced_to.as_ref().map(ToString::to_string),
        rows: stream.len(),
        channels: stream.channel_count(),
    }
}
