//! Drift Correction Engine

use contracts::{
    BlockCorrection, BlockReport, ChannelMatrix, ContractError, DeviceId, ReferenceTrack,
    SensorTrack, SyncEngineConfig, SyncOutcome, SyncReport, SyncTrack, SyncedStream,
};
use tracing::{debug, info, instrument, warn};

use crate::block::classify;
use crate::interpolate::fill_gap;
use crate::trim::trim_range;

/// Rewrites a receiver's sensor track so every block holds exactly the
/// nominal number of samples
#[derive(Debug, Clone, Default)]
pub struct DriftCorrector {
    config: SyncEngineConfig,
}

impl DriftCorrector {
    pub fn new(config: SyncEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncEngineConfig {
        &self.config
    }

    /// Trim `sensor` to `sync` and correct it block by block
    ///
    /// The output keeps its frame column; synthesized samples carry
    /// fractional frames. Boundary lookups run against the untrimmed input,
    /// so a deficit in the last block can use the samples recorded right
    /// after the final tick.
    pub fn correct_track(
        &self,
        sync: &SyncTrack,
        sensor: &SensorTrack,
        interval: u64,
    ) -> Result<(SensorTrack, SyncReport), ContractError> {
        if interval == 0 {
            return Err(ContractError::InvalidInterval);
        }
        let range = trim_range(sensor, sync)?;
        let decimals = self.config.round_decimals;

        let mut out = SensorTrack::with_capacity(sensor.channel_count(), range.len());
        let mut blocks = Vec::with_capacity(sync.block_count());
        let mut cursor = range.start;

        for block in sync.blocks() {
            let drift = block.drift(interval);
            metrics::histogram!("bela_syncer_block_drift").record(drift as f64);

            let correction = match classify(&block, interval, &self.config) {
                Ok(c) => c,
                Err(err) => {
                    metrics::counter!("bela_syncer_anomalies_total").increment(1);
                    warn!(
                        block = block.index,
                        start_frame = block.start_frame,
                        end_frame = block.end_frame,
                        drift,
                        "block drift beyond tolerance"
                    );
                    return Err(err);
                }
            };

            match correction {
                BlockCorrection::Balanced | BlockCorrection::Unwrapped { .. } => {}
                BlockCorrection::Surplus { dropped, .. } => {
                    let boundary = sensor.lower_bound(block.end_frame as f64).min(range.end);
                    let available = boundary.saturating_sub(cursor);
                    if dropped > available {
                        return Err(ContractError::InsufficientSamples {
                            block: block.index,
                            available,
                            requested: dropped,
                        });
                    }
                    out.extend_from(sensor, cursor..boundary - dropped)?;
                    cursor = boundary;
                    debug!(block = block.index, dropped, "dropped surplus samples");
                }
                BlockCorrection::Deficit { inserted } => {
                    let t1 = block.end_frame;
                    let missing = |frame| ContractError::MissingFrame {
                        block: block.index,
                        frame,
                    };
                    let p1 = sensor.position_of_frame(t1).ok_or_else(|| missing(t1))?;
                    let p2 = sensor
                        .position_of_frame(t1 + 1)
                        .ok_or_else(|| missing(t1 + 1))?;
                    let (Some(x1), Some(x2)) = (sensor.channels(p1), sensor.channels(p2)) else {
                        return Err(missing(t1));
                    };

                    let copy_end = (p1 + 1).min(range.end);
                    if cursor < copy_end {
                        out.extend_from(sensor, cursor..copy_end)?;
                    }
                    fill_gap(&mut out, t1, x1, x2, inserted, decimals)?;
                    cursor = cursor.max(p1 + 1);
                    debug!(block = block.index, inserted, "interpolated missing samples");
                }
            }

            blocks.push(BlockReport {
                block: block.index,
                start_frame: block.start_frame,
                end_frame: block.end_frame,
                drift,
                correction,
            });
        }

        if cursor < range.end {
            out.extend_from(sensor, cursor..range.end)?;
        }

        let report = SyncReport {
            interval,
            input_len: range.len(),
            output_len: out.len(),
            blocks,
            ..Default::default()
        };
        Ok((out, report))
    }

    /// Align a receiver to the transmitter's reference grid
    #[instrument(
        name = "drift_correct",
        skip_all,
        fields(device_id = %receiver_id, interval = reference.interval())
    )]
    pub fn synchronize(
        &self,
        receiver_id: DeviceId,
        sync: &SyncTrack,
        sensor: &SensorTrack,
        reference: &ReferenceTrack,
    ) -> Result<SyncOutcome, ContractError> {
        let interval = reference.interval();
        let (track, mut report) = self.correct_track(sync, sensor, interval)?;
        let data = ChannelMatrix::new(track.channel_count(), track.into_values())?;

        report.receiver = receiver_id.clone();
        report.transmitter = Some(reference.device_id.clone());

        let remainder = data.len() as u64 % interval;
        if remainder != 0 {
            warn!(
                len = data.len(),
                remainder,
                "synced length is not a whole number of intervals, samples may be missing inside a block"
            );
        }
        if sync.block_count() == reference.block_count && data.len() != reference.len() {
            warn!(
                len = data.len(),
                reference_len = reference.len(),
                "synced length differs from the reference track"
            );
        }

        info!(
            input_len = report.input_len,
            output_len = report.output_len,
            dropped = report.dropped_total(),
            inserted = report.inserted_total(),
            missed_ticks = report.missed_ticks_total(),
            "receiver synchronized"
        );

        let stream = SyncedStream::aligned(receiver_id, reference.device_id.clone(), data);
        Ok(SyncOutcome { stream, report })
    }
}

/// Correct `sensor` against `interval` with default settings, dropping frames
pub fn synchronize(
    sync: &SyncTrack,
    sensor: &SensorTrack,
    interval: u64,
) -> Result<ChannelMatrix, ContractError> {
    let (track, _) = DriftCorrector::default().correct_track(sync, sensor, interval)?;
    ChannelMatrix::new(track.channel_count(), track.into_values())
}
