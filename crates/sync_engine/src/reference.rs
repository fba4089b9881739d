//! Transmitter Reference Track

use contracts::{ChannelMatrix, ContractError, DeviceId, ReferenceTrack, SensorTrack, SyncTrack};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::trim::trim_to_sync;

/// A transmitter block whose span differs from the configured interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalDeviation {
    pub block: usize,
    pub span: u64,
    pub deviation: i64,
}

/// Every transmitter block whose span is not exactly `interval`
pub fn check_interval_consistency(sync: &SyncTrack, interval: u64) -> Vec<IntervalDeviation> {
    sync.blocks()
        .filter(|b| b.span() != interval)
        .map(|b| IntervalDeviation {
            block: b.index,
            span: b.span(),
            deviation: b.drift(interval),
        })
        .collect()
}

/// Trim the transmitter's own track and re-index it positionally
///
/// `interval` is the configured clock interval, never derived from `sync`.
#[instrument(name = "build_reference", skip_all, fields(device_id = %device_id, interval = interval))]
pub fn build_reference(
    device_id: DeviceId,
    sync: &SyncTrack,
    sensor: &SensorTrack,
    interval: u64,
) -> Result<ReferenceTrack, ContractError> {
    if interval == 0 {
        return Err(ContractError::InvalidInterval);
    }
    let trimmed = trim_to_sync(sensor, sync)?;

    let deviations = check_interval_consistency(sync, interval);
    if !deviations.is_empty() {
        warn!(
            blocks = deviations.len(),
            first_block = deviations[0].block,
            first_span = deviations[0].span,
            "transmitter clock ticks deviate from the configured interval"
        );
    }

    let data = ChannelMatrix::new(trimmed.channel_count(), trimmed.into_values())?;
    info!(len = data.len(), blocks = sync.block_count(), "reference track built");

    Ok(ReferenceTrack {
        device_id,
        interval,
        block_count: sync.block_count(),
        data,
    })
}
