//! Offset Trimmer
//!
//! Cuts the pre-roll before the first clock tick and the post-roll from the
//! last tick on, so tracks of different devices start on a shared tick.

use std::ops::Range;

use contracts::{ContractError, SensorTrack, SyncTrack};
use tracing::debug;

/// Positions of `sensor` between the first tick (inclusive) and the last tick (exclusive)
pub fn trim_range(sensor: &SensorTrack, sync: &SyncTrack) -> Result<Range<usize>, ContractError> {
    sync.require_blocks()?;
    let (Some(first), Some(last)) = (sync.first(), sync.last()) else {
        return Err(ContractError::EmptySyncTrack { ticks: sync.len() });
    };
    let start = sensor.lower_bound(first.frame as f64);
    let end = sensor.lower_bound(last.frame as f64);
    Ok(start..end.max(start))
}

/// Trimmed copy of `sensor`; the input is left untouched
pub fn trim_to_sync(sensor: &SensorTrack, sync: &SyncTrack) -> Result<SensorTrack, ContractError> {
    let range = trim_range(sensor, sync)?;
    debug!(
        pre_roll = range.start,
        post_roll = sensor.len() - range.end,
        kept = range.len(),
        "trimmed sensor track to sync ticks"
    );
    Ok(sensor.slice(range))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contiguous(len: usize) -> SensorTrack {
        SensorTrack::from_rows(1, (0..len).map(|i| (i as f64, [i as f32]))).unwrap()
    }

    #[test]
    fn test_trim_is_half_open() {
        let sensor = contiguous(50);
        let sync = SyncTrack::from_frames(&[5, 20, 40]).unwrap();
        let trimmed = trim_to_sync(&sensor, &sync).unwrap();
        assert_eq!(trimmed.len(), 35);
        assert_eq!(trimmed.frame(0), Some(5.0));
        assert_eq!(trimmed.frame(34), Some(39.0));
        assert_eq!(sensor.len(), 50);
    }

    #[test]
    fn test_trim_uses_lower_bound_for_gaps() {
        let sensor = SensorTrack::from_rows(
            1,
            [0.0, 1.0, 4.0, 5.0, 9.0, 10.0].map(|f| (f, [f as f32])),
        )
        .unwrap();
        let sync = SyncTrack::from_frames(&[2, 8]).unwrap();
        assert_eq!(trim_range(&sensor, &sync).unwrap(), 2..4);
    }

    #[test]
    fn test_ticks_past_end_of_track() {
        let sensor = contiguous(10);
        let sync = SyncTrack::from_frames(&[20, 30]).unwrap();
        assert!(trim_to_sync(&sensor, &sync).unwrap().is_empty());
    }

    #[test]
    fn test_single_tick_rejected() {
        let sensor = contiguous(10);
        let sync = SyncTrack::from_frames(&[3]).unwrap();
        assert!(matches!(
            trim_to_sync(&sensor, &sync),
            Err(ContractError::EmptySyncTrack { ticks: 1 })
        ));
    }
}
