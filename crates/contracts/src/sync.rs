//! SyncedStream - Sync Engine output
//!
//! Positionally indexed channel data plus the per-block record of what the
//! drift correction did to produce it.

use serde::{Deserialize, Serialize};

use crate::{ContractError, DeviceId};

/// Row-major matrix of channel values, indexed by position only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMatrix {
    channel_count: usize,
    values: Vec<f32>,
}

impl ChannelMatrix {
    /// Wrap a row-major buffer; its length must be a multiple of `channel_count`
    pub fn new(channel_count: usize, values: Vec<f32>) -> Result<Self, ContractError> {
        if channel_count == 0 {
            return Err(ContractError::invalid_track("channel count must be > 0"));
        }
        if values.len() % channel_count != 0 {
            return Err(ContractError::invalid_track(format!(
                "{} values do not form whole rows of {} channels",
                values.len(),
                channel_count
            )));
        }
        Ok(Self {
            channel_count,
            values,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        if self.channel_count == 0 {
            0
        } else {
            self.values.len() / self.channel_count
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(rows, channels)`
    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.channel_count)
    }

    pub fn row(&self, pos: usize) -> Option<&[f32]> {
        let cc = self.channel_count;
        self.values.get(pos * cc..(pos + 1) * cc)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.values.chunks_exact(self.channel_count.max(1))
    }

    /// Values of one channel (0-based) down all rows
    pub fn column(&self, channel: usize) -> Option<Vec<f32>> {
        (channel < self.channel_count).then(|| self.rows().map(|r| r[channel]).collect())
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.rows().map(<[f32]>::to_vec).collect()
    }
}

/// A device's sensor data on the transmitter's frame grid
///
/// Immutable once built; re-synchronizing produces a new stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedStream {
    /// Device that recorded the samples
    pub device_id: DeviceId,

    /// Transmitter the stream was aligned against (`None` for standalone devices)
    pub synced_to: Option<DeviceId>,

    /// `{device_id}-x{n}` per channel
    pub channel_names: Vec<String>,

    /// Channel values, frame column discarded
    pub data: ChannelMatrix,
}

impl SyncedStream {
    /// Stream aligned against `transmitter`
    pub fn aligned(device_id: DeviceId, transmitter: DeviceId, data: ChannelMatrix) -> Self {
        let channel_names = device_id.channel_names(data.channel_count());
        Self {
            device_id,
            synced_to: Some(transmitter),
            channel_names,
            data,
        }
    }

    /// Stream of a device recorded without a clock reference
    pub fn standalone(device_id: DeviceId, data: ChannelMatrix) -> Self {
        let channel_names = device_id.channel_names(data.channel_count());
        Self {
            device_id,
            synced_to: None,
            channel_names,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.data.channel_count()
    }

    /// Elapsed seconds of each row at `sample_rate` Hz
    pub fn time_axis(&self, sample_rate: f64) -> Vec<f64> {
        (0..self.len()).map(|i| i as f64 / sample_rate).collect()
    }
}

/// The transmitter's own trimmed track, the target grid for every receiver
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTrack {
    pub device_id: DeviceId,

    /// Frames between clock signals (`d_clock`)
    pub interval: u64,

    /// Sync ticks the track was trimmed against
    pub block_count: usize,

    pub data: ChannelMatrix,
}

impl ReferenceTrack {
    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Export the reference as a stream aligned to itself
    pub fn to_stream(&self) -> SyncedStream {
        SyncedStream::aligned(
            self.device_id.clone(),
            self.device_id.clone(),
            self.data.clone(),
        )
    }
}

/// What drift correction did to one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockCorrection {
    /// Span matched the nominal interval
    Balanced,
    /// Span was a whole multiple of the interval (missed ticks)
    Unwrapped { missed_ticks: u64 },
    /// Surplus samples dropped before the block end
    Surplus { dropped: usize, missed_ticks: u64 },
    /// Missing samples synthesized after the block end
    Deficit { inserted: usize },
}

impl BlockCorrection {
    /// Label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Unwrapped { .. } => "unwrapped",
            Self::Surplus { .. } => "surplus",
            Self::Deficit { .. } => "deficit",
        }
    }

    /// Whether samples were added or removed
    pub fn is_edit(&self) -> bool {
        matches!(self, Self::Surplus { .. } | Self::Deficit { .. })
    }
}

/// Per-block entry of a `SyncReport`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockReport {
    pub block: usize,
    pub start_frame: u64,
    pub end_frame: u64,
    /// Raw drift before unwrapping
    pub drift: i64,
    pub correction: BlockCorrection,
}

/// Summary of a `synchronize` call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub receiver: DeviceId,
    pub transmitter: Option<DeviceId>,
    pub interval: u64,
    pub input_len: usize,
    pub output_len: usize,
    pub blocks: Vec<BlockReport>,
}

impl SyncReport {
    pub fn dropped_total(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| match b.correction {
                BlockCorrection::Surplus { dropped, .. } => dropped,
                _ => 0,
            })
            .sum()
    }

    pub fn inserted_total(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| match b.correction {
                BlockCorrection::Deficit { inserted } => inserted,
                _ => 0,
            })
            .sum()
    }

    pub fn missed_ticks_total(&self) -> u64 {
        self.blocks
            .iter()
            .map(|b| match b.correction {
                BlockCorrection::Unwrapped { missed_ticks }
                | BlockCorrection::Surplus { missed_ticks, .. } => missed_ticks,
                _ => 0,
            })
            .sum()
    }

    /// Blocks whose sample count was edited
    pub fn corrected_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.correction.is_edit()).count()
    }
}

/// Result of synchronizing one receiver
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub stream: SyncedStream,
    pub report: SyncReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_rejects_partial_rows() {
        assert!(ChannelMatrix::new(3, vec![0.0; 7]).is_err());
        assert!(ChannelMatrix::new(0, vec![]).is_err());
        let m = ChannelMatrix::new(3, vec![0.0; 9]).unwrap();
        assert_eq!(m.shape(), (3, 3));
    }

    #[test]
    fn test_matrix_rows_and_columns() {
        let m = ChannelMatrix::new(2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(m.row(3), None);
        assert_eq!(m.column(1), Some(vec![2.0, 4.0, 6.0]));
        assert_eq!(m.column(2), None);
    }

    #[test]
    fn test_stream_channel_names_and_time_axis() {
        let data = ChannelMatrix::new(2, vec![0.0; 8]).unwrap();
        let stream = SyncedStream::aligned("RX1".into(), "TX0".into(), data);
        assert_eq!(stream.channel_names, vec!["RX1-x1", "RX1-x2"]);
        assert_eq!(stream.time_axis(2.0), vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(stream.synced_to.as_deref(), Some("TX0"));
    }

    #[test]
    fn test_report_totals() {
        let block = |i: usize, correction| BlockReport {
            block: i,
            start_frame: 0,
            end_frame: 0,
            drift: 0,
            correction,
        };
        let report = SyncReport {
            blocks: vec![
                block(0, BlockCorrection::Surplus { dropped: 3, missed_ticks: 1 }),
                block(1, BlockCorrection::Deficit { inserted: 4 }),
                block(2, BlockCorrection::Unwrapped { missed_ticks: 2 }),
                block(3, BlockCorrection::Balanced),
            ],
            ..Default::default()
        };
        assert_eq!(report.dropped_total(), 3);
        assert_eq!(report.inserted_total(), 4);
        assert_eq!(report.missed_ticks_total(), 3);
        assert_eq!(report.corrected_blocks(), 2);
    }
}
