//! Sync and sensor tracks - Ingestion output
//!
//! A device record is a pair of tracks decoded from its log files:
//! clock-tick observations (`SyncTrack`) and channel readings (`SensorTrack`).

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Clock-signal observation on a device's local frame clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncTick {
    /// Frames elapsed since device start when the tick was seen
    pub frame: u64,

    /// Message value carried by the clock signal
    pub message: f32,
}

impl SyncTick {
    pub fn new(frame: u64, message: f32) -> Self {
        Self { frame, message }
    }
}

/// Span between two consecutive ticks, `[start_frame, end_frame)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Block index (ascending processing order)
    pub index: usize,
    pub start_frame: u64,
    pub end_frame: u64,
}

impl Block {
    /// Frames elapsed between the two bounding ticks
    #[inline]
    pub fn span(&self) -> u64 {
        self.end_frame - self.start_frame
    }

    /// Signed difference between the observed span and the nominal interval
    #[inline]
    pub fn drift(&self, interval: u64) -> i64 {
        self.span() as i64 - interval as i64
    }
}

/// Ordered clock ticks, strictly increasing in frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncTrack {
    ticks: Vec<SyncTick>,
}

impl SyncTrack {
    /// Build a track, rejecting ticks that are not strictly increasing
    pub fn new(ticks: Vec<SyncTick>) -> Result<Self, ContractError> {
        if let Some(pos) = ticks.windows(2).position(|w| w[1].frame <= w[0].frame) {
            return Err(ContractError::invalid_track(format!(
                "sync tick {} (frame {}) does not follow frame {}",
                pos + 1,
                ticks[pos + 1].frame,
                ticks[pos].frame
            )));
        }
        Ok(Self { ticks })
    }

    /// Build a track from bare frame values (message 0)
    pub fn from_frames(frames: &[u64]) -> Result<Self, ContractError> {
        Self::new(frames.iter().map(|&f| SyncTick::new(f, 0.0)).collect())
    }

    pub fn ticks(&self) -> &[SyncTick] {
        &self.ticks
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn first(&self) -> Option<&SyncTick> {
        self.ticks.first()
    }

    pub fn last(&self) -> Option<&SyncTick> {
        self.ticks.last()
    }

    /// Number of complete blocks
    pub fn block_count(&self) -> usize {
        self.ticks.len().saturating_sub(1)
    }

    /// Fails with `EmptySyncTrack` unless at least one block can be formed
    pub fn require_blocks(&self) -> Result<(), ContractError> {
        if self.ticks.len() < 2 {
            return Err(ContractError::EmptySyncTrack {
                ticks: self.ticks.len(),
            });
        }
        Ok(())
    }

    /// Iterate blocks in ascending order
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.ticks.windows(2).enumerate().map(|(index, w)| Block {
            index,
            start_frame: w[0].frame,
            end_frame: w[1].frame,
        })
    }
}

/// Borrowed view of one sensor sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample<'a> {
    /// Frame index; fractional for interpolated samples
    pub frame: f64,
    pub channels: &'a [f32],
}

/// Sensor readings of one device, non-decreasing in frame
///
/// Stored column-wise: one frame per row plus a row-major value buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorTrack {
    channel_count: usize,
    frames: Vec<f64>,
    values: Vec<f32>,
}

impl SensorTrack {
    /// Create an empty track
    pub fn new(channel_count: usize) -> Self {
        Self::with_capacity(channel_count, 0)
    }

    /// Create an empty track with room for `rows` samples
    pub fn with_capacity(channel_count: usize, rows: usize) -> Self {
        Self {
            channel_count,
            frames: Vec::with_capacity(rows),
            values: Vec::with_capacity(rows * channel_count),
        }
    }

    /// Build a track from `(frame, channels)` rows
    pub fn from_rows<I, R>(channel_count: usize, rows: I) -> Result<Self, ContractError>
    where
        I: IntoIterator<Item = (f64, R)>,
        R: AsRef<[f32]>,
    {
        let mut track = Self::new(channel_count);
        for (frame, channels) in rows {
            track.push(frame, channels.as_ref())?;
        }
        Ok(track)
    }

    /// Append a sample, keeping frames non-decreasing
    pub fn push(&mut self, frame: f64, channels: &[f32]) -> Result<(), ContractError> {
        if channels.len() != self.channel_count {
            return Err(ContractError::invalid_track(format!(
                "sample at frame {frame} has {} channels, expected {}",
                channels.len(),
                self.channel_count
            )));
        }
        if !frame.is_finite() {
            return Err(ContractError::invalid_track(format!(
                "non-finite frame {frame}"
            )));
        }
        if let Some(&last) = self.frames.last() {
            if frame < last {
                return Err(ContractError::invalid_track(format!(
                    "frame {frame} precedes previous frame {last}"
                )));
            }
        }
        self.frames.push(frame);
        self.values.extend_from_slice(channels);
        Ok(())
    }

    /// Append a run of samples from another track with the same layout
    pub fn extend_from(&mut self, other: &SensorTrack, range: Range<usize>) -> Result<(), ContractError> {
        if other.channel_count != self.channel_count {
            return Err(ContractError::invalid_track(format!(
                "cannot append {}-channel rows to a {}-channel track",
                other.channel_count, self.channel_count
            )));
        }
        if range.is_empty() {
            return Ok(());
        }
        if let (Some(&last), Some(&first)) = (self.frames.last(), other.frames.get(range.start)) {
            if first < last {
                return Err(ContractError::invalid_track(format!(
                    "frame {first} precedes previous frame {last}"
                )));
            }
        }
        let cc = self.channel_count;
        self.frames.extend_from_slice(&other.frames[range.clone()]);
        self.values
            .extend_from_slice(&other.values[range.start * cc..range.end * cc]);
        Ok(())
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[f64] {
        &self.frames
    }

    /// Row-major channel values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn frame(&self, pos: usize) -> Option<f64> {
        self.frames.get(pos).copied()
    }

    pub fn channels(&self, pos: usize) -> Option<&[f32]> {
        if pos >= self.len() {
            return None;
        }
        let cc = self.channel_count;
        Some(&self.values[pos * cc..(pos + 1) * cc])
    }

    pub fn sample(&self, pos: usize) -> Option<SensorSample<'_>> {
        Some(SensorSample {
            frame: self.frame(pos)?,
            channels: self.channels(pos)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SensorSample<'_>> + '_ {
        let cc = self.channel_count;
        (0..self.len()).map(move |pos| SensorSample {
            frame: self.frames[pos],
            channels: &self.values[pos * cc..(pos + 1) * cc],
        })
    }

    /// Position of the first sample whose frame is >= `frame`
    pub fn lower_bound(&self, frame: f64) -> usize {
        self.frames.partition_point(|&f| f < frame)
    }

    /// Position of the sample recorded exactly at `frame`
    pub fn position_of_frame(&self, frame: u64) -> Option<usize> {
        let target = frame as f64;
        let pos = self.lower_bound(target);
        (self.frames.get(pos) == Some(&target)).then_some(pos)
    }

    /// Copy of the samples in `range`
    pub fn slice(&self, range: Range<usize>) -> SensorTrack {
        let cc = self.channel_count;
        SensorTrack {
            channel_count: cc,
            frames: self.frames[range.clone()].to_vec(),
            values: self.values[range.start * cc..range.end * cc].to_vec(),
        }
    }

    /// Drop the frame column, keeping channel values in row order
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> SensorTrack {
        SensorTrack::from_rows(
            2,
            (0..len).map(|i| (i as f64, [i as f32, -(i as f32)])),
        )
        .unwrap()
    }

    #[test]
    fn test_sync_track_rejects_non_increasing() {
        let result = SyncTrack::from_frames(&[0, 100, 100, 200]);
        assert!(matches!(result, Err(ContractError::InvalidTrack { .. })));
    }

    #[test]
    fn test_blocks_are_half_open_pairs() {
        let track = SyncTrack::from_frames(&[0, 103, 199, 300]).unwrap();
        let blocks: Vec<_> = track.blocks().collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].start_frame, 103);
        assert_eq!(blocks[1].end_frame, 199);
        assert_eq!(blocks[1].drift(100), -4);
        assert_eq!(track.block_count(), 3);
    }

    #[test]
    fn test_require_blocks() {
        let one = SyncTrack::from_frames(&[10]).unwrap();
        assert!(matches!(
            one.require_blocks(),
            Err(ContractError::EmptySyncTrack { ticks: 1 })
        ));
        assert!(SyncTrack::from_frames(&[0, 5]).unwrap().require_blocks().is_ok());
    }

    #[test]
    fn test_sensor_track_rejects_wrong_width() {
        let mut track = SensorTrack::new(3);
        assert!(track.push(0.0, &[1.0, 2.0]).is_err());
        assert!(track.push(0.0, &[1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn test_sensor_track_rejects_decreasing_frames() {
        let mut track = SensorTrack::new(1);
        track.push(5.0, &[0.0]).unwrap();
        track.push(5.0, &[0.0]).unwrap();
        assert!(track.push(4.0, &[0.0]).is_err());
    }

    #[test]
    fn test_frame_lookup() {
        let track = ramp(10);
        assert_eq!(track.position_of_frame(7), Some(7));
        assert_eq!(track.position_of_frame(10), None);
        assert_eq!(track.lower_bound(3.5), 4);
        assert_eq!(track.channels(3), Some(&[3.0, -3.0][..]));
    }

    #[test]
    fn test_slice_and_extend() {
        let track = ramp(10);
        let middle = track.slice(2..5);
        assert_eq!(middle.frames(), &[2.0, 3.0, 4.0]);

        let mut out = SensorTrack::new(2);
        out.extend_from(&track, 0..2).unwrap();
        out.extend_from(&track, 6..8).unwrap();
        assert_eq!(out.frames(), &[0.0, 1.0, 6.0, 7.0]);
        assert_eq!(out.channels(2), Some(&[6.0, -6.0][..]));
        assert!(out.extend_from(&track, 0..1).is_err());
    }

    #[test]
    fn test_iter_yields_rows() {
        let track = ramp(3);
        let rows: Vec<_> = track.iter().map(|s| (s.frame, s.channels[0])).collect();
        assert_eq!(rows, vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    }
}
