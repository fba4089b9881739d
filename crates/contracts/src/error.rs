//! Layered error definitions
//!
//! Categorized by source: config / decode / track / sync / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Decode Errors =====
    /// Malformed or truncated binary record stream
    #[error("decode error in {context}: {message}")]
    Decode { context: String, message: String },

    // ===== Track Errors =====
    /// Track invariant violated (ordering, row width, frame value)
    #[error("invalid track: {message}")]
    InvalidTrack { message: String },

    /// Fewer than two clock ticks, so no block can be formed
    #[error("sync track has {ticks} tick(s), at least 2 are required to form a block")]
    EmptySyncTrack { ticks: usize },

    // ===== Sync Errors =====
    /// Nominal interval must be a positive frame count
    #[error("nominal clock interval must be > 0")]
    InvalidInterval,

    /// Block drift beyond the tolerated share of the nominal interval
    #[error(
        "unresolved anomaly in block {block} [{start_frame}, {end_frame}): drift {drift} exceeds tolerance for interval {interval}"
    )]
    UnresolvedAnomaly {
        block: usize,
        start_frame: u64,
        end_frame: u64,
        drift: i64,
        interval: u64,
    },

    /// A boundary sample required for correction is absent from the sensor track
    #[error("block {block}: no sensor sample recorded at frame {frame}")]
    MissingFrame { block: usize, frame: u64 },

    /// Block holds fewer samples than the surplus to drop
    #[error("block {block}: cannot drop {requested} samples, only {available} available")]
    InsufficientSamples {
        block: usize,
        available: usize,
        requested: usize,
    },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create decode error
    pub fn decode(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create invalid track error
    pub fn invalid_track(message: impl Into<String>) -> Self {
        Self::InvalidTrack {
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether the error flags a block the engine refused to correct
    pub fn is_anomaly(&self) -> bool {
        matches!(self, Self::UnresolvedAnomaly { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_message_carries_boundaries() {
        let err = ContractError::UnresolvedAnomaly {
            block: 3,
            start_frame: 300,
            end_frame: 451,
            drift: 51,
            interval: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("block 3"), "got: {msg}");
        assert!(msg.contains("[300, 451)"), "got: {msg}");
        assert!(err.is_anomaly());
    }

    #[test]
    fn test_empty_sync_track_message() {
        let err = ContractError::EmptySyncTrack { ticks: 1 };
        assert!(err.to_string().contains("1 tick(s)"));
        assert!(!err.is_anomaly());
    }
}
