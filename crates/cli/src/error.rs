//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Session file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A device's logs could not be loaded
    #[error("Failed to load logs of device '{device_id}'")]
    DeviceLoad {
        device_id: String,
        #[source]
        source: ingestion::IngestionError,
    },

    /// Transmitter reference could not be built or a receiver could not be aligned
    #[error("Synchronization of device '{device_id}' failed")]
    Synchronization {
        device_id: String,
        #[source]
        source: contracts::ContractError,
    },

    /// A receiver in the session has no sync log
    #[error("Receiver '{device_id}' has no sync log")]
    MissingSyncLog { device_id: String },

    /// Some streams did not reach every sink
    #[error("Dispatch finished with {failures} failure(s)")]
    Dispatch { failures: u64 },

    /// Background task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn device_load(device_id: impl Into<String>, source: ingestion::IngestionError) -> Self {
        Self::DeviceLoad {
            device_id: device_id.into(),
            source,
        }
    }

    pub fn synchronization(device_id: impl Into<String>, source: contracts::ContractError) -> Self {
        Self::Synchronization {
            device_id: device_id.into(),
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
