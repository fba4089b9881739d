//! # Ingestion
//!
//! Bela 日志加载模块。
//!
//! Responsibilities:
//! - Decode headerless little-endian `f32` log files (`BinaryLogLoader`)
//! - Convert sync logs into `SyncTrack` and sensor logs into `SensorTrack`
//! - Load a configured device into a `DeviceRecording`
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::DeviceLoader;
//!
//! let loader = DeviceLoader::default();
//! let tx = loader.load_transmitter(&blueprint.transmitter)?;
//! for rx in &blueprint.receivers {
//!     let recording = loader.load(rx)?;
//! }
//! ```

mod device;
mod error;
mod layout;
mod loader;
mod stats;

// Re-exports
pub use device::{DeviceLoader, DeviceRecording};
pub use error::{IngestionError, Result};
pub use layout::{RecordLayout, FRAMES_FIELD, MESSAGE_FIELD};
pub use loader::{BinaryLogLoader, RecordBatch};
pub use stats::{LoaderMetrics, LoaderSnapshot};
