//! # Sync Engine
//!
//! 基于时钟信号的漂移校正引擎。
//!
//! 负责：
//! - 按首尾时钟信号裁剪传感器轨道 (Offset Trimmer)
//! - 逐块校正接收端样本数：丢弃多余样本 / 线性插值补齐缺失样本
//! - 构建发射端参考轨道
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{build_reference, DriftCorrector, SyncEngineConfig};
//!
//! let reference = build_reference(tx_id, &tx_sync, &tx_sensor, d_clock)?;
//! let corrector = DriftCorrector::new(SyncEngineConfig::default());
//!
//! let outcome = corrector.synchronize(rx_id, &rx_sync, &rx_sensor, &reference)?;
//! assert_eq!(outcome.stream.len(), reference.len());
//! ```

mod block;
mod engine;
mod interpolate;
mod reference;
mod trim;

// Re-exports
pub use block::classify;
pub use contracts::{SyncEngineConfig, DEFAULT_MAX_DRIFT_RATIO, DEFAULT_ROUND_DECIMALS};
pub use engine::{synchronize, DriftCorrector};
pub use interpolate::{fill_gap, round_to};
pub use reference::{build_reference, check_interval_consistency, IntervalDeviation};
pub use trim::{trim_range, trim_to_sync};

// Re-export contracts types
pub use contracts::{BlockCorrection, ReferenceTrack, SyncOutcome, SyncReport, SyncedStream};
