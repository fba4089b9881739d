//! # Dispatcher
//!
//! 同步结果分发与持久化模块。
//!
//! 负责：
//! - 消费 `SyncedStream`
//! - Fan-out 到多个 sinks (每个 sink 独立队列与 worker)
//! - 背压：队列满时等待，不丢弃
//! - 读取 FileSink 写出的同步结果 (`SyncedDataLoader`)

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod loader;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, SyncedStream};
pub use dispatcher::{
    create_dispatcher, DispatchSummary, Dispatcher, DispatcherBuilder, DispatcherConfig,
    SinkSummary,
};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use loader::{SyncedDataLoader, SyncedSidecar};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
