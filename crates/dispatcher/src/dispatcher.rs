//! Dispatcher - main loop for fan-out to sinks

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{SinkConfig, SinkType, SyncedStream};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Sink configurations
    pub sinks: Vec<SinkConfig>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<Arc<SyncedStream>>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<Arc<SyncedStream>>) -> Self {
        Self { config, input_rx }
    }

    /// Build and start the dispatcher
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let handles = Self::initialize_handles(&self.config)?;

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }

    #[instrument(
        name = "dispatcher_initialize_handles",
        skip(config),
        fields(sink_count = config.sinks.len())
    )]
    fn initialize_handles(config: &DispatcherConfig) -> Result<Vec<SinkHandle>, DispatcherError> {
        config.sinks.iter().map(create_sink_handle).collect()
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Final counters of one sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkSummary {
    pub name: String,
    pub writes: u64,
    pub failures: u64,
    pub rows_written: u64,
}

/// What a dispatcher run delivered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Streams received from the input channel
    pub streams: u64,
    /// Streams that could not be queued on some sink
    pub undelivered: u64,
    pub sinks: Vec<SinkSummary>,
}

impl DispatchSummary {
    pub fn failures_total(&self) -> u64 {
        self.undelivered + self.sinks.iter().map(|s| s.failures).sum::<u64>()
    }

    /// Every stream reached every sink
    pub fn is_clean(&self) -> bool {
        self.failures_total() == 0
    }
}

/// Fans out synced streams to every sink
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<Arc<SyncedStream>>,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles (for testing)
    pub fn with_handles(
        handles: Vec<SinkHandle>,
        input_rx: mpsc::Receiver<Arc<SyncedStream>>,
    ) -> Self {
        Self { handles, input_rx }
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the dispatcher main loop
    ///
    /// Consumes streams from input and fans out to all sinks.
    /// Returns once the input channel is closed and every sink has drained.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> DispatchSummary {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut summary = DispatchSummary::default();

        while let Some(stream) = self.input_rx.recv().await {
            summary.streams += 1;
            summary.undelivered += self.dispatch_stream(&stream).await;
            debug!(
                device_id = %stream.device_id,
                rows = stream.len(),
                "Stream dispatched"
            );
        }

        info!(
            streams = summary.streams,
            "Dispatcher input closed, shutting down"
        );

        summary.sinks = Self::shutdown_handles(self.handles).await;

        if summary.is_clean() {
            info!("Dispatcher shutdown complete");
        } else {
            warn!(
                failures = summary.failures_total(),
                "Dispatcher finished with failures"
            );
        }
        summary
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<DispatchSummary> {
        tokio::spawn(self.run())
    }

    async fn dispatch_stream(&self, stream: &Arc<SyncedStream>) -> u64 {
        let mut undelivered = 0;
        for handle in &self.handles {
            if handle.send(Arc::clone(stream)).await.is_err() {
                undelivered += 1;
            }
        }
        undelivered
    }

    async fn shutdown_handles(handles: Vec<SinkHandle>) -> Vec<SinkSummary> {
        let mut sinks = Vec::with_capacity(handles.len());
        for handle in handles {
            let name = handle.name().to_string();
            let snapshot = handle.shutdown().await;
            sinks.push(SinkSummary {
                name,
                writes: snapshot.write_count,
                failures: snapshot.failure_count,
                rows_written: snapshot.rows_written,
            });
        }
        sinks
    }
}

/// Convenience function to create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx))]
pub async fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<Arc<SyncedStream>>,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config, input_rx).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ChannelMatrix;
    use std::collections::HashMap;

    fn stream(id: &str) -> Arc<SyncedStream> {
        let data = ChannelMatrix::new(1, vec![1.0, 2.0, 3.0]).unwrap();
        Arc::new(SyncedStream::aligned(id.into(), "TX0".into(), data))
    }

    #[tokio::test]
    async fn test_dispatcher_fanout() {
        let (input_tx, input_rx) = mpsc::channel(10);

        let handles = vec![
            SinkHandle::spawn(LogSink::new("sink1"), 10),
            SinkHandle::spawn(LogSink::new("sink2"), 10),
        ];

        let handle = Dispatcher::with_handles(handles, input_rx).spawn();

        for i in 0..5 {
            input_tx.send(stream(&format!("RX{i}"))).await.unwrap();
        }
        drop(input_tx);

        let summary = handle.await.unwrap();
        assert_eq!(summary.streams, 5);
        assert_eq!(summary.sinks.len(), 2);
        assert!(summary.sinks.iter().all(|s| s.writes == 5 && s.rows_written == 15));
        assert!(summary.is_clean());
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let (input_tx, input_rx) = mpsc::channel(10);

        let configs = vec![
            SinkConfig {
                name: "test_log".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "test_file".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 4,
                params: HashMap::from([(
                    "base_path".to_string(),
                    dir.path().display().to_string(),
                )]),
            },
        ];

        let handle = create_dispatcher(configs, input_rx).await.unwrap().spawn();
        input_tx.send(stream("RX1")).await.unwrap();
        drop(input_tx);

        let summary = handle.await.unwrap();
        assert!(summary.is_clean());
        assert!(dir.path().join("RX1-synced.bin").exists());
        assert!(dir.path().join("RX1-synced.json").exists());
    }

    #[test]
    fn test_summary_counts_failures() {
        let summary = DispatchSummary {
            streams: 2,
            undelivered: 1,
            sinks: vec![SinkSummary {
                name: "file".into(),
                writes: 1,
                failures: 1,
                rows_written: 3,
            }],
        };
        assert_eq!(summary.failures_total(), 2);
        assert!(!summary.is_clean());
    }
}
