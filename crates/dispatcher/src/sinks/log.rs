//! LogSink - logs stream summary via tracing

use contracts::{ContractError, DataSink, SyncedStream};
use tracing::{info, instrument};

/// Sink that logs stream summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_stream_summary(&self, stream: &SyncedStream) {
        info!(
            sink = %self.name,
            device_id = %stream.device_id,
            synced_to = stream.synced_to.as_deref().unwrap_or("-"),
            rows = stream.len(),
            channels = stream.channel_count(),
            "SyncedStream received"
        );
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, stream),
        fields(sink = %self.name, device_id = %stream.device_id)
    )]
    async fn write(&mut self, stream: &SyncedStream) -> Result<(), ContractError> {
        self.log_stream_summary(stream);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ChannelMatrix;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let data = ChannelMatrix::new(2, vec![0.0; 4]).unwrap();
        let stream = SyncedStream::standalone("RX0".into(), data);

        assert!(sink.write(&stream).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
