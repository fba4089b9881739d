//! Pipeline statistics and metrics.

use std::time::Duration;

use dispatcher::DispatchSummary;
use ingestion::LoaderSnapshot;
use observability::CorrectionAggregator;

/// One exported stream
#[derive(Debug, Clone)]
pub struct StreamStats {
    pub device_id: String,
    /// Transmitter the stream was aligned against (`None` for standalone devices)
    pub synced_to: Option<String>,
    pub rows: usize,
    pub channels: usize,
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Rows of the transmitter's trimmed track
    pub reference_len: usize,

    /// Blocks in the transmitter's sync track
    pub reference_blocks: usize,

    /// Receivers aligned to the reference
    pub receivers_synced: usize,

    /// Devices exported without correction
    pub standalone_exported: usize,

    /// Every stream handed to the dispatcher, transmitter first
    pub streams: Vec<StreamStats>,

    /// Log file counters
    pub loader: LoaderSnapshot,

    /// Drift correction aggregator
    pub corrections: CorrectionAggregator,

    /// Dispatcher counters
    pub dispatch: DispatchSummary,
}

impl PipelineStats {
    /// Receiver streams whose length differs from the reference
    pub fn length_mismatches(&self) -> Vec<&StreamStats> {
        self.streams
            .iter()
            .filter(|s| s.synced_to.is_some() && s.rows != self.reference_len)
            .collect()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!(
            "   ├─ Reference: {} rows over {} blocks",
            self.reference_len, self.reference_blocks
        );
        println!("   ├─ Receivers synced: {}", self.receivers_synced);
        println!("   ├─ Standalone exported: {}", self.standalone_exported);
        println!(
            "   └─ Logs read: {} files, {} bytes, {} records",
            self.loader.files_loaded, self.loader.bytes_read, self.loader.records_decoded
        );

        println!("\n🧭 Streams");
        for (i, stream) in self.streams.iter().enumerate() {
            let prefix = if i == self.streams.len() - 1 { "└─" } else { "├─" };
            let target = stream
                .synced_to
                .as_deref()
                .map_or_else(|| "standalone".to_string(), |tx| format!("synced to {tx}"));
            println!(
                "   {} {}: {} rows x {} channels ({})",
                prefix, stream.device_id, stream.rows, stream.channels, target
            );
        }

        let mismatches = self.length_mismatches();
        if !mismatches.is_empty() {
            println!("\n⚠️  Length Mismatches");
            for stream in mismatches {
                println!(
                    "   ├─ {}: {} rows, reference {}",
                    stream.device_id, stream.rows, self.reference_len
                );
            }
        }

        println!("\n📈 {}", self.corrections.summary());

        if !self.dispatch.sinks.is_empty() {
            println!("\n📤 Sinks");
            for (i, sink) in self.dispatch.sinks.iter().enumerate() {
                let prefix = if i == self.dispatch.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} writes, {} rows, {} failures",
                    prefix, sink.name, sink.writes, sink.rows_written, sink.failures
                );
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(id: &str, synced_to: Option<&str>, rows: usize) -> StreamStats {
        StreamStats {
            device_id: id.into(),
            synced_to: synced_to.map(Into::into),
            rows,
            channels: 2,
        }
    }

    #[test]
    fn test_length_mismatches_skip_standalone() {
        let stats = PipelineStats {
            reference_len: 300,
            streams: vec![
                stream("TX0", Some("TX0"), 300),
                stream("RX1", Some("TX0"), 300),
                stream("RX2", Some("TX0"), 297),
                stream("RX0", None, 512),
            ],
            ..Default::default()
        };
        let mismatches: Vec<_> = stats
            .length_mismatches()
            .into_iter()
            .map(|s| s.device_id.as_str())
            .collect();
        assert_eq!(mismatches, vec!["RX2"]);
    }
}
