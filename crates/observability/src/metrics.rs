//! 漂移校正指标收集模块
//!
//! 基于 SyncReport 收集和统计校正引擎的运行指标。

use std::collections::BTreeMap;

use contracts::{BlockCorrection, SyncReport};
use metrics::{counter, gauge, histogram};

/// 从 SyncReport 记录指标
///
/// 每个接收端同步完成后调用一次。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_correction_metrics;
///
/// let outcome = corrector.synchronize(rx_id, &sync, &sensor, &reference)?;
/// record_correction_metrics(&outcome.report);
/// ```
pub fn record_correction_metrics(report: &SyncReport) {
    for block in &report.blocks {
        counter!(
            "bela_syncer_blocks_total",
            "correction" => block.correction.label()
        )
        .increment(1);
    }

    let dropped = report.dropped_total();
    if dropped > 0 {
        counter!("bela_syncer_samples_dropped_total").increment(dropped as u64);
    }

    let inserted = report.inserted_total();
    if inserted > 0 {
        counter!("bela_syncer_samples_interpolated_total").increment(inserted as u64);
    }

    let missed = report.missed_ticks_total();
    if missed > 0 {
        counter!("bela_syncer_missed_ticks_total").increment(missed);
    }

    gauge!(
        "bela_syncer_stream_len",
        "device_id" => report.receiver.to_string()
    )
    .set(report.output_len as f64);
}

/// 记录设备日志加载
pub fn record_device_loaded(device_id: &str, role: &str, samples: usize) {
    gauge!(
        "bela_syncer_device_samples",
        "device_id" => device_id.to_string(),
        "role" => role.to_string()
    )
    .set(samples as f64);
}

/// 记录同步流分发
///
/// 每个 sink 在分发结束后调用一次，按写入成功/失败分别计数。
pub fn record_streams_dispatched(sink_name: &str, writes: u64, failures: u64) {
    counter!(
        "bela_syncer_streams_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => "success"
    )
    .increment(writes);
    if failures > 0 {
        counter!(
            "bela_syncer_streams_dispatched_total",
            "sink" => sink_name.to_string(),
            "status" => "failure"
        )
        .increment(failures);
    }
}

/// 记录单个接收端的同步耗时
pub fn record_sync_duration_ms(device_id: &str, duration_ms: f64) {
    histogram!(
        "bela_syncer_sync_duration_ms",
        "device_id" => device_id.to_string()
    )
    .record(duration_ms);
}

/// 校正指标聚合器
///
/// 在内存中聚合多个 SyncReport，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct CorrectionAggregator {
    /// 处理的接收端数
    pub receivers: u64,

    /// 总块数
    pub total_blocks: u64,

    /// 样本数被修改的块数
    pub corrected_blocks: u64,

    /// 丢弃样本总数
    pub total_dropped: u64,

    /// 插值样本总数
    pub total_inserted: u64,

    /// 漏检时钟信号总数
    pub total_missed_ticks: u64,

    /// 原始漂移统计 (帧)
    pub drift_stats: RunningStats,

    /// 各校正类型的块数
    pub correction_counts: BTreeMap<&'static str, u64>,

    /// 各接收端的输出长度
    pub stream_lens: BTreeMap<String, usize>,
}

impl CorrectionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &SyncReport) {
        self.receivers += 1;
        self.total_blocks += report.blocks.len() as u64;
        self.corrected_blocks += report.corrected_blocks() as u64;
        self.total_dropped += report.dropped_total() as u64;
        self.total_inserted += report.inserted_total() as u64;
        self.total_missed_ticks += report.missed_ticks_total();

        for block in &report.blocks {
            self.drift_stats.push(block.drift as f64);
            *self
                .correction_counts
                .entry(block.correction.label())
                .or_insert(0) += 1;
        }

        self.stream_lens
            .insert(report.receiver.to_string(), report.output_len);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> CorrectionSummary {
        CorrectionSummary {
            receivers: self.receivers,
            total_blocks: self.total_blocks,
            corrected_blocks: self.corrected_blocks,
            total_dropped: self.total_dropped,
            total_inserted: self.total_inserted,
            total_missed_ticks: self.total_missed_ticks,
            corrected_rate: if self.total_blocks > 0 {
                self.corrected_blocks as f64 / self.total_blocks as f64 * 100.0
            } else {
                0.0
            },
            drift: StatsSummary::from(&self.drift_stats),
            correction_counts: self.correction_counts.clone(),
            stream_lens: self.stream_lens.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 校正摘要
#[derive(Debug, Clone, Default)]
pub struct CorrectionSummary {
    pub receivers: u64,
    pub total_blocks: u64,
    pub corrected_blocks: u64,
    pub total_dropped: u64,
    pub total_inserted: u64,
    pub total_missed_ticks: u64,
    pub corrected_rate: f64,
    pub drift: StatsSummary,
    pub correction_counts: BTreeMap<&'static str, u64>,
    pub stream_lens: BTreeMap<String, usize>,
}

impl std::fmt::Display for CorrectionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Drift Correction Summary ===")?;
        writeln!(f, "Receivers: {}", self.receivers)?;
        writeln!(
            f,
            "Blocks: {} ({} corrected, {:.2}%)",
            self.total_blocks, self.corrected_blocks, self.corrected_rate
        )?;
        writeln!(f, "Samples dropped: {}", self.total_dropped)?;
        writeln!(f, "Samples interpolated: {}", self.total_inserted)?;
        writeln!(f, "Missed ticks: {}", self.total_missed_ticks)?;
        writeln!(f, "Block drift (frames): {}", self.drift)?;

        if !self.correction_counts.is_empty() {
            writeln!(f, "Blocks by correction:")?;
            for (kind, count) in &self.correction_counts {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        if !self.stream_lens.is_empty() {
            writeln!(f, "Synced lengths:")?;
            for (device, len) in &self.stream_lens {
                writeln!(f, "  {}: {}", device, len)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// 单行块描述，用于日志
pub fn describe_correction(correction: &BlockCorrection) -> String {
    match correction {
        BlockCorrection::Balanced => "balanced".to_string(),
        BlockCorrection::Unwrapped { missed_ticks } => {
            format!("unwrapped {missed_ticks} missed tick(s)")
        }
        BlockCorrection::Surplus {
            dropped,
            missed_ticks,
        } => format!("dropped {dropped} sample(s), {missed_ticks} missed tick(s)"),
        BlockCorrection::Deficit { inserted } => format!("interpolated {inserted} sample(s)"),
    }
}
