//! SessionBlueprint - Config Loader 输出
//!
//! 描述一次同步会话：发射端、接收端、独立设备、同步参数、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::{DeviceId, SyncEngineConfig, DEFAULT_MAX_DRIFT_RATIO, DEFAULT_ROUND_DECIMALS};

/// 发射端默认时钟间隔 (帧): 689 * 8 + 8
pub const DEFAULT_CLOCK_INTERVAL: u64 = 689 * 8 + 8;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的会话配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 发射端 (参考时钟)
    #[validate(nested)]
    pub transmitter: TransmitterConfig,

    /// 接收端列表 (需要漂移校正)
    #[serde(default)]
    #[validate(nested)]
    pub receivers: Vec<DeviceConfig>,

    /// 无同步日志的独立设备
    #[serde(default)]
    #[validate(nested)]
    pub standalone: Vec<DeviceConfig>,

    /// 同步参数
    #[serde(default)]
    #[validate(nested)]
    pub sync: SyncConfig,

    /// 输出路由配置
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// 发射端配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransmitterConfig {
    /// 设备 ID (e.g., "TX0")
    #[validate(length(min = 1, message = "device id cannot be empty"))]
    pub id: String,

    /// 同步日志路径
    pub sync_log: PathBuf,

    /// 传感器日志路径
    pub sensor_log: PathBuf,

    /// 模拟通道数
    #[validate(range(min = 1, message = "num_sensors must be >= 1"))]
    pub num_sensors: usize,

    /// 时钟信号间隔 (帧)
    #[serde(default = "default_d_clock")]
    #[validate(range(min = 1, message = "d_clock must be >= 1"))]
    pub d_clock: u64,

    /// 模拟采样率 (Hz, 可选)
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "sample_rate must be > 0"))]
    pub sample_rate: Option<f64>,
}

/// 接收端 / 独立设备配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeviceConfig {
    /// 设备 ID (e.g., "RX1")
    #[validate(length(min = 1, message = "device id cannot be empty"))]
    pub id: String,

    /// 同步日志路径 (独立设备为空)
    #[serde(default)]
    pub sync_log: Option<PathBuf>,

    /// 传感器日志路径
    pub sensor_log: PathBuf,

    /// 模拟通道数
    #[validate(range(min = 1, message = "num_sensors must be >= 1"))]
    pub num_sensors: usize,

    /// 模拟采样率 (Hz, 可选)
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "sample_rate must be > 0"))]
    pub sample_rate: Option<f64>,
}

/// 同步参数
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncConfig {
    /// 允许的最大漂移占时钟间隔的比例
    #[serde(default = "default_max_drift_ratio")]
    #[validate(range(
        exclusive_min = 0.0,
        max = 1.0,
        message = "max_drift_ratio must be in (0, 1]"
    ))]
    pub max_drift_ratio: f64,

    /// 插值结果保留的小数位
    #[serde(default = "default_round_decimals")]
    #[validate(range(max = 15, message = "round_decimals must be <= 15"))]
    pub round_decimals: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_drift_ratio: DEFAULT_MAX_DRIFT_RATIO,
            round_decimals: DEFAULT_ROUND_DECIMALS,
        }
    }
}

fn default_d_clock() -> u64 {
    DEFAULT_CLOCK_INTERVAL
}

fn default_max_drift_ratio() -> f64 {
    DEFAULT_MAX_DRIFT_RATIO
}

fn default_round_decimals() -> u32 {
    DEFAULT_ROUND_DECIMALS
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    16
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 二进制文件输出
    File,
}

/// 设备在会话中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Transmitter,
    Receiver,
    Standalone,
}

impl TransmitterConfig {
    /// 以通用设备配置形式查看发射端
    pub fn as_device(&self) -> DeviceConfig {
        DeviceConfig {
            id: self.id.clone(),
            sync_log: Some(self.sync_log.clone()),
            sensor_log: self.sensor_log.clone(),
            num_sensors: self.num_sensors,
            sample_rate: self.sample_rate,
        }
    }
}

impl DeviceConfig {
    pub fn device_id(&self) -> DeviceId {
        DeviceId::from(&self.id)
    }
}

impl SessionBlueprint {
    /// Build the drift correction config from the `[sync]` table
    pub fn to_sync_engine_config(&self) -> SyncEngineConfig {
        SyncEngineConfig {
            max_drift_ratio: self.sync.max_drift_ratio,
            round_decimals: self.sync.round_decimals,
        }
    }

    /// Every device id with its role, transmitter first
    pub fn devices(&self) -> impl Iterator<Item = (&str, DeviceRole)> {
        std::iter::once((self.transmitter.id.as_str(), DeviceRole::Transmitter))
            .chain(
                self.receivers
                    .iter()
                    .map(|d| (d.id.as_str(), DeviceRole::Receiver)),
            )
            .chain(
                self.standalone
                    .iter()
                    .map(|d| (d.id.as_str(), DeviceRole::Standalone)),
            )
    }

    /// Resolve relative log paths against `base_dir` (usually the config file's directory)
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };

        resolve(&mut self.transmitter.sync_log);
        resolve(&mut self.transmitter.sensor_log);
        for device in self.receivers.iter_mut().chain(self.standalone.iter_mut()) {
            resolve(&mut device.sensor_log);
            if let Some(sync_log) = device.sync_log.as_mut() {
                resolve(sync_log);
            }
        }
    }
}
