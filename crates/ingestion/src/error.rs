//! Ingestion 错误类型

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 日志文件无法打开或读取
    #[error("failed to read log file {}: {source}", path.display())]
    Io {
        /// 文件路径
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 文件长度不是记录宽度的整数倍
    #[error(
        "malformed log file {}: {len} bytes is not a multiple of the {record_width}-byte record",
        path.display()
    )]
    Decode {
        /// 文件路径
        path: PathBuf,
        /// 文件字节数
        len: usize,
        /// 单条记录字节数
        record_width: usize,
    },

    /// 记录内容非法 (帧号为负/非有限值等)
    #[error("invalid record {row} in {}: {message}", path.display())]
    InvalidRecord {
        /// 文件路径
        path: PathBuf,
        /// 行号 (0-based)
        row: usize,
        /// 错误消息
        message: String,
    },

    /// 记录布局缺少所需字段
    #[error("record layout has no field '{field}'")]
    MissingField {
        /// 字段名
        field: String,
    },

    /// 轨道构造失败
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
