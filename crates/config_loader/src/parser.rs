//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, SessionBlueprint};
use std::path::Path;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 会话文件的扩展名
    pub fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }

    /// 从会话文件路径推断格式, 错误信息带上路径和扩展名
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!(
                "session file {} has no extension, expected .toml or .json",
                path.display()
            ))
        })?;
        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!(
                "unsupported config format: .{ext} for session file {}, expected .toml or .json",
                path.display()
            ))
        })
    }
}

fn parse_error(
    format: ConfigFormat,
    e: impl std::error::Error + Send + Sync + 'static,
) -> ContractError {
    ContractError::ConfigParse {
        message: format!("session blueprint (.{}) parse error: {e}", format.extension()),
        source: Some(Box::new(e)),
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<SessionBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| parse_error(ConfigFormat::Toml, e))
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<SessionBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| parse_error(ConfigFormat::Json, e))
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<SessionBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
