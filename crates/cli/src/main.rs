//! # Bela Syncer CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 会话配置加载与验证
//! - 漂移校正管道编排
//! - 同步结果导出

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Bela Syncer CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(logging_config(cli))
}

fn logging_config(cli: &Cli) -> ObservabilityConfig {
    ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet, cli.log_format.clone().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_from_flags() {
        let cli = Cli::parse_from(["bela-syncer", "-v", "--log-format", "compact", "validate"]);
        let config = logging_config(&cli);
        assert_eq!(config.default_log_level, "debug");
        assert_eq!(config.log_format, observability::LogFormat::Compact);
        assert_eq!(config.metrics_port, None);
    }
}
