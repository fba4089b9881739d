//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::SessionBlueprint;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    transmitter: String,
    d_clock: u64,
    receiver_count: usize,
    standalone_count: usize,
    channel_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating session");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let channel_count = blueprint.transmitter.num_sensors
                + blueprint
                    .receivers
                    .iter()
                    .chain(&blueprint.standalone)
                    .map(|d| d.num_sensors)
                    .sum::<usize>();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    transmitter: blueprint.transmitter.id.clone(),
                    d_clock: blueprint.transmitter.d_clock,
                    receiver_count: blueprint.receivers.len(),
                    standalone_count: blueprint.standalone.len(),
                    channel_count,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &SessionBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - synced streams will not be exported".to_string());
    }

    let tx = &blueprint.transmitter;
    let mut logs = vec![&tx.sync_log, &tx.sensor_log];
    for device in blueprint.receivers.iter().chain(&blueprint.standalone) {
        logs.push(&device.sensor_log);
        logs.extend(device.sync_log.as_ref());
    }
    for path in logs {
        if !path.exists() {
            warnings.push(format!("Log file not found: {}", path.display()));
        }
    }

    if let Some(tx_rate) = tx.sample_rate {
        for rx in &blueprint.receivers {
            if let Some(rate) = rx.sample_rate.filter(|&r| r != tx_rate) {
                warnings.push(format!(
                    "Receiver '{}' samples at {} Hz, transmitter at {} Hz",
                    rx.id, rate, tx_rate
                ));
            }
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Transmitter: {} (d_clock {})",
                summary.transmitter, summary.d_clock
            );
            println!("  Receivers: {}", summary.receiver_count);
            println!("  Standalone: {}", summary.standalone_count);
            println!("  Channels: {}", summary.channel_count);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SESSION: &str = r#"
[transmitter]
id = "TX0"
sync_log = "TX0-sync.log"
sensor_log = "TX0-data.log"
num_sensors = 2
d_clock = 100
sample_rate = 22050.0

[[receivers]]
id = "RX1"
sync_log = "RX1-sync.log"
sensor_log = "RX1-data.log"
num_sensors = 2
sample_rate = 44100.0
"#;

    fn write_session(dir: &std::path::Path, src: &str) -> std::path::PathBuf {
        let path = dir.join("session.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(src.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_valid_session_reports_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_session(dir.path(), SESSION);

        let result = validate_config(&ValidateArgs { config, json: true });

        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.receiver_count, 1);
        assert_eq!(summary.channel_count, 4);

        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.starts_with("No sinks")));
        assert_eq!(
            warnings.iter().filter(|w| w.starts_with("Log file not found")).count(),
            4
        );
        assert!(warnings.iter().any(|w| w.contains("44100")));
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_config(&ValidateArgs {
            config: dir.path().join("absent.toml"),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().starts_with("File not found"));
    }

    #[test]
    fn test_receiver_without_sync_log_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let src = SESSION.replace("sync_log = \"RX1-sync.log\"\n", "");
        let config = write_session(dir.path(), &src);

        let result = validate_config(&ValidateArgs { config, json: false });
        assert!(!result.valid);
        assert!(result.summary.is_none());
    }
}
