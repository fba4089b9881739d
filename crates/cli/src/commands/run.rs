//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use contracts::SessionBlueprint;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading session");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        transmitter = %blueprint.transmitter.id,
        d_clock = blueprint.transmitter.d_clock,
        receivers = blueprint.receivers.len(),
        standalone = blueprint.standalone.len(),
        sinks = blueprint.sinks.len(),
        "Session loaded"
    );

    if args.dry_run {
        info!("Dry run mode - session is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        output_dir: args.output.clone(),
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    };

    info!("Starting pipeline...");

    let stats = Pipeline::new(pipeline_config)
        .run()
        .await
        .context("Pipeline execution failed")?;

    info!(
        receivers = stats.receivers_synced,
        standalone = stats.standalone_exported,
        reference_len = stats.reference_len,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed successfully"
    );

    stats.print_summary();

    info!("Bela Syncer finished");
    Ok(())
}

/// Print session summary for dry-run mode
fn print_config_summary(blueprint: &SessionBlueprint) {
    let tx = &blueprint.transmitter;

    println!("\n=== Session Summary ===\n");
    println!("Transmitter:");
    println!("  {} - {} channels, d_clock {} frames", tx.id, tx.num_sensors, tx.d_clock);

    println!("\nReceivers ({}):", blueprint.receivers.len());
    for rx in &blueprint.receivers {
        println!("  - {} - {} channels", rx.id, rx.num_sensors);
    }

    if !blueprint.standalone.is_empty() {
        println!("\nStandalone ({}):", blueprint.standalone.len());
        for device in &blueprint.standalone {
            println!("  - {} - {} channels", device.id, device.num_sensors);
        }
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!("\nSync Settings:");
    println!("  Max drift ratio: {}", blueprint.sync.max_drift_ratio);
    println!("  Round decimals: {}", blueprint.sync.round_decimals);

    println!();
}
