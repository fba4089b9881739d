//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{DeviceConfig, SessionBlueprint};

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Session info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    transmitter: TransmitterInfo,
    receivers: Vec<DeviceInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    standalone: Vec<DeviceInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    sync_settings: SyncInfo,
}

#[derive(Serialize)]
struct TransmitterInfo {
    id: String,
    num_sensors: usize,
    d_clock: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    logs: Option<LogPaths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<f64>,
}

#[derive(Serialize)]
struct DeviceInfo {
    id: String,
    num_sensors: usize,
    channels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logs: Option<LogPaths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<f64>,
}

#[derive(Serialize)]
struct LogPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    sync: Option<String>,
    sensor: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

#[derive(Serialize)]
struct SyncInfo {
    max_drift_ratio: f64,
    round_decimals: u32,
    /// Largest correctable drift in frames at the configured d_clock
    drift_tolerance_frames: f64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading session info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn device_info(device: &DeviceConfig, args: &InfoArgs) -> DeviceInfo {
    DeviceInfo {
        id: device.id.clone(),
        num_sensors: device.num_sensors,
        channels: device.device_id().channel_names(device.num_sensors),
        logs: args.devices.then(|| LogPaths {
            sync: device.sync_log.as_ref().map(|p| p.display().to_string()),
            sensor: device.sensor_log.display().to_string(),
        }),
        sample_rate: device.sample_rate,
    }
}

fn build_config_info(blueprint: &SessionBlueprint, args: &InfoArgs) -> ConfigInfo {
    let tx = &blueprint.transmitter;

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
                params: s.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        transmitter: TransmitterInfo {
            id: tx.id.clone(),
            num_sensors: tx.num_sensors,
            d_clock: tx.d_clock,
            logs: args.devices.then(|| LogPaths {
                sync: Some(tx.sync_log.display().to_string()),
                sensor: tx.sensor_log.display().to_string(),
            }),
            sample_rate: tx.sample_rate,
        },
        receivers: blueprint.receivers.iter().map(|d| device_info(d, args)).collect(),
        standalone: blueprint.standalone.iter().map(|d| device_info(d, args)).collect(),
        sinks,
        sync_settings: SyncInfo {
            max_drift_ratio: blueprint.sync.max_drift_ratio,
            round_decimals: blueprint.sync.round_decimals,
            drift_tolerance_frames: blueprint
                .to_sync_engine_config()
                .drift_tolerance(tx.d_clock),
        },
    }
}

fn print_devices(title: &str, devices: &[DeviceConfig], args: &InfoArgs) {
    println!("\n{} ({})", title, devices.len());
    for (i, device) in devices.iter().enumerate() {
        let is_last = i == devices.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({} channels)", prefix, device.id, device.num_sensors);

        if args.devices {
            if let Some(ref sync_log) = device.sync_log {
                println!("   {}  ├─ Sync log: {}", child_prefix, sync_log.display());
            }
            let rate = device
                .sample_rate
                .map_or_else(|| "unknown".to_string(), |r| format!("{r} Hz"));
            println!("   {}  ├─ Sensor log: {}", child_prefix, device.sensor_log.display());
            println!("   {}  └─ Sample rate: {}", child_prefix, rate);
        }
    }
}

fn print_config_info(blueprint: &SessionBlueprint, args: &InfoArgs) {
    let tx = &blueprint.transmitter;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Bela Syncer Session                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📡 Transmitter");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Id: {}", tx.id);
    println!("   ├─ Channels: {}", tx.num_sensors);
    if args.devices {
        println!("   ├─ Sync log: {}", tx.sync_log.display());
        println!("   ├─ Sensor log: {}", tx.sensor_log.display());
    }
    println!("   └─ Clock interval: {} frames", tx.d_clock);

    print_devices("🎛  Receivers", &blueprint.receivers, args);
    if !blueprint.standalone.is_empty() {
        print_devices("🔌 Standalone", &blueprint.standalone, args);
    }

    let sync = &blueprint.sync;
    println!("\n⚙️  Sync Settings");
    println!("   ├─ Max drift ratio: {}", sync.max_drift_ratio);
    println!(
        "   ├─ Drift tolerance: {} frames",
        blueprint.to_sync_engine_config().drift_tolerance(tx.d_clock)
    );
    println!("   └─ Round decimals: {}", sync.round_decimals);

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}
