//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 会话 e2e 测试（日志文件 -> 校正 -> 导出）

#[cfg(test)]
mod fixtures {
    use std::path::Path;

    use contracts::codec::encode_f32_le;

    /// Write records of `[framesElapsed, fields...]` as raw LE f32
    pub fn write_log(path: &Path, rows: impl IntoIterator<Item = Vec<f32>>) {
        let values: Vec<f32> = rows.into_iter().flatten().collect();
        std::fs::write(path, encode_f32_le(&values)).unwrap();
    }

    pub fn write_sync_log(dir: &Path, id: &str, ticks: &[u64]) {
        write_log(
            &dir.join(format!("{id}-sync.log")),
            ticks.iter().map(|&f| vec![f as f32, 1.0]),
        );
    }

    /// Contiguous frames `0..samples`, `x1 = frame / 2`, `x2 = -frame`
    pub fn write_sensor_log(dir: &Path, id: &str, samples: usize) {
        write_log(
            &dir.join(format!("{id}-data.log")),
            (0..samples).map(|i| vec![i as f32, i as f32 * 0.5, -(i as f32)]),
        );
    }

    /// TX0 + RX1 (+ optional standalone RX0) session writing to `out`
    pub fn session_toml(out: &Path, with_standalone: bool) -> String {
        let mut src = format!(
            r#"
[transmitter]
id = "TX0"
sync_log = "TX0-sync.log"
sensor_log = "TX0-data.log"
num_sensors = 2
d_clock = 100

[[receivers]]
id = "RX1"
sync_log = "RX1-sync.log"
sensor_log = "RX1-data.log"
num_sensors = 2

[sync]
max_drift_ratio = 0.5
round_decimals = 7

[[sinks]]
name = "files"
sink_type = "file"
params = {{ base_path = "{}" }}
"#,
            out.display()
        );
        if with_standalone {
            src.push_str(
                r#"
[[standalone]]
id = "RX0"
sensor_log = "RX0-data.log"
num_sensors = 2
"#,
            );
        }
        src
    }
}

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::DeviceRole;

    #[test]
    fn test_session_round_trips_through_toml() {
        let out = std::path::Path::new("/tmp/out");
        let blueprint = ConfigLoader::load_from_str(
            &super::fixtures::session_toml(out, true),
            ConfigFormat::Toml,
        )
        .unwrap();

        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let reparsed = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        let roles: Vec<_> = reparsed.devices().collect();
        assert_eq!(
            roles,
            vec![
                ("TX0", DeviceRole::Transmitter),
                ("RX1", DeviceRole::Receiver),
                ("RX0", DeviceRole::Standalone),
            ]
        );
        assert_eq!(reparsed.transmitter.d_clock, 100);
        assert_eq!(reparsed.sinks[0].params["base_path"], "/tmp/out");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use config_loader::ConfigLoader;
    use contracts::{BlockCorrection, ChannelMatrix, ContractError, SessionBlueprint, SyncedStream};
    use dispatcher::{create_dispatcher, SyncedDataLoader};
    use ingestion::DeviceLoader;
    use observability::CorrectionAggregator;
    use sync_engine::{build_reference, DriftCorrector};
    use tokio::sync::mpsc;

    use super::fixtures::*;

    fn load_session(dir: &std::path::Path, with_standalone: bool) -> SessionBlueprint {
        let path = dir.join("session.toml");
        std::fs::write(&path, session_toml(&dir.join("out"), with_standalone)).unwrap();
        ConfigLoader::load_from_path(&path).unwrap()
    }

    /// End-to-end test: log files -> DeviceLoader -> DriftCorrector -> FileSink
    ///
    /// 验证完整的数据流：
    /// 1. ConfigLoader 解析会话并解析相对路径
    /// 2. 发射端轨道裁剪为参考网格
    /// 3. 接收端漂移校正后与参考长度一致
    /// 4. FileSink 导出的数据可被 SyncedDataLoader 读回
    #[tokio::test]
    async fn test_e2e_session_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        write_sync_log(dir.path(), "TX0", &[0, 100, 200, 300]);
        write_sensor_log(dir.path(), "TX0", 320);
        write_sync_log(dir.path(), "RX1", &[0, 103, 199, 300]);
        write_sensor_log(dir.path(), "RX1", 320);

        let blueprint = load_session(dir.path(), false);
        let loader = DeviceLoader::default();

        let tx = loader.load_transmitter(&blueprint.transmitter).unwrap();
        let reference = build_reference(
            tx.id.clone(),
            tx.sync.as_ref().unwrap(),
            &tx.sensor,
            blueprint.transmitter.d_clock,
        )
        .unwrap();
        assert_eq!(reference.len(), 300);

        let rx = loader.load(&blueprint.receivers[0]).unwrap();
        let corrector = DriftCorrector::new(blueprint.to_sync_engine_config());
        let outcome = corrector
            .synchronize(rx.id.clone(), rx.sync.as_ref().unwrap(), &rx.sensor, &reference)
            .unwrap();

        assert_eq!(outcome.stream.len(), reference.len());
        let corrections: Vec<_> = outcome.report.blocks.iter().map(|b| b.correction).collect();
        assert_eq!(
            corrections,
            vec![
                BlockCorrection::Surplus { dropped: 3, missed_ticks: 0 },
                BlockCorrection::Deficit { inserted: 4 },
                BlockCorrection::Surplus { dropped: 1, missed_ticks: 0 },
            ]
        );

        let (stream_tx, stream_rx) = mpsc::channel(4);
        let dispatcher = create_dispatcher(blueprint.sinks.clone(), stream_rx)
            .await
            .unwrap();
        let handle = dispatcher.spawn();
        stream_tx.send(Arc::new(reference.to_stream())).await.unwrap();
        stream_tx.send(Arc::new(outcome.stream.clone())).await.unwrap();
        drop(stream_tx);

        let summary = handle.await.unwrap();
        assert!(summary.is_clean());
        assert_eq!(summary.sinks[0].rows_written, 600);

        let out = dir.path().join("out");
        let (meta, data) = SyncedDataLoader::load_with_meta(out.join("RX1-synced.bin")).unwrap();
        assert_eq!(meta.synced_to.as_deref(), Some("TX0"));
        assert_eq!(meta.channel_names, vec!["RX1-x1", "RX1-x2"]);
        assert_eq!(data, outcome.stream.data);

        // Surplus of block 0 drops frames 100..103
        assert_eq!(data.row(99), Some(&[49.5, -99.0][..]));
        assert_eq!(data.row(100), Some(&[51.5, -103.0][..]));

        // Deficit of block 1 synthesizes four rows between frames 199 and 200
        let gap: Vec<f32> = (197..201).map(|i| data.row(i).unwrap()[0]).collect();
        for (value, expected) in gap.iter().zip([99.6f32, 99.7, 99.8, 99.9]) {
            assert!((value - expected).abs() < 1e-4, "{value} vs {expected}");
        }
        assert_eq!(data.row(201), Some(&[100.0, -200.0][..]));

        let tx_data = SyncedDataLoader::load(out.join("TX0-synced.bin"), 2).unwrap();
        assert_eq!(tx_data, reference.data);
    }

    #[tokio::test]
    async fn test_e2e_standalone_export() {
        let dir = tempfile::tempdir().unwrap();
        write_sensor_log(dir.path(), "RX0", 50);

        let blueprint = load_session(dir.path(), true);
        let device = &blueprint.standalone[0];
        let sensor = DeviceLoader::default()
            .load_sensor(&device.sensor_log, &device.id, device.num_sensors)
            .unwrap();
        let data = ChannelMatrix::new(sensor.channel_count(), sensor.into_values()).unwrap();
        let stream = SyncedStream::standalone(device.device_id(), data);

        let (stream_tx, stream_rx) = mpsc::channel(1);
        let handle = create_dispatcher(blueprint.sinks.clone(), stream_rx)
            .await
            .unwrap()
            .spawn();
        stream_tx.send(Arc::new(stream)).await.unwrap();
        drop(stream_tx);
        assert!(handle.await.unwrap().is_clean());

        let (meta, data) =
            SyncedDataLoader::load_with_meta(dir.path().join("out/RX0-synced.bin")).unwrap();
        assert_eq!(meta.synced_to, None);
        assert_eq!(data.len(), 50);
        assert_eq!(data.row(49), Some(&[24.5, -49.0][..]));
    }

    #[test]
    fn test_e2e_missed_tick_is_unwrapped() {
        let dir = tempfile::tempdir().unwrap();
        write_sync_log(dir.path(), "TX0", &[0, 100, 200, 300]);
        write_sensor_log(dir.path(), "TX0", 320);
        write_sync_log(dir.path(), "RX1", &[0, 100, 300]);
        write_sensor_log(dir.path(), "RX1", 320);

        let blueprint = load_session(dir.path(), false);
        let loader = DeviceLoader::default();
        let tx = loader.load_transmitter(&blueprint.transmitter).unwrap();
        let reference =
            build_reference(tx.id.clone(), tx.sync.as_ref().unwrap(), &tx.sensor, 100).unwrap();
        let rx = loader.load(&blueprint.receivers[0]).unwrap();

        let outcome = DriftCorrector::default()
            .synchronize(rx.id.clone(), rx.sync.as_ref().unwrap(), &rx.sensor, &reference)
            .unwrap();

        assert_eq!(outcome.stream.len(), 300);
        assert_eq!(outcome.report.missed_ticks_total(), 1);
        assert_eq!(
            outcome.report.blocks[1].correction,
            BlockCorrection::Unwrapped { missed_ticks: 1 }
        );

        let mut aggregator = CorrectionAggregator::new();
        aggregator.update(&outcome.report);
        let summary = aggregator.summary();
        assert_eq!(summary.total_missed_ticks, 1);
        assert_eq!(summary.corrected_blocks, 0);
        assert!(summary.to_string().contains("Blocks: 2"));
    }

    #[test]
    fn test_e2e_anomaly_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_sync_log(dir.path(), "TX0", &[0, 100, 200]);
        write_sensor_log(dir.path(), "TX0", 220);
        write_sync_log(dir.path(), "RX1", &[0, 100, 140]);
        write_sensor_log(dir.path(), "RX1", 220);

        let blueprint = load_session(dir.path(), false);
        let loader = DeviceLoader::default();
        let tx = loader.load_transmitter(&blueprint.transmitter).unwrap();
        let reference =
            build_reference(tx.id.clone(), tx.sync.as_ref().unwrap(), &tx.sensor, 100).unwrap();
        let rx = loader.load(&blueprint.receivers[0]).unwrap();

        let err = DriftCorrector::default()
            .synchronize(rx.id.clone(), rx.sync.as_ref().unwrap(), &rx.sensor, &reference)
            .unwrap_err();

        assert!(err.is_anomaly());
        assert!(matches!(
            err,
            ContractError::UnresolvedAnomaly { block: 1, drift: -60, interval: 100, .. }
        ));
    }
}
