// ==========================================
// 配置层集成测试
// ==========================================
// 测试目标: config_kv 覆写 → 门面每次调用生效
// ==========================================


use garment_aps::api::{ApiError, InMemoryDataSource, ProductionIntelligenceApi};
use garment_aps::config::{config_keys, ConfigManager, IntelligenceConfig};
use garment_aps::domain::bottleneck::OptimalThroughputMode;
use std::io::Write;
use std::sync::Arc;
use test_helpers::{create_test_db, horizon_start, three_station_line, JobBuilder, ResourceBuilder};

#[test]
fn test_config_manager_resolves_defaults_on_empty_db() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();

    let config = manager.resolve_intelligence_config().unwrap();

    assert_eq!(config, IntelligenceConfig::default());
    assert!(manager.get_config_snapshot().unwrap().is_empty());
}

#[test]
fn test_config_value_upsert_and_remove() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();

    manager
        .set_config_value(config_keys::HORIZON_DAYS, "7")
        .unwrap();
    manager
        .set_config_value(config_keys::HORIZON_DAYS, "21")
        .unwrap();
    assert_eq!(
        manager.get_config_value(config_keys::HORIZON_DAYS).unwrap(),
        Some("21".to_string())
    );
    assert_eq!(manager.resolve_intelligence_config().unwrap().optimizer.horizon_days, 21);

    assert!(manager.remove_config_value(config_keys::HORIZON_DAYS).unwrap());
    assert!(!manager.remove_config_value(config_keys::HORIZON_DAYS).unwrap());
    assert_eq!(manager.resolve_intelligence_config().unwrap().optimizer.horizon_days, 14);
}

#[test]
fn test_document_and_override_precedence() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();

    manager
        .set_config_value(
            config_keys::INTELLIGENCE_CONFIG,
            r#"{"detector": {"bottleneck_threshold": 40.0, "optimal_throughput_mode": "MAX"}}"#,
        )
        .unwrap();
    manager
        .set_config_value(config_keys::BOTTLENECK_THRESHOLD, "45")
        .unwrap();

    let config = manager.resolve_intelligence_config().unwrap();
    assert_eq!(config.detector.bottleneck_threshold, 45.0);
    assert_eq!(config.detector.optimal_throughput_mode, OptimalThroughputMode::Max);
    assert_eq!(config.optimizer.horizon_days, 14);
}

#[test]
fn test_load_from_json_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    writeln!(file, r#"{{"optimizer": {{"horizon_days": 5}}}}"#).unwrap();

    let config = IntelligenceConfig::load_from_file(file.path()).unwrap();

    assert_eq!(config.optimizer.horizon_days, 5);
    assert_eq!(config.detector, IntelligenceConfig::default().detector);
}

#[tokio::test]
async fn test_api_reads_config_on_every_call() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = Arc::new(ConfigManager::new(&db_path).unwrap());
    let source = InMemoryDataSource::new()
        .with_jobs(vec![JobBuilder::new("J1").build()])
        .with_resources(vec![ResourceBuilder::new("R1").build()])
        .with_station_metrics(three_station_line(horizon_start()));
    let api = ProductionIntelligenceApi::new(Arc::new(source), manager.clone());

    let before = api.detect_bottlenecks_at(horizon_start()).await.unwrap();
    assert_eq!(before.detected_bottlenecks.len(), 1);

    manager
        .set_config_value(config_keys::BOTTLENECK_THRESHOLD, "25")
        .unwrap();
    manager
        .set_config_value(config_keys::HORIZON_DAYS, "3")
        .unwrap();

    let after = api.detect_bottlenecks_at(horizon_start()).await.unwrap();
    assert_eq!(after.detected_bottlenecks.len(), 2);

    let schedule = api.optimize_schedule(horizon_start()).await.unwrap();
    assert_eq!(schedule.horizon_days, 3);
}

#[tokio::test]
async fn test_invalid_override_surfaces_as_config_error() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = Arc::new(ConfigManager::new(&db_path).unwrap());
    manager
        .set_config_value(config_keys::HORIZON_DAYS, "0")
        .unwrap();
    let api = ProductionIntelligenceApi::new(Arc::new(InMemoryDataSource::new()), manager);

    let err = api.optimize_schedule(horizon_start()).await.unwrap_err();

    assert!(matches!(err, ApiError::ConfigError(_)));
}

#[tokio::test]
async fn test_oversized_horizon_override_is_rejected() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = Arc::new(ConfigManager::new(&db_path).unwrap());
    manager
        .set_config_value(config_keys::HORIZON_DAYS, "4000000000")
        .unwrap();
    let source = InMemoryDataSource::new()
        .with_jobs(vec![JobBuilder::new("J1").build()])
        .with_resources(vec![ResourceBuilder::new("R1").build()]);
    let api = ProductionIntelligenceApi::new(Arc::new(source), manager);

    let err = api.optimize_schedule(horizon_start()).await.unwrap_err();

    assert!(matches!(err, ApiError::ConfigError(msg) if msg.contains("horizon_days")));
}
