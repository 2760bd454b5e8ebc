// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证健康度配置读取与默认值回退
// ==========================================


use project_governance::app::AppState;
use project_governance::config::{config_keys, ConfigManager, HealthConfigReader};
use project_governance::engine::HealthThresholds;
use std::time::Duration;
use test_helpers::create_test_db;

#[tokio::test]
async fn test_defaults_when_unset() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(
        config.get_health_thresholds().await.unwrap(),
        HealthThresholds::default()
    );
    assert_eq!(config.get_rescore_time_budget().await.unwrap(), None);
    assert_eq!(config.get_message_locale().await.unwrap(), "en");
}

#[tokio::test]
async fn test_overrides_are_read() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();

    config.set_global_config_value(config_keys::BUDGET_RED_PCT, "25").unwrap();
    config.set_global_config_value(config_keys::SCHEDULE_AMBER_LAG_PCT, "5.5").unwrap();
    config.set_global_config_value(config_keys::RESCORE_TIME_BUDGET_MS, "1500").unwrap();
    config.set_global_config_value(config_keys::MESSAGE_LOCALE, "zh-CN").unwrap();

    let thresholds = config.get_health_thresholds().await.unwrap();
    assert_eq!(thresholds.budget_red_pct, 25.0);
    assert_eq!(thresholds.budget_amber_pct, 10.0);
    assert_eq!(thresholds.schedule_amber_lag_pct, 5.5);

    assert_eq!(
        config.get_rescore_time_budget().await.unwrap(),
        Some(Duration::from_millis(1500))
    );
    assert_eq!(config.get_message_locale().await.unwrap(), "zh-CN");

    // 覆写同一个键
    config.set_global_config_value(config_keys::BUDGET_RED_PCT, "30").unwrap();
    assert_eq!(config.get_health_thresholds().await.unwrap().budget_red_pct, 30.0);
    assert_eq!(config.list_global_config().unwrap().len(), 4);
}

#[tokio::test]
async fn test_malformed_values_fall_back() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();

    config.set_global_config_value(config_keys::BUDGET_AMBER_PCT, "ten").unwrap();
    config.set_global_config_value(config_keys::SCHEDULE_RED_LAG_PCT, "-4").unwrap();
    config.set_global_config_value(config_keys::RESCORE_TIME_BUDGET_MS, "soon").unwrap();
    config.set_global_config_value(config_keys::MESSAGE_LOCALE, "fr").unwrap();

    assert_eq!(
        config.get_health_thresholds().await.unwrap(),
        HealthThresholds::default()
    );
    assert_eq!(config.get_rescore_time_budget().await.unwrap(), None);
    assert_eq!(config.get_message_locale().await.unwrap(), "en");
}

#[tokio::test]
async fn test_app_state_initialises_fresh_database() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("governance.db");

    let state = AppState::new(db_path.to_string_lossy().to_string())
        .await
        .expect("AppState should initialise");

    let report = state
        .portfolio_api
        .rescore_portfolio(test_helpers::now())
        .unwrap();
    assert!(report.updated.is_empty());
    assert!(report.is_complete());
}
