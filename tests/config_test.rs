// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 阈值读取、默认值回退、快照/恢复、ScopeConfigReader
// ==========================================

mod test_helpers;

use modcon_planner::config::{config_keys, ConfigManager, ScopeConfigReader, ScopeThresholds};
use modcon_planner::db::open_sqlite_connection;
use modcon_planner::logging;
use std::sync::{Arc, Mutex};
use test_helpers::create_test_db;

#[test]
fn test_missing_keys_use_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    let thresholds = config_manager.load_scope_thresholds().unwrap();
    assert_eq!(thresholds, ScopeThresholds::default());
    assert_eq!(thresholds.high_volume_variants, 48);
    assert_eq!(thresholds.max_feed_rows, None);
}

#[test]
fn test_overrides_are_parsed() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::HIGH_VOLUME_VARIANTS, "100")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::MAX_DISTINCT_FORMATS, " 8 ")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::MAX_FEED_ROWS, "2500")
        .unwrap();

    let thresholds = config_manager.load_scope_thresholds().unwrap();
    assert_eq!(thresholds.high_volume_variants, 100);
    assert_eq!(thresholds.max_distinct_formats, 8);
    assert_eq!(thresholds.max_feed_rows, Some(2500));
    assert_eq!(thresholds.moderate_asset_threshold, 20);
}

#[test]
fn test_malformed_value_falls_back_to_default() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::HEAVY_ASSET_THRESHOLD, "many")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::MAX_FEED_ROWS, "")
        .unwrap();

    let thresholds = config_manager.load_scope_thresholds().unwrap();
    assert_eq!(thresholds.heavy_asset_threshold, 50);
    // 空值表示不限制
    assert_eq!(thresholds.max_feed_rows, None);
}

#[test]
fn test_remove_value() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::HIGH_VOLUME_VARIANTS, "10")
        .unwrap();
    assert!(config_manager
        .remove_global_config_value(config_keys::HIGH_VOLUME_VARIANTS)
        .unwrap());
    assert!(!config_manager
        .remove_global_config_value(config_keys::HIGH_VOLUME_VARIANTS)
        .unwrap());
    assert_eq!(
        config_manager
            .get_global_config_value(config_keys::HIGH_VOLUME_VARIANTS)
            .unwrap(),
        None
    );
}

#[test]
fn test_snapshot_and_restore() {
    let (_src_file, src_path) = create_test_db().expect("Failed to create test db");
    let source = ConfigManager::new(&src_path).expect("Failed to create ConfigManager");
    source
        .set_global_config_value(config_keys::HIGH_VOLUME_VARIANTS, "64")
        .unwrap();
    source
        .set_global_config_value(config_keys::MAX_FEED_ROWS, "900")
        .unwrap();

    let snapshot = source.get_config_snapshot().unwrap();

    let (_dst_file, dst_path) = create_test_db().expect("Failed to create test db");
    let target = ConfigManager::new(&dst_path).expect("Failed to create ConfigManager");
    let restored = target.restore_config_from_snapshot(&snapshot).unwrap();

    assert_eq!(restored, 2);
    assert_eq!(
        target.load_scope_thresholds().unwrap(),
        source.load_scope_thresholds().unwrap()
    );
}

#[test]
fn test_restore_rejects_malformed_snapshot() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    assert!(config_manager.restore_config_from_snapshot("not json").is_err());
}

#[tokio::test]
async fn test_config_reader_trait() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    config_manager
        .set_global_config_value(config_keys::MODERATE_ASSET_THRESHOLD, "12")
        .unwrap();

    let reader: &dyn ScopeConfigReader = &config_manager;
    let thresholds = reader.get_scope_thresholds().await.unwrap();
    assert_eq!(thresholds.moderate_asset_threshold, 12);
}

#[test]
fn test_from_connection_shares_existing_connection() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_sqlite_connection(&db_path).expect("Failed to open connection");
    let shared = Arc::new(Mutex::new(conn));

    // 连接上还没有 config_kv，from_connection 负责建表
    let writer = ConfigManager::from_connection(shared.clone()).unwrap();
    let reader = ConfigManager::from_connection(shared).unwrap();

    writer
        .set_global_config_value(config_keys::MAX_FEED_ROWS, "300")
        .unwrap();
    assert_eq!(
        reader.load_scope_thresholds().unwrap().max_feed_rows,
        Some(300)
    );

    // 同一文件的独立连接也能看到写入
    let reopened = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    assert_eq!(
        reopened
            .get_global_config_value(config_keys::MAX_FEED_ROWS)
            .unwrap()
            .as_deref(),
        Some("300")
    );
}
