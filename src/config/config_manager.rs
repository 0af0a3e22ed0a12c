// ==========================================
// ModCon 内容规划系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写、快照/恢复
// 存储: config_kv 表 (scope_id + key + value)，当前只用 global scope
// ==========================================

use crate::config::scope_config_reader::ScopeConfigReader;
use crate::config::scope_thresholds::ScopeThresholds;
use crate::db::{ensure_config_schema, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置库错误: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("配置快照格式错误: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 打开（或创建）配置库
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_config_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（会确保 config_kv 存在）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
            ensure_config_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 删除覆写，恢复默认
    pub fn remove_global_config_value(&self, key: &str) -> Result<bool, ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 获取 global scope 全部配置的 JSON 快照（按 key 排序）
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从快照恢复配置（覆盖同名键），返回写入条数
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, ConfigError> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }
        tx.commit()?;

        tracing::info!(count = count, "配置快照已恢复");
        Ok(count)
    }

    /// 读取并解析配置; 缺失时用默认值，格式错误时告警后用默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Copy,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }

    /// 同步读取范围分析阈值
    pub fn load_scope_thresholds(&self) -> Result<ScopeThresholds, ConfigError> {
        let defaults = ScopeThresholds::default();

        let max_feed_rows = match self.get_global_config_value(config_keys::MAX_FEED_ROWS)? {
            None => defaults.max_feed_rows,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(
                        config_key = config_keys::MAX_FEED_ROWS,
                        raw_value = %raw,
                        "配置值格式错误，使用默认值"
                    );
                    defaults.max_feed_rows
                }
            },
        };

        Ok(ScopeThresholds {
            high_volume_variants: self
                .get_parsed_or_default(config_keys::HIGH_VOLUME_VARIANTS, defaults.high_volume_variants)?,
            moderate_asset_threshold: self.get_parsed_or_default(
                config_keys::MODERATE_ASSET_THRESHOLD,
                defaults.moderate_asset_threshold,
            )?,
            heavy_asset_threshold: self
                .get_parsed_or_default(config_keys::HEAVY_ASSET_THRESHOLD, defaults.heavy_asset_threshold)?,
            max_distinct_formats: self
                .get_parsed_or_default(config_keys::MAX_DISTINCT_FORMATS, defaults.max_distinct_formats)?,
            max_feed_rows,
        })
    }
}

// ==========================================
// ScopeConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ScopeConfigReader for ConfigManager {
    async fn get_scope_thresholds(&self) -> Result<ScopeThresholds, ConfigError> {
        self.load_scope_thresholds()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 复用分析
    pub const HIGH_VOLUME_VARIANTS: &str = "scope.high_volume_variants";

    // 制作复杂度
    pub const MODERATE_ASSET_THRESHOLD: &str = "scope.moderate_asset_threshold";
    pub const HEAVY_ASSET_THRESHOLD: &str = "scope.heavy_asset_threshold";
    pub const MAX_DISTINCT_FORMATS: &str = "scope.max_distinct_formats";

    // 数据源
    pub const MAX_FEED_ROWS: &str = "feed.max_rows";
}
