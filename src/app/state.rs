// ==========================================
// ModCon 内容规划系统 - 应用状态
// ==========================================
// 职责: 管理进程级共享状态（配置存储、工作区、导出 API）
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{ExportApi, PlanWorkspace};
use crate::config::config_manager::ConfigManager;
use crate::domain::snapshot::PlanSnapshot;
use crate::engine::WorkspaceEventPublisher;

/// 应用状态
///
/// 工作区为单写者，由 Mutex 串行化变更
pub struct AppState {
    /// 配置数据库路径
    pub config_db_path: String,

    /// 阈值配置
    pub config_manager: Arc<ConfigManager>,

    /// 计划工作区
    pub workspace: Arc<Mutex<PlanWorkspace>>,

    /// 数据源导出
    pub export_api: Arc<ExportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - config_db_path: 配置数据库文件路径
    /// - snapshot: 初始计划快照
    /// - event_publisher: 工作区事件发布者（None 时不发布）
    pub fn new(
        config_db_path: String,
        snapshot: PlanSnapshot,
        event_publisher: Option<Arc<dyn WorkspaceEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，配置数据库路径: {}", config_db_path);

        let config_manager = Arc::new(
            ConfigManager::new(&config_db_path)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let thresholds = config_manager
            .load_scope_thresholds()
            .map_err(|e| format!("无法读取范围阈值: {}", e))?;

        let mut workspace = PlanWorkspace::with_snapshot(snapshot, thresholds);
        if let Some(publisher) = event_publisher {
            workspace = workspace.with_event_publisher(publisher);
        }

        let export_api = Arc::new(ExportApi::new().with_max_rows(thresholds.max_feed_rows));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            config_db_path,
            config_manager,
            workspace: Arc::new(Mutex::new(workspace)),
            export_api,
        })
    }
}

/// 获取默认配置数据库路径
///
/// 顺序: 环境变量 MODCON_CONFIG_DB_PATH -> 用户数据目录 -> 当前目录
pub fn get_default_config_db_path() -> String {
    if let Ok(path) = std::env::var("MODCON_CONFIG_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./modcon_config.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("modcon-planner");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("modcon_config.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_keys;

    #[test]
    fn test_app_state_applies_configured_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("config.db").to_string_lossy().to_string();
        ConfigManager::new(&db_path)
            .unwrap()
            .set_global_config_value(config_keys::HIGH_VOLUME_VARIANTS, "7")
            .unwrap();

        let state = AppState::new(db_path, PlanSnapshot::default(), None).unwrap();
        let workspace = state.workspace.lock().unwrap();
        assert_eq!(workspace.thresholds().high_volume_variants, 7);
        assert_eq!(workspace.revision(), 0);
    }
}
