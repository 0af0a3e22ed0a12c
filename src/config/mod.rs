// ==========================================
// ModCon 内容规划系统 - 配置层
// ==========================================
// 职责: 策略阈值配置管理，支持覆写与快照
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod scope_config_reader;
pub mod scope_thresholds;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigError, ConfigManager};
pub use scope_config_reader::{ScopeConfigReader, StaticScopeConfig};
pub use scope_thresholds::ScopeThresholds;
