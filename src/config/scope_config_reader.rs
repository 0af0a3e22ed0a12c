// ==========================================
// ModCon 内容规划系统 - 范围配置读取 Trait
// ==========================================
// 职责: 定义分析引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::config_manager::ConfigError;
use crate::config::scope_thresholds::ScopeThresholds;
use async_trait::async_trait;

// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ScopeConfigReader: Send + Sync {
    /// 读取范围分析阈值
    ///
    /// 缺失或无法解析的键使用 ScopeThresholds::default() 中的值
    async fn get_scope_thresholds(&self) -> Result<ScopeThresholds, ConfigError>;
}

/// 固定阈值（测试或无配置库时使用）
#[derive(Debug, Clone, Default)]
pub struct StaticScopeConfig {
    pub thresholds: ScopeThresholds,
}

#[async_trait]
impl ScopeConfigReader for StaticScopeConfig {
    async fn get_scope_thresholds(&self) -> Result<ScopeThresholds, ConfigError> {
        Ok(self.thresholds)
    }
}
