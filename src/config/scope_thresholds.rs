// ==========================================
// ModCon 内容规划系统 - 范围分析阈值
// ==========================================
// 职责: 复用/复杂度/数据源的策略常量
// 默认值: 48 / 20 / 50 / 5（保持兼容）
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeThresholds {
    /// total_variants 超过该值发出 high_volume 警告
    pub high_volume_variants: u64,
    /// total_assets 超过该值升级为 moderate
    pub moderate_asset_threshold: u64,
    /// total_assets 超过该值升级为 heavy
    pub heavy_asset_threshold: u64,
    /// 不同 format 数超过该值升级为 heavy
    pub max_distinct_formats: usize,
    /// 数据源行数上限（None 不限制）
    #[serde(default)]
    pub max_feed_rows: Option<usize>,
}

impl Default for ScopeThresholds {
    fn default() -> Self {
        Self {
            high_volume_variants: 48,
            moderate_asset_threshold: 20,
            heavy_asset_threshold: 50,
            max_distinct_formats: 5,
            max_feed_rows: None,
        }
    }
}
