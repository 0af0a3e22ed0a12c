// ==========================================
// ModCon 内容规划系统 - 制作复杂度评分
// ==========================================
// 职责: 由矩阵单元格 + 模块目录判定制作复杂度
// 规则: simple → moderate (total_assets > 20) → heavy (total_assets > 50 或 format 种类 > 5)
// 红线: 等级只升不降，复杂度因素累加不替换
// ==========================================

use crate::config::ScopeThresholds;
use crate::domain::matrix::MatrixCell;
use crate::domain::module::ModuleCatalog;
use crate::domain::types::ComplexityLevel;
use crate::engine::notice::Notice;
use crate::engine::scope_analyzer::ReuseMetrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// 模块目录统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub module_count: usize,
    pub variation_count: usize,
    /// 仍在制作流程中的变体（planned / in_production / in_review）
    pub in_flight_variations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub level: ComplexityLevel,
    pub total_assets: u64,
    pub distinct_formats: Vec<String>,
    pub reuse_percentage: u32,
    pub factors: Vec<Notice>,
    pub catalog: CatalogStats,
}

#[derive(Debug, Clone, Default)]
pub struct ComplexityScorer {
    thresholds: ScopeThresholds,
}

impl ComplexityScorer {
    pub fn new(thresholds: ScopeThresholds) -> Self {
        Self { thresholds }
    }

    #[instrument(skip_all, fields(cells = cells.len()))]
    pub fn score(
        &self,
        cells: &[MatrixCell],
        catalog: &ModuleCatalog,
        reuse: &ReuseMetrics,
    ) -> ComplexityReport {
        let total_assets: u64 = cells.iter().map(|c| u64::from(c.planned_variant_count)).sum();
        let distinct: BTreeSet<&str> = cells.iter().map(|c| c.format.as_str()).collect();

        let mut level = ComplexityLevel::Simple;
        let mut factors = Vec::new();

        if total_assets > self.thresholds.moderate_asset_threshold {
            level = level.max(ComplexityLevel::Moderate);
            factors.push(
                Notice::info("asset_volume_moderate")
                    .param("total", total_assets)
                    .param("threshold", self.thresholds.moderate_asset_threshold),
            );
        }
        if total_assets > self.thresholds.heavy_asset_threshold {
            level = level.max(ComplexityLevel::Heavy);
            factors.push(
                Notice::warning("asset_volume_heavy")
                    .param("total", total_assets)
                    .param("threshold", self.thresholds.heavy_asset_threshold),
            );
        }
        if distinct.len() > self.thresholds.max_distinct_formats {
            level = level.max(ComplexityLevel::Heavy);
            factors.push(
                Notice::warning("format_diversity")
                    .param("count", distinct.len())
                    .param("threshold", self.thresholds.max_distinct_formats),
            );
        }

        let reuse_percentage = reuse_percentage(reuse.reuse_opportunities, reuse.total_unique_modules);

        debug!(
            level = %level,
            total_assets = total_assets,
            distinct_formats = distinct.len(),
            reuse_percentage = reuse_percentage,
            "复杂度评分完成"
        );

        ComplexityReport {
            level,
            total_assets,
            distinct_formats: distinct.into_iter().map(str::to_string).collect(),
            reuse_percentage,
            factors,
            catalog: catalog_stats(catalog),
        }
    }
}

/// round(opportunities / unique * 100)，unique 为 0 时为 0
pub fn reuse_percentage(reuse_opportunities: usize, total_unique_modules: usize) -> u32 {
    if total_unique_modules == 0 {
        return 0;
    }
    (reuse_opportunities as f64 / total_unique_modules as f64 * 100.0).round() as u32
}

pub fn catalog_stats(catalog: &ModuleCatalog) -> CatalogStats {
    let variations = catalog.modules().iter().flat_map(|m| m.variations.iter());
    CatalogStats {
        module_count: catalog.len(),
        variation_count: catalog.variation_count(),
        in_flight_variations: variations.filter(|v| v.status.is_in_flight()).count(),
    }
}
