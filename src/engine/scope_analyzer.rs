// ==========================================
// ModCon 内容规划系统 - 复用分析引擎
// ==========================================
// 职责: 按 (format, message_theme) 分组矩阵单元格，统计复用机会
// 输入: 全部矩阵单元格
// 输出: { total_variants, total_unique_modules, reuse_opportunities, warnings }
// 红线: 纯派生，不写回矩阵; 每次全量重算
// ==========================================

use crate::config::ScopeThresholds;
use crate::domain::matrix::{ContentMatrix, MatrixCell};
use crate::domain::module::ModuleCatalog;
use crate::engine::notice::Notice;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// 同一 (format, message_theme) 的单元格组（首个为规范单元格）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReuseGroup {
    pub format: String,
    pub message_theme: String,
    pub cell_ids: Vec<String>,
}

impl ReuseGroup {
    pub fn opportunities(&self) -> usize {
        self.cell_ids.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReuseMetrics {
    pub total_cells: usize,
    pub total_variants: u64,
    pub total_unique_modules: usize,
    pub reuse_opportunities: usize,
    /// 成员数 > 1 的分组（按首次出现顺序）
    pub reuse_groups: Vec<ReuseGroup>,
    pub warnings: Vec<Notice>,
}

/// reuse_count 刷新结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReuseCountReport {
    /// (module_id, reuse_count)
    pub counts: Vec<(String, u32)>,
    /// (module_id, cell_id): used_in_cells 中指向不存在单元格的条目
    pub dangling_cells: Vec<(String, String)>,
}

// ==========================================
// ScopeAnalyzer
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ScopeAnalyzer {
    thresholds: ScopeThresholds,
}

impl ScopeAnalyzer {
    pub fn new(thresholds: ScopeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ScopeThresholds {
        &self.thresholds
    }

    /// 按 (format, message_theme) 分组，保持首次出现顺序
    pub fn group_cells(&self, cells: &[MatrixCell]) -> Vec<ReuseGroup> {
        let mut index: HashMap<(&str, &str), usize> = HashMap::new();
        let mut groups: Vec<ReuseGroup> = Vec::new();

        for cell in cells {
            let key = (cell.format.as_str(), cell.message_theme.as_str());
            match index.get(&key) {
                Some(&i) => groups[i].cell_ids.push(cell.id.clone()),
                None => {
                    index.insert(key, groups.len());
                    groups.push(ReuseGroup {
                        format: cell.format.clone(),
                        message_theme: cell.message_theme.clone(),
                        cell_ids: vec![cell.id.clone()],
                    });
                }
            }
        }
        groups
    }

    #[instrument(skip(self, cells), fields(cells = cells.len()))]
    pub fn analyze_cells(&self, cells: &[MatrixCell]) -> ReuseMetrics {
        let groups = self.group_cells(cells);
        let reuse_opportunities: usize = groups.iter().map(ReuseGroup::opportunities).sum();
        let total_variants: u64 = cells.iter().map(|c| u64::from(c.planned_variant_count)).sum();
        let total_unique_modules = cells.len() - reuse_opportunities;

        let mut warnings = Vec::new();
        if total_variants > self.thresholds.high_volume_variants {
            warnings.push(
                Notice::warning("high_volume")
                    .param("total", total_variants)
                    .param("threshold", self.thresholds.high_volume_variants),
            );
        }
        if reuse_opportunities > 0 {
            warnings.push(Notice::info("low_reuse").param("count", reuse_opportunities));
        }

        info!(
            total_variants = total_variants,
            unique_modules = total_unique_modules,
            reuse_opportunities = reuse_opportunities,
            "复用分析完成"
        );

        ReuseMetrics {
            total_cells: cells.len(),
            total_variants,
            total_unique_modules,
            reuse_opportunities,
            reuse_groups: groups.into_iter().filter(|g| g.cell_ids.len() > 1).collect(),
            warnings,
        }
    }

    pub fn analyze(&self, matrix: &ContentMatrix) -> ReuseMetrics {
        self.analyze_cells(matrix.cells())
    }
}

/// 由 used_in_cells 派生每个模块的 reuse_count（只计存在的单元格）
///
/// 悬空 id 只报告，不从 used_in_cells 删除。
pub fn derive_reuse_counts(catalog: &ModuleCatalog, matrix: &ContentMatrix) -> ReuseCountReport {
    let mut report = ReuseCountReport::default();
    for module in catalog.modules() {
        let mut count = 0u32;
        for cell_id in &module.used_in_cells {
            if matrix.find_cell(cell_id).is_some() {
                count += 1;
            } else {
                report.dangling_cells.push((module.id.clone(), cell_id.clone()));
            }
        }
        report.counts.push((module.id.clone(), count));
    }
    report
}

/// 派生并写回 reuse_count
pub fn refresh_reuse_counts(catalog: &mut ModuleCatalog, matrix: &ContentMatrix) -> ReuseCountReport {
    let report = derive_reuse_counts(catalog, matrix);
    for (module_id, count) in &report.counts {
        catalog.set_reuse_count(module_id, *count);
    }
    for (module_id, cell_id) in &report.dangling_cells {
        warn!(module_id = %module_id, cell_id = %cell_id, "模块引用了不存在的单元格");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::FunnelStage;

    fn cell(id: &str, format: &str, theme: &str, variants: u32) -> MatrixCell {
        MatrixCell::new(id, "aud", FunnelStage::Awareness, theme, format, "feed", variants).unwrap()
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let cells = vec![
            cell("c1", "Video", "Speed", 1),
            cell("c2", "Static Image", "Price", 1),
            cell("c3", "Video", "Speed", 1),
        ];
        let groups = ScopeAnalyzer::default().group_cells(&cells);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].cell_ids, vec!["c1", "c3"]);
        assert_eq!(groups[1].format, "Static Image");
    }

    #[test]
    fn test_format_and_theme_both_required_for_reuse() {
        let cells = vec![
            cell("c1", "Video", "Speed", 1),
            cell("c2", "Video", "Price", 1),
            cell("c3", "Static Image", "Speed", 1),
        ];
        let metrics = ScopeAnalyzer::default().analyze_cells(&cells);
        assert_eq!(metrics.reuse_opportunities, 0);
        assert!(metrics.warnings.is_empty());
    }

    #[test]
    fn test_empty_matrix() {
        let metrics = ScopeAnalyzer::default().analyze_cells(&[]);
        assert_eq!(metrics.total_variants, 0);
        assert_eq!(metrics.total_unique_modules, 0);
        assert!(metrics.warnings.is_empty());
    }
}
