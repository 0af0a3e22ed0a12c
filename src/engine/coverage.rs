// ==========================================
// ModCon 内容规划系统 - 覆盖率校验
// ==========================================
// 职责: 孤儿规则/默认值检测 + 矩阵单元格规则覆盖率
// 覆盖率 = 至少有一条活跃、非孤儿规则可满足的单元格数 / 单元格总数 × 100（四舍五入）
// 可满足性: 只用单元格已知属性 (audience / funnel_stage / placement)，未知属性视为可满足
// ==========================================

use crate::domain::decision::{DecisionRule, DecisioningLogic, TargetingContext, VariationRef};
use crate::domain::matrix::{ContentMatrix, MatrixCell};
use crate::domain::module::ModuleCatalog;
use crate::domain::types::{ConditionType, ModuleType};
use crate::engine::condition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    ModuleMissing,
    VariationMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanRule {
    pub rule_id: String,
    pub target: VariationRef,
    pub reason: OrphanReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanDefault {
    pub module_type: ModuleType,
    pub target: VariationRef,
    pub reason: OrphanReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub has_orphan_rules: bool,
    pub orphan_rules: Vec<OrphanRule>,
    pub orphan_defaults: Vec<OrphanDefault>,
    pub coverage_percentage: u32,
    pub covered_cells: Vec<String>,
    /// 只能依赖默认值渲染的单元格
    pub uncovered_cells: Vec<String>,
}

/// 目标 (module_id, variation_id) 是否悬空
pub fn orphan_reason(catalog: &ModuleCatalog, target: &VariationRef) -> Option<OrphanReason> {
    match catalog.find_module(&target.module_id) {
        None => Some(OrphanReason::ModuleMissing),
        Some(module) if module.find_variation(&target.variation_id).is_none() => {
            Some(OrphanReason::VariationMissing)
        }
        Some(_) => None,
    }
}

/// 单元格的已知定向属性
pub fn cell_context(cell: &MatrixCell) -> TargetingContext {
    TargetingContext::new()
        .with(ConditionType::Audience, cell.audience_id.clone())
        .with(ConditionType::FunnelStage, cell.funnel_stage.as_str())
        .with(ConditionType::Placement, cell.placement.clone())
}

/// 规则在已知属性下是否可能命中
pub fn rule_satisfiable(rule: &DecisionRule, context: &TargetingContext) -> bool {
    let results: Vec<Option<bool>> = rule
        .conditions
        .iter()
        .map(|c| condition::evaluate(c, context))
        .collect();
    condition::combine_satisfiable(&results, rule.condition_logic)
}

#[derive(Debug, Clone, Default)]
pub struct CoverageValidator;

impl CoverageValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn find_orphan_rules(&self, logic: &DecisioningLogic, catalog: &ModuleCatalog) -> Vec<OrphanRule> {
        logic
            .rules()
            .iter()
            .filter_map(|rule| {
                let target = rule.action.target();
                orphan_reason(catalog, &target).map(|reason| OrphanRule {
                    rule_id: rule.id.clone(),
                    target,
                    reason,
                })
            })
            .collect()
    }

    pub fn find_orphan_defaults(
        &self,
        logic: &DecisioningLogic,
        catalog: &ModuleCatalog,
    ) -> Vec<OrphanDefault> {
        logic
            .defaults()
            .iter()
            .filter_map(|(module_type, target)| {
                orphan_reason(catalog, target).map(|reason| OrphanDefault {
                    module_type: *module_type,
                    target: target.clone(),
                    reason,
                })
            })
            .collect()
    }

    #[instrument(skip_all, fields(rules = logic.rules().len(), cells = matrix.len()))]
    pub fn validate(
        &self,
        logic: &DecisioningLogic,
        catalog: &ModuleCatalog,
        matrix: &ContentMatrix,
    ) -> CoverageReport {
        let orphan_rules = self.find_orphan_rules(logic, catalog);
        let orphan_defaults = self.find_orphan_defaults(logic, catalog);
        let orphan_ids: HashSet<&str> = orphan_rules.iter().map(|o| o.rule_id.as_str()).collect();

        let candidates: Vec<&DecisionRule> = logic
            .rules()
            .iter()
            .filter(|r| r.is_active && !orphan_ids.contains(r.id.as_str()))
            .collect();

        let mut covered_cells = Vec::new();
        let mut uncovered_cells = Vec::new();
        for cell in matrix.cells() {
            let ctx = cell_context(cell);
            if candidates.iter().any(|rule| rule_satisfiable(rule, &ctx)) {
                covered_cells.push(cell.id.clone());
            } else {
                uncovered_cells.push(cell.id.clone());
            }
        }

        let coverage_percentage = if matrix.is_empty() {
            0
        } else {
            (covered_cells.len() as f64 / matrix.len() as f64 * 100.0).round() as u32
        };

        info!(
            orphan_rules = orphan_rules.len(),
            orphan_defaults = orphan_defaults.len(),
            coverage_percentage = coverage_percentage,
            "覆盖率校验完成"
        );

        CoverageReport {
            has_orphan_rules: !orphan_rules.is_empty(),
            orphan_rules,
            orphan_defaults,
            coverage_percentage,
            covered_cells,
            uncovered_cells,
        }
    }
}
