// ==========================================
// ModCon 内容规划系统 - 数据源行生成器
// ==========================================
// 职责: 按 row_per 策略生成行，按列来源填充值，并对每行预览决策
// 红线: 行顺序确定 (受众外层、投放位内层)，row_id = row_0001 起连续编号
// 红线: rule 列输出占位符，实际值在投放时决策
// 说明: 单槽位 NoMatch 只记录，不中断整批生成
// ==========================================

use crate::domain::decision::{DecisioningLogic, TargetingContext};
use crate::domain::feed::{
    AudienceRef, FeedColumn, FeedColumnSource, FeedRow, FeedStructure, FeedValue, PlacementRef,
    RowPer,
};
use crate::domain::module::ModuleCatalog;
use crate::domain::snapshot::PlanSnapshot;
use crate::domain::types::{ConditionType, ModuleType};
use crate::engine::notice::Notice;
use crate::engine::rule_engine::{DecisionRuleEngine, Resolution};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{info, instrument};

/// rule 列占位符
pub const DYNAMIC_PLACEHOLDER: &str = "[DYNAMIC]";

static FORMULA_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("valid formula placeholder regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("未知的行生成策略: {0}（可选: audience / placement / audience_x_placement）")]
    UnknownRowPolicy(String),

    #[error("数据源行数 {rows} 超过上限 {limit}")]
    RowLimitExceeded { rows: usize, limit: usize },
}

pub fn parse_row_policy(raw: &str) -> Result<RowPer, FeedError> {
    raw.parse::<RowPer>().map_err(FeedError::UnknownRowPolicy)
}

pub fn estimated_row_count(policy: RowPer, audiences: usize, placements: usize) -> usize {
    match policy {
        RowPer::Audience => audiences,
        RowPer::Placement => placements,
        RowPer::AudienceXPlacement => audiences * placements,
    }
}

/// 行生成输入
#[derive(Debug, Clone, Copy)]
pub struct FeedInputs<'a> {
    pub audiences: &'a [AudienceRef],
    pub placements: &'a [PlacementRef],
    pub catalog: &'a ModuleCatalog,
    pub logic: &'a DecisioningLogic,
}

impl<'a> FeedInputs<'a> {
    pub fn from_snapshot(snapshot: &'a PlanSnapshot) -> Self {
        Self {
            audiences: &snapshot.audiences,
            placements: &snapshot.placements,
            catalog: &snapshot.catalog,
            logic: &snapshot.decisioning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedGeneration {
    pub policy: RowPer,
    pub rows: Vec<FeedRow>,
    /// 按列/槽位汇总的未解析情况
    pub warnings: Vec<Notice>,
}

// ==========================================
// FeedGenerator
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct FeedGenerator {
    engine: DecisionRuleEngine,
    max_rows: Option<usize>,
}

impl FeedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }

    #[instrument(skip_all, fields(structure = %structure.id, row_per = %structure.row_per))]
    pub fn generate(
        &self,
        structure: &FeedStructure,
        inputs: FeedInputs<'_>,
    ) -> Result<FeedGeneration, FeedError> {
        let policy = parse_row_policy(&structure.row_per)?;
        let expected = estimated_row_count(policy, inputs.audiences.len(), inputs.placements.len());
        if let Some(limit) = self.max_rows {
            if expected > limit {
                return Err(FeedError::RowLimitExceeded {
                    rows: expected,
                    limit,
                });
            }
        }

        let bindings = row_bindings(policy, inputs.audiences, inputs.placements);
        let mut rows = Vec::with_capacity(bindings.len());
        let mut unresolved_columns: BTreeMap<&str, usize> = BTreeMap::new();
        let mut unmatched_slots: BTreeMap<ModuleType, usize> = BTreeMap::new();

        for (index, (audience, placement)) in bindings.into_iter().enumerate() {
            let row_id = format!("row_{:04}", index + 1);

            let mut values: Vec<FeedValue> = Vec::with_capacity(structure.columns.len());
            for column in &structure.columns {
                let resolved = column_value(column, audience, placement, inputs.catalog, &values, &row_id);
                if resolved.is_none() {
                    *unresolved_columns.entry(column.name.as_str()).or_default() += 1;
                }
                let value = resolved
                    .or_else(|| column.default_value.clone())
                    .unwrap_or_default();
                values.push(FeedValue {
                    column: column.name.clone(),
                    value,
                });
            }

            let preview = self.preview_decisions(structure, audience, placement, inputs.logic);
            for slot in &preview.unresolved_slots {
                *unmatched_slots.entry(*slot).or_default() += 1;
            }

            rows.push(FeedRow {
                row_id,
                audience_id: audience.map(|a| a.id.clone()),
                placement_id: placement.map(|p| p.id.clone()),
                values,
                rules_applied: preview.rules_applied,
                is_default: preview.is_default,
                unresolved_slots: preview.unresolved_slots,
            });
        }

        let mut warnings = Vec::new();
        for column in &structure.columns {
            if let Some(count) = unresolved_columns.get(column.name.as_str()) {
                warnings.push(
                    Notice::warning("feed_column_unresolved")
                        .subject(&column.name)
                        .param("source", column.source)
                        .param("rows", count),
                );
            }
        }
        for (slot, count) in &unmatched_slots {
            warnings.push(
                Notice::warning("feed_slot_no_match")
                    .subject(slot.as_str())
                    .param("rows", count),
            );
        }

        info!(
            policy = %policy,
            rows = rows.len(),
            unresolved_columns = unresolved_columns.len(),
            unmatched_slots = unmatched_slots.len(),
            "数据源行生成完成"
        );

        Ok(FeedGeneration {
            policy,
            rows,
            warnings,
        })
    }

    pub fn generate_from_snapshot(
        &self,
        structure: &FeedStructure,
        snapshot: &PlanSnapshot,
    ) -> Result<FeedGeneration, FeedError> {
        self.generate(structure, FeedInputs::from_snapshot(snapshot))
    }

    /// 对 rule 列引用的每个模块类型（去重，按列顺序）做决策预览
    fn preview_decisions(
        &self,
        structure: &FeedStructure,
        audience: Option<&AudienceRef>,
        placement: Option<&PlacementRef>,
        logic: &DecisioningLogic,
    ) -> DecisionPreview {
        let context = row_context(audience, placement);
        let mut preview = DecisionPreview::default();
        let mut seen: HashSet<ModuleType> = HashSet::new();

        for column in &structure.columns {
            if column.source != FeedColumnSource::Rule {
                continue;
            }
            let Some(slot) = column.rule_module_type() else {
                continue;
            };
            if !seen.insert(slot) {
                continue;
            }
            match self.engine.resolve(&context, logic, slot) {
                Resolution::Rule { rule_id, .. } => preview.rules_applied.push(rule_id),
                Resolution::Default { .. } if structure.include_defaults => preview.is_default = true,
                Resolution::Default { .. } | Resolution::NoMatch => {
                    preview.unresolved_slots.push(slot)
                }
            }
        }
        preview
    }
}

#[derive(Debug, Default)]
struct DecisionPreview {
    rules_applied: Vec<String>,
    is_default: bool,
    unresolved_slots: Vec<ModuleType>,
}

fn row_bindings<'a>(
    policy: RowPer,
    audiences: &'a [AudienceRef],
    placements: &'a [PlacementRef],
) -> Vec<(Option<&'a AudienceRef>, Option<&'a PlacementRef>)> {
    match policy {
        RowPer::Audience => audiences.iter().map(|a| (Some(a), None)).collect(),
        RowPer::Placement => placements.iter().map(|p| (None, Some(p))).collect(),
        RowPer::AudienceXPlacement => audiences
            .iter()
            .flat_map(|a| placements.iter().map(move |p| (Some(a), Some(p))))
            .collect(),
    }
}

/// 行绑定的受众/投放位转成定向上下文
pub fn row_context(audience: Option<&AudienceRef>, placement: Option<&PlacementRef>) -> TargetingContext {
    let mut ctx = TargetingContext::new();
    if let Some(a) = audience {
        ctx.set(ConditionType::Audience, a.id.clone());
        if let Some(stage) = a.funnel_stage {
            ctx.set(ConditionType::FunnelStage, stage.as_str());
        }
        for (key, value) in &a.attributes {
            ctx = apply_attribute(ctx, key, value);
        }
    }
    if let Some(p) = placement {
        ctx.set(ConditionType::Placement, p.id.clone());
        if let Some(platform) = &p.platform {
            ctx.set(ConditionType::Platform, platform.clone());
        }
        for (key, value) in &p.attributes {
            ctx = apply_attribute(ctx, key, value);
        }
    }
    ctx
}

/// 属性名与条件类型同名时作为该类型的值，同时总是作为 custom 字段
fn apply_attribute(mut ctx: TargetingContext, key: &str, value: &str) -> TargetingContext {
    if let Ok(t) = key.parse::<ConditionType>() {
        if !matches!(t, ConditionType::Custom | ConditionType::Audience | ConditionType::Placement) {
            ctx.set(t, value.to_string());
        }
    }
    ctx.with_custom(key, value)
}

fn column_value(
    column: &FeedColumn,
    audience: Option<&AudienceRef>,
    placement: Option<&PlacementRef>,
    catalog: &ModuleCatalog,
    resolved: &[FeedValue],
    row_id: &str,
) -> Option<String> {
    let reference = column.source_reference.as_deref();
    match column.source {
        FeedColumnSource::Static => column.default_value.clone(),
        FeedColumnSource::Audience => audience.and_then(|a| a.field(reference.unwrap_or("id"))),
        FeedColumnSource::Placement => placement.and_then(|p| p.field(reference.unwrap_or("id"))),
        FeedColumnSource::Module => reference
            .and_then(|module_id| catalog.find_module(module_id))
            .and_then(|m| m.first_variation())
            .map(|v| v.preview_value().to_string()),
        FeedColumnSource::Rule => Some(DYNAMIC_PLACEHOLDER.to_string()),
        FeedColumnSource::Formula => reference.and_then(|t| render_formula(t, resolved, row_id)),
    }
}

/// {column_name} 取本行已解析的列值，{row_id} 取行号; 任一占位符无法解析则整列不解析
pub fn render_formula(template: &str, resolved: &[FeedValue], row_id: &str) -> Option<String> {
    let lookup = |name: &str| -> Option<String> {
        if name == "row_id" {
            return Some(row_id.to_string());
        }
        resolved
            .iter()
            .find(|v| v.column == name)
            .map(|v| v.value.clone())
    };

    let all_known = FORMULA_PLACEHOLDER_RE
        .captures_iter(template)
        .all(|caps| lookup(&caps[1]).is_some());
    if !all_known {
        return None;
    }

    let rendered = FORMULA_PLACEHOLDER_RE.replace_all(template, |caps: &regex::Captures<'_>| {
        lookup(&caps[1]).unwrap_or_default()
    });
    Some(rendered.into_owned())
}

/// 列名引用的占位符（不含 row_id）
pub fn formula_references(template: &str) -> Vec<String> {
    FORMULA_PLACEHOLDER_RE
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .filter(|name| name != "row_id")
        .collect()
}

// ==========================================
// 结构静态校验
// ==========================================

/// 生成前列出数据源结构的配置缺陷
pub fn validate_structure(structure: &FeedStructure, catalog: &ModuleCatalog) -> Vec<Notice> {
    let mut issues = Vec::new();

    let policy = match parse_row_policy(&structure.row_per) {
        Ok(p) => Some(p),
        Err(_) => {
            issues.push(
                Notice::error("feed_unknown_row_policy")
                    .subject(&structure.id)
                    .param("policy", &structure.row_per),
            );
            None
        }
    };

    let mut declared: HashSet<&str> = HashSet::new();
    for column in &structure.columns {
        if !declared.insert(column.name.as_str()) {
            issues.push(Notice::error("feed_duplicate_column").subject(&column.name));
        }

        match column.source {
            FeedColumnSource::Module => match column.source_reference.as_deref() {
                None => issues.push(Notice::error("feed_module_ref_missing").subject(&column.name)),
                Some(module_id) => match catalog.find_module(module_id) {
                    None => issues.push(
                        Notice::error("feed_module_unknown")
                            .subject(&column.name)
                            .param("module_id", module_id),
                    ),
                    Some(m) if m.variations.is_empty() => issues.push(
                        Notice::warning("feed_module_empty")
                            .subject(&column.name)
                            .param("module_id", module_id),
                    ),
                    Some(_) => {}
                },
            },
            FeedColumnSource::Rule => {
                if column.rule_module_type().is_none() {
                    issues.push(
                        Notice::error("feed_rule_ref_invalid")
                            .subject(&column.name)
                            .param("reference", column.source_reference.as_deref().unwrap_or("")),
                    );
                }
            }
            FeedColumnSource::Audience => {
                if policy.is_some_and(|p| !p.binds_audience()) {
                    issues.push(Notice::warning("feed_audience_unbound").subject(&column.name));
                }
            }
            FeedColumnSource::Placement => {
                if policy.is_some_and(|p| !p.binds_placement()) {
                    issues.push(Notice::warning("feed_placement_unbound").subject(&column.name));
                }
            }
            FeedColumnSource::Formula => match column.source_reference.as_deref() {
                None => issues.push(Notice::error("feed_formula_missing").subject(&column.name)),
                Some(template) => {
                    for name in formula_references(template) {
                        // 只能引用前面已声明的列
                        if !declared.contains(name.as_str()) || name == column.name {
                            issues.push(
                                Notice::error("feed_formula_unknown_column")
                                    .subject(&column.name)
                                    .param("reference", name),
                            );
                        }
                    }
                }
            },
            FeedColumnSource::Static => {}
        }

        if let Some(pattern) = &column.validation_pattern {
            if Regex::new(pattern).is_err() {
                issues.push(
                    Notice::error("feed_invalid_pattern")
                        .subject(&column.name)
                        .param("pattern", pattern),
                );
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(column: &str, value: &str) -> FeedValue {
        FeedValue {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_formula_renders_earlier_columns() {
        let resolved = vec![value("audience_name", "Loyalists"), value("size", "300x250")];
        assert_eq!(
            render_formula("{audience_name}_{size}_{row_id}", &resolved, "row_0003").as_deref(),
            Some("Loyalists_300x250_row_0003")
        );
    }

    #[test]
    fn test_formula_with_unknown_column_is_unresolved() {
        let resolved = vec![value("audience_name", "Loyalists")];
        assert_eq!(render_formula("{audience_name}-{headline}", &resolved, "row_0001"), None);
        assert_eq!(formula_references("{a}_{row_id}_{b}"), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_policy_is_configuration_error() {
        assert_eq!(
            parse_row_policy("cell"),
            Err(FeedError::UnknownRowPolicy("cell".to_string()))
        );
        assert_eq!(estimated_row_count(RowPer::AudienceXPlacement, 3, 4), 12);
        assert_eq!(estimated_row_count(RowPer::Placement, 3, 4), 4);
    }

    #[test]
    fn test_attributes_feed_row_context() {
        let mut audience = AudienceRef::new("aud_1", "Loyalists");
        audience.attributes.insert("geo".to_string(), "US".to_string());
        audience.attributes.insert("tier".to_string(), "gold".to_string());
        let placement = PlacementRef::new("pl_1", "Feed").with_platform("meta");

        let ctx = row_context(Some(&audience), Some(&placement));
        assert_eq!(ctx.get(ConditionType::Audience), Some("aud_1"));
        assert_eq!(ctx.get(ConditionType::Geo), Some("US"));
        assert_eq!(ctx.get(ConditionType::Platform), Some("meta"));
        assert_eq!(ctx.get(ConditionType::Placement), Some("pl_1"));
    }
}
