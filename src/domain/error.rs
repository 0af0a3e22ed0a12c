// ==========================================
// ModCon 内容规划系统 - 领域层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 所有错误必须指明出错的实体（模块/变体/单元格/规则/条件）
// ==========================================

use crate::domain::types::{ConditionType, Operator};
use thiserror::Error;

/// 条件构造错误（规则编写阶段即失败，不做静默转换）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    #[error("条件 {condition_type} {operator}: 运算符只接受单个值，但给出了列表")]
    ListForScalarOperator {
        condition_type: ConditionType,
        operator: Operator,
    },

    #[error("条件 {condition_type} {operator}: 运算符要求列表值")]
    ScalarForListOperator {
        condition_type: ConditionType,
        operator: Operator,
    },

    #[error("条件 {condition_type} {operator}: 运算符要求数值，实际为 {found}")]
    NonNumericForOrdinalOperator {
        condition_type: ConditionType,
        operator: Operator,
        found: String,
    },

    #[error("条件 {condition_type} {operator}: 列表值不能为空")]
    EmptyList {
        condition_type: ConditionType,
        operator: Operator,
    },

    #[error("条件 {condition_type}: 值 {value} 不是合法取值 ({reason})")]
    InvalidEnumValue {
        condition_type: ConditionType,
        value: String,
        reason: String,
    },

    #[error("条件 {condition_type}: 不支持的值类型 {found}")]
    UnsupportedValue {
        condition_type: ConditionType,
        found: String,
    },

    #[error("条件 custom: 必须指定 field")]
    MissingCustomField,
}

/// 领域模型变更错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    // ===== 模块目录 =====
    #[error("模块已存在: module_id={0}")]
    DuplicateModule(String),

    #[error("模块不存在: module_id={0}")]
    ModuleNotFound(String),

    #[error("变体已存在: module_id={module_id}, variation_id={variation_id}")]
    DuplicateVariation {
        module_id: String,
        variation_id: String,
    },

    #[error("变体不存在: module_id={module_id}, variation_id={variation_id}")]
    VariationNotFound {
        module_id: String,
        variation_id: String,
    },

    // ===== 范围矩阵 =====
    #[error("单元格已存在: cell_id={0}")]
    DuplicateCell(String),

    #[error("单元格不存在: cell_id={0}")]
    CellNotFound(String),

    #[error("单元格 {cell_id} 的计划变体数必须 ≥ 1，实际为 {count}")]
    InvalidVariantCount { cell_id: String, count: u32 },

    // ===== 决策规则 =====
    #[error("规则已存在: rule_id={0}")]
    DuplicateRule(String),

    #[error("规则不存在: rule_id={0}")]
    RuleNotFound(String),

    #[error("规则 {rule_id} 至少需要一个条件")]
    EmptyConditions { rule_id: String },

    #[error("规则 {rule_id} 第 {index} 个条件无效: {source}")]
    MalformedCondition {
        rule_id: String,
        index: usize,
        #[source]
        source: ConditionError,
    },

    #[error("规则 {rule_id} JSON 无法解析: {message}")]
    InvalidRuleJson { rule_id: String, message: String },

    // ===== 受众/投放位 =====
    #[error("受众已存在: audience_id={0}")]
    DuplicateAudience(String),

    #[error("受众不存在: audience_id={0}")]
    AudienceNotFound(String),

    #[error("投放位已存在: placement_id={0}")]
    DuplicatePlacement(String),

    #[error("投放位不存在: placement_id={0}")]
    PlacementNotFound(String),
}
