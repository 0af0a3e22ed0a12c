// ==========================================
// ModCon 内容规划系统 - 条件求值
// ==========================================
// 职责: 单条件对定向上下文求值 + 按 AND/OR 组合
// 三值结果: Some(true) / Some(false) / None (上下文缺少该属性)
// 决策时 None 视为不匹配; 覆盖率可满足性判断时 None 视为可满足
// ==========================================

use crate::domain::decision::{format_number, ConditionValue, DecisionCondition, TargetingContext};
use crate::domain::types::{ConditionLogic, Operator};

/// 单条件求值
pub fn evaluate(condition: &DecisionCondition, context: &TargetingContext) -> Option<bool> {
    let actual = context.lookup(condition)?;
    Some(matches_value(condition.operator(), condition.value(), actual))
}

fn matches_value(operator: Operator, expected: &ConditionValue, actual: &str) -> bool {
    match operator {
        Operator::Equals => expected.scalar_str().is_some_and(|e| e == actual),
        Operator::NotEquals => expected.scalar_str().is_some_and(|e| e != actual),
        Operator::Contains => contains(expected, actual),
        Operator::NotContains => !contains(expected, actual),
        Operator::In => in_list(expected, actual),
        Operator::NotIn => !in_list(expected, actual),
        Operator::GreaterThan => compare(expected, actual).is_some_and(|(a, e)| a > e),
        Operator::LessThan => compare(expected, actual).is_some_and(|(a, e)| a < e),
    }
}

/// 标量: 子串包含; 列表: 成员判断
fn contains(expected: &ConditionValue, actual: &str) -> bool {
    match expected.list_strs() {
        Some(items) => items.iter().any(|i| i == actual),
        None => expected
            .scalar_str()
            .is_some_and(|needle| actual.contains(needle.as_str())),
    }
}

fn in_list(expected: &ConditionValue, actual: &str) -> bool {
    expected
        .list_strs()
        .is_some_and(|items| items.iter().any(|i| i == actual))
}

/// 返回 (上下文数值, 条件数值); 上下文不是数值时不匹配
fn compare(expected: &ConditionValue, actual: &str) -> Option<(f64, f64)> {
    let e = match expected {
        ConditionValue::Number(n) => *n,
        _ => return None,
    };
    let a = actual.trim().parse::<f64>().ok()?;
    Some((a, e))
}

/// 规则条件组合（决策语义: 缺失属性不匹配）
pub fn combine(results: &[Option<bool>], logic: ConditionLogic) -> bool {
    match logic {
        ConditionLogic::And => !results.is_empty() && results.iter().all(|r| *r == Some(true)),
        ConditionLogic::Or => results.iter().any(|r| *r == Some(true)),
    }
}

/// 规则条件组合（可满足性语义: 缺失属性可满足）
pub fn combine_satisfiable(results: &[Option<bool>], logic: ConditionLogic) -> bool {
    match logic {
        ConditionLogic::And => !results.is_empty() && results.iter().all(|r| *r != Some(false)),
        ConditionLogic::Or => results.iter().any(|r| *r != Some(false)),
    }
}

/// 条件的可读描述（用于日志与追踪）
pub fn describe(condition: &DecisionCondition) -> String {
    let value = match condition.value() {
        ConditionValue::Number(n) => format_number(*n),
        other => match other.list_strs() {
            Some(items) => format!("[{}]", items.join(", ")),
            None => other.scalar_str().unwrap_or_default(),
        },
    };
    match condition.field() {
        Some(field) => format!(
            "{}.{} {} {}",
            condition.condition_type(),
            field,
            condition.operator(),
            value
        ),
        None => format!("{} {} {}", condition.condition_type(), condition.operator(), value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ConditionType;
    use serde_json::json;

    fn ctx() -> TargetingContext {
        TargetingContext::new()
            .with(ConditionType::Audience, "loyalists")
            .with(ConditionType::Geo, "US")
            .with(ConditionType::FunnelStage, "conversion")
            .with_custom("temperature", "28")
    }

    #[test]
    fn test_scalar_equality_is_case_sensitive() {
        let c = DecisionCondition::text(ConditionType::Geo, Operator::Equals, "US").unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(true));
        let c = DecisionCondition::text(ConditionType::Geo, Operator::Equals, "us").unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(false));
    }

    #[test]
    fn test_list_membership_operators() {
        let c = DecisionCondition::list(ConditionType::Geo, Operator::In, &["US", "CA"]).unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(true));
        let c = DecisionCondition::list(ConditionType::Geo, Operator::NotIn, &["US", "CA"]).unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(false));
        let c = DecisionCondition::list(ConditionType::Geo, Operator::Contains, &["DE"]).unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(false));
    }

    #[test]
    fn test_scalar_contains_is_substring() {
        let c = DecisionCondition::text(ConditionType::Audience, Operator::Contains, "loyal").unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(true));
        let c =
            DecisionCondition::text(ConditionType::Audience, Operator::NotContains, "loyal").unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(false));
    }

    #[test]
    fn test_numeric_comparison_on_custom_field() {
        let c = DecisionCondition::custom("temperature", Operator::GreaterThan, json!(25)).unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(true));
        let c = DecisionCondition::custom("temperature", Operator::LessThan, json!(25)).unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(false));
    }

    #[test]
    fn test_missing_attribute_is_unknown() {
        let c = DecisionCondition::text(ConditionType::Weather, Operator::NotEquals, "rain").unwrap();
        assert_eq!(evaluate(&c, &ctx()), None);
        assert!(!combine(&[None], ConditionLogic::And));
        assert!(combine_satisfiable(&[None], ConditionLogic::And));
        assert!(!combine_satisfiable(&[Some(false), None], ConditionLogic::And));
        assert!(combine_satisfiable(&[Some(false), None], ConditionLogic::Or));
    }

    #[test]
    fn test_typed_stage_matches_context_string() {
        let c = DecisionCondition::list(
            ConditionType::FunnelStage,
            Operator::In,
            &["consideration", "conversion"],
        )
        .unwrap();
        assert_eq!(evaluate(&c, &ctx()), Some(true));
        assert_eq!(describe(&c), "funnel_stage in [consideration, conversion]");
    }
}
