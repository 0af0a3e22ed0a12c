// ==========================================
// ModCon 内容规划系统 - 决策规则模型
// ==========================================
// 职责: 条件 / 规则 / 默认值 / 定向上下文
// 约束: 条件值按条件类型强类型化，畸形条件在构造时即失败
// 约束: 规则只通过 id 引用模块与变体（弱引用），孤儿由覆盖率校验发现
// ==========================================

use crate::domain::error::{ConditionError, ModelError};
use crate::domain::types::{ConditionLogic, ConditionType, Daypart, FunnelStage, ModuleType, Operator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ==========================================
// ConditionValue - 强类型条件值
// ==========================================
// audience/trigger/platform/placement/geo/weather/custom -> Text / TextSet
// funnel_stage -> Stage / StageSet
// daypart -> Daypart / DaypartSet
// greater_than / less_than -> Number
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Text(String),
    TextSet(Vec<String>),
    Number(f64),
    Stage(FunnelStage),
    StageSet(Vec<FunnelStage>),
    Daypart(Daypart),
    DaypartSet(Vec<Daypart>),
}

impl ConditionValue {
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            ConditionValue::TextSet(_) | ConditionValue::StageSet(_) | ConditionValue::DaypartSet(_)
        )
    }

    /// 标量值的字符串形式（列表返回 None）
    pub fn scalar_str(&self) -> Option<String> {
        match self {
            ConditionValue::Text(s) => Some(s.clone()),
            ConditionValue::Number(n) => Some(format_number(*n)),
            ConditionValue::Stage(s) => Some(s.as_str().to_string()),
            ConditionValue::Daypart(d) => Some(d.as_str().to_string()),
            _ => None,
        }
    }

    /// 列表值的字符串形式（标量返回 None）
    pub fn list_strs(&self) -> Option<Vec<String>> {
        match self {
            ConditionValue::TextSet(items) => Some(items.clone()),
            ConditionValue::StageSet(items) => {
                Some(items.iter().map(|s| s.as_str().to_string()).collect())
            }
            ConditionValue::DaypartSet(items) => {
                Some(items.iter().map(|d| d.as_str().to_string()).collect())
            }
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ConditionValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            other => match other.list_strs() {
                Some(items) => Value::Array(items.into_iter().map(Value::String).collect()),
                None => Value::String(other.scalar_str().unwrap_or_default()),
            },
        }
    }
}

/// 整数不带小数点输出
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ==========================================
// DecisionCondition - 决策条件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition", into = "RawCondition")]
pub struct DecisionCondition {
    condition_type: ConditionType,
    field: Option<String>,
    operator: Operator,
    value: ConditionValue,
}

/// 条件的线上格式 {type, field?, operator, value}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub operator: Operator,
    pub value: Value,
}

impl TryFrom<RawCondition> for DecisionCondition {
    type Error = ConditionError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        DecisionCondition::parse(raw.condition_type, raw.field, raw.operator, raw.value)
    }
}

impl From<DecisionCondition> for RawCondition {
    fn from(c: DecisionCondition) -> Self {
        RawCondition {
            condition_type: c.condition_type,
            field: c.field,
            value: c.value.to_json(),
            operator: c.operator,
        }
    }
}

impl DecisionCondition {
    /// 从原始 JSON 值构造条件，按运算符和条件类型校验值的形状
    pub fn parse(
        condition_type: ConditionType,
        field: Option<String>,
        operator: Operator,
        value: Value,
    ) -> Result<Self, ConditionError> {
        let field = field.map(|f| f.trim().to_string()).filter(|f| !f.is_empty());
        if condition_type == ConditionType::Custom && field.is_none() {
            return Err(ConditionError::MissingCustomField);
        }

        let value = if operator.is_ordinal() {
            parse_number(condition_type, operator, &value)?
        } else {
            match &value {
                Value::Array(items) => {
                    if operator.is_scalar_only() {
                        return Err(ConditionError::ListForScalarOperator {
                            condition_type,
                            operator,
                        });
                    }
                    if items.is_empty() {
                        return Err(ConditionError::EmptyList {
                            condition_type,
                            operator,
                        });
                    }
                    let strs = items
                        .iter()
                        .map(|item| scalar_to_string(condition_type, item))
                        .collect::<Result<Vec<_>, _>>()?;
                    typed_list(condition_type, strs)?
                }
                scalar => {
                    if operator.requires_list() {
                        return Err(ConditionError::ScalarForListOperator {
                            condition_type,
                            operator,
                        });
                    }
                    let s = scalar_to_string(condition_type, scalar)?;
                    typed_scalar(condition_type, s)?
                }
            }
        };

        Ok(Self {
            condition_type,
            field,
            operator,
            value,
        })
    }

    pub fn text(condition_type: ConditionType, operator: Operator, value: &str) -> Result<Self, ConditionError> {
        Self::parse(condition_type, None, operator, Value::String(value.to_string()))
    }

    pub fn list(condition_type: ConditionType, operator: Operator, values: &[&str]) -> Result<Self, ConditionError> {
        let items = values.iter().map(|v| Value::String(v.to_string())).collect();
        Self::parse(condition_type, None, operator, Value::Array(items))
    }

    pub fn custom(field: &str, operator: Operator, value: Value) -> Result<Self, ConditionError> {
        Self::parse(ConditionType::Custom, Some(field.to_string()), operator, value)
    }

    pub fn condition_type(&self) -> ConditionType {
        self.condition_type
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &ConditionValue {
        &self.value
    }
}

fn scalar_to_string(condition_type: ConditionType, value: &Value) -> Result<String, ConditionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        // 整数原样保留，超过 2^53 的 id 不能经过 f64
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Value::Number(n) => Ok(n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())),
        other => Err(ConditionError::UnsupportedValue {
            condition_type,
            found: json_kind(other).to_string(),
        }),
    }
}

fn parse_number(
    condition_type: ConditionType,
    operator: Operator,
    value: &Value,
) -> Result<ConditionValue, ConditionError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Array(_) => {
            return Err(ConditionError::ListForScalarOperator {
                condition_type,
                operator,
            })
        }
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(ConditionValue::Number(n)),
        _ => Err(ConditionError::NonNumericForOrdinalOperator {
            condition_type,
            operator,
            found: value.to_string(),
        }),
    }
}

fn typed_scalar(condition_type: ConditionType, s: String) -> Result<ConditionValue, ConditionError> {
    match condition_type {
        ConditionType::FunnelStage => s
            .parse::<FunnelStage>()
            .map(ConditionValue::Stage)
            .map_err(|reason| ConditionError::InvalidEnumValue {
                condition_type,
                value: s,
                reason,
            }),
        ConditionType::Daypart => s
            .parse::<Daypart>()
            .map(ConditionValue::Daypart)
            .map_err(|reason| ConditionError::InvalidEnumValue {
                condition_type,
                value: s,
                reason,
            }),
        _ => Ok(ConditionValue::Text(s)),
    }
}

fn typed_list(condition_type: ConditionType, items: Vec<String>) -> Result<ConditionValue, ConditionError> {
    match condition_type {
        ConditionType::FunnelStage => items
            .into_iter()
            .map(|s| {
                s.parse::<FunnelStage>()
                    .map_err(|reason| ConditionError::InvalidEnumValue {
                        condition_type,
                        value: s,
                        reason,
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ConditionValue::StageSet),
        ConditionType::Daypart => items
            .into_iter()
            .map(|s| {
                s.parse::<Daypart>()
                    .map_err(|reason| ConditionError::InvalidEnumValue {
                        condition_type,
                        value: s,
                        reason,
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ConditionValue::DaypartSet),
        _ => Ok(ConditionValue::TextSet(items)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ==========================================
// VariationRef / RuleAction
// ==========================================

/// (module_id, variation_id) 弱引用
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariationRef {
    pub module_id: String,
    pub variation_id: String,
}

impl VariationRef {
    pub fn new(module_id: impl Into<String>, variation_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            variation_id: variation_id.into(),
        }
    }
}

/// 规则命中后展示的内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    pub module_type: ModuleType,
    pub module_id: String,
    pub variation_id: String,
}

impl RuleAction {
    pub fn target(&self) -> VariationRef {
        VariationRef::new(self.module_id.clone(), self.variation_id.clone())
    }
}

// ==========================================
// DecisionRule - 决策规则
// ==========================================
pub const DEFAULT_RULE_PRIORITY: i32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct DecisionRule {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 越小越先评估
    pub priority: i32,
    pub conditions: Vec<DecisionCondition>,
    pub condition_logic: ConditionLogic,
    pub action: RuleAction,
    pub is_active: bool,
}

/// 规则编辑器提交的原始格式（条件尚未校验）
#[derive(Debug, Clone, Deserialize)]
pub struct RawRule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub conditions: Vec<RawCondition>,
    #[serde(default)]
    pub condition_logic: ConditionLogic,
    pub action: RuleAction,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_priority() -> i32 {
    DEFAULT_RULE_PRIORITY
}

fn default_active() -> bool {
    true
}

impl TryFrom<RawRule> for DecisionRule {
    type Error = ModelError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        if raw.conditions.is_empty() {
            return Err(ModelError::EmptyConditions { rule_id: raw.id });
        }
        let mut conditions = Vec::with_capacity(raw.conditions.len());
        for (index, condition) in raw.conditions.into_iter().enumerate() {
            let parsed = DecisionCondition::try_from(condition).map_err(|source| {
                ModelError::MalformedCondition {
                    rule_id: raw.id.clone(),
                    index,
                    source,
                }
            })?;
            conditions.push(parsed);
        }
        Ok(DecisionRule {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            priority: raw.priority,
            conditions,
            condition_logic: raw.condition_logic,
            action: raw.action,
            is_active: raw.is_active,
        })
    }
}

impl DecisionRule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        priority: i32,
        conditions: Vec<DecisionCondition>,
        condition_logic: ConditionLogic,
        action: RuleAction,
    ) -> Result<Self, ModelError> {
        let id = id.into();
        if conditions.is_empty() {
            return Err(ModelError::EmptyConditions { rule_id: id });
        }
        Ok(Self {
            id,
            name: name.into(),
            description: None,
            priority,
            conditions,
            condition_logic,
            action,
            is_active: true,
        })
    }

    /// 从规则编辑器的 JSON 解析规则
    pub fn from_json(value: Value) -> Result<Self, ModelError> {
        let rule_id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let raw: RawRule =
            serde_json::from_value(value).map_err(|e| ModelError::InvalidRuleJson {
                rule_id,
                message: e.to_string(),
            })?;
        DecisionRule::try_from(raw)
    }
}

// ==========================================
// DecisioningLogic - 规则集 + 默认值
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDecisioningLogic")]
pub struct DecisioningLogic {
    rules: Vec<DecisionRule>,
    defaults: BTreeMap<ModuleType, VariationRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDecisioningLogic {
    #[serde(default)]
    rules: Vec<DecisionRule>,
    #[serde(default)]
    defaults: BTreeMap<ModuleType, VariationRef>,
}

impl TryFrom<RawDecisioningLogic> for DecisioningLogic {
    type Error = ModelError;

    fn try_from(raw: RawDecisioningLogic) -> Result<Self, Self::Error> {
        let mut logic = DecisioningLogic {
            rules: Vec::with_capacity(raw.rules.len()),
            defaults: raw.defaults,
        };
        for rule in raw.rules {
            logic.add_rule(rule)?;
        }
        Ok(logic)
    }
}

impl DecisioningLogic {
    pub fn new() -> Self {
        Self::default()
    }

    /// 规则按插入顺序保存（优先级相同时以此为次序）
    pub fn rules(&self) -> &[DecisionRule] {
        &self.rules
    }

    pub fn defaults(&self) -> &BTreeMap<ModuleType, VariationRef> {
        &self.defaults
    }

    pub fn default_for(&self, module_type: ModuleType) -> Option<&VariationRef> {
        self.defaults.get(&module_type)
    }

    pub fn find_rule(&self, rule_id: &str) -> Option<&DecisionRule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    pub fn add_rule(&mut self, rule: DecisionRule) -> Result<(), ModelError> {
        if rule.conditions.is_empty() {
            return Err(ModelError::EmptyConditions { rule_id: rule.id });
        }
        if self.find_rule(&rule.id).is_some() {
            return Err(ModelError::DuplicateRule(rule.id));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// 原位替换规则（保持插入位置不变）
    pub fn update_rule(&mut self, rule: DecisionRule) -> Result<(), ModelError> {
        if rule.conditions.is_empty() {
            return Err(ModelError::EmptyConditions { rule_id: rule.id });
        }
        let slot = self
            .rules
            .iter_mut()
            .find(|r| r.id == rule.id)
            .ok_or_else(|| ModelError::RuleNotFound(rule.id.clone()))?;
        *slot = rule;
        Ok(())
    }

    pub fn set_rule_active(&mut self, rule_id: &str, is_active: bool) -> Result<(), ModelError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| ModelError::RuleNotFound(rule_id.to_string()))?;
        rule.is_active = is_active;
        Ok(())
    }

    pub fn remove_rule(&mut self, rule_id: &str) -> Result<DecisionRule, ModelError> {
        let idx = self
            .rules
            .iter()
            .position(|r| r.id == rule_id)
            .ok_or_else(|| ModelError::RuleNotFound(rule_id.to_string()))?;
        Ok(self.rules.remove(idx))
    }

    pub fn set_default(&mut self, module_type: ModuleType, target: VariationRef) {
        self.defaults.insert(module_type, target);
    }

    pub fn clear_default(&mut self, module_type: ModuleType) -> Option<VariationRef> {
        self.defaults.remove(&module_type)
    }
}

// ==========================================
// TargetingContext - 定向上下文
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingContext {
    #[serde(default)]
    values: BTreeMap<ConditionType, String>,
    /// custom 条件按 field 取值
    #[serde(default)]
    custom: BTreeMap<String, String>,
}

impl TargetingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition_type: ConditionType, value: impl Into<String>) -> Self {
        self.set(condition_type, value);
        self
    }

    pub fn with_custom(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(field.into(), value.into());
        self
    }

    pub fn set(&mut self, condition_type: ConditionType, value: impl Into<String>) {
        self.values.insert(condition_type, value.into());
    }

    /// 读取条件对应的上下文值; custom 条件读取 field
    pub fn lookup(&self, condition: &DecisionCondition) -> Option<&str> {
        match condition.condition_type() {
            ConditionType::Custom => condition
                .field()
                .and_then(|f| self.custom.get(f))
                .map(String::as_str),
            other => self.values.get(&other).map(String::as_str),
        }
    }

    pub fn get(&self, condition_type: ConditionType) -> Option<&str> {
        self.values.get(&condition_type).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_value_with_scalar_operator_fails_fast() {
        let err = DecisionCondition::parse(
            ConditionType::Audience,
            None,
            Operator::Equals,
            json!(["a", "b"]),
        )
        .unwrap_err();
        assert!(matches!(err, ConditionError::ListForScalarOperator { .. }));
    }

    #[test]
    fn test_in_requires_list() {
        let err = DecisionCondition::text(ConditionType::Geo, Operator::In, "US").unwrap_err();
        assert!(matches!(err, ConditionError::ScalarForListOperator { .. }));
        assert!(DecisionCondition::list(ConditionType::Geo, Operator::In, &[]).is_err());
    }

    #[test]
    fn test_funnel_stage_values_are_typed() {
        let c = DecisionCondition::text(ConditionType::FunnelStage, Operator::Equals, "conversion")
            .unwrap();
        assert_eq!(c.value(), &ConditionValue::Stage(FunnelStage::Conversion));

        let err = DecisionCondition::text(ConditionType::FunnelStage, Operator::Equals, "purchase")
            .unwrap_err();
        assert!(matches!(err, ConditionError::InvalidEnumValue { .. }));

        let c = DecisionCondition::list(ConditionType::Daypart, Operator::In, &["morning", "evening"])
            .unwrap();
        assert_eq!(
            c.value(),
            &ConditionValue::DaypartSet(vec![Daypart::Morning, Daypart::Evening])
        );
    }

    #[test]
    fn test_ordinal_operator_requires_number() {
        let c = DecisionCondition::custom("temp", Operator::GreaterThan, json!("25")).unwrap();
        assert_eq!(c.value(), &ConditionValue::Number(25.0));
        let err = DecisionCondition::custom("temp", Operator::LessThan, json!("warm")).unwrap_err();
        assert!(matches!(err, ConditionError::NonNumericForOrdinalOperator { .. }));
        assert_eq!(
            DecisionCondition::parse(ConditionType::Custom, None, Operator::Equals, json!("x")),
            Err(ConditionError::MissingCustomField)
        );
    }

    #[test]
    fn test_rule_json_reports_rule_and_condition_index() {
        let raw = json!({
            "id": "r7",
            "name": "Bad rule",
            "conditions": [
                {"type": "audience", "operator": "equals", "value": "a1"},
                {"type": "geo", "operator": "equals", "value": ["US", "CA"]}
            ],
            "action": {"module_type": "cta", "module_id": "m1", "variation_id": "v1"}
        });
        let err = DecisionRule::from_json(raw).unwrap_err();
        match err {
            ModelError::MalformedCondition { rule_id, index, .. } => {
                assert_eq!(rule_id, "r7");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_large_integer_value_is_kept_exact() {
        let condition = DecisionCondition::parse(
            ConditionType::Audience,
            None,
            Operator::Equals,
            json!(9007199254740993u64),
        )
        .unwrap();
        assert_eq!(
            condition.value().scalar_str(),
            Some("9007199254740993".to_string())
        );

        let negative =
            DecisionCondition::parse(ConditionType::Custom, Some("seg".into()), Operator::Equals, json!(-42))
                .unwrap();
        assert_eq!(negative.value().scalar_str(), Some("-42".to_string()));

        let list = DecisionCondition::parse(
            ConditionType::Audience,
            None,
            Operator::In,
            json!([9007199254740993u64, 2.5]),
        )
        .unwrap();
        assert_eq!(
            list.value().list_strs(),
            Some(vec!["9007199254740993".to_string(), "2.5".to_string()])
        );
    }

    #[test]
    fn test_rule_serializes_back_to_wire_shape() {
        let raw = json!({
            "id": "r1",
            "name": "Loyal",
            "priority": 5,
            "conditions": [{"type": "geo", "operator": "in", "value": ["US", "CA"]}],
            "condition_logic": "OR",
            "action": {"module_type": "offer", "module_id": "m1", "variation_id": "v2"}
        });
        let rule = DecisionRule::from_json(raw).unwrap();
        assert!(rule.is_active);
        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["conditions"][0]["value"], json!(["US", "CA"]));
        assert_eq!(back["condition_logic"], json!("OR"));
    }

    #[test]
    fn test_defaults_keyed_by_module_type() {
        let json = r#"{"rules": [], "defaults": {"cta": {"module_id": "m1", "variation_id": "v1"}}}"#;
        let logic: DecisioningLogic = serde_json::from_str(json).unwrap();
        assert_eq!(
            logic.default_for(ModuleType::Cta),
            Some(&VariationRef::new("m1", "v1"))
        );
        assert!(logic.default_for(ModuleType::Hook).is_none());
    }
}
