// ==========================================
// ModCon 内容规划系统 - 决策规则引擎
// ==========================================
// 职责: 按优先级评估规则，为定向上下文选出模块变体
// 红线: 只评估 is_active 规则; 按 (priority, 插入序号) 稳定排序
// 红线: 首个命中即停止（短路），未命中回退到该模块类型的默认值
// 说明: NoMatch 是正常结果，不是错误
// ==========================================

use crate::domain::decision::{DecisionRule, DecisioningLogic, TargetingContext, VariationRef};
use crate::domain::types::ModuleType;
use crate::engine::condition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// ==========================================
// Resolution - 决策结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// 规则命中
    Rule { rule_id: String, target: VariationRef },
    /// 无规则命中，使用默认值
    Default { target: VariationRef },
    /// 无规则也无默认值: 该槽位无内容可渲染
    NoMatch,
}

impl Resolution {
    pub fn target(&self) -> Option<&VariationRef> {
        match self {
            Resolution::Rule { target, .. } | Resolution::Default { target } => Some(target),
            Resolution::NoMatch => None,
        }
    }

    pub fn rule_id(&self) -> Option<&str> {
        match self {
            Resolution::Rule { rule_id, .. } => Some(rule_id),
            _ => None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Resolution::Default { .. })
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, Resolution::NoMatch)
    }
}

// ==========================================
// 决策追踪
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionTrace {
    pub description: String,
    /// None: 上下文缺少该属性
    pub result: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTrace {
    pub rule_id: String,
    pub priority: i32,
    pub matched: bool,
    pub conditions: Vec<ConditionTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionTrace {
    pub module_type: ModuleType,
    /// 实际评估过的规则（短路后的规则不出现）
    pub evaluated: Vec<RuleTrace>,
    pub resolution: Resolution,
}

// ==========================================
// DecisionRuleEngine
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DecisionRuleEngine;

impl DecisionRuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// 参与评估的规则: 活跃 + (可选)模块类型匹配，按 (priority, 插入序号) 升序
    pub fn ordered_rules<'a>(
        &self,
        rules: &'a [DecisionRule],
        module_type: Option<ModuleType>,
    ) -> Vec<&'a DecisionRule> {
        let mut indexed: Vec<(usize, &DecisionRule)> = rules
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_active)
            .filter(|(_, r)| module_type.map_or(true, |t| r.action.module_type == t))
            .collect();
        indexed.sort_by_key(|(index, rule)| (rule.priority, *index));
        indexed.into_iter().map(|(_, rule)| rule).collect()
    }

    /// 规则是否命中（缺失属性视为不匹配）
    pub fn rule_matches(&self, rule: &DecisionRule, context: &TargetingContext) -> bool {
        let results: Vec<Option<bool>> = rule
            .conditions
            .iter()
            .map(|c| condition::evaluate(c, context))
            .collect();
        condition::combine(&results, rule.condition_logic)
    }

    /// 核心决策: resolve(context, rules, defaults) → 变体 | NoMatch
    #[instrument(skip(self, context, rules, defaults), fields(module_type = %module_type, rules = rules.len()))]
    pub fn resolve_rules(
        &self,
        context: &TargetingContext,
        rules: &[DecisionRule],
        defaults: &BTreeMap<ModuleType, VariationRef>,
        module_type: ModuleType,
    ) -> Resolution {
        for rule in self.ordered_rules(rules, Some(module_type)) {
            if self.rule_matches(rule, context) {
                debug!(rule_id = %rule.id, priority = rule.priority, "规则命中");
                return Resolution::Rule {
                    rule_id: rule.id.clone(),
                    target: rule.action.target(),
                };
            }
        }

        match defaults.get(&module_type) {
            Some(target) => {
                debug!(module_id = %target.module_id, variation_id = %target.variation_id, "无规则命中，使用默认值");
                Resolution::Default {
                    target: target.clone(),
                }
            }
            None => {
                debug!("无规则命中且无默认值");
                Resolution::NoMatch
            }
        }
    }

    pub fn resolve(
        &self,
        context: &TargetingContext,
        logic: &DecisioningLogic,
        module_type: ModuleType,
    ) -> Resolution {
        self.resolve_rules(context, logic.rules(), logic.defaults(), module_type)
    }

    /// 对规则或默认值涉及的每个模块类型做决策（分类顺序）
    pub fn resolve_all(
        &self,
        context: &TargetingContext,
        logic: &DecisioningLogic,
    ) -> BTreeMap<ModuleType, Resolution> {
        ModuleType::ALL
            .iter()
            .copied()
            .filter(|t| {
                logic.defaults().contains_key(t)
                    || logic.rules().iter().any(|r| r.action.module_type == *t)
            })
            .map(|t| (t, self.resolve(context, logic, t)))
            .collect()
    }

    /// 带追踪的决策: 记录每条被评估规则的条件结果
    pub fn resolve_with_trace(
        &self,
        context: &TargetingContext,
        logic: &DecisioningLogic,
        module_type: ModuleType,
    ) -> ResolutionTrace {
        let mut evaluated = Vec::new();
        let mut resolution = None;

        for rule in self.ordered_rules(logic.rules(), Some(module_type)) {
            let results: Vec<Option<bool>> = rule
                .conditions
                .iter()
                .map(|c| condition::evaluate(c, context))
                .collect();
            let matched = condition::combine(&results, rule.condition_logic);
            evaluated.push(RuleTrace {
                rule_id: rule.id.clone(),
                priority: rule.priority,
                matched,
                conditions: rule
                    .conditions
                    .iter()
                    .zip(results)
                    .map(|(c, result)| ConditionTrace {
                        description: condition::describe(c),
                        result,
                    })
                    .collect(),
            });
            if matched {
                resolution = Some(Resolution::Rule {
                    rule_id: rule.id.clone(),
                    target: rule.action.target(),
                });
                break;
            }
        }

        let resolution = resolution.unwrap_or_else(|| match logic.default_for(module_type) {
            Some(target) => Resolution::Default {
                target: target.clone(),
            },
            None => Resolution::NoMatch,
        });

        ResolutionTrace {
            module_type,
            evaluated,
            resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::{DecisionCondition, RuleAction};
    use crate::domain::types::{ConditionLogic, ConditionType, Operator};

    fn geo_rule(id: &str, priority: i32, geo: &str) -> DecisionRule {
        DecisionRule::new(
            id,
            id,
            priority,
            vec![DecisionCondition::text(ConditionType::Geo, Operator::Equals, geo).unwrap()],
            ConditionLogic::And,
            RuleAction {
                module_type: ModuleType::Offer,
                module_id: "m_offer".to_string(),
                variation_id: format!("v_{}", id),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let rules = vec![geo_rule("first", 5, "US"), geo_rule("second", 5, "US")];
        let ctx = TargetingContext::new().with(ConditionType::Geo, "US");
        let engine = DecisionRuleEngine::new();
        let res = engine.resolve_rules(&ctx, &rules, &BTreeMap::new(), ModuleType::Offer);
        assert_eq!(res.rule_id(), Some("first"));
    }

    #[test]
    fn test_inactive_rules_are_skipped() {
        let mut winner = geo_rule("winner", 1, "US");
        winner.is_active = false;
        let rules = vec![winner, geo_rule("fallback", 9, "US")];
        let ctx = TargetingContext::new().with(ConditionType::Geo, "US");
        let res = DecisionRuleEngine::new().resolve_rules(
            &ctx,
            &rules,
            &BTreeMap::new(),
            ModuleType::Offer,
        );
        assert_eq!(res.rule_id(), Some("fallback"));
    }

    #[test]
    fn test_rules_for_other_slots_are_ignored() {
        let rules = vec![geo_rule("offer_rule", 1, "US")];
        let ctx = TargetingContext::new().with(ConditionType::Geo, "US");
        let res = DecisionRuleEngine::new().resolve_rules(
            &ctx,
            &rules,
            &BTreeMap::new(),
            ModuleType::Cta,
        );
        assert_eq!(res, Resolution::NoMatch);
    }

    #[test]
    fn test_trace_stops_at_first_match() {
        let mut logic = DecisioningLogic::new();
        logic.add_rule(geo_rule("ca", 1, "CA")).unwrap();
        logic.add_rule(geo_rule("us", 2, "US")).unwrap();
        logic.add_rule(geo_rule("us_late", 3, "US")).unwrap();
        let ctx = TargetingContext::new().with(ConditionType::Geo, "US");

        let trace = DecisionRuleEngine::new().resolve_with_trace(&ctx, &logic, ModuleType::Offer);
        assert_eq!(trace.evaluated.len(), 2);
        assert!(!trace.evaluated[0].matched);
        assert!(trace.evaluated[1].matched);
        assert_eq!(trace.resolution.rule_id(), Some("us"));
        assert_eq!(trace.evaluated[1].conditions[0].description, "geo equals US");
    }
}
