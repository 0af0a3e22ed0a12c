// ==========================================
// ModCon 内容规划系统 - 规则集编写检查
// ==========================================
// 职责: 静态检查规则集健康度，按规则列出问题
// 说明: 语义不匹配（如非数值字段用 greater_than）是警告，不阻止保存
// ==========================================

use crate::domain::decision::DecisioningLogic;
use crate::domain::module::ModuleCatalog;
use crate::domain::types::{ModuleType, Severity};
use crate::engine::coverage::{CoverageValidator, OrphanReason};
use crate::engine::notice::{count_severity, Notice};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetReport {
    pub issues: Vec<Notice>,
    pub error_count: usize,
    pub warning_count: usize,
}

impl RuleSetReport {
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }

    /// 指向某条规则的问题
    pub fn issues_for<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Notice> + 'a {
        self.issues
            .iter()
            .filter(move |n| n.subject.as_deref() == Some(rule_id))
    }
}

fn reason_code(reason: OrphanReason) -> &'static str {
    match reason {
        OrphanReason::ModuleMissing => "module_missing",
        OrphanReason::VariationMissing => "variation_missing",
    }
}

pub fn validate_rule_set(logic: &DecisioningLogic, catalog: &ModuleCatalog) -> RuleSetReport {
    let mut issues = Vec::new();
    let mut active_priorities: HashMap<(ModuleType, i32), &str> = HashMap::new();

    for rule in logic.rules() {
        if rule.name.trim().is_empty() {
            issues.push(Notice::error("rule_missing_name").subject(&rule.id));
        }

        if rule.is_active {
            // 同一槽位类型内的同优先级才会互相竞争
            let key = (rule.action.module_type, rule.priority);
            match active_priorities.get(&key) {
                Some(first) => issues.push(
                    Notice::warning("rule_priority_tie")
                        .subject(&rule.id)
                        .param("priority", rule.priority)
                        .param("other", first),
                ),
                None => {
                    active_priorities.insert(key, rule.id.as_str());
                }
            }
        } else {
            issues.push(Notice::info("rule_inactive").subject(&rule.id));
        }

        for (index, c) in rule.conditions.iter().enumerate() {
            if c.operator().is_ordinal() && !c.condition_type().is_ordinal() {
                issues.push(
                    Notice::warning("rule_ordinal_on_non_ordinal")
                        .subject(&rule.id)
                        .param("index", index)
                        .param("type", c.condition_type())
                        .param("operator", c.operator()),
                );
            }
        }
    }

    let validator = CoverageValidator::new();
    for orphan in validator.find_orphan_rules(logic, catalog) {
        issues.push(
            Notice::error("rule_orphan")
                .subject(&orphan.rule_id)
                .param("module_id", &orphan.target.module_id)
                .param("variation_id", &orphan.target.variation_id)
                .param("reason", reason_code(orphan.reason)),
        );
    }
    for orphan in validator.find_orphan_defaults(logic, catalog) {
        issues.push(
            Notice::error("default_orphan")
                .subject(orphan.module_type.as_str())
                .param("module_id", &orphan.target.module_id)
                .param("variation_id", &orphan.target.variation_id)
                .param("reason", reason_code(orphan.reason)),
        );
    }

    for rule in logic.rules() {
        if let Some(module) = catalog.find_module(&rule.action.module_id) {
            if module.module_type != rule.action.module_type {
                issues.push(
                    Notice::warning("rule_type_mismatch")
                        .subject(&rule.id)
                        .param("module_id", &module.id)
                        .param("expected", rule.action.module_type)
                        .param("actual", module.module_type),
                );
            }
        }
    }

    for (module_type, target) in logic.defaults() {
        if let Some(module) = catalog.find_module(&target.module_id) {
            if module.module_type != *module_type {
                issues.push(
                    Notice::warning("default_type_mismatch")
                        .subject(module_type.as_str())
                        .param("module_id", &module.id)
                        .param("actual", module.module_type),
                );
            }
        }
    }

    let error_count = count_severity(&issues, Severity::Error);
    let warning_count = count_severity(&issues, Severity::Warning);
    debug!(
        rules = logic.rules().len(),
        errors = error_count,
        warnings = warning_count,
        "规则集检查完成"
    );

    RuleSetReport {
        issues,
        error_count,
        warning_count,
    }
}
