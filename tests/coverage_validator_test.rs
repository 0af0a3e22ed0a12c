// ==========================================
// CoverageValidator / 规则集检查 集成测试
// ==========================================
// 测试目标: 孤儿规则与孤儿默认值、覆盖率百分比、规则集问题列表
// ==========================================

mod test_helpers;

use modcon_planner::domain::types::{ConditionType, FunnelStage, ModuleType, Severity};
use modcon_planner::domain::{ContentMatrix, VariationRef};
use modcon_planner::engine::{validate_rule_set, CoverageValidator, OrphanReason};
use test_helpers::*;

#[test]
fn test_rule_targeting_deleted_module_is_orphan() {
    let mut catalog = create_test_catalog();
    let logic = logic_of(vec![
        hook_rule("r_keep", 1, eq(ConditionType::Geo, "US"), "v_speed"),
        hook_rule("r_lost", 2, eq(ConditionType::Geo, "UK"), "v_price"),
    ]);
    let matrix = matrix_of(vec![cell("c1", "Video", "Speed", 1)]);

    let report = CoverageValidator::new().validate(&logic, &catalog, &matrix);
    assert!(!report.has_orphan_rules);

    catalog.remove_module("m_hook").unwrap();
    let report = CoverageValidator::new().validate(&logic, &catalog, &matrix);

    assert!(report.has_orphan_rules);
    let ids: Vec<&str> = report.orphan_rules.iter().map(|o| o.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["r_keep", "r_lost"]);
    assert_eq!(report.orphan_rules[0].reason, OrphanReason::ModuleMissing);
}

#[test]
fn test_rule_targeting_deleted_variation_is_orphan() {
    let mut catalog = create_test_catalog();
    let logic = logic_of(vec![hook_rule("r_price", 1, eq(ConditionType::Geo, "US"), "v_price")]);
    catalog.remove_variation("m_hook", "v_price").unwrap();

    let orphans = CoverageValidator::new().find_orphan_rules(&logic, &catalog);
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].rule_id, "r_price");
    assert_eq!(orphans[0].reason, OrphanReason::VariationMissing);
}

#[test]
fn test_orphan_default_is_reported() {
    let mut catalog = create_test_catalog();
    let mut logic = logic_of(vec![]);
    logic.set_default(ModuleType::Offer, VariationRef::new("m_offer", "v_10off"));
    catalog.remove_module("m_offer").unwrap();

    let report = CoverageValidator::new().validate(&logic, &catalog, &ContentMatrix::new());
    assert_eq!(report.orphan_defaults.len(), 1);
    assert_eq!(report.orphan_defaults[0].module_type, ModuleType::Offer);
    // 默认值孤儿不影响 has_orphan_rules
    assert!(!report.has_orphan_rules);
}

#[test]
fn test_coverage_percentage_counts_satisfiable_cells() {
    let catalog = create_test_catalog();
    let logic = logic_of(vec![hook_rule(
        "r_aware",
        1,
        eq(ConditionType::FunnelStage, "awareness"),
        "v_speed",
    )]);
    let matrix = matrix_of(vec![
        cell_for("c1", "aud_1", FunnelStage::Awareness, "feed"),
        cell_for("c2", "aud_2", FunnelStage::Conversion, "feed"),
        cell_for("c3", "aud_3", FunnelStage::Awareness, "stories"),
        cell_for("c4", "aud_4", FunnelStage::Retention, "feed"),
    ]);

    let report = CoverageValidator::new().validate(&logic, &catalog, &matrix);
    assert_eq!(report.coverage_percentage, 50);
    assert_eq!(report.covered_cells, vec!["c1", "c3"]);
    assert_eq!(report.uncovered_cells, vec!["c2", "c4"]);
}

#[test]
fn test_rule_on_unknown_attribute_covers_cell() {
    // geo 不在单元格属性中，视为可满足
    let catalog = create_test_catalog();
    let logic = logic_of(vec![hook_rule("r_geo", 1, eq(ConditionType::Geo, "US"), "v_speed")]);
    let matrix = matrix_of(vec![cell("c1", "Video", "Speed", 1)]);

    let report = CoverageValidator::new().validate(&logic, &catalog, &matrix);
    assert_eq!(report.coverage_percentage, 100);
}

#[test]
fn test_orphan_and_inactive_rules_do_not_cover() {
    let mut catalog = create_test_catalog();
    let mut logic = logic_of(vec![
        hook_rule("r_inactive", 1, eq(ConditionType::Geo, "US"), "v_speed"),
        hook_rule("r_orphan", 2, eq(ConditionType::Geo, "US"), "v_price"),
    ]);
    logic.set_rule_active("r_inactive", false).unwrap();
    catalog.remove_variation("m_hook", "v_price").unwrap();
    let matrix = matrix_of(vec![cell("c1", "Video", "Speed", 1)]);

    let report = CoverageValidator::new().validate(&logic, &catalog, &matrix);
    assert_eq!(report.coverage_percentage, 0);
}

#[test]
fn test_empty_matrix_has_zero_coverage() {
    let logic = logic_of(vec![hook_rule("r1", 1, eq(ConditionType::Geo, "US"), "v_speed")]);
    let report = CoverageValidator::new().validate(&logic, &create_test_catalog(), &ContentMatrix::new());
    assert_eq!(report.coverage_percentage, 0);
}

#[test]
fn test_rule_set_report_lists_issues() {
    let mut catalog = create_test_catalog();
    let mut unnamed = hook_rule("r_unnamed", 1, eq(ConditionType::Geo, "US"), "v_speed");
    unnamed.name = String::new();
    let tie = hook_rule("r_tie", 1, eq(ConditionType::Geo, "CA"), "v_speed");
    let mut cta_on_hook = hook_rule("r_mismatch", 3, eq(ConditionType::Geo, "MX"), "v_speed");
    cta_on_hook.action.module_type = ModuleType::Cta;
    let lost = hook_rule("r_lost", 4, eq(ConditionType::Geo, "FR"), "v_price");

    let logic = logic_of(vec![unnamed, tie, cta_on_hook, lost]);
    catalog.remove_variation("m_hook", "v_price").unwrap();

    let report = validate_rule_set(&logic, &catalog);
    let codes_for = |id: &str| -> Vec<String> {
        report.issues_for(id).map(|n| n.code.clone()).collect()
    };

    assert_eq!(codes_for("r_unnamed"), vec!["rule_missing_name"]);
    assert_eq!(codes_for("r_tie"), vec!["rule_priority_tie"]);
    assert_eq!(codes_for("r_mismatch"), vec!["rule_type_mismatch"]);
    assert_eq!(codes_for("r_lost"), vec!["rule_orphan"]);
    assert_eq!(report.error_count, 2);
    assert!(!report.is_clean());
    assert!(report
        .issues
        .iter()
        .filter(|n| n.code == "rule_orphan")
        .all(|n| n.severity == Severity::Error));
}
