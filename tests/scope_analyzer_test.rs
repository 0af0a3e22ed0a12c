// ==========================================
// 复用分析 / 复杂度评分 集成测试
// ==========================================
// 测试目标: 复用机会计数、高量警告、复杂度升级、重算幂等、reuse_count 派生
// ==========================================

mod test_helpers;

use modcon_planner::config::ScopeThresholds;
use modcon_planner::domain::types::ComplexityLevel;
use modcon_planner::domain::{ModuleUpdate, PlanSnapshot};
use modcon_planner::engine::{
    refresh_reuse_counts, ComplexityScorer, ScopeAnalyzer, ScopeOrchestrator,
};
use test_helpers::*;

#[test]
fn test_three_matching_cells_give_two_reuse_opportunities() {
    let cells = vec![
        cell("c1", "Static Image", "Speed", 1),
        cell("c2", "Static Image", "Speed", 1),
        cell("c3", "Static Image", "Speed", 1),
        cell("c4", "Video", "Price", 1),
    ];
    let metrics = ScopeAnalyzer::default().analyze_cells(&cells);

    assert_eq!(metrics.reuse_opportunities, 2);
    assert_eq!(metrics.total_unique_modules, cells.len() - 2);
    assert_eq!(metrics.reuse_groups.len(), 1);
    assert_eq!(metrics.reuse_groups[0].cell_ids, vec!["c1", "c2", "c3"]);
    assert!(metrics.warnings.iter().any(|w| w.code == "low_reuse"));
}

#[test]
fn test_high_volume_warning_above_threshold() {
    let at_threshold = vec![cell("c1", "Video", "Speed", 24), cell("c2", "Video", "Price", 24)];
    let metrics = ScopeAnalyzer::default().analyze_cells(&at_threshold);
    assert_eq!(metrics.total_variants, 48);
    assert!(!metrics.warnings.iter().any(|w| w.code == "high_volume"));

    let above = vec![cell("c1", "Video", "Speed", 25), cell("c2", "Video", "Price", 24)];
    let metrics = ScopeAnalyzer::default().analyze_cells(&above);
    let warning = metrics
        .warnings
        .iter()
        .find(|w| w.code == "high_volume")
        .expect("high_volume warning");
    assert_eq!(warning.params.get("total").map(String::as_str), Some("49"));
}

#[test]
fn test_complexity_moderate_with_two_formats() {
    // 21 个变体，2 种格式
    let cells = vec![
        cell("c1", "Static Image", "Speed", 11),
        cell("c2", "Video", "Speed", 10),
    ];
    let reuse = ScopeAnalyzer::default().analyze_cells(&cells);
    let report = ComplexityScorer::default().score(&cells, &create_test_catalog(), &reuse);

    assert_eq!(report.total_assets, 21);
    assert_eq!(report.level, ComplexityLevel::Moderate);
}

#[test]
fn test_complexity_heavy_with_six_formats() {
    // 同样 21 个变体，6 种格式
    let formats = ["Static Image", "Video", "Carousel", "Story", "Banner", "Audio Spot"];
    let cells: Vec<_> = formats
        .iter()
        .enumerate()
        .map(|(i, f)| cell(&format!("c{}", i), f, "Speed", if i == 0 { 16 } else { 1 }))
        .collect();
    let reuse = ScopeAnalyzer::default().analyze_cells(&cells);
    let report = ComplexityScorer::default().score(&cells, &create_test_catalog(), &reuse);

    assert_eq!(report.total_assets, 21);
    assert_eq!(report.distinct_formats.len(), 6);
    assert_eq!(report.level, ComplexityLevel::Heavy);
    assert!(report.factors.iter().any(|f| f.code == "format_diversity"));
}

#[test]
fn test_complexity_simple_at_threshold() {
    let cells = vec![cell("c1", "Video", "Speed", 20)];
    let reuse = ScopeAnalyzer::default().analyze_cells(&cells);
    let report = ComplexityScorer::default().score(&cells, &create_test_catalog(), &reuse);
    assert_eq!(report.level, ComplexityLevel::Simple);
    assert!(report.factors.is_empty());
}

#[test]
fn test_configured_thresholds_change_outcome() {
    let thresholds = ScopeThresholds {
        moderate_asset_threshold: 5,
        ..ScopeThresholds::default()
    };
    let cells = vec![cell("c1", "Video", "Speed", 6)];
    let reuse = ScopeAnalyzer::new(thresholds).analyze_cells(&cells);
    let report = ComplexityScorer::new(thresholds).score(&cells, &create_test_catalog(), &reuse);
    assert_eq!(report.level, ComplexityLevel::Moderate);
}

#[test]
fn test_recompute_is_idempotent() {
    let snapshot = PlanSnapshot {
        matrix: matrix_of(vec![
            cell("c1", "Static Image", "Speed", 12),
            cell("c2", "Static Image", "Speed", 12),
            cell("c3", "Video", "Price", 30),
        ]),
        ..create_test_snapshot()
    };
    let orchestrator = ScopeOrchestrator::default();

    let first = orchestrator.analyze(&snapshot);
    let second = orchestrator.analyze(&snapshot);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_reuse_count_counts_only_existing_cells() {
    let mut catalog = create_test_catalog();
    catalog
        .update_module(
            "m_hook",
            ModuleUpdate {
                used_in_cells: Some(vec!["c1".into(), "c2".into(), "c_deleted".into()]),
                ..ModuleUpdate::default()
            },
        )
        .unwrap();
    let matrix = matrix_of(vec![
        cell("c1", "Video", "Speed", 1),
        cell("c2", "Video", "Price", 1),
    ]);

    let report = refresh_reuse_counts(&mut catalog, &matrix);

    assert_eq!(catalog.find_module("m_hook").unwrap().reuse_count, 2);
    assert_eq!(
        report.dangling_cells,
        vec![("m_hook".to_string(), "c_deleted".to_string())]
    );
    // 悬空 id 只报告，不删除
    assert_eq!(catalog.find_module("m_hook").unwrap().used_in_cells.len(), 3);
}
