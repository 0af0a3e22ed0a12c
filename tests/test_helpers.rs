// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的配置库、模块目录、矩阵、规则、受众/投放位夹具
// ==========================================

#![allow(dead_code)]

use modcon_planner::domain::{
    AudienceRef, ContentMatrix, DecisionCondition, DecisionRule, DecisioningLogic, MatrixCell,
    Module, ModuleCatalog, ModuleVariation, PlacementRef, PlanSnapshot, RuleAction,
};
use modcon_planner::domain::types::{
    ConditionLogic, ConditionType, FunnelStage, ModuleFormat, ModuleType, Operator,
};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时配置库文件
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时路径不是合法 UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

// ==========================================
// 模块目录
// ==========================================

pub fn variation(id: &str, text: &str) -> ModuleVariation {
    let mut v = ModuleVariation::new(id, format!("{} variation", id));
    v.text_content = Some(text.to_string());
    v
}

/// hook: m_hook(v_speed, v_price) / cta: m_cta(v_buy, v_learn) / offer: m_offer(v_10off)
pub fn create_test_catalog() -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new();
    catalog
        .add_module(
            Module::new("m_hook", ModuleType::Hook, "Opening hook", ModuleFormat::Video)
                .with_variation(variation("v_speed", "Faster than ever"))
                .with_variation(variation("v_price", "Half the price")),
        )
        .unwrap();
    catalog
        .add_module(
            Module::new("m_cta", ModuleType::Cta, "Call to action", ModuleFormat::Text)
                .with_variation(variation("v_buy", "Buy now"))
                .with_variation(variation("v_learn", "Learn more")),
        )
        .unwrap();
    catalog
        .add_module(
            Module::new("m_offer", ModuleType::Offer, "Offer", ModuleFormat::Image)
                .with_variation(variation("v_10off", "10% off")),
        )
        .unwrap();
    catalog
}

// ==========================================
// 矩阵
// ==========================================

pub fn cell(id: &str, format: &str, theme: &str, variants: u32) -> MatrixCell {
    MatrixCell::new(id, "aud_loyal", FunnelStage::Awareness, theme, format, "feed", variants).unwrap()
}

pub fn cell_for(id: &str, audience: &str, stage: FunnelStage, placement: &str) -> MatrixCell {
    MatrixCell::new(id, audience, stage, "Speed", "Static Image", placement, 1).unwrap()
}

pub fn matrix_of(cells: Vec<MatrixCell>) -> ContentMatrix {
    let mut matrix = ContentMatrix::new();
    for c in cells {
        matrix.add_cell(c).unwrap();
    }
    matrix
}

// ==========================================
// 规则
// ==========================================

pub fn action(module_type: ModuleType, module_id: &str, variation_id: &str) -> RuleAction {
    RuleAction {
        module_type,
        module_id: module_id.to_string(),
        variation_id: variation_id.to_string(),
    }
}

pub fn eq(condition_type: ConditionType, value: &str) -> DecisionCondition {
    DecisionCondition::text(condition_type, Operator::Equals, value).unwrap()
}

/// 单条件 hook 规则
pub fn hook_rule(id: &str, priority: i32, condition: DecisionCondition, variation_id: &str) -> DecisionRule {
    DecisionRule::new(
        id,
        format!("rule {}", id),
        priority,
        vec![condition],
        ConditionLogic::And,
        action(ModuleType::Hook, "m_hook", variation_id),
    )
    .unwrap()
}

pub fn logic_of(rules: Vec<DecisionRule>) -> DecisioningLogic {
    let mut logic = DecisioningLogic::new();
    for rule in rules {
        logic.add_rule(rule).unwrap();
    }
    logic
}

// ==========================================
// 受众 / 投放位
// ==========================================

pub fn create_test_audiences(count: usize) -> Vec<AudienceRef> {
    let stages = [
        FunnelStage::Awareness,
        FunnelStage::Consideration,
        FunnelStage::Conversion,
    ];
    (0..count)
        .map(|i| {
            AudienceRef::new(format!("aud_{}", i + 1), format!("Audience {}", i + 1))
                .with_stage(stages[i % stages.len()])
        })
        .collect()
}

pub fn create_test_placements(count: usize) -> Vec<PlacementRef> {
    let sizes = ["300x250", "728x90", "160x600", "320x50"];
    (0..count)
        .map(|i| {
            PlacementRef::new(format!("plc_{}", i + 1), format!("Placement {}", i + 1))
                .with_platform("display")
                .with_dimensions(sizes[i % sizes.len()])
        })
        .collect()
}

/// 完整快照: 目录 + 2 个单元格 + hook 规则 + cta 默认值 + 3 受众 × 4 投放位
pub fn create_test_snapshot() -> PlanSnapshot {
    let catalog = create_test_catalog();
    let matrix = matrix_of(vec![
        cell_for("c1", "aud_1", FunnelStage::Awareness, "plc_1"),
        cell_for("c2", "aud_2", FunnelStage::Consideration, "plc_2"),
    ]);
    let mut decisioning = logic_of(vec![hook_rule(
        "r_aware",
        1,
        eq(ConditionType::FunnelStage, "awareness"),
        "v_speed",
    )]);
    decisioning.set_default(
        ModuleType::Cta,
        modcon_planner::domain::VariationRef::new("m_cta", "v_learn"),
    );

    PlanSnapshot {
        catalog,
        matrix,
        decisioning,
        audiences: create_test_audiences(3),
        placements: create_test_placements(4),
    }
}
