// ==========================================
// ModCon 内容规划系统 - 计划快照
// ==========================================
// 职责: 引擎输入的显式快照 (目录 + 矩阵 + 规则 + 受众/投放位列表)
// 约束: 引擎只读快照; 导出前先取快照，不观察后续变更
// 约束: 反序列化时受众/投放位 id 必须唯一
// ==========================================

use crate::domain::decision::DecisioningLogic;
use crate::domain::error::ModelError;
use crate::domain::feed::{AudienceRef, PlacementRef};
use crate::domain::matrix::ContentMatrix;
use crate::domain::module::ModuleCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlanSnapshot")]
pub struct PlanSnapshot {
    #[serde(default)]
    pub catalog: ModuleCatalog,
    #[serde(default)]
    pub matrix: ContentMatrix,
    #[serde(default)]
    pub decisioning: DecisioningLogic,
    #[serde(default)]
    pub audiences: Vec<AudienceRef>,
    #[serde(default)]
    pub placements: Vec<PlacementRef>,
}

impl PlanSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_audience(&self, audience_id: &str) -> Option<&AudienceRef> {
        self.audiences.iter().find(|a| a.id == audience_id)
    }

    pub fn find_placement(&self, placement_id: &str) -> Option<&PlacementRef> {
        self.placements.iter().find(|p| p.id == placement_id)
    }
}

#[derive(Deserialize)]
struct RawPlanSnapshot {
    #[serde(default)]
    catalog: ModuleCatalog,
    #[serde(default)]
    matrix: ContentMatrix,
    #[serde(default)]
    decisioning: DecisioningLogic,
    #[serde(default)]
    audiences: Vec<AudienceRef>,
    #[serde(default)]
    placements: Vec<PlacementRef>,
}

impl TryFrom<RawPlanSnapshot> for PlanSnapshot {
    type Error = ModelError;

    fn try_from(raw: RawPlanSnapshot) -> Result<Self, Self::Error> {
        if let Some(id) = first_duplicate(raw.audiences.iter().map(|a| a.id.as_str())) {
            return Err(ModelError::DuplicateAudience(id));
        }
        if let Some(id) = first_duplicate(raw.placements.iter().map(|p| p.id.as_str())) {
            return Err(ModelError::DuplicatePlacement(id));
        }

        Ok(Self {
            catalog: raw.catalog,
            matrix: raw.matrix,
            decisioning: raw.decisioning,
            audiences: raw.audiences,
            placements: raw.placements,
        })
    }
}

fn first_duplicate<'a>(ids: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Some(id.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_keeps_unique_references() {
        let snapshot: PlanSnapshot = serde_json::from_value(json!({
            "audiences": [{"id": "a1", "name": "A"}, {"id": "a2", "name": "B"}],
            "placements": [{"id": "p1", "name": "Banner"}]
        }))
        .unwrap();
        assert_eq!(snapshot.find_audience("a2").unwrap().name, "B");
        assert!(snapshot.find_placement("p1").is_some());
        assert!(snapshot.matrix.is_empty());
    }
}
