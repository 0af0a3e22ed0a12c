// ==========================================
// ModCon 内容规划系统 - 内容范围矩阵
// ==========================================
// 职责: 计划内容单元格集合 (受众 × 漏斗阶段 × 主题 × 形式 × 投放位)
// 约束: planned_variant_count ≥ 1（构造、反序列化、更新均校验）
// 约束: 单元格不归属于任何模块，只通过 id 被弱引用
// ==========================================

use crate::domain::error::ModelError;
use crate::domain::types::FunnelStage;
use serde::{Deserialize, Serialize};

// ==========================================
// MatrixCell - 矩阵单元格
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub id: String,
    pub audience_id: String,
    pub funnel_stage: FunnelStage,
    pub message_theme: String,
    /// 制作形式（自由文本，如 "Static Image"、"Vertical Video"）
    pub format: String,
    pub placement: String,
    pub planned_variant_count: u32,
}

impl MatrixCell {
    pub fn new(
        id: impl Into<String>,
        audience_id: impl Into<String>,
        funnel_stage: FunnelStage,
        message_theme: impl Into<String>,
        format: impl Into<String>,
        placement: impl Into<String>,
        planned_variant_count: u32,
    ) -> Result<Self, ModelError> {
        let cell = Self {
            id: id.into(),
            audience_id: audience_id.into(),
            funnel_stage,
            message_theme: message_theme.into(),
            format: format.into(),
            placement: placement.into(),
            planned_variant_count,
        };
        cell.validate()?;
        Ok(cell)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.planned_variant_count < 1 {
            return Err(ModelError::InvalidVariantCount {
                cell_id: self.id.clone(),
                count: self.planned_variant_count,
            });
        }
        Ok(())
    }
}

// ==========================================
// ContentMatrix - 单元格集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MatrixCell>", into = "Vec<MatrixCell>")]
pub struct ContentMatrix {
    cells: Vec<MatrixCell>,
}

impl TryFrom<Vec<MatrixCell>> for ContentMatrix {
    type Error = ModelError;

    fn try_from(cells: Vec<MatrixCell>) -> Result<Self, Self::Error> {
        let mut matrix = Self::default();
        for cell in cells {
            matrix.add_cell(cell)?;
        }
        Ok(matrix)
    }
}

impl From<ContentMatrix> for Vec<MatrixCell> {
    fn from(matrix: ContentMatrix) -> Self {
        matrix.cells
    }
}

impl ContentMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[MatrixCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn find_cell(&self, cell_id: &str) -> Option<&MatrixCell> {
        self.cells.iter().find(|c| c.id == cell_id)
    }

    pub fn add_cell(&mut self, cell: MatrixCell) -> Result<(), ModelError> {
        cell.validate()?;
        if self.find_cell(&cell.id).is_some() {
            return Err(ModelError::DuplicateCell(cell.id));
        }
        self.cells.push(cell);
        Ok(())
    }

    /// 整体替换单元格内容（id 不变）
    pub fn update_cell(&mut self, cell: MatrixCell) -> Result<(), ModelError> {
        cell.validate()?;
        let slot = self
            .cells
            .iter_mut()
            .find(|c| c.id == cell.id)
            .ok_or_else(|| ModelError::CellNotFound(cell.id.clone()))?;
        *slot = cell;
        Ok(())
    }

    pub fn remove_cell(&mut self, cell_id: &str) -> Result<MatrixCell, ModelError> {
        let idx = self
            .cells
            .iter()
            .position(|c| c.id == cell_id)
            .ok_or_else(|| ModelError::CellNotFound(cell_id.to_string()))?;
        Ok(self.cells.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_variant_count_rejected_everywhere() {
        assert!(matches!(
            MatrixCell::new("c1", "a1", FunnelStage::Awareness, "Speed", "Static Image", "feed", 0),
            Err(ModelError::InvalidVariantCount { count: 0, .. })
        ));

        let mut matrix = ContentMatrix::new();
        let cell =
            MatrixCell::new("c1", "a1", FunnelStage::Awareness, "Speed", "Static Image", "feed", 2)
                .unwrap();
        matrix.add_cell(cell.clone()).unwrap();

        let mut zeroed = cell;
        zeroed.planned_variant_count = 0;
        assert!(matrix.update_cell(zeroed).is_err());

        let json = r#"[{"id":"c9","audience_id":"a","funnel_stage":"conversion",
            "message_theme":"Price","format":"Video","placement":"story",
            "planned_variant_count":0}]"#;
        assert!(serde_json::from_str::<ContentMatrix>(json).is_err());
    }

    #[test]
    fn test_duplicate_cell_rejected() {
        let mut matrix = ContentMatrix::new();
        let cell =
            MatrixCell::new("c1", "a1", FunnelStage::Awareness, "Speed", "Static Image", "feed", 1)
                .unwrap();
        matrix.add_cell(cell.clone()).unwrap();
        assert_eq!(
            matrix.add_cell(cell),
            Err(ModelError::DuplicateCell("c1".to_string()))
        );
        assert!(matrix.remove_cell("c1").is_ok());
        assert!(matrix.is_empty());
    }
}
