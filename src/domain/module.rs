// ==========================================
// ModCon 内容规划系统 - 模块目录
// ==========================================
// 职责: 可复用内容模块及其变体（纯数据 + 按 id 查找）
// 约束: 变体 id 仅在所属模块内唯一，任何变体查找都必须带 module_id
// 约束: 模块与矩阵单元格之间只有弱引用（id），不持有对象
// ==========================================

use crate::domain::error::ModelError;
use crate::domain::types::{FunnelStage, ModuleFormat, ModuleType, SourceType, VariationStatus};
use serde::{Deserialize, Serialize};

// ==========================================
// ModuleVariation - 模块变体
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleVariation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,

    // ===== 定向提示 =====
    #[serde(default)]
    pub audience_ids: Vec<String>,
    #[serde(default)]
    pub funnel_stage: Option<FunnelStage>,
    #[serde(default)]
    pub trigger: Option<String>,

    // ===== 内容 =====
    #[serde(default)]
    pub content_preview: Option<String>,
    #[serde(default)]
    pub asset_url: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,

    #[serde(default)]
    pub status: VariationStatus,
}

impl ModuleVariation {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            audience_ids: Vec::new(),
            funnel_stage: None,
            trigger: None,
            content_preview: None,
            asset_url: None,
            text_content: None,
            status: VariationStatus::Planned,
        }
    }

    /// 预览值: 文案 > 素材地址 > 名称
    pub fn preview_value(&self) -> &str {
        self.text_content
            .as_deref()
            .or(self.asset_url.as_deref())
            .unwrap_or(&self.name)
    }
}

// ==========================================
// ModuleSpecs - 技术规格
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpecs {
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub character_limit: Option<u32>,
    #[serde(default)]
    pub file_size_limit: Option<String>,
    #[serde(default)]
    pub frame_rate: Option<u32>,
}

// ==========================================
// Module - 内容模块
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub name: String,
    #[serde(default)]
    pub description: String,

    /// 有序变体列表（第一个变体用于预览）
    #[serde(default)]
    pub variations: Vec<ModuleVariation>,

    pub format: ModuleFormat,
    #[serde(default)]
    pub specs: ModuleSpecs,

    #[serde(default)]
    pub source_type: SourceType,
    /// 引用该模块的矩阵单元格数（派生值，见 scope_analyzer::refresh_reuse_counts）
    #[serde(default)]
    pub reuse_count: u32,
    /// 引用该模块的单元格 id（弱引用）
    #[serde(default)]
    pub used_in_cells: Vec<String>,

    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Module {
    pub fn new(
        id: impl Into<String>,
        module_type: ModuleType,
        name: impl Into<String>,
        format: ModuleFormat,
    ) -> Self {
        Self {
            id: id.into(),
            module_type,
            name: name.into(),
            description: String::new(),
            variations: Vec::new(),
            format,
            specs: ModuleSpecs::default(),
            source_type: SourceType::default(),
            reuse_count: 0,
            used_in_cells: Vec::new(),
            owner: None,
            notes: None,
        }
    }

    pub fn with_variation(mut self, variation: ModuleVariation) -> Self {
        self.variations.push(variation);
        self
    }

    pub fn find_variation(&self, variation_id: &str) -> Option<&ModuleVariation> {
        self.variations.iter().find(|v| v.id == variation_id)
    }

    pub fn first_variation(&self) -> Option<&ModuleVariation> {
        self.variations.first()
    }
}

/// 模块可编辑字段（None 表示不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specs: Option<ModuleSpecs>,
    #[serde(default)]
    pub source_type: Option<SourceType>,
    #[serde(default)]
    pub used_in_cells: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ==========================================
// ModuleCatalog - 模块目录（模块的所有者集合）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Module>", into = "Vec<Module>")]
pub struct ModuleCatalog {
    modules: Vec<Module>,
}

impl TryFrom<Vec<Module>> for ModuleCatalog {
    type Error = ModelError;

    fn try_from(modules: Vec<Module>) -> Result<Self, Self::Error> {
        Self::from_modules(modules)
    }
}

impl From<ModuleCatalog> for Vec<Module> {
    fn from(catalog: ModuleCatalog) -> Self {
        catalog.modules
    }
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_modules(modules: Vec<Module>) -> Result<Self, ModelError> {
        let mut catalog = Self::new();
        for module in modules {
            catalog.add_module(module)?;
        }
        Ok(catalog)
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn find_module(&self, module_id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    fn find_module_mut(&mut self, module_id: &str) -> Result<&mut Module, ModelError> {
        self.modules
            .iter_mut()
            .find(|m| m.id == module_id)
            .ok_or_else(|| ModelError::ModuleNotFound(module_id.to_string()))
    }

    /// 按 (module_id, variation_id) 查找变体
    pub fn find_variation(&self, module_id: &str, variation_id: &str) -> Option<&ModuleVariation> {
        self.find_module(module_id)
            .and_then(|m| m.find_variation(variation_id))
    }

    pub fn modules_of_type(&self, module_type: ModuleType) -> impl Iterator<Item = &Module> {
        self.modules
            .iter()
            .filter(move |m| m.module_type == module_type)
    }

    pub fn variation_count(&self) -> usize {
        self.modules.iter().map(|m| m.variations.len()).sum()
    }

    // ==========================================
    // 变更操作（仅由用户显式操作触发）
    // ==========================================

    pub fn add_module(&mut self, module: Module) -> Result<(), ModelError> {
        if self.find_module(&module.id).is_some() {
            return Err(ModelError::DuplicateModule(module.id));
        }
        // 同一模块内变体 id 必须唯一
        for (idx, variation) in module.variations.iter().enumerate() {
            if module.variations[..idx].iter().any(|v| v.id == variation.id) {
                return Err(ModelError::DuplicateVariation {
                    module_id: module.id.clone(),
                    variation_id: variation.id.clone(),
                });
            }
        }
        self.modules.push(module);
        Ok(())
    }

    pub fn update_module(&mut self, module_id: &str, update: ModuleUpdate) -> Result<(), ModelError> {
        let module = self.find_module_mut(module_id)?;
        if let Some(name) = update.name {
            module.name = name;
        }
        if let Some(description) = update.description {
            module.description = description;
        }
        if let Some(specs) = update.specs {
            module.specs = specs;
        }
        if let Some(source_type) = update.source_type {
            module.source_type = source_type;
        }
        if let Some(cells) = update.used_in_cells {
            module.used_in_cells = cells;
        }
        if let Some(notes) = update.notes {
            module.notes = Some(notes);
        }
        Ok(())
    }

    /// 删除模块; 引用它的规则由覆盖率校验报告为孤儿规则，不做级联删除
    pub fn remove_module(&mut self, module_id: &str) -> Result<Module, ModelError> {
        let idx = self
            .modules
            .iter()
            .position(|m| m.id == module_id)
            .ok_or_else(|| ModelError::ModuleNotFound(module_id.to_string()))?;
        Ok(self.modules.remove(idx))
    }

    pub fn add_variation(
        &mut self,
        module_id: &str,
        variation: ModuleVariation,
    ) -> Result<(), ModelError> {
        let module = self.find_module_mut(module_id)?;
        if module.find_variation(&variation.id).is_some() {
            return Err(ModelError::DuplicateVariation {
                module_id: module_id.to_string(),
                variation_id: variation.id,
            });
        }
        module.variations.push(variation);
        Ok(())
    }

    pub fn update_variation_status(
        &mut self,
        module_id: &str,
        variation_id: &str,
        status: VariationStatus,
    ) -> Result<(), ModelError> {
        let module = self.find_module_mut(module_id)?;
        let variation = module
            .variations
            .iter_mut()
            .find(|v| v.id == variation_id)
            .ok_or_else(|| ModelError::VariationNotFound {
                module_id: module_id.to_string(),
                variation_id: variation_id.to_string(),
            })?;
        variation.status = status;
        Ok(())
    }

    pub fn remove_variation(
        &mut self,
        module_id: &str,
        variation_id: &str,
    ) -> Result<ModuleVariation, ModelError> {
        let module = self.find_module_mut(module_id)?;
        let idx = module
            .variations
            .iter()
            .position(|v| v.id == variation_id)
            .ok_or_else(|| ModelError::VariationNotFound {
                module_id: module_id.to_string(),
                variation_id: variation_id.to_string(),
            })?;
        Ok(module.variations.remove(idx))
    }

    /// 写回派生的 reuse_count
    pub(crate) fn set_reuse_count(&mut self, module_id: &str, count: u32) {
        if let Some(module) = self.modules.iter_mut().find(|m| m.id == module_id) {
            module.reuse_count = count;
        }
    }
}
