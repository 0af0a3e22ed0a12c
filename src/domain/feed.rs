// ==========================================
// ModCon 内容规划系统 - 数据源(Feed)结构
// ==========================================
// 职责: 列定义 / 行生成策略 / 受众与投放位引用 / 生成的行
// 约束: 行是纯函数产物，不作为独立实体持久化
// ==========================================

use crate::domain::platform::{platform_columns, ColumnBinding, PlatformColumn, PlatformId};
use crate::domain::types::{FunnelStage, ModuleType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ==========================================
// 列类型 / 列来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedColumnType {
    #[default]
    Text,
    Number,
    Url,
    Image,
    Video,
    Color,
    Date,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedColumnSource {
    /// 固定字面值（default_value）
    Static,
    /// 受众字段; source_reference = id/name/funnel_stage/属性名
    Audience,
    /// 投放位字段; source_reference = id/name/platform/dimensions/format/属性名
    Placement,
    /// 模块首个变体; source_reference = module_id
    Module,
    /// 投放时动态决策; source_reference = module_type
    Rule,
    /// 字符串模板; source_reference = "{column_name}_{row_id}"
    Formula,
}

impl fmt::Display for FeedColumnSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedColumnSource::Static => "static",
            FeedColumnSource::Audience => "audience",
            FeedColumnSource::Placement => "placement",
            FeedColumnSource::Module => "module",
            FeedColumnSource::Rule => "rule",
            FeedColumnSource::Formula => "formula",
        };
        f.write_str(s)
    }
}

// ==========================================
// FeedColumn - 列定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedColumn {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub column_type: FeedColumnType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_dynamic: bool,
    pub source: FeedColumnSource,
    #[serde(default)]
    pub source_reference: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub validation_pattern: Option<String>,
}

impl FeedColumn {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, source: FeedColumnSource) -> Self {
        let name = name.into();
        Self {
            id: format!("col_{}", name),
            name,
            display_name: display_name.into(),
            column_type: FeedColumnType::Text,
            is_required: false,
            is_dynamic: source == FeedColumnSource::Rule,
            source,
            source_reference: None,
            default_value: None,
            validation_pattern: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.source_reference = Some(reference.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_type(mut self, column_type: FeedColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.validation_pattern = Some(pattern.into());
        self
    }

    /// 平台原生列 -> 数据源列
    pub fn from_platform(column: &PlatformColumn) -> Self {
        let base = |source| FeedColumn::new(column.name, column.header, source);
        match column.binding {
            ColumnBinding::RowId => base(FeedColumnSource::Formula).with_reference("{row_id}"),
            ColumnBinding::AudienceId => base(FeedColumnSource::Audience).with_reference("id"),
            ColumnBinding::AudienceName => base(FeedColumnSource::Audience).with_reference("name"),
            ColumnBinding::PlacementId => base(FeedColumnSource::Placement).with_reference("id"),
            ColumnBinding::PlacementName => base(FeedColumnSource::Placement).with_reference("name"),
            ColumnBinding::PlacementSize => {
                base(FeedColumnSource::Placement).with_reference("dimensions")
            }
            ColumnBinding::Slot(module_type) => {
                base(FeedColumnSource::Rule).with_reference(module_type.as_str())
            }
        }
    }

    /// rule 列引用的模块类型
    pub fn rule_module_type(&self) -> Option<ModuleType> {
        self.source_reference
            .as_deref()
            .and_then(|r| r.parse::<ModuleType>().ok())
    }
}

// ==========================================
// RowPer - 行生成策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPer {
    Audience,
    Placement,
    AudienceXPlacement,
}

impl RowPer {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowPer::Audience => "audience",
            RowPer::Placement => "placement",
            RowPer::AudienceXPlacement => "audience_x_placement",
        }
    }

    pub fn binds_audience(&self) -> bool {
        matches!(self, RowPer::Audience | RowPer::AudienceXPlacement)
    }

    pub fn binds_placement(&self) -> bool {
        matches!(self, RowPer::Placement | RowPer::AudienceXPlacement)
    }
}

impl fmt::Display for RowPer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowPer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "audience" => Ok(RowPer::Audience),
            "placement" => Ok(RowPer::Placement),
            "audience_x_placement" => Ok(RowPer::AudienceXPlacement),
            other => Err(other.to_string()),
        }
    }
}

// ==========================================
// FeedStructure - 列结构 + 行策略
// ==========================================
// row_per 保留原始字符串: 非法策略是可编辑的配置缺陷，在校验/生成时报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedStructure {
    pub id: String,
    pub name: String,
    pub target_platform: PlatformId,
    pub columns: Vec<FeedColumn>,
    pub row_per: String,
    #[serde(default = "default_include_defaults")]
    pub include_defaults: bool,
}

fn default_include_defaults() -> bool {
    true
}

impl FeedStructure {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        target_platform: PlatformId,
        row_per: RowPer,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_platform,
            columns: Vec::new(),
            row_per: row_per.as_str().to_string(),
            include_defaults: true,
        }
    }

    pub fn with_column(mut self, column: FeedColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// 按平台原生表头生成结构，列顺序与平台一致
    pub fn from_platform_template(
        id: impl Into<String>,
        name: impl Into<String>,
        target_platform: PlatformId,
        row_per: RowPer,
    ) -> Self {
        platform_columns(target_platform)
            .iter()
            .fold(Self::new(id, name, target_platform, row_per), |structure, column| {
                structure.with_column(FeedColumn::from_platform(column))
            })
    }

    pub fn find_column(&self, name: &str) -> Option<&FeedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

// ==========================================
// 受众 / 投放位引用
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub funnel_stage: Option<FunnelStage>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl AudienceRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            funnel_stage: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_stage(mut self, stage: FunnelStage) -> Self {
        self.funnel_stage = Some(stage);
        self
    }

    pub fn field(&self, key: &str) -> Option<String> {
        match key {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "funnel_stage" => self.funnel_stage.map(|s| s.as_str().to_string()),
            other => self.attributes.get(other).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl PlacementRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            platform: None,
            dimensions: None,
            format: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_dimensions(mut self, dimensions: impl Into<String>) -> Self {
        self.dimensions = Some(dimensions.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<String> {
        match key {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "platform" => self.platform.clone(),
            "dimensions" => self.dimensions.clone(),
            "format" => self.format.clone(),
            other => self.attributes.get(other).cloned(),
        }
    }
}

// ==========================================
// FeedRow - 生成的行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedValue {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRow {
    pub row_id: String,
    pub audience_id: Option<String>,
    pub placement_id: Option<String>,
    /// 按列声明顺序
    pub values: Vec<FeedValue>,
    /// 预览决策: 命中的规则 id
    pub rules_applied: Vec<String>,
    /// 预览决策: 任一槽位回退到默认值
    pub is_default: bool,
    /// 预览决策: 无规则也无默认值的槽位
    pub unresolved_slots: Vec<ModuleType>,
}

impl FeedRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.column == column)
            .map(|v| v.value.as_str())
    }
}
