// ==========================================
// ModCon 内容规划系统 - 领域类型定义
// ==========================================
// 职责: 模块分类、条件类型、运算符、生命周期等封闭枚举
// 序列化格式: snake_case（与规则编辑器/导出文件一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 模块类型 (Module Type)
// ==========================================
// 封闭分类; 声明顺序即预览/导出时的槽位顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Hook,       // 开场钩子
    ValueProp,  // 价值主张
    ProofPoint, // 证明点
    Product,    // 产品
    Offer,      // 优惠
    Cta,        // 行动号召
    Background, // 背景
    Logo,       // 标志
    Legal,      // 法律声明
    Audio,      // 音频
    EndCard,    // 结束卡
    Transition, // 转场
}

impl ModuleType {
    /// 全部模块类型（分类顺序）
    pub const ALL: [ModuleType; 12] = [
        ModuleType::Hook,
        ModuleType::ValueProp,
        ModuleType::ProofPoint,
        ModuleType::Product,
        ModuleType::Offer,
        ModuleType::Cta,
        ModuleType::Background,
        ModuleType::Logo,
        ModuleType::Legal,
        ModuleType::Audio,
        ModuleType::EndCard,
        ModuleType::Transition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Hook => "hook",
            ModuleType::ValueProp => "value_prop",
            ModuleType::ProofPoint => "proof_point",
            ModuleType::Product => "product",
            ModuleType::Offer => "offer",
            ModuleType::Cta => "cta",
            ModuleType::Background => "background",
            ModuleType::Logo => "logo",
            ModuleType::Legal => "legal",
            ModuleType::Audio => "audio",
            ModuleType::EndCard => "end_card",
            ModuleType::Transition => "transition",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("未知模块类型: {}", s))
    }
}

// ==========================================
// 交付形式 (Module Format)
// ==========================================
// html5/lottie 统一归入 interactive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleFormat {
    Text,
    Image,
    Video,
    Audio,
    #[serde(alias = "html5", alias = "lottie")]
    Interactive,
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleFormat::Text => write!(f, "text"),
            ModuleFormat::Image => write!(f, "image"),
            ModuleFormat::Video => write!(f, "video"),
            ModuleFormat::Audio => write!(f, "audio"),
            ModuleFormat::Interactive => write!(f, "interactive"),
        }
    }
}

// ==========================================
// 素材来源 (Source Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    NewShoot, // 新拍摄
    ExistingAsset, // 既有素材
    Ugc,           // 用户生成内容
    Stock,         // 图库
    AiGenerated,   // AI 生成
    Template,      // 模板
}

// ==========================================
// 漏斗阶段 (Funnel Stage)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Awareness,     // 认知
    Consideration, // 考虑
    Conversion,    // 转化
    Retention,     // 留存
}

impl FunnelStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelStage::Awareness => "awareness",
            FunnelStage::Consideration => "consideration",
            FunnelStage::Conversion => "conversion",
            FunnelStage::Retention => "retention",
        }
    }
}

impl fmt::Display for FunnelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunnelStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "awareness" => Ok(FunnelStage::Awareness),
            "consideration" => Ok(FunnelStage::Consideration),
            "conversion" => Ok(FunnelStage::Conversion),
            "retention" => Ok(FunnelStage::Retention),
            other => Err(format!("未知漏斗阶段: {}", other)),
        }
    }
}

// ==========================================
// 变体生命周期 (Variation Status)
// ==========================================
// 顺序: planned < in_production < in_review < approved < live
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationStatus {
    #[default]
    Planned,
    InProduction,
    InReview,
    Approved,
    Live,
}

impl VariationStatus {
    /// 是否仍在制作流程中（尚未审批）
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            VariationStatus::Planned | VariationStatus::InProduction | VariationStatus::InReview
        )
    }
}

// ==========================================
// 条件类型 (Condition Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Audience,
    FunnelStage,
    Trigger,
    Platform,
    Placement,
    Daypart,
    Geo,
    Weather,
    Custom,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Audience => "audience",
            ConditionType::FunnelStage => "funnel_stage",
            ConditionType::Trigger => "trigger",
            ConditionType::Platform => "platform",
            ConditionType::Placement => "placement",
            ConditionType::Daypart => "daypart",
            ConditionType::Geo => "geo",
            ConditionType::Weather => "weather",
            ConditionType::Custom => "custom",
        }
    }

    /// 是否为可比较大小的字段（greater_than / less_than 有意义）
    pub fn is_ordinal(&self) -> bool {
        matches!(self, ConditionType::Weather | ConditionType::Custom)
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "audience" => Ok(ConditionType::Audience),
            "funnel_stage" => Ok(ConditionType::FunnelStage),
            "trigger" => Ok(ConditionType::Trigger),
            "platform" => Ok(ConditionType::Platform),
            "placement" => Ok(ConditionType::Placement),
            "daypart" => Ok(ConditionType::Daypart),
            "geo" => Ok(ConditionType::Geo),
            "weather" => Ok(ConditionType::Weather),
            "custom" => Ok(ConditionType::Custom),
            other => Err(format!("未知条件类型: {}", other)),
        }
    }
}

// ==========================================
// 运算符 (Operator)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    In,
    NotIn,
    GreaterThan,
    LessThan,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
        }
    }

    /// 只接受标量值的运算符
    pub fn is_scalar_only(&self) -> bool {
        matches!(self, Operator::Equals | Operator::NotEquals)
    }

    /// 只接受列表值的运算符
    pub fn requires_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// 数值比较运算符
    pub fn is_ordinal(&self) -> bool {
        matches!(self, Operator::GreaterThan | Operator::LessThan)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 条件组合逻辑 (Condition Logic)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionLogic {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl fmt::Display for ConditionLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionLogic::And => write!(f, "AND"),
            ConditionLogic::Or => write!(f, "OR"),
        }
    }
}

// ==========================================
// 时段 (Daypart)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Daypart {
    EarlyMorning, // 05-08
    Morning,      // 08-12
    Afternoon,    // 12-17
    Evening,      // 17-21
    LateNight,    // 21-05
}

impl Daypart {
    pub fn as_str(&self) -> &'static str {
        match self {
            Daypart::EarlyMorning => "early_morning",
            Daypart::Morning => "morning",
            Daypart::Afternoon => "afternoon",
            Daypart::Evening => "evening",
            Daypart::LateNight => "late_night",
        }
    }
}

impl fmt::Display for Daypart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Daypart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "early_morning" => Ok(Daypart::EarlyMorning),
            "morning" => Ok(Daypart::Morning),
            "afternoon" => Ok(Daypart::Afternoon),
            "evening" => Ok(Daypart::Evening),
            "late_night" => Ok(Daypart::LateNight),
            other => Err(format!("未知时段: {}", other)),
        }
    }
}

// ==========================================
// 提示级别 (Severity)
// ==========================================
// 顺序: Info < Warning < Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

// ==========================================
// 制作复杂度 (Complexity Level)
// ==========================================
// 顺序: Simple < Moderate < Heavy（只升不降）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    #[default]
    Simple,
    Moderate,
    Heavy,
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplexityLevel::Simple => write!(f, "simple"),
            ComplexityLevel::Moderate => write!(f, "moderate"),
            ComplexityLevel::Heavy => write!(f, "heavy"),
        }
    }
}
