// ==========================================
// ModCon 内容规划系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、封闭枚举、模型变更校验
// 红线: 不含引擎逻辑，不含存储与导出逻辑
// ==========================================

pub mod decision;
pub mod error;
pub mod feed;
pub mod matrix;
pub mod module;
pub mod platform;
pub mod snapshot;
pub mod types;

// 重导出核心类型
pub use decision::{
    ConditionValue, DecisionCondition, DecisionRule, DecisioningLogic, RawCondition, RawRule,
    RuleAction, TargetingContext, VariationRef, DEFAULT_RULE_PRIORITY,
};
pub use error::{ConditionError, ModelError};
pub use feed::{
    AudienceRef, FeedColumn, FeedColumnSource, FeedColumnType, FeedRow, FeedStructure, FeedValue,
    PlacementRef, RowPer,
};
pub use matrix::{ContentMatrix, MatrixCell};
pub use module::{Module, ModuleCatalog, ModuleSpecs, ModuleUpdate, ModuleVariation};
pub use platform::{
    find_platform, platform_catalog, platform_columns, ColumnBinding, FeedFormat, MediaType,
    PlatformCapabilities, PlatformCategory, PlatformColumn, PlatformConstraints, PlatformId,
};
pub use snapshot::PlanSnapshot;
pub use types::{
    ComplexityLevel, ConditionLogic, ConditionType, Daypart, FunnelStage, ModuleFormat,
    ModuleType, Operator, Severity, SourceType, VariationStatus,
};
