// ==========================================
// ModCon 内容规划系统 - 核心库
// ==========================================
// 职责: 模块化内容的决策规则求值、范围分析、覆盖率校验、平台数据源生成
// 技术栈: Rust + SQLite（阈值配置）
// 系统定位: 规划辅助（所有变更由用户显式触发，引擎只读快照）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体、封闭枚举、模型校验
pub mod domain;

// 引擎层 - 决策求值与分析
pub mod engine;

// 配置层 - 范围阈值
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/配置表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 工作区与导出
pub mod api;

// 应用层 - 进程级状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ComplexityLevel, ConditionLogic, ConditionType, FunnelStage, ModuleType, Operator, Severity,
    VariationStatus,
};

// 领域实体
pub use domain::{
    ContentMatrix, DecisionCondition, DecisionRule, DecisioningLogic, FeedStructure, MatrixCell,
    Module, ModuleCatalog, ModuleVariation, PlanSnapshot, TargetingContext, VariationRef,
};

// 引擎
pub use engine::{
    ComplexityScorer, CoverageValidator, DecisionRuleEngine, FeedGenerator, Resolution,
    ScopeAnalysis, ScopeAnalyzer, ScopeOrchestrator,
};

// API
pub use api::{ApiError, ApiResult, ExportApi, PlanWorkspace};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "ModCon 内容规划系统";
