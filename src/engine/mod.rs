// ==========================================
// ModCon 内容规划系统 - 引擎层
// ==========================================
// 职责: 决策求值、范围分析、覆盖率校验、数据源生成与平台校验
// 红线: 引擎无状态、不做 I/O; 所有诊断以 Notice 输出（code + 参数）
// ==========================================

pub mod complexity;
pub mod condition;
pub mod coverage;
pub mod events;
pub mod feed_generator;
pub mod feed_validator;
pub mod notice;
pub mod orchestrator;
pub mod rule_engine;
pub mod rule_validation;
pub mod scope_analyzer;

// 重导出核心引擎
pub use complexity::{CatalogStats, ComplexityReport, ComplexityScorer};
pub use coverage::{CoverageReport, CoverageValidator, OrphanDefault, OrphanReason, OrphanRule};
pub use events::{NoOpEventPublisher, WorkspaceEvent, WorkspaceEventPublisher, WorkspaceEventType};
pub use feed_generator::{
    validate_structure, FeedError, FeedGeneration, FeedGenerator, FeedInputs, DYNAMIC_PLACEHOLDER,
};
pub use feed_validator::{validate_feed, FeedValidationReport};
pub use notice::Notice;
pub use orchestrator::{ScopeAnalysis, ScopeOrchestrator};
pub use rule_engine::{DecisionRuleEngine, Resolution, ResolutionTrace};
pub use rule_validation::{validate_rule_set, RuleSetReport};
pub use scope_analyzer::{
    derive_reuse_counts, refresh_reuse_counts, ReuseCountReport, ReuseGroup, ReuseMetrics,
    ScopeAnalyzer,
};
