// ==========================================
// ModCon 内容规划系统 - 范围分析编排器
// ==========================================
// 用途: 对一份计划快照依次执行复用分析、复杂度评分、覆盖率校验、规则集检查
// 红线: 每次全量重算，不做增量修补; 不修改快照
// ==========================================

use crate::config::{ConfigError, ScopeConfigReader, ScopeThresholds};
use crate::domain::snapshot::PlanSnapshot;
use crate::engine::complexity::{ComplexityReport, ComplexityScorer};
use crate::engine::coverage::{CoverageReport, CoverageValidator};
use crate::engine::rule_validation::{validate_rule_set, RuleSetReport};
use crate::engine::scope_analyzer::{derive_reuse_counts, ReuseCountReport, ReuseMetrics, ScopeAnalyzer};
use serde::{Deserialize, Serialize};
use tracing::info;

// ==========================================
// ScopeAnalysis - 范围分析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAnalysis {
    pub reuse: ReuseMetrics,
    pub complexity: ComplexityReport,
    pub coverage: CoverageReport,
    pub rule_set: RuleSetReport,
    pub reuse_counts: ReuseCountReport,
}

// ==========================================
// ScopeOrchestrator
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ScopeOrchestrator {
    analyzer: ScopeAnalyzer,
    scorer: ComplexityScorer,
    coverage: CoverageValidator,
}

impl ScopeOrchestrator {
    pub fn new(thresholds: ScopeThresholds) -> Self {
        Self {
            analyzer: ScopeAnalyzer::new(thresholds),
            scorer: ComplexityScorer::new(thresholds),
            coverage: CoverageValidator::new(),
        }
    }

    /// 从配置读取器加载阈值后创建
    pub async fn from_config<C>(config: &C) -> Result<Self, ConfigError>
    where
        C: ScopeConfigReader + ?Sized,
    {
        let thresholds = config.get_scope_thresholds().await?;
        Ok(Self::new(thresholds))
    }

    pub fn thresholds(&self) -> &ScopeThresholds {
        self.analyzer.thresholds()
    }

    pub fn analyze(&self, snapshot: &PlanSnapshot) -> ScopeAnalysis {
        let reuse = self.analyzer.analyze(&snapshot.matrix);
        let complexity = self
            .scorer
            .score(snapshot.matrix.cells(), &snapshot.catalog, &reuse);
        let coverage = self
            .coverage
            .validate(&snapshot.decisioning, &snapshot.catalog, &snapshot.matrix);
        let rule_set = validate_rule_set(&snapshot.decisioning, &snapshot.catalog);
        let reuse_counts = derive_reuse_counts(&snapshot.catalog, &snapshot.matrix);

        info!(
            cells = snapshot.matrix.len(),
            rules = snapshot.decisioning.rules().len(),
            complexity = %complexity.level,
            coverage_percentage = coverage.coverage_percentage,
            rule_errors = rule_set.error_count,
            "范围分析完成"
        );

        ScopeAnalysis {
            reuse,
            complexity,
            coverage,
            rule_set,
            reuse_counts,
        }
    }
}
