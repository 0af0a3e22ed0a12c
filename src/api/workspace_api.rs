// ==========================================
// ModCon 内容规划系统 - 计划工作区 API
// ==========================================
// 职责: 持有单写者计划快照，统一处理变更、分析缓存与事件发布
// 流程: 校验 -> 应用 -> revision+1 -> 缓存失效 -> 发布事件
// 红线: 分析结果只在计算时的 revision 上有效，不假设缓存新鲜
// ==========================================

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ScopeConfigReader, ScopeThresholds};
use crate::domain::decision::{DecisionRule, TargetingContext, VariationRef};
use crate::domain::feed::{AudienceRef, FeedStructure, PlacementRef};
use crate::domain::matrix::MatrixCell;
use crate::domain::module::{Module, ModuleUpdate, ModuleVariation};
use crate::domain::error::ModelError;
use crate::domain::snapshot::PlanSnapshot;
use crate::domain::types::{ModuleType, VariationStatus};
use crate::engine::events::{
    NoOpEventPublisher, WorkspaceEvent, WorkspaceEventPublisher, WorkspaceEventType,
};
use crate::engine::feed_generator::{validate_structure, FeedGeneration, FeedGenerator};
use crate::engine::notice::Notice;
use crate::engine::orchestrator::{ScopeAnalysis, ScopeOrchestrator};
use crate::engine::rule_engine::{DecisionRuleEngine, Resolution, ResolutionTrace};
use crate::engine::scope_analyzer::refresh_reuse_counts;

// ==========================================
// PlanWorkspace - 计划工作区
// ==========================================

/// 计划工作区
///
/// 职责：
/// 1. 模块 / 变体 / 单元格 / 规则 / 默认值 / 受众 / 投放位的增删改
/// 2. 按 revision 缓存范围分析结果
/// 3. 决策预览与数据源行生成
pub struct PlanWorkspace {
    snapshot: PlanSnapshot,
    revision: u64,
    orchestrator: ScopeOrchestrator,
    rule_engine: DecisionRuleEngine,
    /// (计算时的 revision, 分析结果)
    cached_analysis: Option<(u64, ScopeAnalysis)>,
    event_publisher: Arc<dyn WorkspaceEventPublisher>,
}

impl Default for PlanWorkspace {
    fn default() -> Self {
        Self::new(ScopeThresholds::default())
    }
}

impl PlanWorkspace {
    pub fn new(thresholds: ScopeThresholds) -> Self {
        Self::with_snapshot(PlanSnapshot::default(), thresholds)
    }

    /// 以已有快照创建工作区（revision 从 0 开始）
    pub fn with_snapshot(snapshot: PlanSnapshot, thresholds: ScopeThresholds) -> Self {
        Self::with_orchestrator(snapshot, ScopeOrchestrator::new(thresholds))
    }

    fn with_orchestrator(snapshot: PlanSnapshot, orchestrator: ScopeOrchestrator) -> Self {
        Self {
            snapshot,
            revision: 0,
            orchestrator,
            rule_engine: DecisionRuleEngine::new(),
            cached_analysis: None,
            event_publisher: Arc::new(NoOpEventPublisher),
        }
    }

    /// 从配置读取器加载阈值后创建
    pub async fn from_config<C>(snapshot: PlanSnapshot, config: &C) -> ApiResult<Self>
    where
        C: ScopeConfigReader + ?Sized,
    {
        let orchestrator = ScopeOrchestrator::from_config(config).await?;
        Ok(Self::with_orchestrator(snapshot, orchestrator))
    }

    pub fn with_event_publisher(mut self, publisher: Arc<dyn WorkspaceEventPublisher>) -> Self {
        self.event_publisher = publisher;
        self
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn thresholds(&self) -> &ScopeThresholds {
        self.orchestrator.thresholds()
    }

    /// 当前状态的只读视图
    pub fn state(&self) -> &PlanSnapshot {
        &self.snapshot
    }

    /// 当前状态的独立副本（导出用，不观察后续变更）
    pub fn snapshot(&self) -> PlanSnapshot {
        self.snapshot.clone()
    }

    // ==========================================
    // 范围分析
    // ==========================================

    /// 返回当前 revision 的范围分析; 缓存失效时全量重算
    ///
    /// 重算时同时写回派生的 reuse_count（派生值，不算变更，不增加 revision）
    pub fn analysis(&mut self) -> &ScopeAnalysis {
        if !self.has_fresh_analysis() {
            refresh_reuse_counts(&mut self.snapshot.catalog, &self.snapshot.matrix);
            self.cached_analysis = None;
        }
        let revision = self.revision;
        let orchestrator = &self.orchestrator;
        let snapshot = &self.snapshot;
        let (_, analysis) = self
            .cached_analysis
            .get_or_insert_with(|| (revision, orchestrator.analyze(snapshot)));
        analysis
    }

    pub fn has_fresh_analysis(&self) -> bool {
        matches!(&self.cached_analysis, Some((rev, _)) if *rev == self.revision)
    }

    // ==========================================
    // 决策预览 / 数据源生成
    // ==========================================

    pub fn resolve(&self, context: &TargetingContext, module_type: ModuleType) -> Resolution {
        self.rule_engine
            .resolve(context, &self.snapshot.decisioning, module_type)
    }

    pub fn resolve_with_trace(
        &self,
        context: &TargetingContext,
        module_type: ModuleType,
    ) -> ResolutionTrace {
        self.rule_engine
            .resolve_with_trace(context, &self.snapshot.decisioning, module_type)
    }

    pub fn validate_feed_structure(&self, structure: &FeedStructure) -> Vec<Notice> {
        validate_structure(structure, &self.snapshot.catalog)
    }

    #[instrument(skip_all, fields(structure = %structure.id, revision = self.revision))]
    pub fn generate_feed(&self, structure: &FeedStructure) -> ApiResult<FeedGeneration> {
        let generator = FeedGenerator::new().with_max_rows(self.thresholds().max_feed_rows);
        Ok(generator.generate_from_snapshot(structure, &self.snapshot)?)
    }

    // ==========================================
    // 模块 / 变体
    // ==========================================

    pub fn add_module(&mut self, module: Module) -> ApiResult<()> {
        let module_id = module.id.clone();
        self.snapshot.catalog.add_module(module)?;
        self.commit(WorkspaceEventType::ModuleChanged, &module_id);
        Ok(())
    }

    pub fn update_module(&mut self, module_id: &str, update: ModuleUpdate) -> ApiResult<()> {
        self.snapshot.catalog.update_module(module_id, update)?;
        self.commit(WorkspaceEventType::ModuleChanged, module_id);
        Ok(())
    }

    /// 删除模块（不级联删除引用它的规则，由覆盖率校验报告孤儿）
    pub fn remove_module(&mut self, module_id: &str) -> ApiResult<Module> {
        let removed = self.snapshot.catalog.remove_module(module_id)?;
        self.commit(WorkspaceEventType::ModuleChanged, module_id);
        Ok(removed)
    }

    pub fn add_variation(&mut self, module_id: &str, variation: ModuleVariation) -> ApiResult<()> {
        let entity = format!("{}/{}", module_id, variation.id);
        self.snapshot.catalog.add_variation(module_id, variation)?;
        self.commit(WorkspaceEventType::VariationChanged, &entity);
        Ok(())
    }

    pub fn update_variation_status(
        &mut self,
        module_id: &str,
        variation_id: &str,
        status: VariationStatus,
    ) -> ApiResult<()> {
        self.snapshot
            .catalog
            .update_variation_status(module_id, variation_id, status)?;
        self.commit(
            WorkspaceEventType::VariationChanged,
            &format!("{}/{}", module_id, variation_id),
        );
        Ok(())
    }

    pub fn remove_variation(
        &mut self,
        module_id: &str,
        variation_id: &str,
    ) -> ApiResult<ModuleVariation> {
        let removed = self
            .snapshot
            .catalog
            .remove_variation(module_id, variation_id)?;
        self.commit(
            WorkspaceEventType::VariationChanged,
            &format!("{}/{}", module_id, variation_id),
        );
        Ok(removed)
    }

    // ==========================================
    // 矩阵单元格
    // ==========================================

    pub fn add_cell(&mut self, cell: MatrixCell) -> ApiResult<()> {
        let cell_id = cell.id.clone();
        self.snapshot.matrix.add_cell(cell)?;
        self.commit(WorkspaceEventType::CellChanged, &cell_id);
        Ok(())
    }

    pub fn update_cell(&mut self, cell: MatrixCell) -> ApiResult<()> {
        let cell_id = cell.id.clone();
        self.snapshot.matrix.update_cell(cell)?;
        self.commit(WorkspaceEventType::CellChanged, &cell_id);
        Ok(())
    }

    pub fn remove_cell(&mut self, cell_id: &str) -> ApiResult<MatrixCell> {
        let removed = self.snapshot.matrix.remove_cell(cell_id)?;
        self.commit(WorkspaceEventType::CellChanged, cell_id);
        Ok(removed)
    }

    // ==========================================
    // 决策规则 / 默认值
    // ==========================================

    pub fn add_rule(&mut self, rule: DecisionRule) -> ApiResult<()> {
        let rule_id = rule.id.clone();
        self.snapshot.decisioning.add_rule(rule)?;
        self.commit(WorkspaceEventType::RuleChanged, &rule_id);
        Ok(())
    }

    /// 添加规则编辑器提交的原始 JSON 规则
    ///
    /// # 返回
    /// - Err(ApiError::MalformedCondition): 条件不合法（消息含规则 id 与条件序号）
    /// - Err(ApiError::InvalidInput): JSON 结构无法解析
    pub fn add_rule_from_raw(&mut self, raw: Value) -> ApiResult<String> {
        let rule = DecisionRule::from_json(raw).map_err(|e| {
            warn!(error = %e, "规则解析失败");
            ApiError::from(e)
        })?;
        let rule_id = rule.id.clone();
        self.add_rule(rule)?;
        Ok(rule_id)
    }

    pub fn update_rule(&mut self, rule: DecisionRule) -> ApiResult<()> {
        let rule_id = rule.id.clone();
        self.snapshot.decisioning.update_rule(rule)?;
        self.commit(WorkspaceEventType::RuleChanged, &rule_id);
        Ok(())
    }

    pub fn set_rule_active(&mut self, rule_id: &str, is_active: bool) -> ApiResult<()> {
        self.snapshot.decisioning.set_rule_active(rule_id, is_active)?;
        self.commit(WorkspaceEventType::RuleChanged, rule_id);
        Ok(())
    }

    pub fn remove_rule(&mut self, rule_id: &str) -> ApiResult<DecisionRule> {
        let removed = self.snapshot.decisioning.remove_rule(rule_id)?;
        self.commit(WorkspaceEventType::RuleChanged, rule_id);
        Ok(removed)
    }

    /// 设置模块类型的默认变体; 目标必须存在于目录中
    pub fn set_default(&mut self, module_type: ModuleType, target: VariationRef) -> ApiResult<()> {
        if self.snapshot.catalog.find_module(&target.module_id).is_none() {
            return Err(ModelError::ModuleNotFound(target.module_id).into());
        }
        if self
            .snapshot
            .catalog
            .find_variation(&target.module_id, &target.variation_id)
            .is_none()
        {
            return Err(ModelError::VariationNotFound {
                module_id: target.module_id,
                variation_id: target.variation_id,
            }
            .into());
        }
        self.snapshot.decisioning.set_default(module_type, target);
        self.commit(WorkspaceEventType::DefaultChanged, module_type.as_str());
        Ok(())
    }

    pub fn clear_default(&mut self, module_type: ModuleType) -> ApiResult<VariationRef> {
        let removed = self
            .snapshot
            .decisioning
            .clear_default(module_type)
            .ok_or_else(|| ApiError::NotFound(format!("模块类型 {} 没有默认变体", module_type)))?;
        self.commit(WorkspaceEventType::DefaultChanged, module_type.as_str());
        Ok(removed)
    }

    // ==========================================
    // 受众 / 投放位
    // ==========================================

    pub fn add_audience(&mut self, audience: AudienceRef) -> ApiResult<()> {
        if self.snapshot.find_audience(&audience.id).is_some() {
            return Err(ModelError::DuplicateAudience(audience.id).into());
        }
        let audience_id = audience.id.clone();
        self.snapshot.audiences.push(audience);
        self.commit(WorkspaceEventType::AudienceChanged, &audience_id);
        Ok(())
    }

    pub fn update_audience(&mut self, audience: AudienceRef) -> ApiResult<()> {
        let audience_id = audience.id.clone();
        let slot = self
            .snapshot
            .audiences
            .iter_mut()
            .find(|a| a.id == audience.id)
            .ok_or_else(|| ModelError::AudienceNotFound(audience.id.clone()))?;
        *slot = audience;
        self.commit(WorkspaceEventType::AudienceChanged, &audience_id);
        Ok(())
    }

    pub fn remove_audience(&mut self, audience_id: &str) -> ApiResult<AudienceRef> {
        let idx = self
            .snapshot
            .audiences
            .iter()
            .position(|a| a.id == audience_id)
            .ok_or_else(|| ModelError::AudienceNotFound(audience_id.to_string()))?;
        let removed = self.snapshot.audiences.remove(idx);
        self.commit(WorkspaceEventType::AudienceChanged, audience_id);
        Ok(removed)
    }

    pub fn add_placement(&mut self, placement: PlacementRef) -> ApiResult<()> {
        if self.snapshot.find_placement(&placement.id).is_some() {
            return Err(ModelError::DuplicatePlacement(placement.id).into());
        }
        let placement_id = placement.id.clone();
        self.snapshot.placements.push(placement);
        self.commit(WorkspaceEventType::PlacementChanged, &placement_id);
        Ok(())
    }

    pub fn update_placement(&mut self, placement: PlacementRef) -> ApiResult<()> {
        let placement_id = placement.id.clone();
        let slot = self
            .snapshot
            .placements
            .iter_mut()
            .find(|p| p.id == placement.id)
            .ok_or_else(|| ModelError::PlacementNotFound(placement.id.clone()))?;
        *slot = placement;
        self.commit(WorkspaceEventType::PlacementChanged, &placement_id);
        Ok(())
    }

    pub fn remove_placement(&mut self, placement_id: &str) -> ApiResult<PlacementRef> {
        let idx = self
            .snapshot
            .placements
            .iter()
            .position(|p| p.id == placement_id)
            .ok_or_else(|| ModelError::PlacementNotFound(placement_id.to_string()))?;
        let removed = self.snapshot.placements.remove(idx);
        self.commit(WorkspaceEventType::PlacementChanged, placement_id);
        Ok(removed)
    }

    // ==========================================
    // 内部: 提交变更
    // ==========================================

    fn commit(&mut self, event_type: WorkspaceEventType, entity_id: &str) {
        self.revision += 1;
        self.cached_analysis = None;

        info!(
            revision = self.revision,
            event_type = event_type.as_str(),
            entity_id = %entity_id,
            "工作区已变更"
        );

        // 发布失败不回滚已完成的变更
        let event = WorkspaceEvent::new(self.revision, event_type, entity_id);
        if let Err(e) = self.event_publisher.publish(event) {
            warn!(
                revision = self.revision,
                event_type = event_type.as_str(),
                error = %e,
                "工作区事件发布失败"
            );
        }
    }
}
