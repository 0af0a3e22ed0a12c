// ==========================================
// ModCon 内容规划系统 - 工作区事件发布
// ==========================================
// 职责: 定义计划变更事件与发布 trait
// 说明: 引擎层只定义 trait，由宿主（UI/同步服务）实现
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;

/// 变更的实体类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkspaceEventType {
    ModuleChanged,
    VariationChanged,
    CellChanged,
    RuleChanged,
    DefaultChanged,
    AudienceChanged,
    PlacementChanged,
}

impl WorkspaceEventType {
    pub fn as_str(&self) -> &str {
        match self {
            WorkspaceEventType::ModuleChanged => "ModuleChanged",
            WorkspaceEventType::VariationChanged => "VariationChanged",
            WorkspaceEventType::CellChanged => "CellChanged",
            WorkspaceEventType::RuleChanged => "RuleChanged",
            WorkspaceEventType::DefaultChanged => "DefaultChanged",
            WorkspaceEventType::AudienceChanged => "AudienceChanged",
            WorkspaceEventType::PlacementChanged => "PlacementChanged",
        }
    }
}

/// 工作区变更事件（每次变更一条，revision 单调递增）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceEvent {
    pub revision: u64,
    pub event_type: WorkspaceEventType,
    pub entity_id: String,
    pub occurred_at: DateTime<Utc>,
}

impl WorkspaceEvent {
    pub fn new(revision: u64, event_type: WorkspaceEventType, entity_id: impl Into<String>) -> Self {
        Self {
            revision,
            event_type,
            entity_id: entity_id.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// 工作区事件发布者 Trait
///
/// 发布失败只记录日志，不回滚已完成的变更
pub trait WorkspaceEventPublisher: Send + Sync {
    fn publish(&self, event: WorkspaceEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl WorkspaceEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: WorkspaceEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            revision = event.revision,
            event_type = event.event_type.as_str(),
            entity_id = %event.entity_id,
            "NoOpEventPublisher: 跳过事件发布"
        );
        Ok(())
    }
}
