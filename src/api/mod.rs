// ==========================================
// ModCon 内容规划系统 - API 层
// ==========================================
// 职责: 工作区变更入口与数据源导出，负责校验与错误映射
// ==========================================

pub mod error;
pub mod export_api;
pub mod workspace_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use export_api::{sanitize_filename, ExportApi, FeedExport};
pub use workspace_api::PlanWorkspace;
