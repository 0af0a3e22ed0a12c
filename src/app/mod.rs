// ==========================================
// ModCon 内容规划系统 - 应用层
// ==========================================
// 职责: 进程级状态装配与默认路径
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_config_db_path, AppState};
