// ==========================================
// ModCon 内容规划系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将模型/引擎/存储错误转换为面向用户的错误
// 约束: 错误信息必须指明出错的实体（规则 id、条件序号、列名等）
// ==========================================

use crate::config::ConfigError;
use crate::domain::error::{ConditionError, ModelError};
use crate::engine::feed_generator::FeedError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 规则编写时的条件错误（不做静默修正）
    #[error("条件无效: {0}")]
    MalformedCondition(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 配置缺陷（可通过编辑规则/结构修复）
    // ==========================================
    #[error("配置缺陷: {0}")]
    ConfigurationDefect(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 导出错误
    // ==========================================
    #[error("导出失败: {0}")]
    ExportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ModelError 转换
// ==========================================
impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ModuleNotFound(_)
            | ModelError::VariationNotFound { .. }
            | ModelError::CellNotFound(_)
            | ModelError::RuleNotFound(_)
            | ModelError::AudienceNotFound(_)
            | ModelError::PlacementNotFound(_) => ApiError::NotFound(err.to_string()),

            ModelError::DuplicateModule(_)
            | ModelError::DuplicateVariation { .. }
            | ModelError::DuplicateCell(_)
            | ModelError::DuplicateRule(_)
            | ModelError::DuplicateAudience(_)
            | ModelError::DuplicatePlacement(_) => ApiError::BusinessRuleViolation(err.to_string()),

            ModelError::MalformedCondition { .. } | ModelError::EmptyConditions { .. } => {
                ApiError::MalformedCondition(err.to_string())
            }

            ModelError::InvalidVariantCount { .. } | ModelError::InvalidRuleJson { .. } => {
                ApiError::InvalidInput(err.to_string())
            }
        }
    }
}

impl From<ConditionError> for ApiError {
    fn from(err: ConditionError) -> Self {
        ApiError::MalformedCondition(err.to_string())
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        ApiError::ConfigurationDefect(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::ConfigError(format!("数据库错误: {}", err))
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::ExportError(format!("CSV 写入失败: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ExportError(format!("JSON 序列化失败: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::ExportError(format!("文件写入失败: {}", err))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ConditionType, Operator};

    #[test]
    fn test_model_error_conversion() {
        let api_err: ApiError = ModelError::ModuleNotFound("m_404".to_string()).into();
        match api_err {
            ApiError::NotFound(msg) => assert!(msg.contains("m_404")),
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let api_err: ApiError = ModelError::DuplicateRule("rule_1".to_string()).into();
        assert!(matches!(api_err, ApiError::BusinessRuleViolation(_)));
    }

    #[test]
    fn test_malformed_condition_names_rule_and_index() {
        let err = ModelError::MalformedCondition {
            rule_id: "rule_geo".to_string(),
            index: 1,
            source: ConditionError::ListForScalarOperator {
                condition_type: ConditionType::Geo,
                operator: Operator::Equals,
            },
        };
        let api_err: ApiError = err.into();
        match api_err {
            ApiError::MalformedCondition(msg) => {
                assert!(msg.contains("rule_geo"));
                assert!(msg.contains('1'));
            }
            other => panic!("Expected MalformedCondition, got {:?}", other),
        }
    }

    #[test]
    fn test_feed_error_is_configuration_defect() {
        let api_err: ApiError = FeedError::UnknownRowPolicy("cell".to_string()).into();
        match api_err {
            ApiError::ConfigurationDefect(msg) => assert!(msg.contains("cell")),
            other => panic!("Expected ConfigurationDefect, got {:?}", other),
        }
    }
}
