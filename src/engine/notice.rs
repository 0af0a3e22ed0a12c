// ==========================================
// ModCon 内容规划系统 - 提示/问题条目
// ==========================================
// 职责: 各引擎输出的警告、复杂度因素、校验问题的统一载体
// 约束: 只保存 code + 参数，文本在展示时经 i18n 渲染（结果与语言无关）
// ==========================================

use crate::domain::types::Severity;
use crate::i18n;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// 机器可读代码，如 "high_volume"、"orphan_rule"
    pub code: String,
    pub severity: Severity,
    /// 指向的实体（规则 id、列名、行 id 等）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl Notice {
    pub fn new(code: &str, severity: Severity) -> Self {
        Self {
            code: code.to_string(),
            severity,
            subject: None,
            params: BTreeMap::new(),
        }
    }

    pub fn info(code: &str) -> Self {
        Self::new(code, Severity::Info)
    }

    pub fn warning(code: &str) -> Self {
        Self::new(code, Severity::Warning)
    }

    pub fn error(code: &str) -> Self {
        Self::new(code, Severity::Error)
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// 按当前语言渲染文本（key: notice.<code>，subject 以 %{subject} 引用）
    pub fn message(&self) -> String {
        let mut args: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if let Some(subject) = &self.subject {
            args.push(("subject", subject.as_str()));
        }
        i18n::notice_text(&self.code, &args)
    }
}

/// 按严重程度计数
pub fn count_severity(notices: &[Notice], severity: Severity) -> usize {
    notices.iter().filter(|n| n.severity == severity).count()
}
