// ==========================================
// ModCon 内容规划系统 - 数据源平台校验
// ==========================================
// 职责: 按目标平台约束校验已生成的行
// 检查: 必填 / 校验正则 / 文案长度 / URL / 颜色 / 图片扩展名 / 行数上限
// 说明: 动态占位符只在投放时取值，不参与值校验
// ==========================================

use crate::domain::feed::{FeedColumn, FeedColumnType, FeedRow, FeedStructure};
use crate::domain::platform::{PlatformCapabilities, PlatformId};
use crate::domain::types::Severity;
use crate::engine::feed_generator::DYNAMIC_PLACEHOLDER;
use crate::engine::notice::{count_severity, Notice};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

static COLOR_HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid color regex"));

/// 超过上限该比例时给出接近上限的警告
const NEAR_LIMIT_RATIO: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedValidationReport {
    pub platform: PlatformId,
    pub is_valid: bool,
    pub total_rows: usize,
    pub errors: usize,
    pub warnings: usize,
    pub issues: Vec<Notice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextSlot {
    Headline,
    Body,
    Cta,
}

fn text_slot(column: &FeedColumn) -> Option<TextSlot> {
    let name = column.name.to_lowercase();
    if name.contains("headline") {
        Some(TextSlot::Headline)
    } else if name.contains("body") || name.contains("description") {
        Some(TextSlot::Body)
    } else if name.contains("cta") {
        Some(TextSlot::Cta)
    } else {
        None
    }
}

fn image_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

pub fn validate_feed(
    structure: &FeedStructure,
    rows: &[FeedRow],
    platform: &PlatformCapabilities,
) -> FeedValidationReport {
    let constraints = &platform.constraints;
    let mut issues = Vec::new();

    if let Some(max_rows) = constraints.max_feed_rows {
        if rows.len() > max_rows {
            issues.push(
                Notice::error("feed_too_many_rows")
                    .param("rows", rows.len())
                    .param("limit", max_rows)
                    .param("platform", platform.id),
            );
        }
    }

    // 每列只编译一次校验正则; 非法正则由结构校验报告
    let patterns: Vec<Option<Regex>> = structure
        .columns
        .iter()
        .map(|c| c.validation_pattern.as_deref().and_then(|p| Regex::new(p).ok()))
        .collect();

    for row in rows {
        for (column, pattern) in structure.columns.iter().zip(&patterns) {
            let value = row.get(&column.name).unwrap_or("");
            let at = |code: &str, severity: Severity| {
                Notice::new(code, severity)
                    .subject(&row.row_id)
                    .param("column", &column.name)
            };

            if value.trim().is_empty() {
                if column.is_required {
                    issues.push(at("feed_required_empty", Severity::Error));
                }
                continue;
            }
            if value == DYNAMIC_PLACEHOLDER {
                continue;
            }

            if let Some(re) = pattern {
                if !re.is_match(value) {
                    issues.push(at("feed_pattern_mismatch", Severity::Error).param("value", value));
                }
            }

            if let Some(slot) = text_slot(column) {
                let limit = match slot {
                    TextSlot::Headline => constraints.max_headline_length,
                    TextSlot::Body => constraints.max_body_length,
                    TextSlot::Cta => constraints.max_cta_length,
                };
                let len = value.chars().count();
                if len > limit {
                    issues.push(
                        at("feed_text_too_long", Severity::Error)
                            .param("length", len)
                            .param("limit", limit),
                    );
                } else if len as f64 > limit as f64 * NEAR_LIMIT_RATIO {
                    issues.push(
                        at("feed_text_near_limit", Severity::Warning)
                            .param("length", len)
                            .param("limit", limit),
                    );
                }
            }

            match column.column_type {
                FeedColumnType::Url => {
                    if !(value.starts_with("http://") || value.starts_with("https://")) {
                        issues.push(at("feed_invalid_url", Severity::Error).param("value", value));
                    }
                }
                FeedColumnType::Color => {
                    if !COLOR_HEX_RE.is_match(value) {
                        issues.push(at("feed_invalid_color", Severity::Error).param("value", value));
                    }
                }
                FeedColumnType::Image => {
                    let ext = image_extension(value);
                    if !constraints.image_formats.iter().any(|f| *f == ext) {
                        issues.push(
                            at("feed_image_format", Severity::Warning)
                                .param("extension", ext)
                                .param("allowed", constraints.image_formats.join(", ")),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    let errors = count_severity(&issues, Severity::Error);
    let warnings = count_severity(&issues, Severity::Warning);
    if errors > 0 {
        warn!(platform = %platform.id, errors = errors, warnings = warnings, "数据源校验未通过");
    } else {
        debug!(platform = %platform.id, rows = rows.len(), warnings = warnings, "数据源校验通过");
    }

    FeedValidationReport {
        platform: platform.id,
        is_valid: errors == 0,
        total_rows: rows.len(),
        errors,
        warnings,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension_ignores_query() {
        assert_eq!(image_extension("https://cdn.example.com/a/hero.PNG?v=2"), "png");
        assert_eq!(image_extension("https://cdn.example.com/a/hero"), "");
    }

    #[test]
    fn test_color_pattern() {
        assert!(COLOR_HEX_RE.is_match("#FFF"));
        assert!(COLOR_HEX_RE.is_match("#00aa11"));
        assert!(!COLOR_HEX_RE.is_match("#12345"));
        assert!(!COLOR_HEX_RE.is_match("red"));
    }
}
