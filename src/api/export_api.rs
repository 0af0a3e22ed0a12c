// ==========================================
// ModCon 内容规划系统 - 数据源导出 API
// ==========================================
// 职责: 生成行 -> 平台校验 -> 序列化为 CSV / JSON -> 写文件
// 约束: 导出只读取传入的快照，不观察工作区后续变更
// 说明: 表格平台输出 CSV（表头为 display_name），其他平台输出扁平对象数组
// ==========================================

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::feed::{FeedRow, FeedStructure};
use crate::domain::platform::{find_platform, platform_catalog, FeedFormat, PlatformCapabilities, PlatformId};
use crate::domain::snapshot::PlanSnapshot;
use crate::engine::feed_generator::{validate_structure, FeedGenerator};
use crate::engine::feed_validator::{validate_feed, FeedValidationReport};
use crate::engine::notice::Notice;

/// 一次数据源导出的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedExport {
    pub export_id: String,
    pub platform: PlatformId,
    pub feed_format: FeedFormat,
    pub filename: String,
    pub content: String,
    pub row_count: usize,
    pub exported_at: DateTime<Utc>,
    pub validation: FeedValidationReport,
    /// 结构静态检查与生成阶段的提示
    pub generation_warnings: Vec<Notice>,
}

// ==========================================
// ExportApi
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ExportApi {
    generator: FeedGenerator,
}

impl ExportApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置生成行数上限（见 ScopeThresholds::max_feed_rows）
    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.generator = self.generator.with_max_rows(max_rows);
        self
    }

    pub fn list_platforms(&self) -> Vec<PlatformCapabilities> {
        platform_catalog()
    }

    /// 生成并序列化数据源（不写文件）
    ///
    /// # 返回
    /// - Err(ApiError::ConfigurationDefect): 结构无法生成（未知 row_per、超出行数上限）
    #[instrument(skip_all, fields(structure = %structure.id, platform = %structure.target_platform))]
    pub fn build_feed_export(
        &self,
        snapshot: &PlanSnapshot,
        structure: &FeedStructure,
        campaign_name: &str,
    ) -> ApiResult<FeedExport> {
        let platform = find_platform(structure.target_platform);

        let mut generation_warnings = validate_structure(structure, &snapshot.catalog);
        let generation = self.generator.generate_from_snapshot(structure, snapshot)?;
        generation_warnings.extend(generation.warnings);

        let validation = validate_feed(structure, &generation.rows, &platform);
        if !validation.is_valid {
            warn!(
                errors = validation.errors,
                warnings = validation.warnings,
                "数据源未通过平台校验，仍然导出"
            );
        }

        let content = if platform.feed_format.is_tabular() {
            render_csv(structure, &generation.rows)?
        } else {
            render_json(structure, &generation.rows)?
        };

        let filename = format!(
            "{}_{}_feed.{}",
            sanitize_filename(campaign_name),
            platform.id,
            platform.feed_format.extension()
        );

        info!(
            filename = %filename,
            rows = generation.rows.len(),
            valid = validation.is_valid,
            "数据源导出完成"
        );

        Ok(FeedExport {
            export_id: Uuid::new_v4().to_string(),
            platform: platform.id,
            feed_format: platform.feed_format,
            filename,
            content,
            row_count: generation.rows.len(),
            exported_at: Utc::now(),
            validation,
            generation_warnings,
        })
    }

    /// 生成并写入 `dir/<filename>`
    ///
    /// 快照按值传入，写文件期间不受工作区变更影响
    pub async fn write_feed_export(
        &self,
        snapshot: PlanSnapshot,
        structure: &FeedStructure,
        campaign_name: &str,
        dir: impl AsRef<Path>,
    ) -> ApiResult<(PathBuf, FeedExport)> {
        let export = self.build_feed_export(&snapshot, structure, campaign_name)?;

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&export.filename);
        tokio::fs::write(&path, export.content.as_bytes()).await?;

        info!(path = %path.display(), bytes = export.content.len(), "数据源文件已写入");
        Ok((path, export))
    }
}

fn render_csv(structure: &FeedStructure, rows: &[FeedRow]) -> ApiResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let header: Vec<&str> = structure
        .columns
        .iter()
        .map(|c| c.display_name.as_str())
        .collect();
    wtr.write_record(&header)?;

    for row in rows {
        let record: Vec<&str> = structure
            .columns
            .iter()
            .map(|c| row.get(&c.name).unwrap_or(""))
            .collect();
        wtr.write_record(&record)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ApiError::ExportError(format!("CSV 缓冲区刷新失败: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ApiError::ExportError(format!("CSV 不是合法 UTF-8: {}", e)))
}

/// 行对象的键按列声明顺序（serde_json preserve_order）
fn render_json(structure: &FeedStructure, rows: &[FeedRow]) -> ApiResult<String> {
    let objects: Vec<Value> = rows
        .iter()
        .map(|row| {
            let mut object = Map::new();
            for column in &structure.columns {
                let value = row.get(&column.name).unwrap_or("");
                object.insert(column.name.clone(), Value::String(value.to_string()));
            }
            Value::Object(object)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&objects)?)
}

/// 活动名称转为文件名片段: 非字母数字替换为 `_`，合并连续 `_`
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() || ch == '-' {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "campaign".to_string()
    } else {
        trimmed.to_string()
    }
}
