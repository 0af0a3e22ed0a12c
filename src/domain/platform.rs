// ==========================================
// ModCon 内容规划系统 - 第三方决策平台描述
// ==========================================
// 职责: 静态平台能力表（只用于导出格式选择与校验约束）
// 职责: 各平台原生表头映射（数据源结构模板）
// ==========================================

use crate::domain::types::ModuleType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformId {
    Flashtalking,
    Innovid,
    Clinch,
    Celtra,
    Storyteq,
    GoogleStudio,
    Sizmek,
    Jivox,
    Adform,
}

impl PlatformId {
    pub const ALL: [PlatformId; 9] = [
        PlatformId::Flashtalking,
        PlatformId::Innovid,
        PlatformId::Clinch,
        PlatformId::Celtra,
        PlatformId::Storyteq,
        PlatformId::GoogleStudio,
        PlatformId::Sizmek,
        PlatformId::Jivox,
        PlatformId::Adform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Flashtalking => "flashtalking",
            PlatformId::Innovid => "innovid",
            PlatformId::Clinch => "clinch",
            PlatformId::Celtra => "celtra",
            PlatformId::Storyteq => "storyteq",
            PlatformId::GoogleStudio => "google_studio",
            PlatformId::Sizmek => "sizmek",
            PlatformId::Jivox => "jivox",
            PlatformId::Adform => "adform",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformId::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| format!("未知平台: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFormat {
    Csv,
    Json,
    Xml,
    ApiOnly,
}

impl FeedFormat {
    /// 表格格式（CSV）; 其他格式导出为扁平对象数组
    pub fn is_tabular(&self) -> bool {
        matches!(self, FeedFormat::Csv)
    }

    pub fn extension(&self) -> &'static str {
        if self.is_tabular() {
            "csv"
        } else {
            "json"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformCategory {
    Dco,
    ProductionAutomation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Display,
    Video,
    Interactive,
    Ctv,
    Audio,
    Social,
}

/// 导出约束（文本长度、行数、图片扩展名）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConstraints {
    pub max_headline_length: usize,
    pub max_body_length: usize,
    pub max_cta_length: usize,
    pub max_feed_rows: Option<usize>,
    pub image_formats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    pub id: PlatformId,
    pub name: String,
    pub category: PlatformCategory,
    pub media_types: Vec<MediaType>,
    pub feed_format: FeedFormat,
    pub real_time_decisioning: bool,
    pub has_api: bool,
    pub constraints: PlatformConstraints,
}

fn constraints(
    headline: usize,
    body: usize,
    cta: usize,
    max_rows: Option<usize>,
    images: &[&str],
) -> PlatformConstraints {
    PlatformConstraints {
        max_headline_length: headline,
        max_body_length: body,
        max_cta_length: cta,
        max_feed_rows: max_rows,
        image_formats: images.iter().map(|s| s.to_string()).collect(),
    }
}

/// 平台能力表（PlatformId::ALL 顺序）
pub fn platform_catalog() -> Vec<PlatformCapabilities> {
    PlatformId::ALL.iter().map(|&id| find_platform(id)).collect()
}

pub fn find_platform(id: PlatformId) -> PlatformCapabilities {
    use MediaType::*;
    let (name, category, media, format, rtd, api, cons) = match id {
        PlatformId::Flashtalking => (
            "Flashtalking",
            PlatformCategory::Dco,
            vec![Display, Video, Interactive, Ctv],
            FeedFormat::Csv,
            true,
            true,
            constraints(40, 90, 25, Some(10_000), &["jpg", "jpeg", "png", "gif"]),
        ),
        PlatformId::Innovid => (
            "Innovid",
            PlatformCategory::Dco,
            vec![Video, Ctv, Interactive],
            FeedFormat::Json,
            true,
            true,
            constraints(50, 120, 30, Some(5_000), &["jpg", "jpeg", "png"]),
        ),
        PlatformId::Clinch => (
            "Clinch",
            PlatformCategory::Dco,
            vec![Display, Video, Social, Ctv],
            FeedFormat::Csv,
            true,
            true,
            constraints(40, 90, 25, None, &["jpg", "jpeg", "png", "gif"]),
        ),
        PlatformId::Celtra => (
            "Celtra",
            PlatformCategory::ProductionAutomation,
            vec![Display, Video, Social, Interactive],
            FeedFormat::Json,
            false,
            true,
            constraints(45, 100, 20, None, &["jpg", "jpeg", "png", "gif", "svg"]),
        ),
        PlatformId::Storyteq => (
            "Storyteq",
            PlatformCategory::ProductionAutomation,
            vec![Display, Video, Social],
            FeedFormat::Csv,
            false,
            true,
            constraints(60, 150, 30, None, &["jpg", "jpeg", "png"]),
        ),
        PlatformId::GoogleStudio => (
            "Google Creative Studio",
            PlatformCategory::Dco,
            vec![Display, Video],
            FeedFormat::Csv,
            true,
            false,
            constraints(30, 90, 15, Some(1_000), &["jpg", "jpeg", "png", "gif"]),
        ),
        PlatformId::Sizmek => (
            "Sizmek",
            PlatformCategory::Dco,
            vec![Display, Video],
            FeedFormat::Csv,
            true,
            false,
            constraints(40, 90, 25, None, &["jpg", "jpeg", "png", "gif"]),
        ),
        PlatformId::Jivox => (
            "Jivox",
            PlatformCategory::Dco,
            vec![Display, Video, Social, Audio],
            FeedFormat::Json,
            true,
            true,
            constraints(50, 120, 30, None, &["jpg", "jpeg", "png"]),
        ),
        PlatformId::Adform => (
            "Adform",
            PlatformCategory::Dco,
            vec![Display, Video],
            FeedFormat::Csv,
            true,
            true,
            constraints(40, 90, 25, None, &["jpg", "jpeg", "png", "gif"]),
        ),
    };
    PlatformCapabilities {
        id,
        name: name.to_string(),
        category,
        media_types: media,
        feed_format: format,
        real_time_decisioning: rtd,
        has_api: api,
        constraints: cons,
    }
}

// ==========================================
// 平台原生列映射
// ==========================================

/// 平台列的取值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnBinding {
    RowId,
    AudienceId,
    AudienceName,
    PlacementId,
    PlacementName,
    PlacementSize,
    /// 投放时按该模块类型决策
    Slot(ModuleType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformColumn {
    /// 行内列名（JSON 导出时即键名）
    pub name: &'static str,
    /// 平台要求的表头
    pub header: &'static str,
    pub binding: ColumnBinding,
}

const fn col(name: &'static str, header: &'static str, binding: ColumnBinding) -> PlatformColumn {
    PlatformColumn { name, header, binding }
}

use ColumnBinding::*;

const FLASHTALKING_COLUMNS: &[PlatformColumn] = &[
    col("creative_id", "Creative ID", RowId),
    col("audience", "Audience", AudienceName),
    col("placement", "Placement", PlacementName),
    col("headline", "Headline", Slot(ModuleType::Hook)),
    col("body_copy", "Body Copy", Slot(ModuleType::ValueProp)),
    col("cta", "CTA", Slot(ModuleType::Cta)),
    col("image_1", "Image 1 URL", Slot(ModuleType::Product)),
    col("image_2", "Image 2 URL", Slot(ModuleType::ProofPoint)),
    col("logo", "Logo URL", Slot(ModuleType::Logo)),
    col("background_color", "Background Color", Slot(ModuleType::Background)),
];

const INNOVID_COLUMNS: &[PlatformColumn] = &[
    col("version_id", "version_id", RowId),
    col("audience_segment", "audience_segment", AudienceName),
    col("placement_id", "placement_id", PlacementId),
    col("headline", "headline", Slot(ModuleType::Hook)),
    col("description", "description", Slot(ModuleType::ValueProp)),
    col("cta_text", "cta_text", Slot(ModuleType::Cta)),
    col("primary_asset_url", "primary_asset_url", Slot(ModuleType::Product)),
    col("logo_url", "logo_url", Slot(ModuleType::Logo)),
    col("background_color", "background_color", Slot(ModuleType::Background)),
];

const CELTRA_COLUMNS: &[PlatformColumn] = &[
    col("feedId", "feedId", RowId),
    col("audienceId", "audienceId", AudienceId),
    col("placementId", "placementId", PlacementId),
    col("headline", "headline", Slot(ModuleType::Hook)),
    col("subhead", "subhead", Slot(ModuleType::ValueProp)),
    col("ctaLabel", "ctaLabel", Slot(ModuleType::Cta)),
    col("heroImage", "heroImage", Slot(ModuleType::Product)),
    col("logoImage", "logoImage", Slot(ModuleType::Logo)),
    col("backgroundColor", "backgroundColor", Slot(ModuleType::Background)),
];

const STORYTEQ_COLUMNS: &[PlatformColumn] = &[
    col("variant", "variant", RowId),
    col("audience", "audience", AudienceName),
    col("size", "size", PlacementSize),
    col("headline", "headline", Slot(ModuleType::Hook)),
    col("body", "body", Slot(ModuleType::ValueProp)),
    col("cta", "cta", Slot(ModuleType::Cta)),
    col("image_1", "image_1", Slot(ModuleType::Product)),
    col("image_2", "image_2", Slot(ModuleType::ProofPoint)),
    col("logo", "logo", Slot(ModuleType::Logo)),
    col("background", "background", Slot(ModuleType::Background)),
];

const GOOGLE_STUDIO_COLUMNS: &[PlatformColumn] = &[
    col("reporting_label", "Reporting Label", RowId),
    col("audience_id", "Audience ID", AudienceId),
    col("headline", "Headline", Slot(ModuleType::Hook)),
    col("description_1", "Description Line 1", Slot(ModuleType::ValueProp)),
    col("description_2", "Description Line 2", Slot(ModuleType::ProofPoint)),
    col("cta_text", "CTA Text", Slot(ModuleType::Cta)),
    col("image_1", "Image Asset 1", Slot(ModuleType::Product)),
    col("logo", "Logo Asset", Slot(ModuleType::Logo)),
    col("primary_color", "Primary Color", Slot(ModuleType::Background)),
];

/// 平台原生列（声明顺序即导出顺序）
///
/// Clinch/Sizmek/Adform 沿用 Flashtalking 表头，Jivox 沿用 Innovid 键名
pub fn platform_columns(id: PlatformId) -> &'static [PlatformColumn] {
    match id {
        PlatformId::Flashtalking | PlatformId::Clinch | PlatformId::Sizmek | PlatformId::Adform => {
            FLASHTALKING_COLUMNS
        }
        PlatformId::Innovid | PlatformId::Jivox => INNOVID_COLUMNS,
        PlatformId::Celtra => CELTRA_COLUMNS,
        PlatformId::Storyteq => STORYTEQ_COLUMNS,
        PlatformId::GoogleStudio => GOOGLE_STUDIO_COLUMNS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_platform() {
        let catalog = platform_catalog();
        assert_eq!(catalog.len(), 9);
        for id in PlatformId::ALL {
            assert_eq!(find_platform(id).id, id);
        }
    }

    #[test]
    fn test_feed_format_selection() {
        assert_eq!(find_platform(PlatformId::Flashtalking).feed_format.extension(), "csv");
        assert_eq!(find_platform(PlatformId::Innovid).feed_format.extension(), "json");
        assert_eq!("google_studio".parse::<PlatformId>(), Ok(PlatformId::GoogleStudio));
    }

    #[test]
    fn test_platform_columns_are_unique_per_platform() {
        for id in PlatformId::ALL {
            let columns = platform_columns(id);
            assert!(columns.iter().any(|c| c.binding == ColumnBinding::RowId));
            for (idx, column) in columns.iter().enumerate() {
                assert!(
                    columns[..idx].iter().all(|c| c.name != column.name),
                    "{} 列名重复: {}",
                    id,
                    column.name
                );
            }
        }
        assert_eq!(platform_columns(PlatformId::Adform), platform_columns(PlatformId::Flashtalking));
        assert_eq!(platform_columns(PlatformId::Celtra)[0].header, "feedId");
    }
}
