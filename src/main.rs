// ==========================================
// ModCon 内容规划系统 - 命令行入口
// ==========================================
// 用途: 读取计划快照 -> 输出范围分析 JSON -> （可选）导出平台数据源
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;
use modcon_planner::app::{get_default_config_db_path, AppState};
use modcon_planner::domain::{FeedStructure, PlanSnapshot};
use modcon_planner::{i18n, logging};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "ModCon 决策与范围分析", long_about = None)]
struct Cli {
    /// 计划快照 JSON 文件（catalog / matrix / decisioning / audiences / placements）
    snapshot: PathBuf,

    /// 数据源结构 JSON 文件; 给出时导出数据源
    #[arg(long)]
    feed_structure: Option<PathBuf>,

    /// 导出目录
    #[arg(long, default_value = "./exports")]
    out_dir: PathBuf,

    /// 活动名称（用于导出文件名）
    #[arg(long, default_value = "campaign")]
    campaign: String,

    /// 配置数据库路径
    #[arg(long, env = "MODCON_CONFIG_DB_PATH")]
    config_db: Option<String>,

    /// 提示信息语言（zh-CN / en）
    #[arg(long, env = "MODCON_LOCALE", default_value = "zh-CN")]
    locale: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    info!("ModCon 内容规划系统 v{}", modcon_planner::VERSION);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "运行失败");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let locale = i18n::set_locale(&cli.locale);
    if locale != cli.locale {
        warn!(requested = %cli.locale, applied = locale, "提示语言不受支持，已回退");
    }

    let raw = tokio::fs::read_to_string(&cli.snapshot)
        .await
        .with_context(|| format!("无法读取快照文件 {}", cli.snapshot.display()))?;
    let snapshot: PlanSnapshot = serde_json::from_str(&raw).context("快照 JSON 无效")?;

    let db_path = cli.config_db.unwrap_or_else(get_default_config_db_path);
    let state = AppState::new(db_path, snapshot, None).map_err(anyhow::Error::msg)?;

    // 分析完成后释放工作区锁，导出只使用快照副本
    let export_snapshot = {
        let mut workspace = state
            .workspace
            .lock()
            .map_err(|e| anyhow!("工作区锁获取失败: {}", e))?;
        let analysis = workspace.analysis();

        for notice in analysis
            .reuse
            .warnings
            .iter()
            .chain(&analysis.complexity.factors)
            .chain(&analysis.rule_set.issues)
        {
            warn!(code = %notice.code, "{}", notice.message());
        }
        println!("{}", serde_json::to_string_pretty(analysis)?);
        workspace.snapshot()
    };

    let Some(structure_path) = cli.feed_structure else {
        return Ok(());
    };
    let raw = tokio::fs::read_to_string(&structure_path)
        .await
        .with_context(|| format!("无法读取数据源结构文件 {}", structure_path.display()))?;
    let structure: FeedStructure = serde_json::from_str(&raw).context("数据源结构 JSON 无效")?;

    let (path, export) = state
        .export_api
        .write_feed_export(export_snapshot, &structure, &cli.campaign, &cli.out_dir)
        .await?;

    for notice in export.generation_warnings.iter().chain(&export.validation.issues) {
        warn!(code = %notice.code, "{}", notice.message());
    }
    info!(
        path = %path.display(),
        rows = export.row_count,
        valid = export.validation.is_valid,
        "数据源已导出"
    );

    Ok(())
}
