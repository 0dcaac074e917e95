// ==========================================
// 服装生产排程系统 - 命令行入口
// ==========================================
// 数据来源: SQLite 快照库（默认）或 CSV / Excel 文件
// 输出: stdout 打印 JSON 结果，日志写 stderr
// ==========================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use garment_aps::api::{
    InMemoryDataSource, ProductionDataSource, ProductionIntelligenceApi, TimeWindow,
};
use garment_aps::config::{
    ConfigManager, ConfigResult, IntelligenceConfig, IntelligenceConfigReader, StaticConfigReader,
};
use garment_aps::importer::ProductionImporter;
use garment_aps::logging::LogFormat;
use garment_aps::repository::SqliteSnapshotRepository;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "garment-aps")]
#[command(author, version, about = "服装生产排程系统 - 排程优化与瓶颈检测", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite 快照库路径
    #[arg(long, env = "GARMENT_APS_DB_PATH")]
    db: Option<PathBuf>,

    /// JSON 配置文件（不指定时读取快照库 config_kv）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 建议文案语言（en / zh-CN）
    #[arg(long, default_value = "en")]
    locale: String,

    /// JSON 格式日志
    #[arg(long)]
    log_json: bool,

    /// 美化输出 JSON
    #[arg(long)]
    pretty: bool,
}

/// 从文件直接读取输入（跳过快照库）
#[derive(clap::Args, Default)]
struct FileInputs {
    /// 作业表（.csv / .xlsx / .xls）
    #[arg(long)]
    jobs: Option<PathBuf>,

    /// 资源表
    #[arg(long)]
    resources: Option<PathBuf>,

    /// 工位快照表
    #[arg(long)]
    metrics: Option<PathBuf>,
}

impl FileInputs {
    fn is_empty(&self) -> bool {
        self.jobs.is_none() && self.resources.is_none() && self.metrics.is_none()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// 生成排程
    Optimize {
        /// 排程起点（RFC3339，默认当前时刻）
        #[arg(long)]
        horizon_start: Option<DateTime<Utc>>,

        #[command(flatten)]
        inputs: FileInputs,
    },

    /// 检测瓶颈
    Bottlenecks {
        /// 快照截止时刻（RFC3339，默认当前时刻）
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,

        /// 快照回溯窗口（小时）
        #[arg(long, default_value = "24")]
        window_hours: i64,

        #[command(flatten)]
        inputs: FileInputs,
    },

    /// 排程 + 瓶颈综合分析
    Analyze {
        #[arg(long)]
        horizon_start: Option<DateTime<Utc>>,

        #[arg(long, default_value = "24")]
        window_hours: i64,

        #[command(flatten)]
        inputs: FileInputs,
    },

    /// 瓶颈趋势分析（仅快照库）
    Trends {
        /// 回溯小时数
        #[arg(long, default_value = "168")]
        hours: i64,

        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },

    /// 导入文件到快照库
    Import {
        #[command(flatten)]
        inputs: FileInputs,
    },
}

impl Commands {
    fn file_inputs(&self) -> Option<&FileInputs> {
        match self {
            Commands::Optimize { inputs, .. }
            | Commands::Bottlenecks { inputs, .. }
            | Commands::Analyze { inputs, .. }
            | Commands::Import { inputs } => Some(inputs),
            Commands::Trends { .. } => None,
        }
    }
}

// ==========================================
// 配置来源
// ==========================================
enum CliConfigReader {
    Static(StaticConfigReader),
    Database(ConfigManager),
}

#[async_trait]
impl IntelligenceConfigReader for CliConfigReader {
    async fn load_intelligence_config(&self) -> ConfigResult<IntelligenceConfig> {
        match self {
            CliConfigReader::Static(reader) => reader.load_intelligence_config().await,
            CliConfigReader::Database(manager) => manager.load_intelligence_config().await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    garment_aps::logging::init(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });
    garment_aps::i18n::set_locale(&cli.locale);

    tracing::info!("{} v{}", garment_aps::APP_NAME, garment_aps::VERSION);

    let db_path = cli.db.clone().unwrap_or_else(default_db_path);
    let db_path = db_path.to_string_lossy().to_string();

    let reader = Arc::new(match &cli.config {
        Some(path) => CliConfigReader::Static(StaticConfigReader::new(
            IntelligenceConfig::load_from_file(path)
                .with_context(|| format!("读取配置文件失败: {}", path.display()))?,
        )),
        None => CliConfigReader::Database(
            ConfigManager::new(&db_path).with_context(|| format!("打开配置库失败: {}", db_path))?,
        ),
    });

    match cli.command {
        Commands::Import { inputs } => {
            let repo = SqliteSnapshotRepository::new(&db_path)
                .with_context(|| format!("打开快照库失败: {}", db_path))?;
            let summary = import_into(&repo, &inputs)?;
            print_json(&summary, cli.pretty)
        }
        Commands::Trends { hours, until } => {
            let repo = Arc::new(
                SqliteSnapshotRepository::new(&db_path)
                    .with_context(|| format!("打开快照库失败: {}", db_path))?,
            );
            let api = ProductionIntelligenceApi::new(repo, reader);
            let window =
                TimeWindow::trailing(until.unwrap_or_else(Utc::now), window_length(hours)?);
            let report = api.analyze_bottleneck_trends(window).await?;
            print_json(&report, cli.pretty)
        }
        command => {
            let source = match command.file_inputs() {
                Some(inputs) if !inputs.is_empty() => Some(Arc::new(load_files(inputs)?)),
                _ => None,
            };

            match source {
                Some(source) => {
                    let api = ProductionIntelligenceApi::new(source, reader);
                    run_analysis(api, command, cli.pretty).await
                }
                None => {
                    let repo = Arc::new(
                        SqliteSnapshotRepository::new(&db_path)
                            .with_context(|| format!("打开快照库失败: {}", db_path))?,
                    );
                    let api = ProductionIntelligenceApi::new(repo, reader);
                    run_analysis(api, command, cli.pretty).await
                }
            }
        }
    }
}

async fn run_analysis<S>(
    api: ProductionIntelligenceApi<S, CliConfigReader>,
    command: Commands,
    pretty: bool,
) -> Result<()>
where
    S: ProductionDataSource + 'static,
{
    match command {
        Commands::Optimize { horizon_start, .. } => {
            let schedule = api.optimize_schedule(horizon_start.unwrap_or_else(Utc::now)).await?;
            print_json(&schedule, pretty)
        }
        Commands::Bottlenecks {
            as_of, window_hours, ..
        } => {
            let analysis = api
                .with_snapshot_window(window_length(window_hours)?)
                .detect_bottlenecks_at(as_of.unwrap_or_else(Utc::now))
                .await?;
            print_json(&analysis, pretty)
        }
        Commands::Analyze {
            horizon_start,
            window_hours,
            ..
        } => {
            let analysis = api
                .with_snapshot_window(window_length(window_hours)?)
                .analyze_production(horizon_start.unwrap_or_else(Utc::now))
                .await?;
            print_json(&analysis, pretty)
        }
        Commands::Trends { .. } | Commands::Import { .. } => {
            anyhow::bail!("该命令不走分析流程")
        }
    }
}

/// 文件导入 → 内存数据源
fn load_files(inputs: &FileInputs) -> Result<InMemoryDataSource> {
    let importer = ProductionImporter;
    let mut source = InMemoryDataSource::new();
    if let Some(path) = &inputs.jobs {
        source = source.with_jobs(importer.import_jobs(path)?);
    }
    if let Some(path) = &inputs.resources {
        source = source.with_resources(importer.import_resources(path)?);
    }
    if let Some(path) = &inputs.metrics {
        source = source.with_station_metrics(importer.import_station_metrics(path)?);
    }
    Ok(source)
}

#[derive(Serialize)]
struct ImportSummary {
    jobs: Option<usize>,
    resources: Option<usize>,
    station_metrics: Option<usize>,
}

/// 文件导入 → 快照库（作业 / 资源全量替换，工位快照追加）
fn import_into(repo: &SqliteSnapshotRepository, inputs: &FileInputs) -> Result<ImportSummary> {
    if inputs.is_empty() {
        anyhow::bail!("至少指定 --jobs / --resources / --metrics 之一");
    }

    let importer = ProductionImporter;
    let jobs = match &inputs.jobs {
        Some(path) => Some(repo.replace_jobs(&importer.import_jobs(path)?)?),
        None => None,
    };
    let resources = match &inputs.resources {
        Some(path) => Some(repo.replace_resources(&importer.import_resources(path)?)?),
        None => None,
    };
    let station_metrics = match &inputs.metrics {
        Some(path) => Some(repo.insert_station_metrics(&importer.import_station_metrics(path)?)?),
        None => None,
    };

    Ok(ImportSummary {
        jobs,
        resources,
        station_metrics,
    })
}

/// 回溯窗口小时数 → 时长（负数或越界直接报错）
fn window_length(hours: i64) -> Result<Duration> {
    if hours < 0 {
        anyhow::bail!("回溯小时数不能为负: {}", hours);
    }
    Duration::try_hours(hours).with_context(|| format!("回溯小时数超出范围: {}", hours))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

/// 默认快照库路径（用户数据目录）
fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("garment-aps");
            // 目录创建失败时回退到当前目录
            if std::fs::create_dir_all(&dir).is_ok() {
                dir.join("garment_aps.db")
            } else {
                PathBuf::from("./garment_aps.db")
            }
        }
        None => PathBuf::from("./garment_aps.db"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_length_bounds() {
        assert_eq!(window_length(24).unwrap(), Duration::hours(24));
        assert!(window_length(-1).is_err());
        assert!(window_length(i64::MAX).is_err());
    }
}
