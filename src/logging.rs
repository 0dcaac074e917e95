// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 日志一律写 stderr，stdout 只输出分析结果 JSON
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// RUST_LOG 未设置时的过滤规则
pub const DEFAULT_FILTER: &str = "info";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 终端可读文本
    #[default]
    Text,
    /// 每行一条 JSON（带当前 span 字段，供日志采集）
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=garment_aps::engine=debug 查看逐作业排程决策
///
/// # 示例
/// ```no_run
/// use garment_aps::logging::{self, LogFormat};
/// logging::init(LogFormat::Json);
/// ```
pub fn init(format: LogFormat) {
    match format {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .init(),
    }
}

/// 初始化测试环境的日志系统（可重复调用）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
