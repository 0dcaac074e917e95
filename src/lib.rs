// ==========================================
// 服装生产排程系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 生产智能层（排程优化 + 瓶颈检测）
// 红线: 引擎为纯函数式计算，输入每次重新构造
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 生产快照
pub mod repository;

// 引擎层 - 排程优化 / 瓶颈检测
pub mod engine;

// 导入层 - CSV / Excel
pub mod importer;

// 配置层 - 生产智能参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 生产智能门面
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{JobStage, JobStatus, PipelineStage, Priority, ResourceType, Severity};

// 领域实体
pub use domain::{
    BottleneckAnalysis, BottleneckTrendReport, Job, Resource, Schedule, StationMetric,
};

// 引擎
pub use engine::{
    BottleneckDetector, Scenario, ScenarioAnalyzer, SchedulingOptimizer, TrendAnalyzer,
};

// 配置
pub use config::IntelligenceConfig;

// API
pub use api::{ApiError, InMemoryDataSource, ProductionDataSource, ProductionIntelligenceApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "服装生产排程系统";
