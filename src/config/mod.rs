// ==========================================
// 服装生产排程系统 - 配置层
// ==========================================
// 职责: 生产智能层参数管理,支持多级覆写
// 存储: 默认值 / JSON 文件 / config_kv 表
// ==========================================

pub mod config_manager;
pub mod config_reader;
pub mod error;
pub mod intelligence_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use config_reader::{IntelligenceConfigReader, StaticConfigReader};
pub use error::{ConfigError, ConfigResult};
pub use intelligence_config::{
    BottleneckWeights, DetectorConfig, IntelligenceConfig, OptimizationWeights, OptimizerConfig,
    PipelineConfig, RootCauseThresholds, SkillMatchMode, StageResourceRule, MAX_HORIZON_DAYS,
};
