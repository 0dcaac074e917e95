// ==========================================
// 服装生产排程系统 - API 层
// ==========================================
// 职责: 生产智能门面，供 HTTP 层 / CLI 调用
// ==========================================

pub mod data_source;
pub mod error;
pub mod production_intelligence_api;

// 重导出核心类型
pub use data_source::{InMemoryDataSource, ProductionDataSource, TimeWindow};
pub use error::{ApiError, ApiResult};
pub use production_intelligence_api::{
    DelayedAssignment, DetectRequest, OptimizeRequest, ProductionAnalysis,
    ProductionIntelligenceApi, DEFAULT_SNAPSHOT_WINDOW_HOURS,
};
