// ==========================================
// 服装生产排程系统 - 领域层
// ==========================================
// 职责: 定义作业、资源、工位快照与分析结果
// 红线: 领域对象每次调用重新构造，核心内不持久化
// ==========================================

pub mod bottleneck;
pub mod job;
pub mod resource;
pub mod schedule;
pub mod station;
pub mod types;

// 重导出核心类型
pub use bottleneck::{
    BottleneckAnalysis, BottleneckTrendReport, CriticalPathEntry, DetectedBottleneck,
    EfficiencyTrend, ImplementationCost, OptimalThroughputMode, PredictedDelay, RootCause,
    RootCauseKind, ScoreBreakdown, SkippedStation, StationAction, StationImpact, StationScore,
    TrendPoint,
};
pub use job::Job;
pub use resource::Resource;
pub use schedule::{
    ConflictReason, ResourceLoad, Schedule, ScheduleAssignment, ScheduleConflict,
    ScheduleMetrics, UnscheduledJob, UnscheduledReason,
};
pub use station::{StationMetric, StationMetricBuilder};
pub use types::{JobStage, JobStatus, PipelineStage, Priority, ResourceType, Severity};
