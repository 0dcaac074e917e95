// ==========================================
// 服装生产排程系统 - 引擎层
// ==========================================
// 职责: 排程优化 + 瓶颈检测的纯计算规则
// 红线: Engine 不拼 SQL、不做 I/O、不读系统时钟
// 红线: 所有未排 / 跳过必须输出 reason
// ==========================================

pub mod bottleneck;
pub mod capacity_ledger;
pub mod eligibility;
pub mod events;
pub mod priority;
pub mod recommendation;
pub mod scenario;
pub mod schedule_metrics;
pub mod scheduler;

// 重导出核心引擎
pub use bottleneck::{BottleneckDetector, TrendAnalyzer};
pub use capacity_ledger::{CapacityLedger, Placement, ResourceLedger};
pub use eligibility::EligibilityEngine;
pub use events::{
    IntelligenceEvent, IntelligenceEventPublisher, IntelligenceEventType, NoOpEventPublisher,
    OptionalEventPublisher,
};
pub use priority::JobPrioritySorter;
pub use recommendation::ScheduleRecommender;
pub use scenario::{MetricComparison, Scenario, ScenarioAnalyzer, ScenarioResult};
pub use schedule_metrics::ScheduleMetricsCalculator;
pub use scheduler::SchedulingOptimizer;
