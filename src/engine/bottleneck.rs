// ==========================================
// 服装生产排程系统 - 瓶颈检测引擎
// ==========================================
// 红线: 单个工位数据非法只跳过该工位，不中断批次
// 红线: 纯计算，不读系统时钟，不做 I/O
// ==========================================
// 职责: 工位评分 + 瓶颈排序 + 根因 + 关键路径 + 延误预测 + 趋势
// 输入: 工位快照 (StationMetric) [+ 作业列表]
// 输出: BottleneckAnalysis / BottleneckTrendReport
// ==========================================

mod advice;
mod core;
mod root_cause;
mod scoring;
mod trend;

#[cfg(test)]
mod tests;

pub use advice::{station_actions, BottleneckAdvisor};
pub use core::BottleneckDetector;
pub use root_cause::RootCauseAnalyzer;
pub use scoring::StationScorer;
pub use trend::TrendAnalyzer;
