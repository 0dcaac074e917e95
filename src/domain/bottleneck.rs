// ==========================================
// 服装生产排程系统 - 瓶颈分析对象
// ==========================================
// 职责: 瓶颈检测器的输出（工位评分、关键路径、延误预测、趋势）
// ==========================================

use crate::domain::station::StationMetric;
use crate::domain::types::{PipelineStage, Priority, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 工位评分分解
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub gap_score: f64,
    pub queue_score: f64,
    pub utilization_score: f64,
    pub defect_score: f64,
    /// 加权总分 (0-100)
    pub score: f64,
}

/// 根因类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RootCauseKind {
    LowThroughput,
    QueueBuildup,
    ExcessiveWaitTime,
    UnderUtilization,
    OverUtilization,
    OperatorShortage,
    HighDefectRate,
}

impl fmt::Display for RootCauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RootCauseKind::LowThroughput => "LOW_THROUGHPUT",
            RootCauseKind::QueueBuildup => "QUEUE_BUILDUP",
            RootCauseKind::ExcessiveWaitTime => "EXCESSIVE_WAIT_TIME",
            RootCauseKind::UnderUtilization => "UNDER_UTILIZATION",
            RootCauseKind::OverUtilization => "OVER_UTILIZATION",
            RootCauseKind::OperatorShortage => "OPERATOR_SHORTAGE",
            RootCauseKind::HighDefectRate => "HIGH_DEFECT_RATE",
        };
        write!(f, "{}", s)
    }
}

/// 根因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    pub cause: RootCauseKind,
    /// 置信度 (0-100)
    pub confidence: f64,
    pub description: String,
}

/// 措施实施成本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImplementationCost {
    Low,
    Medium,
    High,
}

/// 工位级改善措施（按根因生成）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationAction {
    pub action: String,
    pub priority: Priority,
    pub estimated_impact: String,
    pub implementation_cost: ImplementationCost,
}

/// 工位影响评估
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationImpact {
    pub throughput_loss_percent: f64,
    pub estimated_delay_hours: f64,
    pub affected_orders: u32,
    /// 延误成本 = estimated_delay_hours * cost_per_delay_hour * score / 100
    pub cost_impact: f64,
}

/// 工位评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationScore {
    pub station: StationMetric,
    pub breakdown: ScoreBreakdown,
    pub severity: Severity,
}

impl StationScore {
    pub fn score(&self) -> f64 {
        self.breakdown.score
    }
}

/// 已识别的瓶颈工位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedBottleneck {
    pub station: StationMetric,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub severity: Severity,
    pub root_causes: Vec<RootCause>,
    pub impact: StationImpact,
    /// 工位级措施，无根因时为一条持续监控
    pub recommendations: Vec<StationAction>,
}

impl DetectedBottleneck {
    pub fn has_cause(&self, kind: RootCauseKind) -> bool {
        self.root_causes.iter().any(|c| c.cause == kind)
    }
}

/// 关键路径节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPathEntry {
    pub stage: PipelineStage,
    /// 该工序下的工位
    pub station_ids: Vec<String>,
    /// 工序最高分（无工位数据为 None）
    pub score: Option<f64>,
    /// 是否受约束（分数超阈值）
    pub constrained: bool,
    /// 是否为主瓶颈所在工序
    pub primary: bool,
}

/// 作业延误预测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedDelay {
    pub job_id: String,
    pub order_id: String,
    pub station_id: String,
    pub stage: PipelineStage,
    pub expected_delay_hours: f64,
    pub reason: String,
}

/// 被跳过的工位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedStation {
    pub station_id: String,
    pub reason: String,
}

/// 最优吞吐口径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimalThroughputMode {
    /// 期望吞吐均值
    #[default]
    Mean,
    /// 期望吞吐最大值（工位可再平衡）
    Max,
    /// 期望吞吐最小值（按设计最慢工位）
    Min,
}

/// 瓶颈分析结果 (BottleneckAnalysis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckAnalysis {
    /// 按分数降序
    pub detected_bottlenecks: Vec<DetectedBottleneck>,
    pub primary_bottleneck: Option<DetectedBottleneck>,
    /// 全部有效工位评分（按输入顺序）
    pub station_scores: Vec<StationScore>,
    pub skipped_stations: Vec<SkippedStation>,
    /// 整体效率 (0-100)
    pub overall_efficiency: f64,
    pub system_throughput: f64,
    pub optimal_throughput: f64,
    pub optimal_throughput_mode: OptimalThroughputMode,
    pub efficiency_loss_percent: f64,
    pub critical_path: Vec<CriticalPathEntry>,
    pub recommendations: Vec<String>,
    pub predicted_completion_delays: Vec<PredictedDelay>,
}

impl BottleneckAnalysis {
    /// 是否有瓶颈
    pub fn has_bottleneck(&self) -> bool {
        self.primary_bottleneck.is_some()
    }

    /// 按工位 ID 查找评分
    pub fn score_for(&self, station_id: &str) -> Option<f64> {
        self.station_scores
            .iter()
            .find(|s| s.station.station_id == station_id)
            .map(|s| s.score())
    }
}

// ==========================================
// 趋势分析
// ==========================================

/// 效率趋势
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EfficiencyTrend {
    Improving,
    Worsening,
    Stable,
}

impl fmt::Display for EfficiencyTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EfficiencyTrend::Improving => write!(f, "IMPROVING"),
            EfficiencyTrend::Worsening => write!(f, "WORSENING"),
            EfficiencyTrend::Stable => write!(f, "STABLE"),
        }
    }
}

/// 历史瓶颈点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub bottleneck_count: usize,
    pub worst_severity: Severity,
    pub primary_station: Option<String>,
    pub efficiency: f64,
}

/// 瓶颈趋势报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckTrendReport {
    pub trend: EfficiencyTrend,
    pub recent_efficiency: f64,
    pub historical_efficiency: f64,
    pub trend_analysis: String,
    pub history: Vec<TrendPoint>,
    pub recommendations: Vec<String>,
}
