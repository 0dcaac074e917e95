// ==========================================
// 服装生产排程系统 - 排程指标计算
// ==========================================
// 职责: 利用率 / 准时率 / 总工期 / 浪费产能 / 优化评分
// 输入: 分配列表 + 资源台账
// 输出: ScheduleMetrics + ResourceLoad + optimization_score
// ==========================================

use crate::config::OptimizationWeights;
use crate::domain::schedule::{ResourceLoad, ScheduleAssignment, ScheduleMetrics};
use crate::engine::capacity_ledger::{time_to_offset, CapacityLedger, HOURS_EPSILON};
use chrono::{DateTime, Utc};

pub struct ScheduleMetricsCalculator;

impl ScheduleMetricsCalculator {
    /// 计算排程指标
    ///
    /// - avg_resource_utilization: 各资源 committed/available 的均值 (可用为 0 记 100)
    /// - on_time_completion_rate: 准时已排数 / total_jobs (无作业记 100)
    /// - total_makespan_hours: max(end) - horizon_start
    /// - wasted_capacity_hours: Σ available - Σ committed
    pub fn compute(
        total_jobs: usize,
        assignments: &[ScheduleAssignment],
        ledger: &CapacityLedger,
        horizon_start: DateTime<Utc>,
    ) -> ScheduleMetrics {
        let ledgers = ledger.ledgers();

        let avg_resource_utilization = if ledgers.is_empty() {
            0.0
        } else {
            ledgers.iter().map(|l| l.utilization_percent()).sum::<f64>() / ledgers.len() as f64
        };

        let on_time_completion_rate = if total_jobs == 0 {
            100.0
        } else {
            let on_time = assignments.iter().filter(|a| a.on_time).count();
            on_time as f64 / total_jobs as f64 * 100.0
        };

        let total_makespan_hours = assignments
            .iter()
            .map(|a| time_to_offset(horizon_start, a.end_time))
            .fold(0.0_f64, f64::max);

        let available: f64 = ledgers.iter().map(|l| l.available_hours()).sum();
        let committed: f64 = ledgers.iter().map(|l| l.committed_hours()).sum();

        ScheduleMetrics {
            avg_resource_utilization,
            on_time_completion_rate,
            total_makespan_hours,
            wasted_capacity_hours: (available - committed).max(0.0),
        }
    }

    /// 各资源负荷（保持资源池顺序）
    pub fn resource_loads(ledger: &CapacityLedger) -> Vec<ResourceLoad> {
        ledger
            .ledgers()
            .iter()
            .map(|l| ResourceLoad {
                resource_id: l.resource_id.clone(),
                resource_name: l.resource_name.clone(),
                committed_hours: l.committed_hours(),
                available_hours: l.available_hours(),
                utilization_percent: l.utilization_percent(),
            })
            .collect()
    }

    /// 优化评分
    ///
    /// score = w_on_time * on_time + w_util * util + w_waste * (100 - waste_ratio*100)
    /// 结果截断到 [0, 100]；无作业记 100
    pub fn optimization_score(
        total_jobs: usize,
        metrics: &ScheduleMetrics,
        ledger: &CapacityLedger,
        weights: &OptimizationWeights,
    ) -> f64 {
        if total_jobs == 0 {
            return 100.0;
        }

        let available: f64 = ledger.ledgers().iter().map(|l| l.available_hours()).sum();
        let waste_ratio = if available > HOURS_EPSILON {
            (metrics.wasted_capacity_hours / available).clamp(0.0, 1.0)
        } else if ledger.ledgers().is_empty() {
            1.0
        } else {
            0.0
        };

        let score = weights.on_time * metrics.on_time_completion_rate
            + weights.utilization * metrics.avg_resource_utilization
            + weights.waste * (100.0 - waste_ratio * 100.0);
        score.clamp(0.0, 100.0)
    }
}
