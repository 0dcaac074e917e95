use crate::config::DetectorConfig;
use crate::domain::bottleneck::{ScoreBreakdown, StationImpact};
use crate::domain::station::StationMetric;

// ==========================================
// StationScorer - 工位评分
// ==========================================
// gap_score         = clamp(100 * (expected - current) / expected, 0, 100)
// queue_score       = clamp(wait_minutes / 60 * per_hour, 0, 100)
// utilization_score = utilization_rate
// defect_score      = defect_rate
// score = Σ weight * component
// ==========================================
pub struct StationScorer<'a> {
    config: &'a DetectorConfig,
}

impl<'a> StationScorer<'a> {
    pub fn new(config: &'a DetectorConfig) -> Self {
        Self { config }
    }

    /// 计算评分分解（调用方保证快照已通过 validate）
    pub fn score(&self, metric: &StationMetric) -> ScoreBreakdown {
        let weights = &self.config.weights;

        let gap_score = gap_percent(metric);
        let queue_score = (metric.avg_wait_time_minutes / 60.0
            * self.config.queue_score_per_wait_hour)
            .clamp(0.0, 100.0);
        let utilization_score = metric.utilization_rate;
        let defect_score = metric.defect_rate;

        let score = weights.gap * gap_score
            + weights.queue * queue_score
            + weights.utilization * utilization_score
            + weights.defect * defect_score;

        ScoreBreakdown {
            gap_score,
            queue_score,
            utilization_score,
            defect_score,
            score: score.clamp(0.0, 100.0),
        }
    }

    /// 影响评估
    ///
    /// - estimated_delay_hours = queue / current_throughput + wait / 60
    /// - affected_orders = ceil(queue / units_per_order)
    /// - cost_impact = delay * cost_per_delay_hour * score / 100
    pub fn impact(&self, metric: &StationMetric, breakdown: &ScoreBreakdown) -> StationImpact {
        let queue_hours = match metric.queue_length {
            Some(queue) if metric.current_throughput > 0.0 => {
                queue as f64 / metric.current_throughput
            }
            _ => 0.0,
        };
        let affected_orders = match (metric.queue_length, self.config.units_per_order) {
            (Some(queue), per_order) if per_order > 0 => queue.div_ceil(per_order),
            _ => 0,
        };

        let estimated_delay_hours = queue_hours + metric.avg_wait_time_minutes / 60.0;
        let cost_impact =
            estimated_delay_hours * self.config.cost_per_delay_hour * breakdown.score / 100.0;

        StationImpact {
            throughput_loss_percent: gap_percent(metric),
            estimated_delay_hours,
            affected_orders,
            cost_impact: (cost_impact * 100.0).round() / 100.0,
        }
    }
}

/// 产出缺口百分比
pub(super) fn gap_percent(metric: &StationMetric) -> f64 {
    if metric.expected_throughput <= 0.0 {
        return 0.0;
    }
    (100.0 * (metric.expected_throughput - metric.current_throughput) / metric.expected_throughput)
        .clamp(0.0, 100.0)
}
