use crate::config::RootCauseThresholds;
use crate::domain::bottleneck::{RootCause, RootCauseKind, ScoreBreakdown};
use crate::domain::station::StationMetric;
use crate::i18n::{fmt_num, t_with_args};

// ==========================================
// RootCauseAnalyzer - 瓶颈根因识别
// ==========================================
// 每条规则独立判定，结果按置信度降序
// 指标类根因置信度分档: ≥ critical → 100; ≥ warning → 60; 其余 min(value / warning * 60, 50)
// 利用率与缺员类根因取固定置信度
const UNDER_UTILIZATION_CONFIDENCE: f64 = 80.0;
const OVER_UTILIZATION_CONFIDENCE: f64 = 85.0;
const OPERATOR_SHORTAGE_CONFIDENCE: f64 = 90.0;

pub struct RootCauseAnalyzer<'a> {
    thresholds: &'a RootCauseThresholds,
}

impl<'a> RootCauseAnalyzer<'a> {
    pub fn new(thresholds: &'a RootCauseThresholds) -> Self {
        Self { thresholds }
    }

    pub fn analyze(&self, metric: &StationMetric, breakdown: &ScoreBreakdown) -> Vec<RootCause> {
        let th = self.thresholds;
        let mut causes = Vec::new();

        if breakdown.gap_score > th.gap_score {
            causes.push(cause(
                RootCauseKind::LowThroughput,
                tiered(breakdown.gap_score, th.gap_score, th.throughput_loss_critical),
                t_with_args(
                    "root_cause.low_throughput",
                    &[
                        ("current", &fmt_num(metric.current_throughput)),
                        ("expected", &fmt_num(metric.expected_throughput)),
                        ("gap", &fmt_num(breakdown.gap_score)),
                    ],
                ),
            ));
        }

        if let Some(queue) = metric.queue_length.filter(|q| *q > th.queue_length) {
            causes.push(cause(
                RootCauseKind::QueueBuildup,
                tiered(queue as f64, th.queue_length as f64, th.queue_length_critical as f64),
                t_with_args("root_cause.queue_buildup", &[("queue", &queue.to_string())]),
            ));
        }

        if metric.avg_wait_time_minutes > th.wait_time_minutes {
            causes.push(cause(
                RootCauseKind::ExcessiveWaitTime,
                tiered(
                    metric.avg_wait_time_minutes,
                    th.wait_time_minutes,
                    th.wait_time_critical_minutes,
                ),
                t_with_args(
                    "root_cause.excessive_wait",
                    &[("wait", &fmt_num(metric.avg_wait_time_minutes))],
                ),
            ));
        }

        if metric.utilization_rate < th.utilization_low {
            causes.push(cause(
                RootCauseKind::UnderUtilization,
                UNDER_UTILIZATION_CONFIDENCE,
                t_with_args(
                    "root_cause.under_utilization",
                    &[("util", &fmt_num(metric.utilization_rate))],
                ),
            ));
        } else if metric.utilization_rate > th.utilization_high {
            causes.push(cause(
                RootCauseKind::OverUtilization,
                OVER_UTILIZATION_CONFIDENCE,
                t_with_args(
                    "root_cause.over_utilization",
                    &[("util", &fmt_num(metric.utilization_rate))],
                ),
            ));
        }

        let shortage = metric.operator_shortage();
        if shortage > 0 && metric.operator_count > 0 {
            causes.push(cause(
                RootCauseKind::OperatorShortage,
                OPERATOR_SHORTAGE_CONFIDENCE,
                t_with_args(
                    "root_cause.operator_shortage",
                    &[
                        ("active", &metric.active_operators.to_string()),
                        ("total", &metric.operator_count.to_string()),
                    ],
                ),
            ));
        }

        if metric.defect_rate > th.defect_rate {
            causes.push(cause(
                RootCauseKind::HighDefectRate,
                tiered(metric.defect_rate, th.defect_rate, th.defect_rate_critical),
                t_with_args(
                    "root_cause.high_defect",
                    &[("defect", &fmt_num(metric.defect_rate))],
                ),
            ));
        }

        // 稳定排序：同置信度保持规则顺序
        causes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        causes
    }
}

/// 指标分档置信度
fn tiered(value: f64, warning: f64, critical: f64) -> f64 {
    if value >= critical {
        100.0
    } else if value >= warning {
        60.0
    } else if warning > 0.0 {
        (value / warning * 60.0).min(50.0)
    } else {
        0.0
    }
}

fn cause(kind: RootCauseKind, confidence: f64, description: String) -> RootCause {
    RootCause {
        cause: kind,
        confidence: confidence.clamp(0.0, 100.0),
        description,
    }
}
