use crate::config::DetectorConfig;
use crate::domain::bottleneck::{
    DetectedBottleneck, ImplementationCost, RootCause, RootCauseKind, StationAction,
};
use crate::domain::station::StationMetric;
use crate::domain::types::{Priority, Severity};
use crate::i18n::{fmt_num, t, t_with_args};

// ==========================================
// BottleneckAdvisor - 瓶颈建议
// ==========================================
// 顺序:
// 1) 主瓶颈聚焦
// 2) 逐个瓶颈: 高缺口低利用 → 订单再平衡; 高排队 → 合批/加班;
//    高不良 → 质量升级; 缺员 → 复核排班
// 3) 瓶颈过多 → 流程重构
// 4) 效率损失过高 → 生产率告警
// 5) 以上皆无 → 运行平稳
// ==========================================
pub struct BottleneckAdvisor<'a> {
    config: &'a DetectorConfig,
}

impl<'a> BottleneckAdvisor<'a> {
    pub fn new(config: &'a DetectorConfig) -> Self {
        Self { config }
    }

    pub fn recommend(
        &self,
        detected: &[DetectedBottleneck],
        efficiency_loss_percent: f64,
        has_station_data: bool,
    ) -> Vec<String> {
        if !has_station_data {
            return vec![t("bottleneck.idle_system")];
        }

        let cfg = self.config;
        let mut recommendations = Vec::new();

        if let Some(primary) = detected.first() {
            recommendations.push(t_with_args(
                "bottleneck.primary_focus",
                &[
                    ("station", &primary.station.station_name),
                    ("stage", primary.station.station_type.as_str()),
                    ("score", &fmt_num(primary.score)),
                ],
            ));
        }

        for bottleneck in detected {
            let station = &bottleneck.station;
            let breakdown = &bottleneck.breakdown;

            if breakdown.gap_score >= cfg.high_gap_score
                && station.utilization_rate < cfg.root_causes.utilization_low
            {
                recommendations.push(t_with_args(
                    "bottleneck.rebalance",
                    &[
                        ("station", &station.station_name),
                        ("gap", &fmt_num(breakdown.gap_score)),
                        ("util", &fmt_num(station.utilization_rate)),
                    ],
                ));
            }
            if breakdown.queue_score >= cfg.high_queue_score {
                recommendations.push(t_with_args(
                    "bottleneck.queue_batching",
                    &[
                        ("station", &station.station_name),
                        ("wait", &fmt_num(station.avg_wait_time_minutes)),
                    ],
                ));
            }
            if breakdown.defect_score >= cfg.high_defect_score {
                recommendations.push(t_with_args(
                    "bottleneck.quality",
                    &[
                        ("station", &station.station_name),
                        ("defect", &fmt_num(station.defect_rate)),
                    ],
                ));
            }
            let shortage = station.operator_shortage();
            if shortage > 0 {
                recommendations.push(t_with_args(
                    "bottleneck.operator_shortage",
                    &[
                        ("station", &station.station_name),
                        ("missing", &shortage.to_string()),
                    ],
                ));
            }
        }

        if detected.len() > cfg.multiple_bottleneck_count {
            recommendations.push(t_with_args(
                "bottleneck.workflow_redesign",
                &[("count", &detected.len().to_string())],
            ));
        }

        if efficiency_loss_percent > cfg.efficiency_loss_warning {
            recommendations.push(t_with_args(
                "bottleneck.efficiency_warning",
                &[("loss", &fmt_num(efficiency_loss_percent))],
            ));
        }

        if recommendations.is_empty() {
            recommendations.push(t("bottleneck.smooth"));
        }
        recommendations
    }
}

// ==========================================
// 工位级措施
// ==========================================
// 按根因顺序逐条生成；EXCESSIVE_WAIT_TIME 由系统级合批建议覆盖
// CRITICAL 工位的缺员 / 积压措施升为 URGENT
// 无措施时给出持续监控
// ==========================================
pub fn station_actions(
    station: &StationMetric,
    root_causes: &[RootCause],
    severity: Severity,
) -> Vec<StationAction> {
    let critical = severity == Severity::Critical;
    let name: &str = &station.station_name;
    let mut actions = Vec::new();

    for cause in root_causes {
        let step = match cause.cause {
            RootCauseKind::OperatorShortage => action(
                "operator_shortage",
                &[
                    ("station", name),
                    ("missing", &station.operator_shortage().to_string()),
                ],
                escalate(critical, Priority::High),
                ImplementationCost::Low,
            ),
            RootCauseKind::LowThroughput => action(
                "low_throughput",
                &[("station", name)],
                Priority::High,
                ImplementationCost::Medium,
            ),
            RootCauseKind::QueueBuildup => action(
                "queue_buildup",
                &[("station", name)],
                escalate(critical, Priority::Medium),
                ImplementationCost::Medium,
            ),
            RootCauseKind::OverUtilization => action(
                "over_utilization",
                &[("station", name)],
                Priority::High,
                ImplementationCost::Low,
            ),
            RootCauseKind::HighDefectRate => action(
                "high_defect",
                &[("station", name)],
                Priority::High,
                ImplementationCost::Medium,
            ),
            RootCauseKind::UnderUtilization => action(
                "under_utilization",
                &[("station", name)],
                Priority::Medium,
                ImplementationCost::Low,
            ),
            RootCauseKind::ExcessiveWaitTime => continue,
        };
        actions.push(step);
    }

    if actions.is_empty() {
        actions.push(action(
            "monitor",
            &[("station", name)],
            Priority::Low,
            ImplementationCost::Low,
        ));
    }
    actions
}

fn escalate(critical: bool, priority: Priority) -> Priority {
    if critical {
        Priority::Urgent
    } else {
        priority
    }
}

fn action(
    key: &str,
    args: &[(&str, &str)],
    priority: Priority,
    implementation_cost: ImplementationCost,
) -> StationAction {
    StationAction {
        action: t_with_args(&format!("station_action.{}.action", key), args),
        priority,
        estimated_impact: t(&format!("station_action.{}.impact", key)),
        implementation_cost,
    }
}
