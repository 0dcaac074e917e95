// ==========================================
// 服装生产排程系统 - 排程建议生成
// ==========================================
// 职责: 基于未排诊断 / 冲突 / 利用率输出有序建议（本地化文案）
// 红线: 只读排程结果，不改变排程
// ==========================================

use crate::config::OptimizerConfig;
use crate::domain::schedule::{
    ConflictReason, ScheduleConflict, ScheduleMetrics, UnscheduledJob, UnscheduledReason,
};
use crate::domain::types::Severity;
use crate::i18n::{fmt_num, t, t_with_args};
use std::collections::BTreeSet;

/// 建议生成所需的排程事实
pub struct ScheduleFacts<'a> {
    pub unscheduled: &'a [UnscheduledJob],
    pub conflicts: &'a [ScheduleConflict],
    pub metrics: &'a ScheduleMetrics,
    /// 未匹配技能（NO_SKILL_MATCH 作业汇总）
    pub missing_skills: &'a BTreeSet<String>,
    /// 资源池是否非空
    pub has_resources: bool,
    pub horizon_days: u32,
}

// ==========================================
// ScheduleRecommender - 排程建议引擎
// ==========================================
pub struct ScheduleRecommender<'a> {
    config: &'a OptimizerConfig,
}

impl<'a> ScheduleRecommender<'a> {
    pub fn new(config: &'a OptimizerConfig) -> Self {
        Self { config }
    }

    /// 生成建议
    ///
    /// 顺序:
    /// 1) NO_SKILL_MATCH → 交叉培训
    /// 2) CAPACITY_EXCEEDED → 扩产能 / 延长周期
    /// 3) NO_RESOURCES → 登记资源
    /// 4) INVALID_JOB → 修正作业数据
    /// 5) 利用率过低 / 过高
    /// 6) 准时率偏低 → 复核交期
    /// 7) 高严重度冲突 → 立即处理
    /// 8) 闲置产能过多 → 承接更多订单
    /// 9) 每个存在 AT_RISK 的资源 → 加急 / 加班
    /// 10) 以上皆无 → 已充分优化
    pub fn recommend(&self, facts: &ScheduleFacts<'_>) -> Vec<String> {
        let mut recommendations = Vec::new();

        let no_skill = count_reason(facts.unscheduled, UnscheduledReason::NoSkillMatch);
        if no_skill > 0 {
            let skills = facts
                .missing_skills
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            recommendations.push(t_with_args(
                "optimizer.cross_training",
                &[("count", &no_skill.to_string()), ("skills", &skills)],
            ));
        }

        let over_capacity = count_reason(facts.unscheduled, UnscheduledReason::CapacityExceeded);
        if over_capacity > 0 {
            recommendations.push(t_with_args(
                "optimizer.capacity_exceeded",
                &[
                    ("count", &over_capacity.to_string()),
                    ("days", &facts.horizon_days.to_string()),
                ],
            ));
        }

        if count_reason(facts.unscheduled, UnscheduledReason::NoResources) > 0 {
            recommendations.push(t("optimizer.no_resources"));
        }

        let invalid = count_reason(facts.unscheduled, UnscheduledReason::InvalidJob);
        if invalid > 0 {
            recommendations.push(t_with_args(
                "optimizer.invalid_job",
                &[("count", &invalid.to_string())],
            ));
        }

        if facts.has_resources {
            let util = facts.metrics.avg_resource_utilization;
            if util < self.config.low_utilization_threshold {
                recommendations.push(t_with_args(
                    "optimizer.low_utilization",
                    &[("util", &fmt_num(util))],
                ));
            } else if util > self.config.high_utilization_threshold {
                recommendations.push(t_with_args(
                    "optimizer.high_utilization",
                    &[("util", &fmt_num(util))],
                ));
            }
        }

        let on_time = facts.metrics.on_time_completion_rate;
        if on_time < self.config.on_time_rate_warning {
            recommendations.push(t_with_args(
                "optimizer.review_deadlines",
                &[("rate", &fmt_num(on_time))],
            ));
        }

        let severe = facts.conflicts.iter().filter(|c| c.severity >= Severity::High).count();
        if severe > self.config.high_severity_conflict_limit {
            recommendations.push(t_with_args(
                "optimizer.severe_conflicts",
                &[("count", &severe.to_string())],
            ));
        }

        let wasted = facts.metrics.wasted_capacity_hours;
        if facts.has_resources && wasted > self.config.wasted_capacity_warning_hours {
            recommendations.push(t_with_args(
                "optimizer.spare_capacity",
                &[("hours", &fmt_num(wasted))],
            ));
        }

        for (resource_id, job_ids) in at_risk_by_resource(facts.conflicts) {
            recommendations.push(t_with_args(
                "optimizer.at_risk",
                &[
                    ("resource", &resource_id),
                    ("count", &job_ids.len().to_string()),
                    ("jobs", &job_ids.join(", ")),
                ],
            ));
        }

        if recommendations.is_empty() {
            recommendations.push(t("optimizer.well_optimized"));
        }
        recommendations
    }
}

fn count_reason(unscheduled: &[UnscheduledJob], reason: UnscheduledReason) -> usize {
    unscheduled.iter().filter(|u| u.reason == reason).count()
}

/// AT_RISK 冲突按资源聚合（按首次出现顺序）
fn at_risk_by_resource(conflicts: &[ScheduleConflict]) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for conflict in conflicts.iter().filter(|c| c.reason == ConflictReason::AtRisk) {
        match grouped.iter_mut().find(|(id, _)| *id == conflict.resource_id) {
            Some((_, jobs)) => jobs.extend(conflict.job_ids.iter().cloned()),
            None => grouped.push((conflict.resource_id.clone(), conflict.job_ids.clone())),
        }
    }
    grouped
}
