// ==========================================
// 服装生产排程系统 - 排程优化引擎
// ==========================================
// 红线: 产能约束优先于作业优先级，单日占用不超过日产能
// 红线: 不读系统时钟，不引入随机性（同输入同输出）
// ==========================================
// 职责: 贪心优先级列表排程 + 约束检查
// 输入: 作业列表 + 资源列表 + horizon_start
// 输出: Schedule（分配 / 未排诊断 / 冲突 / 指标 / 建议）
// ==========================================

use crate::config::{IntelligenceConfig, OptimizerConfig, PipelineConfig, MAX_HORIZON_DAYS};
use crate::domain::job::Job;
use crate::domain::resource::Resource;
use crate::domain::schedule::{
    ConflictReason, Schedule, ScheduleAssignment, ScheduleConflict, UnscheduledJob,
    UnscheduledReason,
};
use crate::domain::types::{Priority, Severity};
use crate::engine::capacity_ledger::{
    offset_to_time, time_to_offset, CapacityLedger, Placement, HOURS_EPSILON,
};
use crate::engine::eligibility::EligibilityEngine;
use crate::engine::priority::JobPrioritySorter;
use crate::engine::recommendation::{ScheduleFacts, ScheduleRecommender};
use crate::engine::schedule_metrics::ScheduleMetricsCalculator;
use crate::i18n::t;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, instrument};

/// 候选资源的放置结果
struct Choice<'r> {
    idx: usize,
    resource: &'r Resource,
    placement: Placement,
    post_utilization: f64,
}

// ==========================================
// SchedulingOptimizer - 排程优化引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct SchedulingOptimizer {
    config: OptimizerConfig,
    pipeline: PipelineConfig,
}

impl Default for SchedulingOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default(), PipelineConfig::default())
    }
}

impl SchedulingOptimizer {
    pub fn new(config: OptimizerConfig, pipeline: PipelineConfig) -> Self {
        Self { config, pipeline }
    }

    pub fn from_config(config: &IntelligenceConfig) -> Self {
        Self::new(config.optimizer.clone(), config.pipeline.clone())
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 生成排程
    ///
    /// 步骤:
    /// 1) 准入校验（已完工 / 非法作业 / 非法资源）
    /// 2) 作业排序（优先级 → 交期 → 工序 → 输入顺序）
    /// 3) 候选过滤（技能 + 资源类型）
    /// 4) 逐候选搜索连续块放置，选完工最早者
    /// 5) 提交台账，记录 AT_RISK / DEPENDENCY_UNMET 冲突
    /// 6) 指标 + 评分 + 建议
    #[instrument(skip(self, jobs, resources), fields(
        job_count = jobs.len(),
        resource_count = resources.len(),
        horizon_days = self.config.horizon_days
    ))]
    pub fn optimize(
        &self,
        jobs: &[Job],
        resources: &[Resource],
        horizon_start: DateTime<Utc>,
    ) -> Schedule {
        // 未经 validate 的直接构造同样受上限约束
        let horizon_days = self.config.horizon_days.min(MAX_HORIZON_DAYS);

        if jobs.is_empty() {
            let mut schedule = Schedule::empty(horizon_start, horizon_days);
            schedule.recommendations.push(t("optimizer.no_jobs"));
            return schedule;
        }

        let eligibility = EligibilityEngine::new(&self.config);
        let (pool, rejected) = eligibility.filter_resources(resources);

        let mut unscheduled: Vec<UnscheduledJob> = Vec::new();
        let mut schedulable: Vec<&Job> = Vec::with_capacity(jobs.len());
        for job in jobs {
            match eligibility.check_job(job) {
                Some(diag) => {
                    debug!(job_id = %job.id, reason = %diag.reason, "作业未进入排序");
                    unscheduled.push(diag);
                }
                None => schedulable.push(job),
            }
        }

        let mut ledger = CapacityLedger::new(&pool, horizon_days);
        let mut assignments: Vec<ScheduleAssignment> = Vec::new();
        let mut conflicts: Vec<ScheduleConflict> = Vec::new();
        let mut missing_skills: BTreeSet<String> = BTreeSet::new();

        if pool.is_empty() {
            for job in schedulable {
                unscheduled.push(UnscheduledJob {
                    job_id: job.id.clone(),
                    reason: UnscheduledReason::NoResources,
                    detail: "资源池为空".to_string(),
                });
            }
        } else {
            let completed: HashSet<&str> = jobs
                .iter()
                .filter(|j| j.is_completed())
                .map(|j| j.id.as_str())
                .collect();
            let mut finished_at: HashMap<&str, DateTime<Utc>> = HashMap::new();

            let ordered = JobPrioritySorter::new(&self.pipeline).sort(schedulable);
            for job in ordered {
                let (earliest, unmet) =
                    resolve_dependencies(job, &finished_at, &completed, horizon_start);

                let candidates = eligibility.candidates(job, &pool);
                if candidates.is_empty() {
                    let mut missing = eligibility.missing_skills(job, &pool);
                    if missing.is_empty() {
                        missing = job.required_skills.clone();
                    }
                    let detail = format!(
                        "无资源匹配技能 [{}] 且类型兼容工序 {}",
                        missing.iter().cloned().collect::<Vec<_>>().join(", "),
                        job.current_stage
                    );
                    missing_skills.extend(missing);
                    unscheduled.push(UnscheduledJob {
                        job_id: job.id.clone(),
                        reason: UnscheduledReason::NoSkillMatch,
                        detail,
                    });
                    continue;
                }

                let best = candidates
                    .into_iter()
                    .filter_map(|(idx, resource)| {
                        let resource_ledger = ledger.get(idx)?;
                        let placement =
                            resource_ledger.find_placement(job.estimated_hours, earliest)?;
                        Some(Choice {
                            idx,
                            resource,
                            post_utilization: resource_ledger
                                .utilization_with(placement.work_hours),
                            placement,
                        })
                    })
                    .min_by(compare_choices);

                let choice = match best {
                    Some(choice) => choice,
                    None => {
                        unscheduled.push(UnscheduledJob {
                            job_id: job.id.clone(),
                            reason: UnscheduledReason::CapacityExceeded,
                            detail: format!(
                                "{} 天周期内无候选资源可容纳 {:.1} 工时",
                                horizon_days, job.estimated_hours
                            ),
                        });
                        continue;
                    }
                };

                ledger.commit(choice.idx, &choice.placement);

                let start_time = offset_to_time(horizon_start, choice.placement.start_hours);
                let end_time = offset_to_time(horizon_start, choice.placement.finish_hours);
                let on_time = job.meets_deadline(end_time);

                if !on_time {
                    conflicts.push(ScheduleConflict {
                        resource_id: choice.resource.id.clone(),
                        job_ids: vec![job.id.clone()],
                        reason: ConflictReason::AtRisk,
                        severity: at_risk_severity(job.priority),
                        description: format!(
                            "作业 {} 预计 {} 完工，晚于交期 {}",
                            job.id,
                            end_time.to_rfc3339(),
                            job.deadline.to_rfc3339()
                        ),
                    });
                }
                if !unmet.is_empty() {
                    conflicts.push(ScheduleConflict {
                        resource_id: choice.resource.id.clone(),
                        job_ids: std::iter::once(job.id.clone())
                            .chain(unmet.iter().cloned())
                            .collect(),
                        reason: ConflictReason::DependencyUnmet,
                        severity: Severity::Medium,
                        description: format!(
                            "作业 {} 的前置作业 [{}] 未排，按可用时间开工",
                            job.id,
                            unmet.join(", ")
                        ),
                    });
                }

                debug!(
                    job_id = %job.id,
                    resource_id = %choice.resource.id,
                    start = %start_time,
                    end = %end_time,
                    on_time,
                    "作业已分配"
                );

                finished_at.insert(job.id.as_str(), end_time);
                assignments.push(ScheduleAssignment {
                    job_id: job.id.clone(),
                    order_id: job.order_id.clone(),
                    resource_id: choice.resource.id.clone(),
                    resource_name: choice.resource.name.clone(),
                    stage: job.current_stage,
                    priority: job.priority,
                    start_time,
                    end_time,
                    duration_hours: job.estimated_hours,
                    on_time,
                });
            }
        }

        // 稳定排序：同开工时刻保持分配顺序
        assignments.sort_by_key(|a| a.start_time);

        let metrics =
            ScheduleMetricsCalculator::compute(jobs.len(), &assignments, &ledger, horizon_start);
        let optimization_score = ScheduleMetricsCalculator::optimization_score(
            jobs.len(),
            &metrics,
            &ledger,
            &self.config.weights,
        );
        let resource_loads = ScheduleMetricsCalculator::resource_loads(&ledger);

        let recommendations = ScheduleRecommender::new(&self.config).recommend(&ScheduleFacts {
            unscheduled: &unscheduled,
            conflicts: &conflicts,
            metrics: &metrics,
            missing_skills: &missing_skills,
            has_resources: !pool.is_empty(),
            horizon_days,
        });

        info!(
            total_jobs = jobs.len(),
            scheduled = assignments.len(),
            unscheduled = unscheduled.len(),
            rejected_resources = rejected.len(),
            conflicts = conflicts.len(),
            score = optimization_score,
            "排程完成"
        );

        Schedule {
            horizon_start,
            horizon_days,
            total_jobs: jobs.len(),
            scheduled_jobs: assignments.len(),
            assignments,
            unscheduled_jobs: unscheduled,
            optimization_score,
            metrics,
            resource_loads,
            recommendations,
            conflicts,
        }
    }
}

/// 前置作业解析
///
/// # 返回
/// - 最早开工偏移（已排前置作业的最晚完工）
/// - 未满足的前置作业 ID（输入中已完工的视为满足）
fn resolve_dependencies(
    job: &Job,
    finished_at: &HashMap<&str, DateTime<Utc>>,
    completed: &HashSet<&str>,
    horizon_start: DateTime<Utc>,
) -> (f64, Vec<String>) {
    let mut earliest = 0.0_f64;
    let mut unmet = Vec::new();

    for dep in &job.dependencies {
        if let Some(end) = finished_at.get(dep.as_str()) {
            earliest = earliest.max(time_to_offset(horizon_start, *end));
        } else if !completed.contains(dep.as_str()) {
            unmet.push(dep.clone());
        }
    }

    (earliest, unmet)
}

/// 候选比较: 完工早 → 效率高 → 排后利用率低 → 输入顺序
fn compare_choices(a: &Choice<'_>, b: &Choice<'_>) -> Ordering {
    let finish = if (a.placement.finish_hours - b.placement.finish_hours).abs() <= HOURS_EPSILON {
        Ordering::Equal
    } else {
        a.placement.finish_hours.total_cmp(&b.placement.finish_hours)
    };
    finish
        .then_with(|| {
            b.resource
                .efficiency_rating
                .total_cmp(&a.resource.efficiency_rating)
        })
        .then_with(|| a.post_utilization.total_cmp(&b.post_utilization))
        .then_with(|| a.idx.cmp(&b.idx))
}

fn at_risk_severity(priority: Priority) -> Severity {
    match priority {
        Priority::Urgent => Severity::Critical,
        Priority::High => Severity::High,
        Priority::Medium => Severity::Medium,
        Priority::Low => Severity::Low,
    }
}
