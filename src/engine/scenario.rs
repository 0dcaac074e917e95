// ==========================================
// 服装生产排程系统 - 假设情景分析
// ==========================================
// 职责: 在基线输入上施加一个变更，对比前后排程
// 情景: 新增作业 / 移除作业 / 新增资源 / 调整交期
// 红线: 不修改调用方输入（在副本上施加变更）
// ==========================================

use crate::domain::job::Job;
use crate::domain::resource::Resource;
use crate::domain::schedule::Schedule;
use crate::engine::scheduler::SchedulingOptimizer;
use crate::i18n::{fmt_num, t_with_args};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// 情景定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scenario {
    AddJob { job: Job },
    RemoveJob { job_id: String },
    AddResource { resource: Resource },
    ChangeDeadline {
        job_id: String,
        deadline: DateTime<Utc>,
    },
}

impl Scenario {
    /// 情景名称（本地化）
    pub fn name(&self) -> String {
        match self {
            Scenario::AddJob { job } => t_with_args("scenario.add_job", &[("job", &job.id)]),
            Scenario::RemoveJob { job_id } => {
                t_with_args("scenario.remove_job", &[("job", job_id)])
            }
            Scenario::AddResource { resource } => {
                t_with_args("scenario.add_resource", &[("resource", &resource.id)])
            }
            Scenario::ChangeDeadline { job_id, .. } => {
                t_with_args("scenario.change_deadline", &[("job", job_id)])
            }
        }
    }
}

/// 单项指标对比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: String,
    pub before: f64,
    pub after: f64,
    pub change: f64,
}

impl MetricComparison {
    fn new(metric: &str, before: f64, after: f64) -> Self {
        Self {
            metric: metric.to_string(),
            before,
            after,
            change: after - before,
        }
    }
}

/// 情景分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub impact: String,
    /// 情景是否实际改变了输入
    pub applied: bool,
    pub baseline: Schedule,
    pub schedule: Schedule,
    pub comparison: Vec<MetricComparison>,
}

impl ScenarioResult {
    pub fn change_of(&self, metric: &str) -> Option<f64> {
        self.comparison
            .iter()
            .find(|c| c.metric == metric)
            .map(|c| c.change)
    }
}

// ==========================================
// ScenarioAnalyzer - 情景分析引擎
// ==========================================
pub struct ScenarioAnalyzer<'a> {
    optimizer: &'a SchedulingOptimizer,
}

impl<'a> ScenarioAnalyzer<'a> {
    pub fn new(optimizer: &'a SchedulingOptimizer) -> Self {
        Self { optimizer }
    }

    /// 执行情景分析
    ///
    /// 未知作业 ID: 输入不变，applied=false，impact 说明原因
    #[instrument(skip(self, jobs, resources, scenario), fields(
        job_count = jobs.len(),
        resource_count = resources.len()
    ))]
    pub fn analyze(
        &self,
        jobs: &[Job],
        resources: &[Resource],
        horizon_start: DateTime<Utc>,
        scenario: &Scenario,
    ) -> ScenarioResult {
        let baseline = self.optimizer.optimize(jobs, resources, horizon_start);

        let mut new_jobs = jobs.to_vec();
        let mut new_resources = resources.to_vec();
        let missing_job = apply(scenario, &mut new_jobs, &mut new_resources);

        let schedule = self
            .optimizer
            .optimize(&new_jobs, &new_resources, horizon_start);

        let comparison = vec![
            MetricComparison::new(
                "scheduled_jobs",
                baseline.scheduled_jobs as f64,
                schedule.scheduled_jobs as f64,
            ),
            MetricComparison::new(
                "optimization_score",
                baseline.optimization_score,
                schedule.optimization_score,
            ),
            MetricComparison::new(
                "avg_resource_utilization",
                baseline.metrics.avg_resource_utilization,
                schedule.metrics.avg_resource_utilization,
            ),
            MetricComparison::new(
                "on_time_completion_rate",
                baseline.metrics.on_time_completion_rate,
                schedule.metrics.on_time_completion_rate,
            ),
        ];

        let impact = match &missing_job {
            Some(job_id) => {
                warn!(job_id = %job_id, "情景引用的作业不存在");
                t_with_args("scenario.job_not_found", &[("job", job_id)])
            }
            None => t_with_args(
                "scenario.impact",
                &[
                    ("before", &baseline.scheduled_jobs.to_string()),
                    ("after", &schedule.scheduled_jobs.to_string()),
                    (
                        "delta",
                        &fmt_num(schedule.optimization_score - baseline.optimization_score),
                    ),
                ],
            ),
        };

        info!(
            applied = missing_job.is_none(),
            score_before = baseline.optimization_score,
            score_after = schedule.optimization_score,
            "情景分析完成"
        );

        ScenarioResult {
            scenario_name: scenario.name(),
            impact,
            applied: missing_job.is_none(),
            baseline,
            schedule,
            comparison,
        }
    }
}

/// 施加情景，返回找不到的作业 ID
fn apply(
    scenario: &Scenario,
    jobs: &mut Vec<Job>,
    resources: &mut Vec<Resource>,
) -> Option<String> {
    match scenario {
        Scenario::AddJob { job } => {
            jobs.push(job.clone());
            None
        }
        Scenario::RemoveJob { job_id } => {
            let before = jobs.len();
            jobs.retain(|j| &j.id != job_id);
            (jobs.len() == before).then(|| job_id.clone())
        }
        Scenario::AddResource { resource } => {
            resources.push(resource.clone());
            None
        }
        Scenario::ChangeDeadline { job_id, deadline } => {
            match jobs.iter_mut().find(|j| &j.id == job_id) {
                Some(job) => {
                    job.deadline = *deadline;
                    None
                }
                None => Some(job_id.clone()),
            }
        }
    }
}
