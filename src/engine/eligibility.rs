// ==========================================
// 服装生产排程系统 - 排程准入引擎
// ==========================================
// 红线: 非法作业不得进入排序，非法资源不得进入资源池
// ==========================================
// 职责: 作业校验 + 资源校验 + 候选资源过滤
// 输入: 作业列表 + 资源列表 + 优化器配置
// 输出: 可排作业 / 未排诊断 / 可用资源池
// ==========================================

use crate::config::{OptimizerConfig, SkillMatchMode};
use crate::domain::job::Job;
use crate::domain::resource::Resource;
use crate::domain::schedule::{UnscheduledJob, UnscheduledReason};
use std::collections::BTreeSet;
use tracing::warn;

/// 被剔除的资源
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedResource {
    pub resource_id: String,
    pub reason: String,
}

// ==========================================
// EligibilityEngine - 排程准入引擎
// ==========================================
// 红线: 不修改输入，只返回判定结果
pub struct EligibilityEngine<'a> {
    config: &'a OptimizerConfig,
}

impl<'a> EligibilityEngine<'a> {
    pub fn new(config: &'a OptimizerConfig) -> Self {
        Self { config }
    }

    /// 作业准入判定
    ///
    /// # 返回
    /// - None: 可进入排序
    /// - Some(UnscheduledJob): 未排诊断（已完工 / 数据非法）
    pub fn check_job(&self, job: &Job) -> Option<UnscheduledJob> {
        if job.is_completed() {
            return Some(UnscheduledJob {
                job_id: job.id.clone(),
                reason: UnscheduledReason::AlreadyCompleted,
                detail: "作业已完工，无需排程".to_string(),
            });
        }
        match job.validate() {
            Ok(()) => None,
            Err(detail) => Some(UnscheduledJob {
                job_id: job.id.clone(),
                reason: UnscheduledReason::InvalidJob,
                detail,
            }),
        }
    }

    /// 资源池过滤：剔除非法资源并记录告警
    pub fn filter_resources<'r>(
        &self,
        resources: &'r [Resource],
    ) -> (Vec<&'r Resource>, Vec<RejectedResource>) {
        let mut usable = Vec::with_capacity(resources.len());
        let mut rejected = Vec::new();

        for resource in resources {
            match resource.validate() {
                Ok(()) => usable.push(resource),
                Err(reason) => {
                    warn!(resource_id = %resource.id, reason = %reason, "资源数据非法，已剔除");
                    rejected.push(RejectedResource {
                        resource_id: resource.id.clone(),
                        reason,
                    });
                }
            }
        }

        (usable, rejected)
    }

    /// 候选资源判定：技能匹配 + 资源类型兼容
    pub fn is_candidate(&self, job: &Job, resource: &Resource) -> bool {
        let skill_ok = match self.config.skill_match {
            SkillMatchMode::Any => resource.has_any_skill(&job.required_skills),
            SkillMatchMode::All => resource.has_all_skills(&job.required_skills),
        };
        skill_ok
            && self
                .config
                .is_type_compatible(job.current_stage, resource.resource_type)
    }

    /// 候选资源列表（保持资源池顺序）
    pub fn candidates<'r>(&self, job: &Job, pool: &[&'r Resource]) -> Vec<(usize, &'r Resource)> {
        pool.iter()
            .enumerate()
            .filter(|(_, r)| self.is_candidate(job, r))
            .map(|(idx, r)| (idx, *r))
            .collect()
    }

    /// 资源池中（类型兼容的资源）无人具备的技能
    pub fn missing_skills(&self, job: &Job, pool: &[&Resource]) -> BTreeSet<String> {
        let offered: BTreeSet<&String> = pool
            .iter()
            .filter(|r| {
                self.config
                    .is_type_compatible(job.current_stage, r.resource_type)
            })
            .flat_map(|r| r.skills.iter())
            .collect();

        job.required_skills
            .iter()
            .filter(|s| !offered.contains(s))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{JobStage, JobStatus, Priority, ResourceType};
    use chrono::{TimeZone, Utc};

    fn skills(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn job(stage: JobStage, required: &[&str]) -> Job {
        Job {
            id: "J1".to_string(),
            order_id: "ORD-1".to_string(),
            client_name: "ACME".to_string(),
            garment_type: "HOODIE".to_string(),
            quantity: 50,
            priority: Priority::Medium,
            deadline: Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap(),
            estimated_hours: 6.0,
            required_skills: skills(required),
            current_stage: stage,
            status: JobStatus::Pending,
            dependencies: Vec::new(),
        }
    }

    fn resource(id: &str, resource_type: ResourceType, offered: &[&str]) -> Resource {
        Resource {
            id: id.to_string(),
            name: format!("Resource {}", id),
            resource_type,
            skills: skills(offered),
            capacity_hours_per_day: 8.0,
            current_utilization: 0.0,
            efficiency_rating: 100.0,
        }
    }

    #[test]
    fn test_completed_job_wins_over_invalid_data() {
        let config = OptimizerConfig::default();
        let engine = EligibilityEngine::new(&config);

        let mut done = job(JobStage::Sewing, &[]);
        done.status = JobStatus::Completed;
        let diag = engine.check_job(&done).unwrap();
        assert_eq!(diag.reason, UnscheduledReason::AlreadyCompleted);

        let invalid = job(JobStage::Sewing, &[]);
        let diag = engine.check_job(&invalid).unwrap();
        assert_eq!(diag.reason, UnscheduledReason::InvalidJob);

        assert!(engine.check_job(&job(JobStage::Sewing, &["SEWING"])).is_none());
    }

    #[test]
    fn test_invalid_resources_rejected() {
        let config = OptimizerConfig::default();
        let engine = EligibilityEngine::new(&config);

        let mut broken = resource("R2", ResourceType::Machine, &["CUTTING"]);
        broken.capacity_hours_per_day = 30.0;
        let pool = vec![resource("R1", ResourceType::Machine, &["CUTTING"]), broken];

        let (usable, rejected) = engine.filter_resources(&pool);
        assert_eq!(usable.len(), 1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].resource_id, "R2");
    }

    #[test]
    fn test_skill_match_modes() {
        let mut config = OptimizerConfig::default();
        let partial = resource("R1", ResourceType::Operator, &["SEWING"]);
        let target = job(JobStage::Sewing, &["SEWING", "EMBROIDERY"]);

        assert!(EligibilityEngine::new(&config).is_candidate(&target, &partial));

        config.skill_match = SkillMatchMode::All;
        assert!(!EligibilityEngine::new(&config).is_candidate(&target, &partial));
    }

    #[test]
    fn test_finishing_rejects_machines_by_default() {
        let config = OptimizerConfig::default();
        let engine = EligibilityEngine::new(&config);
        let press = resource("R1", ResourceType::Machine, &["PRESSING"]);
        let operator = resource("R2", ResourceType::Operator, &["PRESSING"]);
        let target = job(JobStage::Finishing, &["PRESSING"]);

        assert!(!engine.is_candidate(&target, &press));
        assert!(engine.is_candidate(&target, &operator));

        let pool = vec![&press];
        assert_eq!(engine.missing_skills(&target, &pool), skills(&["PRESSING"]));
    }
}
