// ==========================================
// 服装生产排程系统 - 作业排序引擎
// ==========================================
// 职责: 决定贪心排程的作业处理顺序
// 输入: 已通过校验的作业列表
// 输出: 排序后的作业列表（稳定排序）
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::job::Job;
use std::cmp::Ordering;

// ==========================================
// JobPrioritySorter - 作业排序引擎
// ==========================================
pub struct JobPrioritySorter<'a> {
    pipeline: &'a PipelineConfig,
}

impl<'a> JobPrioritySorter<'a> {
    /// 构造函数
    ///
    /// # 参数
    /// - `pipeline`: 工序顺序（用于同优先级同交期时的工序比较）
    pub fn new(pipeline: &'a PipelineConfig) -> Self {
        Self { pipeline }
    }

    /// 排序作业列表
    ///
    /// 排序键:
    /// 1) priority rank 升序 (URGENT 优先)
    /// 2) deadline 升序 (早交期优先)
    /// 3) 工序在流水线中的位置升序
    /// 4) 输入顺序 (稳定排序保证)
    pub fn sort<'j>(&self, mut jobs: Vec<&'j Job>) -> Vec<&'j Job> {
        jobs.sort_by(|a, b| self.compare(a, b));
        jobs
    }

    /// 比较两个作业的处理顺序
    pub fn compare(&self, a: &Job, b: &Job) -> Ordering {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| a.deadline.cmp(&b.deadline))
            .then_with(|| {
                self.pipeline
                    .stage_index(a.current_stage.pipeline_stage())
                    .cmp(&self.pipeline.stage_index(b.current_stage.pipeline_stage()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{JobStage, JobStatus, Priority};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn job(id: &str, priority: Priority, deadline_days: i64, stage: JobStage) -> Job {
        let base = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        Job {
            id: id.to_string(),
            order_id: format!("ORD-{}", id),
            client_name: "ACME".to_string(),
            garment_type: "T-SHIRT".to_string(),
            quantity: 100,
            priority,
            deadline: base + Duration::days(deadline_days),
            estimated_hours: 4.0,
            required_skills: BTreeSet::from(["CUTTING".to_string()]),
            current_stage: stage,
            status: JobStatus::Pending,
            dependencies: Vec::new(),
        }
    }

    fn ids(jobs: &[&Job]) -> Vec<String> {
        jobs.iter().map(|j| j.id.clone()).collect()
    }

    #[test]
    fn test_priority_before_deadline() {
        let pipeline = PipelineConfig::default();
        let sorter = JobPrioritySorter::new(&pipeline);
        let low = job("J1", Priority::Low, 1, JobStage::Cutting);
        let urgent = job("J2", Priority::Urgent, 10, JobStage::Cutting);
        let high = job("J3", Priority::High, 5, JobStage::Cutting);

        let sorted = sorter.sort(vec![&low, &urgent, &high]);
        assert_eq!(ids(&sorted), vec!["J2", "J3", "J1"]);
    }

    #[test]
    fn test_deadline_then_stage_then_input_order() {
        let pipeline = PipelineConfig::default();
        let sorter = JobPrioritySorter::new(&pipeline);
        let late = job("J1", Priority::Medium, 6, JobStage::Cutting);
        let sewing = job("J2", Priority::Medium, 3, JobStage::Sewing);
        let cutting = job("J3", Priority::Medium, 3, JobStage::Cutting);
        let cutting_twin = job("J4", Priority::Medium, 3, JobStage::Cutting);

        let sorted = sorter.sort(vec![&late, &sewing, &cutting, &cutting_twin]);
        assert_eq!(ids(&sorted), vec!["J3", "J4", "J2", "J1"]);
    }
}
