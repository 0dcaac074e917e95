// ==========================================
// 服装生产排程系统 - 生产作业实体
// ==========================================
// 职责: 一个订单在当前工序上的剩余生产工作
// 红线: current_stage 在单次排程中不回退
// ==========================================

use crate::domain::types::{JobStage, JobStatus, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 生产作业 (Job)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// 作业 ID
    pub id: String,

    /// 所属订单 ID
    pub order_id: String,

    /// 客户名称
    pub client_name: String,

    /// 款式 / 品类
    pub garment_type: String,

    /// 件数 (> 0)
    pub quantity: i64,

    /// 优先级
    pub priority: Priority,

    /// 交期
    pub deadline: DateTime<Utc>,

    /// 剩余工时 (> 0)
    pub estimated_hours: f64,

    /// 所需技能标签（非空）
    pub required_skills: BTreeSet<String>,

    /// 当前工序
    pub current_stage: JobStage,

    /// 作业状态
    pub status: JobStatus,

    /// 前置作业（必须先完工）
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Job {
    /// 校验作业数据
    ///
    /// # 返回
    /// - Ok(()): 数据合法
    /// - Err(String): 非法原因（用于 INVALID_JOB 诊断）
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("作业 ID 为空".to_string());
        }
        if self.quantity <= 0 {
            return Err(format!("件数必须大于 0: quantity={}", self.quantity));
        }
        if !self.estimated_hours.is_finite() || self.estimated_hours <= 0.0 {
            return Err(format!(
                "剩余工时必须为正数: estimated_hours={}",
                self.estimated_hours
            ));
        }
        if self.required_skills.is_empty() {
            return Err("所需技能为空".to_string());
        }
        Ok(())
    }

    /// 是否已完工
    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// 完工时间是否满足交期
    pub fn meets_deadline(&self, finish: DateTime<Utc>) -> bool {
        finish <= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_job() -> Job {
        Job {
            id: "J1".to_string(),
            order_id: "ORD-1".to_string(),
            client_name: "Reefer Apparel".to_string(),
            garment_type: "T-SHIRT".to_string(),
            quantity: 200,
            priority: Priority::High,
            deadline: Utc.with_ymd_and_hms(2026, 3, 10, 17, 0, 0).unwrap(),
            estimated_hours: 12.0,
            required_skills: ["CUTTING".to_string()].into_iter().collect(),
            current_stage: JobStage::Cutting,
            status: JobStatus::Pending,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_job().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_hours_and_quantity() {
        let mut job = sample_job();
        job.estimated_hours = 0.0;
        assert!(job.validate().is_err());

        let mut job = sample_job();
        job.estimated_hours = f64::NAN;
        assert!(job.validate().is_err());

        let mut job = sample_job();
        job.quantity = 0;
        assert!(job.validate().is_err());

        let mut job = sample_job();
        job.quantity = -5;
        assert!(job.validate().is_err());

        let mut job = sample_job();
        job.required_skills.clear();
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_dependencies_default_on_deserialize() {
        let json = r#"{
            "id": "J9", "order_id": "O9", "client_name": "c", "garment_type": "POLO",
            "quantity": 10, "priority": "LOW", "deadline": "2026-03-01T00:00:00Z",
            "estimated_hours": 4.0, "required_skills": ["SEWING"],
            "current_stage": "SEWING", "status": "PENDING"
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert!(job.dependencies.is_empty());
        assert_eq!(job.current_stage, JobStage::Sewing);
    }
}
