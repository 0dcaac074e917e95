// ==========================================
// 服装生产排程系统 - 排程结果对象
// ==========================================
// 职责: 排程优化器的输出（分配、诊断、冲突、指标）
// 红线: ScheduleAssignment 仅由优化器创建，产出后不可变
// 红线: scheduled_jobs + unscheduled_jobs.len() == total_jobs
// ==========================================

use crate::domain::types::{JobStage, Priority, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 作业-资源分配
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub job_id: String,
    pub order_id: String,
    pub resource_id: String,
    pub resource_name: String,
    pub stage: JobStage,
    pub priority: Priority,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// 占用工时
    pub duration_hours: f64,
    /// 是否满足交期
    pub on_time: bool,
}

/// 未排原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnscheduledReason {
    /// 资源池为空
    NoResources,
    /// 无技能/类型匹配的资源
    NoSkillMatch,
    /// 可视周期内产能不足
    CapacityExceeded,
    /// 作业数据非法
    InvalidJob,
    /// 作业已完工
    AlreadyCompleted,
}

impl UnscheduledReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnscheduledReason::NoResources => "NO_RESOURCES",
            UnscheduledReason::NoSkillMatch => "NO_SKILL_MATCH",
            UnscheduledReason::CapacityExceeded => "CAPACITY_EXCEEDED",
            UnscheduledReason::InvalidJob => "INVALID_JOB",
            UnscheduledReason::AlreadyCompleted => "ALREADY_COMPLETED",
        }
    }
}

impl fmt::Display for UnscheduledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 未排作业诊断
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnscheduledJob {
    pub job_id: String,
    pub reason: UnscheduledReason,
    /// 明细说明
    pub detail: String,
}

/// 冲突类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictReason {
    /// 已排但预计超交期
    AtRisk,
    /// 前置作业未排
    DependencyUnmet,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::AtRisk => write!(f, "AT_RISK"),
            ConflictReason::DependencyUnmet => write!(f, "DEPENDENCY_UNMET"),
        }
    }
}

/// 排程冲突
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub resource_id: String,
    pub job_ids: Vec<String>,
    pub reason: ConflictReason,
    pub severity: Severity,
    pub description: String,
}

/// 排程指标
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMetrics {
    /// 平均资源利用率 (0-100)
    pub avg_resource_utilization: f64,
    /// 准时完工率 (0-100)
    pub on_time_completion_rate: f64,
    /// 总工期（小时）
    pub total_makespan_hours: f64,
    /// 闲置产能（小时）
    pub wasted_capacity_hours: f64,
}

/// 单资源负荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLoad {
    pub resource_id: String,
    pub resource_name: String,
    /// 本次排程承诺工时
    pub committed_hours: f64,
    /// 周期内可用工时
    pub available_hours: f64,
    /// 利用率 (0-100)
    pub utilization_percent: f64,
}

/// 排程结果 (Schedule)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub horizon_start: DateTime<Utc>,
    pub horizon_days: u32,
    pub assignments: Vec<ScheduleAssignment>,
    pub total_jobs: usize,
    pub scheduled_jobs: usize,
    pub unscheduled_jobs: Vec<UnscheduledJob>,
    /// 优化得分 (0-100)
    pub optimization_score: f64,
    pub metrics: ScheduleMetrics,
    pub resource_loads: Vec<ResourceLoad>,
    pub recommendations: Vec<String>,
    pub conflicts: Vec<ScheduleConflict>,
}

impl Schedule {
    /// 空排程（无作业）
    pub fn empty(horizon_start: DateTime<Utc>, horizon_days: u32) -> Self {
        Self {
            horizon_start,
            horizon_days,
            assignments: Vec::new(),
            total_jobs: 0,
            scheduled_jobs: 0,
            unscheduled_jobs: Vec::new(),
            optimization_score: 100.0,
            metrics: ScheduleMetrics {
                on_time_completion_rate: 100.0,
                ..ScheduleMetrics::default()
            },
            resource_loads: Vec::new(),
            recommendations: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// 按作业 ID 查找分配
    pub fn assignment_for(&self, job_id: &str) -> Option<&ScheduleAssignment> {
        self.assignments.iter().find(|a| a.job_id == job_id)
    }

    /// 按作业 ID 查找未排诊断
    pub fn unscheduled_for(&self, job_id: &str) -> Option<&UnscheduledJob> {
        self.unscheduled_jobs.iter().find(|u| u.job_id == job_id)
    }

    /// 是否存在指定原因的未排作业
    pub fn has_unscheduled_reason(&self, reason: UnscheduledReason) -> bool {
        self.unscheduled_jobs.iter().any(|u| u.reason == reason)
    }

    /// 预计超交期的冲突
    pub fn at_risk_conflicts(&self) -> impl Iterator<Item = &ScheduleConflict> {
        self.conflicts
            .iter()
            .filter(|c| c.reason == ConflictReason::AtRisk)
    }
}
