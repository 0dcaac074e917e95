// ==========================================
// 服装生产排程系统 - 领域类型定义
// ==========================================
// 职责: 优先级 / 工序 / 状态 / 资源类型等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与 ERP 接口一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 作业优先级 (Job Priority)
// ==========================================
// 排序: URGENT=0 < HIGH=1 < MEDIUM=2 < LOW=3 (rank 越小越先排)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// 排序 rank（越小越优先）
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            other => Err(format!("未知优先级: {}", other)),
        }
    }
}

// ==========================================
// 作业所处工序 (Job Stage)
// ==========================================
// 红线: 单次排程内工序只前进不回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStage {
    Cutting,
    Printing,
    Sewing,
    Finishing,
}

impl JobStage {
    /// 对应的产线工位
    pub fn pipeline_stage(&self) -> PipelineStage {
        match self {
            JobStage::Cutting => PipelineStage::Cutting,
            JobStage::Printing => PipelineStage::Printing,
            JobStage::Sewing => PipelineStage::Sewing,
            JobStage::Finishing => PipelineStage::Finishing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.pipeline_stage().as_str()
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CUTTING" => Ok(JobStage::Cutting),
            "PRINTING" => Ok(JobStage::Printing),
            "SEWING" => Ok(JobStage::Sewing),
            "FINISHING" => Ok(JobStage::Finishing),
            other => Err(format!("未知作业工序: {}", other)),
        }
    }
}

// ==========================================
// 产线工位 (Pipeline Stage)
// ==========================================
// 订单进度模型中的工位序列: CUTTING → PRINTING → SEWING → QC → FINISHING → DELIVERY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Cutting,
    Printing,
    Sewing,
    Qc,
    Finishing,
    Delivery,
}

impl PipelineStage {
    /// 默认工位顺序
    pub const DEFAULT_ORDER: [PipelineStage; 6] = [
        PipelineStage::Cutting,
        PipelineStage::Printing,
        PipelineStage::Sewing,
        PipelineStage::Qc,
        PipelineStage::Finishing,
        PipelineStage::Delivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Cutting => "CUTTING",
            PipelineStage::Printing => "PRINTING",
            PipelineStage::Sewing => "SEWING",
            PipelineStage::Qc => "QC",
            PipelineStage::Finishing => "FINISHING",
            PipelineStage::Delivery => "DELIVERY",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CUTTING" => Ok(PipelineStage::Cutting),
            "PRINTING" => Ok(PipelineStage::Printing),
            "SEWING" => Ok(PipelineStage::Sewing),
            "QC" => Ok(PipelineStage::Qc),
            "FINISHING" => Ok(PipelineStage::Finishing),
            "DELIVERY" => Ok(PipelineStage::Delivery),
            other => Err(format!("未知工位类型: {}", other)),
        }
    }
}

// ==========================================
// 作业状态 (Job Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    Scheduled,
    Completed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::InProgress => write!(f, "IN_PROGRESS"),
            JobStatus::Scheduled => write!(f, "SCHEDULED"),
            JobStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "IN_PROGRESS" => Ok(JobStatus::InProgress),
            "SCHEDULED" => Ok(JobStatus::Scheduled),
            "COMPLETED" => Ok(JobStatus::Completed),
            other => Err(format!("未知作业状态: {}", other)),
        }
    }
}

// ==========================================
// 资源类型 (Resource Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Operator,
    Machine,
    Station,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Operator => write!(f, "OPERATOR"),
            ResourceType::Machine => write!(f, "MACHINE"),
            ResourceType::Station => write!(f, "STATION"),
        }
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OPERATOR" => Ok(ResourceType::Operator),
            "MACHINE" => Ok(ResourceType::Machine),
            "STATION" => Ok(ResourceType::Station),
            other => Err(format!("未知资源类型: {}", other)),
        }
    }
}

// ==========================================
// 严重程度 (Severity)
// ==========================================
// 顺序: None < Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// 按 0-100 分数划分等级
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Severity::Critical,
            s if s >= 60.0 => Severity::High,
            s if s >= 40.0 => Severity::Medium,
            s if s >= 20.0 => Severity::Low,
            _ => Severity::None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "NONE"),
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}
