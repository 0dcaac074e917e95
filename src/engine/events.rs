// ==========================================
// 服装生产排程系统 - 引擎层事件发布
// ==========================================
// 职责: 定义生产告警事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，通知层（不在本 crate）实现适配器
// ==========================================

use crate::domain::types::Severity;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 告警事件类型
// ==========================================

/// 生产智能告警类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntelligenceEventType {
    /// 已排但预计超交期
    JobAtRisk,
    /// 作业未能排程
    JobUnscheduled,
    /// 检测到瓶颈工位
    BottleneckDetected,
    /// 不良率需升级质量管控
    QualityEscalation,
}

impl IntelligenceEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            IntelligenceEventType::JobAtRisk => "JOB_AT_RISK",
            IntelligenceEventType::JobUnscheduled => "JOB_UNSCHEDULED",
            IntelligenceEventType::BottleneckDetected => "BOTTLENECK_DETECTED",
            IntelligenceEventType::QualityEscalation => "QUALITY_ESCALATION",
        }
    }
}

/// 生产智能告警事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceEvent {
    /// 请求 ID（与 tracing span 一致）
    pub request_id: String,
    pub event_type: IntelligenceEventType,
    /// 作业 ID 或工位 ID
    pub subject_id: String,
    pub severity: Severity,
    pub message: String,
}

impl IntelligenceEvent {
    pub fn new(
        request_id: impl Into<String>,
        event_type: IntelligenceEventType,
        subject_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            event_type,
            subject_id: subject_id.into(),
            severity,
            message: message.into(),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 告警事件发布者 Trait
///
/// # 返回
/// - `Ok(task_id)`: 任务 ID（如果支持）或空字符串
/// - `Err`: 发布失败（调用方记录告警，不影响计算结果）
pub trait IntelligenceEventPublisher: Send + Sync {
    fn publish(&self, event: IntelligenceEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl IntelligenceEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: IntelligenceEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - request_id={}, event_type={}, subject={}",
            event.request_id,
            event.event_type.as_str(),
            event.subject_id
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn IntelligenceEventPublisher>> 的使用
#[derive(Clone, Default)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn IntelligenceEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn IntelligenceEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(
        &self,
        event: IntelligenceEvent,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => Ok(String::new()),
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}
