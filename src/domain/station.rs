// ==========================================
// 服装生产排程系统 - 工位快照
// ==========================================
// 职责: 单个产线工位的时点指标（吞吐、排队、利用率、不良率）
// 说明: 每种工位一个构造入口，统一经 StationMetricBuilder 生成
// ==========================================

use crate::domain::types::PipelineStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 工位快照 (StationMetric)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationMetric {
    /// 工位 ID
    pub station_id: String,

    /// 工位名称
    pub station_name: String,

    /// 工位类型（产线工序）
    pub station_type: PipelineStage,

    /// 当前吞吐（件/小时）
    pub current_throughput: f64,

    /// 期望吞吐（件/小时）
    pub expected_throughput: f64,

    /// 排队件数（None = 无排队数据）
    #[serde(default)]
    pub queue_length: Option<u32>,

    /// 平均等待时长（分钟）
    pub avg_wait_time_minutes: f64,

    /// 利用率 (0-100)
    pub utilization_rate: f64,

    /// 编制人数
    pub operator_count: u32,

    /// 在岗人数
    pub active_operators: u32,

    /// 不良率 (0-100)
    pub defect_rate: f64,

    /// 快照时间
    pub timestamp: DateTime<Utc>,
}

impl StationMetric {
    /// 通用构造入口
    pub fn builder(
        station_id: impl Into<String>,
        station_name: impl Into<String>,
        station_type: PipelineStage,
    ) -> StationMetricBuilder {
        StationMetricBuilder::new(station_id.into(), station_name.into(), station_type)
    }

    /// 裁剪工位
    pub fn cutting(
        station_id: impl Into<String>,
        station_name: impl Into<String>,
    ) -> StationMetricBuilder {
        Self::builder(station_id, station_name, PipelineStage::Cutting)
    }

    /// 印花工位
    pub fn printing(
        station_id: impl Into<String>,
        station_name: impl Into<String>,
    ) -> StationMetricBuilder {
        Self::builder(station_id, station_name, PipelineStage::Printing)
    }

    /// 缝制工位
    pub fn sewing(
        station_id: impl Into<String>,
        station_name: impl Into<String>,
    ) -> StationMetricBuilder {
        Self::builder(station_id, station_name, PipelineStage::Sewing)
    }

    /// 质检工位
    pub fn qc(
        station_id: impl Into<String>,
        station_name: impl Into<String>,
    ) -> StationMetricBuilder {
        Self::builder(station_id, station_name, PipelineStage::Qc)
    }

    /// 后整工位
    pub fn finishing(
        station_id: impl Into<String>,
        station_name: impl Into<String>,
    ) -> StationMetricBuilder {
        Self::builder(station_id, station_name, PipelineStage::Finishing)
    }

    /// 发货工位
    pub fn delivery(
        station_id: impl Into<String>,
        station_name: impl Into<String>,
    ) -> StationMetricBuilder {
        Self::builder(station_id, station_name, PipelineStage::Delivery)
    }

    /// 校验快照数据
    ///
    /// # 返回
    /// - Err(String): 跳过原因
    pub fn validate(&self) -> Result<(), String> {
        if !self.expected_throughput.is_finite() || self.expected_throughput <= 0.0 {
            return Err(format!(
                "期望吞吐必须为正数: expected_throughput={}",
                self.expected_throughput
            ));
        }
        if !self.current_throughput.is_finite() || self.current_throughput < 0.0 {
            return Err(format!(
                "当前吞吐不能为负: current_throughput={}",
                self.current_throughput
            ));
        }
        if !self.avg_wait_time_minutes.is_finite() || self.avg_wait_time_minutes < 0.0 {
            return Err(format!(
                "平均等待时长不能为负: avg_wait_time_minutes={}",
                self.avg_wait_time_minutes
            ));
        }
        for (field, value) in [
            ("utilization_rate", self.utilization_rate),
            ("defect_rate", self.defect_rate),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(format!("{} 超出范围 [0, 100]: {}", field, value));
            }
        }
        Ok(())
    }

    /// 缺员人数
    pub fn operator_shortage(&self) -> u32 {
        self.operator_count.saturating_sub(self.active_operators)
    }
}

// ==========================================
// StationMetricBuilder - 工位快照构建器
// ==========================================
#[derive(Debug, Clone)]
pub struct StationMetricBuilder {
    metric: StationMetric,
}

impl StationMetricBuilder {
    fn new(station_id: String, station_name: String, station_type: PipelineStage) -> Self {
        Self {
            metric: StationMetric {
                station_id,
                station_name,
                station_type,
                current_throughput: 0.0,
                expected_throughput: 0.0,
                queue_length: None,
                avg_wait_time_minutes: 0.0,
                utilization_rate: 0.0,
                operator_count: 0,
                active_operators: 0,
                defect_rate: 0.0,
                timestamp: DateTime::<Utc>::UNIX_EPOCH,
            },
        }
    }

    pub fn throughput(mut self, current: f64, expected: f64) -> Self {
        self.metric.current_throughput = current;
        self.metric.expected_throughput = expected;
        self
    }

    pub fn queue(mut self, queue_length: u32, avg_wait_time_minutes: f64) -> Self {
        self.metric.queue_length = Some(queue_length);
        self.metric.avg_wait_time_minutes = avg_wait_time_minutes;
        self
    }

    pub fn wait_time(mut self, avg_wait_time_minutes: f64) -> Self {
        self.metric.avg_wait_time_minutes = avg_wait_time_minutes;
        self
    }

    pub fn utilization(mut self, utilization_rate: f64) -> Self {
        self.metric.utilization_rate = utilization_rate;
        self
    }

    pub fn operators(mut self, operator_count: u32, active_operators: u32) -> Self {
        self.metric.operator_count = operator_count;
        self.metric.active_operators = active_operators;
        self
    }

    pub fn defect_rate(mut self, defect_rate: f64) -> Self {
        self.metric.defect_rate = defect_rate;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.metric.timestamp = timestamp;
        self
    }

    pub fn build(self) -> StationMetric {
        self.metric
    }
}
