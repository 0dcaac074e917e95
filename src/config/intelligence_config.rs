// ==========================================
// 服装生产排程系统 - 生产智能层配置
// ==========================================
// 职责: 排程权重、瓶颈阈值、工位顺序等可调参数
// 存储: config_kv（key='intelligence_config' 整体 JSON + 点分 key 单项覆写）
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::bottleneck::OptimalThroughputMode;
use crate::domain::types::{JobStage, PipelineStage, ResourceType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 可视排程周期上限（天），台账按天为每个资源预分配
pub const MAX_HORIZON_DAYS: u32 = 366;

/// 生产智能层配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelligenceConfig {
    pub optimizer: OptimizerConfig,
    pub detector: DetectorConfig,
    pub pipeline: PipelineConfig,
}

// ==========================================
// 排程优化器配置
// ==========================================

/// 技能匹配口径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillMatchMode {
    /// 与所需技能有交集即可
    #[default]
    Any,
    /// 必须覆盖全部所需技能
    All,
}

/// 优化得分权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationWeights {
    pub on_time: f64,
    pub utilization: f64,
    pub waste: f64,
}

impl Default for OptimizationWeights {
    fn default() -> Self {
        Self {
            on_time: 0.4,
            utilization: 0.3,
            waste: 0.3,
        }
    }
}

/// 工序可用资源类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResourceRule {
    pub stage: JobStage,
    pub resource_types: Vec<ResourceType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// 可视排程周期（天）
    pub horizon_days: u32,
    pub skill_match: SkillMatchMode,
    pub weights: OptimizationWeights,
    /// 低利用率建议阈值 (%)
    pub low_utilization_threshold: f64,
    /// 高利用率建议阈值 (%)
    pub high_utilization_threshold: f64,
    /// 准时率低于该值时建议复核交期 (%)
    pub on_time_rate_warning: f64,
    /// 高严重度冲突数超过该值时告警
    pub high_severity_conflict_limit: usize,
    /// 闲置产能超过该值时提示可承接更多订单（小时）
    pub wasted_capacity_warning_hours: f64,
    /// 未列出的工序允许全部资源类型
    pub stage_resource_types: Vec<StageResourceRule>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            skill_match: SkillMatchMode::Any,
            weights: OptimizationWeights::default(),
            low_utilization_threshold: 50.0,
            high_utilization_threshold: 90.0,
            on_time_rate_warning: 90.0,
            high_severity_conflict_limit: 0,
            wasted_capacity_warning_hours: 200.0,
            stage_resource_types: vec![StageResourceRule {
                stage: JobStage::Finishing,
                resource_types: vec![ResourceType::Operator, ResourceType::Station],
            }],
        }
    }
}

impl OptimizerConfig {
    /// 资源类型是否可承接该工序
    pub fn is_type_compatible(&self, stage: JobStage, resource_type: ResourceType) -> bool {
        match self.stage_resource_types.iter().find(|r| r.stage == stage) {
            Some(rule) => rule.resource_types.contains(&resource_type),
            None => true,
        }
    }
}

// ==========================================
// 瓶颈检测器配置
// ==========================================

/// 瓶颈评分权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BottleneckWeights {
    pub gap: f64,
    pub queue: f64,
    pub utilization: f64,
    pub defect: f64,
}

impl Default for BottleneckWeights {
    fn default() -> Self {
        Self {
            gap: 0.4,
            queue: 0.25,
            utilization: 0.2,
            defect: 0.15,
        }
    }
}

/// 根因判定阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootCauseThresholds {
    /// 吞吐缺口分 > 该值视为 LOW_THROUGHPUT
    pub gap_score: f64,
    /// 吞吐缺口达到该值时 LOW_THROUGHPUT 置信度为 100
    pub throughput_loss_critical: f64,
    /// 排队件数 > 该值视为 QUEUE_BUILDUP
    pub queue_length: u32,
    pub queue_length_critical: u32,
    /// 等待分钟 > 该值视为 EXCESSIVE_WAIT_TIME
    pub wait_time_minutes: f64,
    pub wait_time_critical_minutes: f64,
    /// 利用率 < 该值视为 UNDER_UTILIZATION
    pub utilization_low: f64,
    /// 利用率 > 该值视为 OVER_UTILIZATION
    pub utilization_high: f64,
    /// 不良率 > 该值视为 HIGH_DEFECT_RATE
    pub defect_rate: f64,
    pub defect_rate_critical: f64,
}

impl Default for RootCauseThresholds {
    fn default() -> Self {
        Self {
            gap_score: 20.0,
            throughput_loss_critical: 40.0,
            queue_length: 10,
            queue_length_critical: 30,
            wait_time_minutes: 30.0,
            wait_time_critical_minutes: 120.0,
            utilization_low: 60.0,
            utilization_high: 95.0,
            defect_rate: 5.0,
            defect_rate_critical: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// 瓶颈判定阈值 (score > threshold)
    pub bottleneck_threshold: f64,
    pub weights: BottleneckWeights,
    pub optimal_throughput_mode: OptimalThroughputMode,
    /// 每小时等待对应的排队分
    pub queue_score_per_wait_hour: f64,
    pub root_causes: RootCauseThresholds,
    /// 高吞吐缺口分（建议: 需求再平衡）
    pub high_gap_score: f64,
    /// 高排队分（建议: 批量/加班次）
    pub high_queue_score: f64,
    /// 高不良分（建议: 质量升级）
    pub high_defect_score: f64,
    /// 每单平均件数（估算受影响订单）
    pub units_per_order: u32,
    /// 每延误小时成本（计算 cost_impact）
    pub cost_per_delay_hour: f64,
    /// 多瓶颈告警数量
    pub multiple_bottleneck_count: usize,
    /// 效率损失告警 (%)
    pub efficiency_loss_warning: f64,
    /// 趋势判定容差 (百分点)
    pub trend_tolerance: f64,
    /// 趋势近期窗口（快照数）
    pub trend_recent_window: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            bottleneck_threshold: 50.0,
            weights: BottleneckWeights::default(),
            optimal_throughput_mode: OptimalThroughputMode::Mean,
            queue_score_per_wait_hour: 20.0,
            root_causes: RootCauseThresholds::default(),
            high_gap_score: 50.0,
            high_queue_score: 50.0,
            high_defect_score: 10.0,
            units_per_order: 100,
            cost_per_delay_hour: 5000.0,
            multiple_bottleneck_count: 3,
            efficiency_loss_warning: 30.0,
            trend_tolerance: 5.0,
            trend_recent_window: 3,
        }
    }
}

// ==========================================
// 产线配置
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 工位顺序
    pub stage_order: Vec<PipelineStage>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_order: PipelineStage::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl PipelineConfig {
    /// 工位在产线中的序号（未配置的排在最后）
    pub fn stage_index(&self, stage: PipelineStage) -> usize {
        self.stage_order
            .iter()
            .position(|s| *s == stage)
            .unwrap_or(self.stage_order.len())
    }
}

// ==========================================
// 加载 / 校验
// ==========================================

impl IntelligenceConfig {
    /// 从 JSON 字符串解析（缺省字段取默认值）
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: IntelligenceConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// 应用点分 key 覆写，例如 `detector.bottleneck_threshold = 60`
    ///
    /// 值优先按 JSON 解析，失败时按字符串处理
    pub fn apply_override(&mut self, key: &str, raw_value: &str) -> ConfigResult<()> {
        let mut root = serde_json::to_value(&*self)?;
        let value = serde_json::from_str::<serde_json::Value>(raw_value)
            .unwrap_or_else(|_| serde_json::Value::String(raw_value.to_string()));

        let pointer = format!("/{}", key.trim().replace('.', "/"));
        let slot = root
            .pointer_mut(&pointer)
            .ok_or_else(|| ConfigError::ValueError {
                key: key.to_string(),
                value: raw_value.to_string(),
                message: "未知配置项".to_string(),
            })?;
        *slot = value;

        let updated: IntelligenceConfig =
            serde_json::from_value(root).map_err(|e| ConfigError::ValueError {
                key: key.to_string(),
                value: raw_value.to_string(),
                message: e.to_string(),
            })?;
        *self = updated;
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> ConfigResult<()> {
        let o = &self.optimizer;
        if o.horizon_days == 0 || o.horizon_days > MAX_HORIZON_DAYS {
            return Err(ConfigError::ValidationError(format!(
                "optimizer.horizon_days 必须在 1..={} 之间: {}",
                MAX_HORIZON_DAYS, o.horizon_days
            )));
        }
        let ow = &o.weights;
        check_weights("optimizer.weights", &[ow.on_time, ow.utilization, ow.waste])?;
        check_percent("optimizer.low_utilization_threshold", o.low_utilization_threshold)?;
        check_percent("optimizer.high_utilization_threshold", o.high_utilization_threshold)?;
        check_percent("optimizer.on_time_rate_warning", o.on_time_rate_warning)?;
        if !o.wasted_capacity_warning_hours.is_finite() || o.wasted_capacity_warning_hours < 0.0 {
            return Err(ConfigError::ValidationError(
                "optimizer.wasted_capacity_warning_hours 不能为负".to_string(),
            ));
        }

        let d = &self.detector;
        check_percent("detector.bottleneck_threshold", d.bottleneck_threshold)?;
        let dw = &d.weights;
        check_weights(
            "detector.weights",
            &[dw.gap, dw.queue, dw.utilization, dw.defect],
        )?;
        if !d.queue_score_per_wait_hour.is_finite() || d.queue_score_per_wait_hour < 0.0 {
            return Err(ConfigError::ValidationError(
                "detector.queue_score_per_wait_hour 不能为负".to_string(),
            ));
        }
        if !d.cost_per_delay_hour.is_finite() || d.cost_per_delay_hour < 0.0 {
            return Err(ConfigError::ValidationError(
                "detector.cost_per_delay_hour 不能为负".to_string(),
            ));
        }
        if d.units_per_order == 0 {
            return Err(ConfigError::ValidationError(
                "detector.units_per_order 必须大于 0".to_string(),
            ));
        }
        if d.trend_recent_window == 0 {
            return Err(ConfigError::ValidationError(
                "detector.trend_recent_window 必须大于 0".to_string(),
            ));
        }

        if self.pipeline.stage_order.is_empty() {
            return Err(ConfigError::ValidationError(
                "pipeline.stage_order 不能为空".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_weights(name: &str, weights: &[f64]) -> ConfigResult<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ConfigError::ValidationError(format!(
            "{} 权重不能为负: {:?}",
            name, weights
        )));
    }
    Ok(())
}

fn check_percent(name: &str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{} 超出范围 [0, 100]: {}",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = IntelligenceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.optimizer.horizon_days, 14);
        assert_eq!(config.detector.bottleneck_threshold, 50.0);
        assert_eq!(config.pipeline.stage_order.len(), 6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = IntelligenceConfig::from_json_str(
            r#"{"detector": {"bottleneck_threshold": 65, "optimal_throughput_mode": "MAX"}}"#,
        )
        .unwrap();
        assert_eq!(config.detector.bottleneck_threshold, 65.0);
        assert_eq!(config.detector.optimal_throughput_mode, OptimalThroughputMode::Max);
        assert_eq!(config.detector.weights.gap, 0.4);
        assert_eq!(config.optimizer.weights.on_time, 0.4);
    }

    #[test]
    fn test_apply_override() {
        let mut config = IntelligenceConfig::default();
        config.apply_override("detector.weights.gap", "0.5").unwrap();
        config.apply_override("optimizer.skill_match", "ALL").unwrap();
        assert_eq!(config.detector.weights.gap, 0.5);
        assert_eq!(config.optimizer.skill_match, SkillMatchMode::All);

        assert!(config.apply_override("detector.no_such_key", "1").is_err());
        assert!(config.apply_override("optimizer.horizon_days", "\"soon\"").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = IntelligenceConfig::default();
        config.detector.weights.queue = -0.1;
        assert!(config.validate().is_err());

        let mut config = IntelligenceConfig::default();
        config.optimizer.horizon_days = 0;
        assert!(config.validate().is_err());

        let mut config = IntelligenceConfig::default();
        config.optimizer.horizon_days = MAX_HORIZON_DAYS;
        assert!(config.validate().is_ok());
        config.optimizer.horizon_days = 4_000_000_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("366")
        ));

        let mut config = IntelligenceConfig::default();
        config.optimizer.on_time_rate_warning = 120.0;
        assert!(config.validate().is_err());

        let mut config = IntelligenceConfig::default();
        config.detector.cost_per_delay_hour = -1.0;
        assert!(config.validate().is_err());

        let mut config = IntelligenceConfig::default();
        config.pipeline.stage_order.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stage_type_compatibility() {
        let config = OptimizerConfig::default();
        assert!(config.is_type_compatible(JobStage::Cutting, ResourceType::Machine));
        assert!(!config.is_type_compatible(JobStage::Finishing, ResourceType::Machine));
        assert!(config.is_type_compatible(JobStage::Finishing, ResourceType::Station));
    }

    #[test]
    fn test_stage_index() {
        let pipeline = PipelineConfig {
            stage_order: vec![PipelineStage::Cutting, PipelineStage::Sewing],
        };
        assert_eq!(pipeline.stage_index(PipelineStage::Sewing), 1);
        assert_eq!(pipeline.stage_index(PipelineStage::Qc), 2);
    }
}
