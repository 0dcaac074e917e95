// ==========================================
// 服装生产排程系统 - 生产资源实体
// ==========================================
// 职责: 操作工 / 设备 / 工作站
// 红线: 单日有效空闲产能 = 日产能 × (1 - 已用率) × 效率，下限 0
// ==========================================

use crate::domain::types::ResourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 单日产能上限（小时）
pub const MAX_HOURS_PER_DAY: f64 = 24.0;

/// 生产资源 (Resource)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// 资源 ID
    pub id: String,

    /// 资源名称
    pub name: String,

    /// 资源类型
    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    /// 技能标签
    pub skills: BTreeSet<String>,

    /// 日产能（小时, > 0）
    pub capacity_hours_per_day: f64,

    /// 已承诺比例 (0-100)
    pub current_utilization: f64,

    /// 效率评级 (0-100)
    pub efficiency_rating: f64,
}

impl Resource {
    /// 校验资源数据
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("资源 ID 为空".to_string());
        }
        if !self.capacity_hours_per_day.is_finite()
            || self.capacity_hours_per_day <= 0.0
            || self.capacity_hours_per_day > MAX_HOURS_PER_DAY
        {
            return Err(format!(
                "日产能超出范围 (0, 24]: capacity_hours_per_day={}",
                self.capacity_hours_per_day
            ));
        }
        if !is_percent(self.current_utilization) {
            return Err(format!(
                "已用率超出范围 [0, 100]: current_utilization={}",
                self.current_utilization
            ));
        }
        if !is_percent(self.efficiency_rating) {
            return Err(format!(
                "效率评级超出范围 [0, 100]: efficiency_rating={}",
                self.efficiency_rating
            ));
        }
        Ok(())
    }

    /// 单日有效产能（效率折算后，不扣除已用率）
    pub fn effective_daily_capacity(&self) -> f64 {
        (self.capacity_hours_per_day * self.efficiency_rating / 100.0).max(0.0)
    }

    /// 单日有效空闲产能
    pub fn effective_free_capacity_per_day(&self) -> f64 {
        (self.capacity_hours_per_day
            * (1.0 - self.current_utilization / 100.0)
            * (self.efficiency_rating / 100.0))
            .max(0.0)
    }

    /// 技能是否与需求有交集
    pub fn has_any_skill(&self, required: &BTreeSet<String>) -> bool {
        required.iter().any(|s| self.skills.contains(s))
    }

    /// 技能是否覆盖全部需求
    pub fn has_all_skills(&self, required: &BTreeSet<String>) -> bool {
        required.iter().all(|s| self.skills.contains(s))
    }
}

fn is_percent(v: f64) -> bool {
    v.is_finite() && (0.0..=100.0).contains(&v)
}
