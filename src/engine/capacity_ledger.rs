// ==========================================
// 服装生产排程系统 - 资源产能台账
// ==========================================
// 红线: 单日已占用工时不得超过 capacity_hours_per_day * efficiency/100
// ==========================================
// 职责: 每资源每日的产能台账 + 连续块放置搜索
// 时间模型: 第 d 天起点 = horizon_start + d 天；
//           日内偏移以小时计，从 0 到日产能 C
// 预占: 每日开始即预占 C * current_utilization/100
// ==========================================

use crate::domain::resource::Resource;
use chrono::{DateTime, Duration, Utc};

/// 工时比较容差
pub const HOURS_EPSILON: f64 = 1e-9;

const HOURS_PER_DAY: f64 = 24.0;

/// 单日台账
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySlot {
    /// 日产能 C
    pub capacity: f64,
    /// 预占工时（现有负荷）
    pub pre_committed: f64,
    /// 本次排程已占用工时
    pub committed: f64,
    /// 下一可用日内偏移
    pub cursor: f64,
}

impl DaySlot {
    fn new(capacity: f64, utilization: f64) -> Self {
        let pre_committed = (capacity * utilization / 100.0).clamp(0.0, capacity);
        Self {
            capacity,
            pre_committed,
            committed: 0.0,
            cursor: pre_committed,
        }
    }

    /// 当日可供本次排程的工时
    pub fn available(&self) -> f64 {
        (self.capacity - self.pre_committed).max(0.0)
    }

    /// 当日总占用（预占 + 本次排程）
    pub fn total_committed(&self) -> f64 {
        self.pre_committed + self.committed
    }
}

/// 放置片段（某一天上的一段连续工时）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub day: u32,
    pub start_offset: f64,
    pub hours: f64,
}

/// 候选放置方案
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub segments: Vec<Segment>,
    /// 开工时刻（相对 horizon_start 的小时数）
    pub start_hours: f64,
    /// 完工时刻（相对 horizon_start 的小时数）
    pub finish_hours: f64,
    /// 放置工时合计
    pub work_hours: f64,
}

// ==========================================
// ResourceLedger - 单资源台账
// ==========================================
#[derive(Debug, Clone)]
pub struct ResourceLedger {
    pub resource_id: String,
    pub resource_name: String,
    days: Vec<DaySlot>,
}

impl ResourceLedger {
    pub fn new(resource: &Resource, horizon_days: u32) -> Self {
        let capacity = resource.effective_daily_capacity();
        let slot = DaySlot::new(capacity, resource.current_utilization);
        Self {
            resource_id: resource.id.clone(),
            resource_name: resource.name.clone(),
            days: vec![slot; horizon_days as usize],
        }
    }

    pub fn days(&self) -> &[DaySlot] {
        &self.days
    }

    /// 周期内可用工时（扣除预占）
    pub fn available_hours(&self) -> f64 {
        self.days.iter().map(DaySlot::available).sum()
    }

    /// 本次排程占用工时
    pub fn committed_hours(&self) -> f64 {
        self.days.iter().map(|d| d.committed).sum()
    }

    /// 利用率（可用为 0 时视为 100）
    pub fn utilization_percent(&self) -> f64 {
        self.utilization_with(0.0)
    }

    /// 追加 extra 工时后的利用率
    pub fn utilization_with(&self, extra_hours: f64) -> f64 {
        let available = self.available_hours();
        if available <= HOURS_EPSILON {
            return 100.0;
        }
        ((self.committed_hours() + extra_hours) / available * 100.0).clamp(0.0, 100.0)
    }

    /// 搜索连续块放置
    ///
    /// 规则:
    /// 1) 从 earliest_offset 所在日开始，起点取 max(cursor, 日内偏移)
    /// 2) 按天向后消耗空闲工时，满载日跳过（作业暂停）
    /// 3) 一旦开工，不跳过任何仍有空闲的日子
    /// 4) 周期内放不下 → None
    pub fn find_placement(&self, work_hours: f64, earliest_offset: f64) -> Option<Placement> {
        if work_hours <= 0.0 || !work_hours.is_finite() {
            return None;
        }

        let earliest_offset = earliest_offset.max(0.0);
        let start_day = (earliest_offset / HOURS_PER_DAY).floor() as usize;
        let in_day_offset = earliest_offset - start_day as f64 * HOURS_PER_DAY;

        let mut remaining = work_hours;
        let mut segments = Vec::new();

        for (day, slot) in self.days.iter().enumerate().skip(start_day) {
            let start = if day == start_day {
                slot.cursor.max(in_day_offset)
            } else {
                slot.cursor
            };
            let free = slot.capacity - start;
            if free <= HOURS_EPSILON {
                continue;
            }

            let take = free.min(remaining);
            segments.push(Segment {
                day: day as u32,
                start_offset: start,
                hours: take,
            });
            remaining -= take;

            if remaining <= HOURS_EPSILON {
                let first = segments[0];
                return Some(Placement {
                    start_hours: first.day as f64 * HOURS_PER_DAY + first.start_offset,
                    finish_hours: day as f64 * HOURS_PER_DAY + start + take,
                    work_hours,
                    segments,
                });
            }
        }

        None
    }

    /// 提交放置方案
    pub fn commit(&mut self, placement: &Placement) {
        for seg in &placement.segments {
            if let Some(slot) = self.days.get_mut(seg.day as usize) {
                slot.committed += seg.hours;
                slot.cursor = (seg.start_offset + seg.hours).min(slot.capacity);
            }
        }
    }
}

// ==========================================
// CapacityLedger - 资源池台账
// ==========================================
#[derive(Debug, Clone)]
pub struct CapacityLedger {
    ledgers: Vec<ResourceLedger>,
}

impl CapacityLedger {
    /// 按资源池顺序建账
    pub fn new(resources: &[&Resource], horizon_days: u32) -> Self {
        Self {
            ledgers: resources
                .iter()
                .map(|r| ResourceLedger::new(r, horizon_days))
                .collect(),
        }
    }

    pub fn get(&self, idx: usize) -> Option<&ResourceLedger> {
        self.ledgers.get(idx)
    }

    pub fn commit(&mut self, idx: usize, placement: &Placement) {
        if let Some(ledger) = self.ledgers.get_mut(idx) {
            ledger.commit(placement);
        }
    }

    pub fn ledgers(&self) -> &[ResourceLedger] {
        &self.ledgers
    }
}

/// 相对小时数 → 绝对时间
pub fn offset_to_time(horizon_start: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    horizon_start + Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// 绝对时间 → 相对小时数（早于起点时取 0）
pub fn time_to_offset(horizon_start: DateTime<Utc>, time: DateTime<Utc>) -> f64 {
    ((time - horizon_start).num_milliseconds() as f64 / 3_600_000.0).max(0.0)
}
