// ==========================================
// 服装生产排程系统 - 字段映射器
// ==========================================
// 职责: 源列名 → 领域字段映射 + 类型转换
// 列名匹配: 忽略大小写、空格、下划线、连字符；支持中英文别名
// ==========================================

use crate::domain::job::Job;
use crate::domain::resource::Resource;
use crate::domain::station::StationMetric;
use crate::domain::types::{JobStage, JobStatus, PipelineStage, Priority, ResourceType};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeSet;
use std::str::FromStr;

pub struct FieldMapper;

impl FieldMapper {
    // ==========================================
    // 作业
    // ==========================================

    pub fn map_job(&self, record: &RawRecord) -> ImportResult<Job> {
        Ok(Job {
            id: self.require_string(record, "job_id")?,
            order_id: self.get_string(record, "order_id").unwrap_or_default(),
            client_name: self.get_string(record, "client_name").unwrap_or_default(),
            garment_type: self.get_string(record, "garment_type").unwrap_or_default(),
            quantity: self.parse_number::<i64>(record, "quantity")?.unwrap_or(0),
            priority: self
                .parse_enum::<Priority>(record, "priority")?
                .unwrap_or(Priority::Medium),
            deadline: self.require_datetime(record, "deadline")?,
            estimated_hours: self.require_number::<f64>(record, "estimated_hours")?,
            required_skills: self.parse_list(record, "required_skills").into_iter().collect(),
            current_stage: self
                .parse_enum::<JobStage>(record, "current_stage")?
                .unwrap_or(JobStage::Cutting),
            status: self
                .parse_enum::<JobStatus>(record, "status")?
                .unwrap_or(JobStatus::Pending),
            dependencies: self.parse_list(record, "dependencies"),
        })
    }

    // ==========================================
    // 资源
    // ==========================================

    pub fn map_resource(&self, record: &RawRecord) -> ImportResult<Resource> {
        let id = self.require_string(record, "resource_id")?;
        Ok(Resource {
            name: self.get_string(record, "name").unwrap_or_else(|| id.clone()),
            id,
            resource_type: self
                .parse_enum::<ResourceType>(record, "resource_type")?
                .unwrap_or(ResourceType::Operator),
            skills: self
                .parse_list(record, "skills")
                .into_iter()
                .collect::<BTreeSet<_>>(),
            capacity_hours_per_day: self.require_number::<f64>(record, "capacity_hours_per_day")?,
            current_utilization: self
                .parse_number::<f64>(record, "current_utilization")?
                .unwrap_or(0.0),
            efficiency_rating: self
                .parse_number::<f64>(record, "efficiency_rating")?
                .unwrap_or(100.0),
        })
    }

    // ==========================================
    // 工位快照
    // ==========================================

    pub fn map_station_metric(&self, record: &RawRecord) -> ImportResult<StationMetric> {
        let station_id = self.require_string(record, "station_id")?;
        let station_type = self
            .parse_enum::<PipelineStage>(record, "station_type")?
            .ok_or_else(|| ImportError::MissingField {
                row: record.row_number,
                field: "station_type".to_string(),
            })?;
        let station_name = self
            .get_string(record, "station_name")
            .unwrap_or_else(|| station_id.clone());

        let wait = self
            .parse_number::<f64>(record, "avg_wait_time_minutes")?
            .unwrap_or(0.0);

        let mut builder = StationMetric::builder(station_id, station_name, station_type)
            .throughput(
                self.require_number::<f64>(record, "current_throughput")?,
                self.require_number::<f64>(record, "expected_throughput")?,
            )
            .wait_time(wait)
            .utilization(self.parse_number::<f64>(record, "utilization_rate")?.unwrap_or(0.0))
            .defect_rate(self.parse_number::<f64>(record, "defect_rate")?.unwrap_or(0.0));

        let operator_count = self.parse_number::<u32>(record, "operator_count")?.unwrap_or(0);
        let active_operators = self
            .parse_number::<u32>(record, "active_operators")?
            .unwrap_or(operator_count);
        builder = builder.operators(operator_count, active_operators);

        if let Some(queue_length) = self.parse_number::<u32>(record, "queue_length")? {
            builder = builder.queue(queue_length, wait);
        }
        if let Some(timestamp) = self.parse_datetime(record, "timestamp")? {
            builder = builder.at(timestamp);
        }

        Ok(builder.build())
    }

    // ==========================================
    // 字段读取
    // ==========================================

    /// 标准字段的可接受列名
    fn aliases(key: &str) -> &'static [&'static str] {
        match key {
            "job_id" => &["job_id", "id", "作业号", "作业ID"],
            "order_id" => &["order_id", "order", "订单号"],
            "client_name" => &["client_name", "client", "customer", "客户", "客户名称"],
            "garment_type" => &["garment_type", "garment", "style", "款式", "服装类型"],
            "quantity" => &["quantity", "qty", "数量"],
            "priority" => &["priority", "优先级"],
            "deadline" => &["deadline", "due_date", "交期", "交货期"],
            "estimated_hours" => &["estimated_hours", "hours", "预计工时"],
            "required_skills" => &["required_skills", "skills_required", "所需技能"],
            "current_stage" => &["current_stage", "stage", "当前工序"],
            "status" => &["status", "状态"],
            "dependencies" => &["dependencies", "depends_on", "前置作业"],
            "resource_id" => &["resource_id", "id", "资源号", "资源ID"],
            "name" => &["name", "resource_name", "名称"],
            "resource_type" => &["resource_type", "type", "资源类型"],
            "skills" => &["skills", "技能"],
            "capacity_hours_per_day" => &["capacity_hours_per_day", "capacity", "日产能工时"],
            "current_utilization" => &["current_utilization", "utilization", "当前负荷"],
            "efficiency_rating" => &["efficiency_rating", "efficiency", "效率"],
            "station_id" => &["station_id", "id", "工位号", "工位ID"],
            "station_name" => &["station_name", "name", "工位名称"],
            "station_type" => &["station_type", "type", "工位类型"],
            "current_throughput" => &["current_throughput", "throughput", "当前产出"],
            "expected_throughput" => &["expected_throughput", "target_throughput", "目标产出"],
            "queue_length" => &["queue_length", "queue", "排队数"],
            "avg_wait_time_minutes" => &[
                "avg_wait_time_minutes",
                "avg_wait_time",
                "wait_minutes",
                "平均等待分钟",
            ],
            "utilization_rate" => &["utilization_rate", "utilization", "利用率"],
            "operator_count" => &["operator_count", "operators", "定编人数"],
            "active_operators" => &["active_operators", "在岗人数"],
            "defect_rate" => &["defect_rate", "defects", "不良率"],
            "timestamp" => &["timestamp", "recorded_at", "采集时间"],
            _ => &[],
        }
    }

    fn normalize(header: &str) -> String {
        header
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// 提取字符串字段（空白视为缺失）
    fn get_string(&self, record: &RawRecord, key: &str) -> Option<String> {
        for alias in Self::aliases(key) {
            let wanted = Self::normalize(alias);
            let hit = record
                .fields
                .iter()
                .find(|(header, _)| Self::normalize(header) == wanted)
                .map(|(_, value)| value.trim());
            if let Some(value) = hit {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        None
    }

    fn require_string(&self, record: &RawRecord, key: &str) -> ImportResult<String> {
        self.get_string(record, key)
            .ok_or_else(|| ImportError::MissingField {
                row: record.row_number,
                field: key.to_string(),
            })
    }

    fn parse_number<T: FromStr>(&self, record: &RawRecord, key: &str) -> ImportResult<Option<T>> {
        match self.get_string(record, key) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| ImportError::TypeConversionError {
                    row: record.row_number,
                    field: key.to_string(),
                    message: format!("无法解析为数值: {}", value),
                }),
        }
    }

    fn require_number<T: FromStr>(&self, record: &RawRecord, key: &str) -> ImportResult<T> {
        self.parse_number(record, key)?
            .ok_or_else(|| ImportError::MissingField {
                row: record.row_number,
                field: key.to_string(),
            })
    }

    fn parse_enum<T: FromStr<Err = String>>(
        &self,
        record: &RawRecord,
        key: &str,
    ) -> ImportResult<Option<T>> {
        match self.get_string(record, key) {
            None => Ok(None),
            Some(value) => T::from_str(&value.replace([' ', '-'], "_"))
                .map(Some)
                .map_err(|message| ImportError::TypeConversionError {
                    row: record.row_number,
                    field: key.to_string(),
                    message,
                }),
        }
    }

    /// 分隔符: `;` `,` `|`
    fn parse_list(&self, record: &RawRecord, key: &str) -> Vec<String> {
        self.get_string(record, key)
            .map(|value| {
                value
                    .split([';', ',', '|'])
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 解析时间（RFC3339 → YYYY-MM-DD HH:MM:SS → YYYY-MM-DD，无时区按 UTC）
    fn parse_datetime(&self, record: &RawRecord, key: &str) -> ImportResult<Option<DateTime<Utc>>> {
        let Some(value) = self.get_string(record, key) else {
            return Ok(None);
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S") {
            return Ok(Some(naive.and_utc()));
        }
        if let Some(naive) = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(Some(naive.and_utc()));
        }

        Err(ImportError::DateFormatError {
            row: record.row_number,
            field: key.to_string(),
            value,
        })
    }

    fn require_datetime(&self, record: &RawRecord, key: &str) -> ImportResult<DateTime<Utc>> {
        self.parse_datetime(record, key)?
            .ok_or_else(|| ImportError::MissingField {
                row: record.row_number,
                field: key.to_string(),
            })
    }
}
