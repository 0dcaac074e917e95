// ==========================================
// 服装生产排程系统 - 生产快照数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: production_job / production_resource / station_metric_snapshot
//       及其技能、依赖子表的读写
// 约束: 所有查询使用参数化
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_snapshot_schema, open_sqlite_connection};
use crate::domain::job::Job;
use crate::domain::resource::Resource;
use crate::domain::station::StationMetric;
use crate::domain::types::{JobStage, JobStatus, PipelineStage, Priority, ResourceType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// production_job 原始行
struct JobRow {
    id: String,
    order_id: String,
    client_name: String,
    garment_type: String,
    quantity: i64,
    priority: String,
    deadline: DateTime<Utc>,
    estimated_hours: f64,
    current_stage: String,
    status: String,
}

/// production_resource 原始行
struct ResourceRow {
    id: String,
    name: String,
    resource_type: String,
    capacity_hours_per_day: f64,
    current_utilization: f64,
    efficiency_rating: f64,
}

// ==========================================
// SqliteSnapshotRepository - 生产快照仓储
// ==========================================
#[derive(Clone)]
pub struct SqliteSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSnapshotRepository {
    /// 创建仓储实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_snapshot_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_snapshot_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 作业
    // ==========================================

    /// 全量替换作业快照（单事务）
    ///
    /// # 返回
    /// - Ok(usize): 写入作业数
    pub fn replace_jobs(&self, jobs: &[Job]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM job_dependency", [])?;
        tx.execute("DELETE FROM job_skill", [])?;
        tx.execute("DELETE FROM production_job", [])?;

        for (seq_no, job) in jobs.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO production_job (
                    job_id, order_id, client_name, garment_type, quantity, priority,
                    deadline, estimated_hours, current_stage, status, seq_no
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    job.id,
                    job.order_id,
                    job.client_name,
                    job.garment_type,
                    job.quantity,
                    job.priority.as_str(),
                    job.deadline,
                    job.estimated_hours,
                    job.current_stage.as_str(),
                    job.status.to_string(),
                    seq_no as i64,
                ],
            )?;
            for skill in &job.required_skills {
                tx.execute(
                    "INSERT OR IGNORE INTO job_skill (job_id, skill) VALUES (?1, ?2)",
                    params![job.id, skill],
                )?;
            }
            for (dep_seq, dep) in job.dependencies.iter().enumerate() {
                tx.execute(
                    "INSERT OR IGNORE INTO job_dependency (job_id, depends_on_job_id, seq_no)
                     VALUES (?1, ?2, ?3)",
                    params![job.id, dep, dep_seq as i64],
                )?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(jobs.len())
    }

    /// 读取作业快照（保持写入顺序）
    pub fn load_jobs(&self) -> RepositoryResult<Vec<Job>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT job_id, order_id, client_name, garment_type, quantity, priority,
                   deadline, estimated_hours, current_stage, status
            FROM production_job
            ORDER BY seq_no
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(JobRow {
                    id: row.get(0)?,
                    order_id: row.get(1)?,
                    client_name: row.get(2)?,
                    garment_type: row.get(3)?,
                    quantity: row.get(4)?,
                    priority: row.get(5)?,
                    deadline: row.get(6)?,
                    estimated_hours: row.get(7)?,
                    current_stage: row.get(8)?,
                    status: row.get(9)?,
                })
            })?
            .collect::<SqliteResult<Vec<JobRow>>>()?;

        let mut skills = group_pairs(
            &conn,
            "SELECT job_id, skill FROM job_skill ORDER BY job_id, skill",
        )?;
        let mut deps = group_pairs(
            &conn,
            "SELECT job_id, depends_on_job_id FROM job_dependency ORDER BY job_id, seq_no",
        )?;

        rows.into_iter()
            .map(|row| {
                Ok(Job {
                    priority: parse_field::<Priority>("priority", &row.priority)?,
                    current_stage: parse_field::<JobStage>("current_stage", &row.current_stage)?,
                    status: parse_field::<JobStatus>("status", &row.status)?,
                    required_skills: skills
                        .remove(&row.id)
                        .unwrap_or_default()
                        .into_iter()
                        .collect::<BTreeSet<_>>(),
                    dependencies: deps.remove(&row.id).unwrap_or_default(),
                    id: row.id,
                    order_id: row.order_id,
                    client_name: row.client_name,
                    garment_type: row.garment_type,
                    quantity: row.quantity,
                    deadline: row.deadline,
                    estimated_hours: row.estimated_hours,
                })
            })
            .collect()
    }

    // ==========================================
    // 资源
    // ==========================================

    /// 全量替换资源快照（单事务）
    pub fn replace_resources(&self, resources: &[Resource]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM resource_skill", [])?;
        tx.execute("DELETE FROM production_resource", [])?;

        for (seq_no, resource) in resources.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO production_resource (
                    resource_id, name, resource_type, capacity_hours_per_day,
                    current_utilization, efficiency_rating, seq_no
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    resource.id,
                    resource.name,
                    resource.resource_type.to_string(),
                    resource.capacity_hours_per_day,
                    resource.current_utilization,
                    resource.efficiency_rating,
                    seq_no as i64,
                ],
            )?;
            for skill in &resource.skills {
                tx.execute(
                    "INSERT OR IGNORE INTO resource_skill (resource_id, skill) VALUES (?1, ?2)",
                    params![resource.id, skill],
                )?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(resources.len())
    }

    /// 读取资源快照（保持写入顺序）
    pub fn load_resources(&self) -> RepositoryResult<Vec<Resource>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT resource_id, name, resource_type, capacity_hours_per_day,
                   current_utilization, efficiency_rating
            FROM production_resource
            ORDER BY seq_no
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ResourceRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    resource_type: row.get(2)?,
                    capacity_hours_per_day: row.get(3)?,
                    current_utilization: row.get(4)?,
                    efficiency_rating: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<ResourceRow>>>()?;

        let mut skills = group_pairs(
            &conn,
            "SELECT resource_id, skill FROM resource_skill ORDER BY resource_id, skill",
        )?;

        rows.into_iter()
            .map(|row| {
                Ok(Resource {
                    resource_type: parse_field::<ResourceType>(
                        "resource_type",
                        &row.resource_type,
                    )?,
                    skills: skills
                        .remove(&row.id)
                        .unwrap_or_default()
                        .into_iter()
                        .collect(),
                    id: row.id,
                    name: row.name,
                    capacity_hours_per_day: row.capacity_hours_per_day,
                    current_utilization: row.current_utilization,
                    efficiency_rating: row.efficiency_rating,
                })
            })
            .collect()
    }

    // ==========================================
    // 工位快照
    // ==========================================

    /// 追加工位快照
    pub fn insert_station_metrics(&self, metrics: &[StationMetric]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        for m in metrics {
            tx.execute(
                r#"
                INSERT INTO station_metric_snapshot (
                    snapshot_id, station_id, station_name, station_type,
                    current_throughput, expected_throughput, queue_length,
                    avg_wait_time_minutes, utilization_rate, operator_count,
                    active_operators, defect_rate, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    m.station_id,
                    m.station_name,
                    m.station_type.as_str(),
                    m.current_throughput,
                    m.expected_throughput,
                    m.queue_length,
                    m.avg_wait_time_minutes,
                    m.utilization_rate,
                    m.operator_count,
                    m.active_operators,
                    m.defect_rate,
                    m.timestamp,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(metrics.len())
    }

    /// 时间窗内各工位最新快照（按工位 ID 排序）
    pub fn latest_station_metrics(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepositoryResult<Vec<StationMetric>> {
        let snapshots = self.station_metrics_between(since, until, "station_id, recorded_at DESC")?;

        let mut latest: Vec<StationMetric> = Vec::new();
        for metric in snapshots {
            if latest.last().map(|m| m.station_id.as_str()) != Some(metric.station_id.as_str()) {
                latest.push(metric);
            }
        }
        Ok(latest)
    }

    /// 时间窗内的历史快照，按记录时刻分组（升序）
    pub fn station_history(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepositoryResult<Vec<(DateTime<Utc>, Vec<StationMetric>)>> {
        let snapshots = self.station_metrics_between(since, until, "recorded_at, station_id")?;

        let mut grouped: BTreeMap<DateTime<Utc>, Vec<StationMetric>> = BTreeMap::new();
        for metric in snapshots {
            grouped.entry(metric.timestamp).or_default().push(metric);
        }
        Ok(grouped.into_iter().collect())
    }

    fn station_metrics_between(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        order_by: &str,
    ) -> RepositoryResult<Vec<StationMetric>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT station_id, station_name, station_type, current_throughput,
                   expected_throughput, queue_length, avg_wait_time_minutes,
                   utilization_rate, operator_count, active_operators, defect_rate,
                   recorded_at
            FROM station_metric_snapshot
            WHERE recorded_at >= ?1 AND recorded_at <= ?2
            ORDER BY {}
            "#,
            order_by
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![since, until], |row| {
                Ok((
                    row.get::<_, String>(2)?,
                    StationMetric {
                        station_id: row.get(0)?,
                        station_name: row.get(1)?,
                        station_type: PipelineStage::Cutting,
                        current_throughput: row.get(3)?,
                        expected_throughput: row.get(4)?,
                        queue_length: row.get(5)?,
                        avg_wait_time_minutes: row.get(6)?,
                        utilization_rate: row.get(7)?,
                        operator_count: row.get(8)?,
                        active_operators: row.get(9)?,
                        defect_rate: row.get(10)?,
                        timestamp: row.get(11)?,
                    },
                ))
            })?
            .collect::<SqliteResult<Vec<(String, StationMetric)>>>()?;

        rows.into_iter()
            .map(|(station_type, mut metric)| {
                metric.station_type = parse_field::<PipelineStage>("station_type", &station_type)?;
                Ok(metric)
            })
            .collect()
    }
}

/// (owner_id, value) 两列结果按 owner 聚合
fn group_pairs(conn: &Connection, sql: &str) -> RepositoryResult<HashMap<String, Vec<String>>> {
    let mut stmt = conn.prepare(sql)?;
    let pairs = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<SqliteResult<Vec<(String, String)>>>()?;

    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (owner, value) in pairs {
        grouped.entry(owner).or_default().push(value);
    }
    Ok(grouped)
}

fn parse_field<T: FromStr<Err = String>>(field: &str, raw: &str) -> RepositoryResult<T> {
    T::from_str(raw).map_err(|message| RepositoryError::FieldValueError {
        field: field.to_string(),
        value: raw.to_string(),
        message,
    })
}
