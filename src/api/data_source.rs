// ==========================================
// 服装生产排程系统 - 生产数据源 Trait
// ==========================================
// 职责: 门面层读取作业 / 资源 / 工位快照的异步接口
// 实现者: InMemoryDataSource（测试 / 嵌入）/ SqliteSnapshotRepository
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::job::Job;
use crate::domain::resource::Resource;
use crate::domain::station::StationMetric;
use crate::repository::snapshot_repo::SqliteSnapshotRepository;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 快照时间窗（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self { since, until }
    }

    /// 截止 as_of 的回溯窗口（起点越界时取 MIN_UTC）
    pub fn trailing(as_of: DateTime<Utc>, length: Duration) -> Self {
        Self {
            since: as_of
                .checked_sub_signed(length)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            until: as_of,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since <= at && at <= self.until
    }
}

// ==========================================
// ProductionDataSource Trait
// ==========================================
#[async_trait]
pub trait ProductionDataSource: Send + Sync {
    /// 当前未完工作业
    async fn fetch_jobs(&self) -> ApiResult<Vec<Job>>;

    /// 当前资源池
    async fn fetch_resources(&self) -> ApiResult<Vec<Resource>>;

    /// 时间窗内各工位最新快照
    async fn fetch_station_metrics(&self, window: TimeWindow) -> ApiResult<Vec<StationMetric>>;

    /// 时间窗内的历史快照（按时刻分组，升序）
    async fn fetch_station_history(
        &self,
        window: TimeWindow,
    ) -> ApiResult<Vec<(DateTime<Utc>, Vec<StationMetric>)>>;
}

// ==========================================
// InMemoryDataSource - 内存数据源
// ==========================================
// 当前快照原样返回（不按时间窗过滤）；历史快照按时间窗过滤
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    jobs: Vec<Job>,
    resources: Vec<Resource>,
    station_metrics: Vec<StationMetric>,
    station_history: Vec<(DateTime<Utc>, Vec<StationMetric>)>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(mut self, jobs: Vec<Job>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_station_metrics(mut self, metrics: Vec<StationMetric>) -> Self {
        self.station_metrics = metrics;
        self
    }

    pub fn with_history_point(mut self, at: DateTime<Utc>, metrics: Vec<StationMetric>) -> Self {
        self.station_history.push((at, metrics));
        self
    }
}

#[async_trait]
impl ProductionDataSource for InMemoryDataSource {
    async fn fetch_jobs(&self) -> ApiResult<Vec<Job>> {
        Ok(self.jobs.clone())
    }

    async fn fetch_resources(&self) -> ApiResult<Vec<Resource>> {
        Ok(self.resources.clone())
    }

    async fn fetch_station_metrics(&self, _window: TimeWindow) -> ApiResult<Vec<StationMetric>> {
        Ok(self.station_metrics.clone())
    }

    async fn fetch_station_history(
        &self,
        window: TimeWindow,
    ) -> ApiResult<Vec<(DateTime<Utc>, Vec<StationMetric>)>> {
        let mut history: Vec<_> = self
            .station_history
            .iter()
            .filter(|(at, _)| window.contains(*at))
            .cloned()
            .collect();
        history.sort_by_key(|(at, _)| *at);
        Ok(history)
    }
}

// ==========================================
// SQLite 快照数据源
// ==========================================
// rusqlite 为同步调用，放到阻塞线程池执行
#[async_trait]
impl ProductionDataSource for SqliteSnapshotRepository {
    async fn fetch_jobs(&self) -> ApiResult<Vec<Job>> {
        let repo = self.clone();
        Ok(tokio::task::spawn_blocking(move || repo.load_jobs()).await??)
    }

    async fn fetch_resources(&self) -> ApiResult<Vec<Resource>> {
        let repo = self.clone();
        Ok(tokio::task::spawn_blocking(move || repo.load_resources()).await??)
    }

    async fn fetch_station_metrics(&self, window: TimeWindow) -> ApiResult<Vec<StationMetric>> {
        let repo = self.clone();
        Ok(tokio::task::spawn_blocking(move || {
            repo.latest_station_metrics(window.since, window.until)
        })
        .await??)
    }

    async fn fetch_station_history(
        &self,
        window: TimeWindow,
    ) -> ApiResult<Vec<(DateTime<Utc>, Vec<StationMetric>)>> {
        let repo = self.clone();
        Ok(
            tokio::task::spawn_blocking(move || repo.station_history(window.since, window.until))
                .await??,
        )
    }
}
