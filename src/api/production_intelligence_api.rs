// ==========================================
// 服装生产排程系统 - 生产智能门面 API
// ==========================================
// 职责: 拉取作业 / 资源 / 工位快照，调用排程优化与瓶颈检测，返回结果
// 红线: 门面不持有可变业务状态；每次调用重新读取配置
// 说明: 数据源并发读取（try_join!），计算放到阻塞线程池
// ==========================================

use crate::api::data_source::{ProductionDataSource, TimeWindow};
use crate::api::error::{ApiError, ApiResult};
use crate::config::config_reader::IntelligenceConfigReader;
use crate::config::intelligence_config::IntelligenceConfig;
use crate::domain::bottleneck::{BottleneckAnalysis, BottleneckTrendReport, RootCauseKind};
use crate::domain::job::Job;
use crate::domain::resource::Resource;
use crate::domain::schedule::{Schedule, UnscheduledReason};
use crate::domain::station::StationMetric;
use crate::domain::types::Severity;
use crate::engine::bottleneck::{BottleneckDetector, TrendAnalyzer};
use crate::engine::events::{
    IntelligenceEvent, IntelligenceEventPublisher, IntelligenceEventType, OptionalEventPublisher,
};
use crate::engine::scenario::{Scenario, ScenarioAnalyzer, ScenarioResult};
use crate::engine::scheduler::SchedulingOptimizer;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;

/// 默认工位快照回溯窗口（小时）
pub const DEFAULT_SNAPSHOT_WINDOW_HOURS: i64 = 24;

// ==========================================
// 请求 / 响应 DTO
// ==========================================

/// JSON 排程请求（集合字段缺失或为 null 时拒绝）
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub jobs: Option<Vec<Job>>,
    pub resources: Option<Vec<Resource>>,
    #[serde(default)]
    pub horizon_start: Option<DateTime<Utc>>,
}

/// JSON 瓶颈检测请求
#[derive(Debug, Clone, Deserialize)]
pub struct DetectRequest {
    pub metrics: Option<Vec<StationMetric>>,
    /// 可选：用于预测交付延迟
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// 已排作业的瓶颈延迟推演
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayedAssignment {
    pub job_id: String,
    pub station_id: String,
    pub planned_end: DateTime<Utc>,
    pub expected_delay_hours: f64,
    pub projected_end: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    /// 叠加延迟后是否仍满足交期
    pub still_on_time: bool,
}

/// 综合分析结果（排程 + 瓶颈）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionAnalysis {
    pub request_id: String,
    pub schedule: Schedule,
    pub bottlenecks: BottleneckAnalysis,
    pub delayed_assignments: Vec<DelayedAssignment>,
}

// ==========================================
// ProductionIntelligenceApi
// ==========================================
pub struct ProductionIntelligenceApi<S, C> {
    source: Arc<S>,
    config_reader: Arc<C>,
    publisher: OptionalEventPublisher,
    snapshot_window: Duration,
}

impl<S, C> ProductionIntelligenceApi<S, C>
where
    S: ProductionDataSource + 'static,
    C: IntelligenceConfigReader + 'static,
{
    /// 创建门面实例
    ///
    /// # 参数
    /// - source: 生产数据源
    /// - config_reader: 配置读取器（每次调用读取）
    pub fn new(source: Arc<S>, config_reader: Arc<C>) -> Self {
        Self {
            source,
            config_reader,
            publisher: OptionalEventPublisher::none(),
            snapshot_window: Duration::hours(DEFAULT_SNAPSHOT_WINDOW_HOURS),
        }
    }

    /// 配置告警事件发布者
    pub fn with_event_publisher(mut self, publisher: Arc<dyn IntelligenceEventPublisher>) -> Self {
        self.publisher = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    /// 调整工位快照回溯窗口
    pub fn with_snapshot_window(mut self, window: Duration) -> Self {
        self.snapshot_window = window;
        self
    }

    async fn load_config(&self) -> ApiResult<IntelligenceConfig> {
        Ok(self.config_reader.load_intelligence_config().await?)
    }

    // ==========================================
    // 排程优化
    // ==========================================

    /// 基于当前作业与资源生成排程
    pub async fn optimize_schedule(&self, horizon_start: DateTime<Utc>) -> ApiResult<Schedule> {
        let request_id = new_request_id();
        let span = info_span!("optimize_schedule", request_id = %request_id);

        async {
            let (config, jobs, resources) = futures::try_join!(
                self.load_config(),
                self.source.fetch_jobs(),
                self.source.fetch_resources()
            )?;

            let schedule = run_optimizer(config, jobs, resources, horizon_start).await?;
            self.publish_schedule_events(&request_id, &schedule);

            info!(
                scheduled = schedule.scheduled_jobs,
                unscheduled = schedule.unscheduled_jobs.len(),
                score = schedule.optimization_score,
                "排程完成"
            );
            Ok::<_, ApiError>(schedule)
        }
        .instrument(span)
        .await
    }

    // ==========================================
    // 瓶颈检测
    // ==========================================

    /// 以当前时刻为截止点检测瓶颈
    pub async fn detect_bottlenecks(&self) -> ApiResult<BottleneckAnalysis> {
        self.detect_bottlenecks_at(Utc::now()).await
    }

    /// 以指定时刻为截止点检测瓶颈
    pub async fn detect_bottlenecks_at(
        &self,
        as_of: DateTime<Utc>,
    ) -> ApiResult<BottleneckAnalysis> {
        let request_id = new_request_id();
        let span = info_span!("detect_bottlenecks", request_id = %request_id);
        let window = TimeWindow::trailing(as_of, self.snapshot_window);

        async {
            let (config, metrics, jobs) = futures::try_join!(
                self.load_config(),
                self.source.fetch_station_metrics(window),
                self.source.fetch_jobs()
            )?;

            let analysis = run_detector(config, metrics, jobs).await?;
            self.publish_bottleneck_events(&request_id, &analysis);

            info!(
                detected = analysis.detected_bottlenecks.len(),
                efficiency = analysis.overall_efficiency,
                "瓶颈检测完成"
            );
            Ok::<_, ApiError>(analysis)
        }
        .instrument(span)
        .await
    }

    // ==========================================
    // 综合分析
    // ==========================================

    /// 排程 + 瓶颈检测，并推演瓶颈对已排作业的延迟
    ///
    /// 工位快照以 horizon_start 为截止点回溯
    pub async fn analyze_production(
        &self,
        horizon_start: DateTime<Utc>,
    ) -> ApiResult<ProductionAnalysis> {
        let request_id = new_request_id();
        let span = info_span!("analyze_production", request_id = %request_id);
        let window = TimeWindow::trailing(horizon_start, self.snapshot_window);

        async {
            let (config, jobs, resources, metrics) = futures::try_join!(
                self.load_config(),
                self.source.fetch_jobs(),
                self.source.fetch_resources(),
                self.source.fetch_station_metrics(window)
            )?;

            let schedule =
                run_optimizer(config.clone(), jobs.clone(), resources, horizon_start).await?;
            let bottlenecks = run_detector(config, metrics, jobs.clone()).await?;
            let delayed_assignments = link_delays(&schedule, &bottlenecks, &jobs);

            self.publish_schedule_events(&request_id, &schedule);
            self.publish_bottleneck_events(&request_id, &bottlenecks);

            info!(
                scheduled = schedule.scheduled_jobs,
                detected = bottlenecks.detected_bottlenecks.len(),
                delayed = delayed_assignments.len(),
                "综合分析完成"
            );
            Ok::<_, ApiError>(ProductionAnalysis {
                request_id: request_id.clone(),
                schedule,
                bottlenecks,
                delayed_assignments,
            })
        }
        .instrument(span)
        .await
    }

    /// 假设情景分析
    pub async fn analyze_scenario(
        &self,
        horizon_start: DateTime<Utc>,
        scenario: Scenario,
    ) -> ApiResult<ScenarioResult> {
        let request_id = new_request_id();
        let span = info_span!("analyze_scenario", request_id = %request_id);

        async {
            let (config, jobs, resources) = futures::try_join!(
                self.load_config(),
                self.source.fetch_jobs(),
                self.source.fetch_resources()
            )?;

            let current = Span::current();
            let result = tokio::task::spawn_blocking(move || {
                current.in_scope(|| {
                    let optimizer = SchedulingOptimizer::from_config(&config);
                    ScenarioAnalyzer::new(&optimizer).analyze(
                        &jobs,
                        &resources,
                        horizon_start,
                        &scenario,
                    )
                })
            })
            .await?;

            info!(scenario = %result.scenario_name, applied = result.applied, "情景分析完成");
            Ok::<_, ApiError>(result)
        }
        .instrument(span)
        .await
    }

    /// 瓶颈趋势分析
    pub async fn analyze_bottleneck_trends(
        &self,
        window: TimeWindow,
    ) -> ApiResult<BottleneckTrendReport> {
        let request_id = new_request_id();
        let span = info_span!("analyze_bottleneck_trends", request_id = %request_id);

        async {
            let (config, history) = futures::try_join!(
                self.load_config(),
                self.source.fetch_station_history(window)
            )?;

            let current = Span::current();
            let report = tokio::task::spawn_blocking(move || {
                current.in_scope(|| {
                    let detector = BottleneckDetector::from_config(&config);
                    TrendAnalyzer::new(&detector).analyze(&history)
                })
            })
            .await?;

            info!(points = report.history.len(), trend = ?report.trend, "趋势分析完成");
            Ok::<_, ApiError>(report)
        }
        .instrument(span)
        .await
    }

    // ==========================================
    // JSON 边界
    // ==========================================

    /// JSON 请求排程（不访问数据源）
    pub async fn optimize_from_json(&self, request: &str) -> ApiResult<Schedule> {
        let request: OptimizeRequest = parse_request(request)?;
        let jobs = request
            .jobs
            .ok_or_else(|| ApiError::InvalidInput("jobs 不能为空 (null)".to_string()))?;
        let resources = request
            .resources
            .ok_or_else(|| ApiError::InvalidInput("resources 不能为空 (null)".to_string()))?;
        let horizon_start = request.horizon_start.unwrap_or_else(Utc::now);

        let request_id = new_request_id();
        let span = info_span!("optimize_from_json", request_id = %request_id);

        async {
            let config = self.load_config().await?;
            let schedule = run_optimizer(config, jobs, resources, horizon_start).await?;
            self.publish_schedule_events(&request_id, &schedule);
            Ok::<_, ApiError>(schedule)
        }
        .instrument(span)
        .await
    }

    /// JSON 请求瓶颈检测（不访问数据源）
    pub async fn detect_from_json(&self, request: &str) -> ApiResult<BottleneckAnalysis> {
        let request: DetectRequest = parse_request(request)?;
        let metrics = request
            .metrics
            .ok_or_else(|| ApiError::InvalidInput("metrics 不能为空 (null)".to_string()))?;

        let request_id = new_request_id();
        let span = info_span!("detect_from_json", request_id = %request_id);

        async {
            let config = self.load_config().await?;
            let analysis = run_detector(config, metrics, request.jobs).await?;
            self.publish_bottleneck_events(&request_id, &analysis);
            Ok::<_, ApiError>(analysis)
        }
        .instrument(span)
        .await
    }

    // ==========================================
    // 告警事件
    // ==========================================

    fn publish_schedule_events(&self, request_id: &str, schedule: &Schedule) {
        if !self.publisher.is_configured() {
            return;
        }

        for conflict in schedule.at_risk_conflicts() {
            if let Some(job_id) = conflict.job_ids.first() {
                self.publish(IntelligenceEvent::new(
                    request_id,
                    IntelligenceEventType::JobAtRisk,
                    job_id.clone(),
                    conflict.severity,
                    conflict.description.clone(),
                ));
            }
        }

        for unscheduled in &schedule.unscheduled_jobs {
            let severity = match unscheduled.reason {
                UnscheduledReason::AlreadyCompleted => continue,
                UnscheduledReason::NoResources | UnscheduledReason::CapacityExceeded => {
                    Severity::High
                }
                UnscheduledReason::NoSkillMatch | UnscheduledReason::InvalidJob => Severity::Medium,
            };
            self.publish(IntelligenceEvent::new(
                request_id,
                IntelligenceEventType::JobUnscheduled,
                unscheduled.job_id.clone(),
                severity,
                format!("{}: {}", unscheduled.reason.as_str(), unscheduled.detail),
            ));
        }
    }

    fn publish_bottleneck_events(&self, request_id: &str, analysis: &BottleneckAnalysis) {
        if !self.publisher.is_configured() {
            return;
        }

        for bottleneck in &analysis.detected_bottlenecks {
            self.publish(IntelligenceEvent::new(
                request_id,
                IntelligenceEventType::BottleneckDetected,
                bottleneck.station.station_id.clone(),
                bottleneck.severity,
                bottleneck.station.station_name.clone(),
            ));
            if bottleneck.has_cause(RootCauseKind::HighDefectRate) {
                self.publish(IntelligenceEvent::new(
                    request_id,
                    IntelligenceEventType::QualityEscalation,
                    bottleneck.station.station_id.clone(),
                    Severity::High,
                    format!("不良率 {:.1}%", bottleneck.station.defect_rate),
                ));
            }
        }
    }

    fn publish(&self, event: IntelligenceEvent) {
        let event_type = event.event_type;
        let subject = event.subject_id.clone();
        if let Err(e) = self.publisher.publish(event) {
            warn!(
                event_type = event_type.as_str(),
                subject = %subject,
                error = %e,
                "告警事件发布失败"
            );
        }
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

fn parse_request<T: serde::de::DeserializeOwned>(raw: &str) -> ApiResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| ApiError::InvalidInput(format!("请求 JSON 解析失败: {}", e)))
}

async fn run_optimizer(
    config: IntelligenceConfig,
    jobs: Vec<Job>,
    resources: Vec<Resource>,
    horizon_start: DateTime<Utc>,
) -> ApiResult<Schedule> {
    let current = Span::current();
    Ok(tokio::task::spawn_blocking(move || {
        current.in_scope(|| {
            SchedulingOptimizer::from_config(&config).optimize(&jobs, &resources, horizon_start)
        })
    })
    .await?)
}

async fn run_detector(
    config: IntelligenceConfig,
    metrics: Vec<StationMetric>,
    jobs: Vec<Job>,
) -> ApiResult<BottleneckAnalysis> {
    let current = Span::current();
    Ok(tokio::task::spawn_blocking(move || {
        current.in_scope(|| {
            BottleneckDetector::from_config(&config).detect_with_jobs(&metrics, &jobs)
        })
    })
    .await?)
}

/// 预测延迟 × 已排作业：叠加延迟后重新判断交期
fn link_delays(
    schedule: &Schedule,
    analysis: &BottleneckAnalysis,
    jobs: &[Job],
) -> Vec<DelayedAssignment> {
    analysis
        .predicted_completion_delays
        .iter()
        .filter_map(|delay| {
            let assignment = schedule.assignment_for(&delay.job_id)?;
            let job = jobs.iter().find(|j| j.id == delay.job_id)?;
            // 延迟超出可表示时间范围时钉在 MAX_UTC，并视为必然超期
            let (projected_end, representable) =
                match shift_by_hours(assignment.end_time, delay.expected_delay_hours) {
                    Some(end) => (end, true),
                    None => {
                        warn!(
                            job_id = %delay.job_id,
                            station_id = %delay.station_id,
                            expected_delay_hours = delay.expected_delay_hours,
                            "预测延迟超出时间范围"
                        );
                        (DateTime::<Utc>::MAX_UTC, false)
                    }
                };
            Some(DelayedAssignment {
                job_id: delay.job_id.clone(),
                station_id: delay.station_id.clone(),
                planned_end: assignment.end_time,
                expected_delay_hours: delay.expected_delay_hours,
                projected_end,
                deadline: job.deadline,
                still_on_time: representable && projected_end <= job.deadline,
            })
        })
        .collect()
}

fn shift_by_hours(at: DateTime<Utc>, hours: f64) -> Option<DateTime<Utc>> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    at.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}
