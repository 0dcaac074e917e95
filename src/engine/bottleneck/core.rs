use super::advice::{station_actions, BottleneckAdvisor};
use super::root_cause::RootCauseAnalyzer;
use super::scoring::StationScorer;
use crate::config::{DetectorConfig, IntelligenceConfig, PipelineConfig};
use crate::domain::bottleneck::{
    BottleneckAnalysis, CriticalPathEntry, DetectedBottleneck, OptimalThroughputMode,
    PredictedDelay, SkippedStation, StationScore,
};
use crate::domain::job::Job;
use crate::domain::station::StationMetric;
use crate::domain::types::Severity;
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};

// ==========================================
// BottleneckDetector - 瓶颈检测引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct BottleneckDetector {
    config: DetectorConfig,
    pipeline: PipelineConfig,
}

impl Default for BottleneckDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default(), PipelineConfig::default())
    }
}

impl BottleneckDetector {
    pub fn new(config: DetectorConfig, pipeline: PipelineConfig) -> Self {
        Self { config, pipeline }
    }

    pub fn from_config(config: &IntelligenceConfig) -> Self {
        Self::new(config.detector.clone(), config.pipeline.clone())
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 瓶颈检测（不含作业延误预测）
    pub fn detect(&self, metrics: &[StationMetric]) -> BottleneckAnalysis {
        self.detect_with_jobs(metrics, &[])
    }

    /// 瓶颈检测 + 作业延误预测
    ///
    /// 步骤:
    /// 1) 非法快照记入 skipped_stations，不中断批次
    /// 2) 逐工位评分，score > threshold 记为瓶颈（降序，同分按工位 ID）
    /// 3) 系统吞吐 = min(current)，最优吞吐按口径取 expected
    /// 4) 关键路径按配置工序顺序标注
    /// 5) 建议 + 延误预测
    #[instrument(skip(self, metrics, jobs), fields(
        station_count = metrics.len(),
        job_count = jobs.len(),
        threshold = self.config.bottleneck_threshold
    ))]
    pub fn detect_with_jobs(&self, metrics: &[StationMetric], jobs: &[Job]) -> BottleneckAnalysis {
        let scorer = StationScorer::new(&self.config);
        let root_causes = RootCauseAnalyzer::new(&self.config.root_causes);

        let mut skipped_stations = Vec::new();
        let mut station_scores = Vec::with_capacity(metrics.len());
        for metric in metrics {
            if let Err(reason) = metric.validate() {
                warn!(station_id = %metric.station_id, reason = %reason, "工位快照非法，已跳过");
                skipped_stations.push(SkippedStation {
                    station_id: metric.station_id.clone(),
                    reason,
                });
                continue;
            }
            let breakdown = scorer.score(metric);
            debug!(
                station_id = %metric.station_id,
                gap = breakdown.gap_score,
                queue = breakdown.queue_score,
                score = breakdown.score,
                "工位评分"
            );
            station_scores.push(StationScore {
                station: metric.clone(),
                severity: Severity::from_score(breakdown.score),
                breakdown,
            });
        }

        let mut detected: Vec<DetectedBottleneck> = station_scores
            .iter()
            .filter(|s| s.score() > self.config.bottleneck_threshold)
            .map(|s| {
                let causes = root_causes.analyze(&s.station, &s.breakdown);
                DetectedBottleneck {
                    station: s.station.clone(),
                    score: s.score(),
                    breakdown: s.breakdown.clone(),
                    severity: s.severity,
                    recommendations: station_actions(&s.station, &causes, s.severity),
                    root_causes: causes,
                    impact: scorer.impact(&s.station, &s.breakdown),
                }
            })
            .collect();
        detected.sort_by(compare_bottlenecks);
        let primary_bottleneck = detected.first().cloned();

        let valid: Vec<&StationMetric> = station_scores.iter().map(|s| &s.station).collect();
        let (system_throughput, optimal_throughput) = self.throughputs(&valid);
        let efficiency_loss_percent = if optimal_throughput > 0.0 {
            (100.0 * (optimal_throughput - system_throughput) / optimal_throughput).max(0.0)
        } else {
            0.0
        };
        let overall_efficiency = (100.0 - efficiency_loss_percent).clamp(0.0, 100.0);

        let critical_path = self.critical_path(&station_scores, primary_bottleneck.as_ref());
        let recommendations = BottleneckAdvisor::new(&self.config).recommend(
            &detected,
            efficiency_loss_percent,
            !station_scores.is_empty(),
        );
        let predicted_completion_delays = predict_delays(&detected, jobs);

        info!(
            valid_stations = station_scores.len(),
            skipped = skipped_stations.len(),
            bottlenecks = detected.len(),
            primary = primary_bottleneck
                .as_ref()
                .map(|b| b.station.station_id.as_str())
                .unwrap_or("-"),
            efficiency = overall_efficiency,
            "瓶颈检测完成"
        );

        BottleneckAnalysis {
            detected_bottlenecks: detected,
            primary_bottleneck,
            station_scores,
            skipped_stations,
            overall_efficiency,
            system_throughput,
            optimal_throughput,
            optimal_throughput_mode: self.config.optimal_throughput_mode,
            efficiency_loss_percent,
            critical_path,
            recommendations,
            predicted_completion_delays,
        }
    }

    /// (system_throughput, optimal_throughput)，无有效工位时均为 0
    fn throughputs(&self, valid: &[&StationMetric]) -> (f64, f64) {
        if valid.is_empty() {
            return (0.0, 0.0);
        }
        let system = valid
            .iter()
            .map(|m| m.current_throughput)
            .fold(f64::INFINITY, f64::min);
        let expected = valid.iter().map(|m| m.expected_throughput);
        let optimal = match self.config.optimal_throughput_mode {
            OptimalThroughputMode::Mean => expected.sum::<f64>() / valid.len() as f64,
            OptimalThroughputMode::Max => expected.fold(f64::NEG_INFINITY, f64::max),
            OptimalThroughputMode::Min => expected.fold(f64::INFINITY, f64::min),
        };
        (system, optimal)
    }

    /// 关键路径：按配置工序顺序，未配置的工序不上路径
    fn critical_path(
        &self,
        scores: &[StationScore],
        primary: Option<&DetectedBottleneck>,
    ) -> Vec<CriticalPathEntry> {
        self.pipeline
            .stage_order
            .iter()
            .map(|stage| {
                let on_stage: Vec<&StationScore> = scores
                    .iter()
                    .filter(|s| s.station.station_type == *stage)
                    .collect();
                let score = on_stage
                    .iter()
                    .map(|s| s.score())
                    .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
                CriticalPathEntry {
                    stage: *stage,
                    station_ids: on_stage.iter().map(|s| s.station.station_id.clone()).collect(),
                    score,
                    constrained: score.is_some_and(|s| s > self.config.bottleneck_threshold),
                    primary: primary.is_some_and(|p| p.station.station_type == *stage),
                }
            })
            .collect()
    }
}

/// 分数降序，同分按工位 ID 升序
fn compare_bottlenecks(a: &DetectedBottleneck, b: &DetectedBottleneck) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.station.station_id.cmp(&b.station.station_id))
}

/// 作业延误预测
///
/// 未完工作业所在工序命中瓶颈工位时: delay = queue_length / current_throughput
/// 工位无队列数据或吞吐为 0 时不预测
fn predict_delays(detected: &[DetectedBottleneck], jobs: &[Job]) -> Vec<PredictedDelay> {
    jobs.iter()
        .filter(|job| !job.is_completed())
        .filter_map(|job| {
            let stage = job.current_stage.pipeline_stage();
            detected
                .iter()
                .filter(|b| b.station.station_type == stage)
                .find_map(|b| {
                    let queue = b.station.queue_length?;
                    if b.station.current_throughput <= 0.0 {
                        return None;
                    }
                    Some(PredictedDelay {
                        job_id: job.id.clone(),
                        order_id: job.order_id.clone(),
                        station_id: b.station.station_id.clone(),
                        stage,
                        expected_delay_hours: queue as f64 / b.station.current_throughput,
                        reason: format!(
                            "工位 {} 积压 {} 件，当前吞吐 {:.1}/h",
                            b.station.station_id, queue, b.station.current_throughput
                        ),
                    })
                })
        })
        .collect()
}
