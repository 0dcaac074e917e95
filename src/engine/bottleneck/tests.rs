use super::*;
use crate::config::{DetectorConfig, PipelineConfig};
use crate::domain::bottleneck::{
    EfficiencyTrend, ImplementationCost, OptimalThroughputMode, RootCause, RootCauseKind,
};
use crate::domain::job::Job;
use crate::domain::station::StationMetric;
use crate::domain::types::{JobStage, JobStatus, PipelineStage, Priority, Severity};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeSet;

// ==========================================
// 测试辅助函数
// ==========================================

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

/// 三工位产线: 裁剪 50/50, 缝制 20/50, 整烫 40/50
fn three_station_line() -> Vec<StationMetric> {
    vec![
        StationMetric::cutting("C1", "Cutting Table 1")
            .throughput(50.0, 50.0)
            .queue(2, 0.0)
            .utilization(70.0)
            .defect_rate(1.0)
            .build(),
        StationMetric::sewing("S1", "Sewing Line 1")
            .throughput(20.0, 50.0)
            .queue(40, 120.0)
            .utilization(95.0)
            .defect_rate(2.0)
            .build(),
        StationMetric::finishing("F1", "Pressing")
            .throughput(40.0, 50.0)
            .queue(5, 30.0)
            .utilization(80.0)
            .defect_rate(2.0)
            .build(),
    ]
}

fn job(id: &str, stage: JobStage, status: JobStatus) -> Job {
    Job {
        id: id.to_string(),
        order_id: format!("ORD-{}", id),
        client_name: "ACME".to_string(),
        garment_type: "DRESS".to_string(),
        quantity: 120,
        priority: Priority::High,
        deadline: base_time() + Duration::days(4),
        estimated_hours: 6.0,
        required_skills: BTreeSet::from(["SEWING".to_string()]),
        current_stage: stage,
        status,
        dependencies: Vec::new(),
    }
}

// ==========================================
// 评分与排序
// ==========================================

#[test]
fn test_slowest_station_is_primary() {
    let analysis = BottleneckDetector::default().detect(&three_station_line());

    assert_eq!(analysis.system_throughput, 20.0);
    assert_eq!(analysis.detected_bottlenecks.len(), 1);
    let primary = analysis.primary_bottleneck.as_ref().unwrap();
    assert_eq!(primary.station.station_id, "S1");
    assert!((primary.score - 53.3).abs() < 1e-9);
    assert_eq!(primary.severity, Severity::Medium);

    assert!((analysis.score_for("C1").unwrap() - 14.15).abs() < 1e-9);
    assert!((analysis.score_for("F1").unwrap() - 26.8).abs() < 1e-9);
}

#[test]
fn test_efficiency_against_mean_expected() {
    let analysis = BottleneckDetector::default().detect(&three_station_line());

    assert_eq!(analysis.optimal_throughput_mode, OptimalThroughputMode::Mean);
    assert_eq!(analysis.optimal_throughput, 50.0);
    assert!((analysis.efficiency_loss_percent - 60.0).abs() < 1e-9);
    assert!((analysis.overall_efficiency - 40.0).abs() < 1e-9);
}

#[test]
fn test_optimal_throughput_modes() {
    let line = vec![
        StationMetric::cutting("C1", "Cut").throughput(30.0, 60.0).build(),
        StationMetric::sewing("S1", "Sew").throughput(20.0, 40.0).build(),
        StationMetric::qc("Q1", "QC").throughput(50.0, 50.0).build(),
    ];

    let mut config = DetectorConfig::default();
    let mean = BottleneckDetector::new(config.clone(), PipelineConfig::default()).detect(&line);
    assert!((mean.efficiency_loss_percent - 60.0).abs() < 1e-9);

    config.optimal_throughput_mode = OptimalThroughputMode::Max;
    let max = BottleneckDetector::new(config.clone(), PipelineConfig::default()).detect(&line);
    assert_eq!(max.optimal_throughput, 60.0);
    assert!((max.efficiency_loss_percent - 200.0 / 3.0).abs() < 1e-9);

    config.optimal_throughput_mode = OptimalThroughputMode::Min;
    let min = BottleneckDetector::new(config, PipelineConfig::default()).detect(&line);
    assert_eq!(min.optimal_throughput, 40.0);
    assert!((min.overall_efficiency - 50.0).abs() < 1e-9);
}

#[test]
fn test_ties_broken_by_station_id() {
    let twin = |id: &str| {
        StationMetric::sewing(id, "Twin")
            .throughput(10.0, 50.0)
            .queue(20, 120.0)
            .utilization(90.0)
            .build()
    };
    let analysis = BottleneckDetector::default().detect(&[twin("S2"), twin("S1")]);

    let ids: Vec<&str> = analysis
        .detected_bottlenecks
        .iter()
        .map(|b| b.station.station_id.as_str())
        .collect();
    assert_eq!(ids, vec!["S1", "S2"]);
}

#[test]
fn test_threshold_is_strict() {
    // gap 100 → 0.4*100 + 0.2*50 = 50，恰好等于阈值
    let line = vec![StationMetric::printing("P1", "Printer")
        .throughput(0.0, 10.0)
        .utilization(50.0)
        .build()];
    let analysis = BottleneckDetector::default().detect(&line);
    assert!((analysis.score_for("P1").unwrap() - 50.0).abs() < 1e-9);
    assert!(!analysis.has_bottleneck());
}

#[test]
fn test_invalid_stations_skipped() {
    let mut line = three_station_line();
    line.push(StationMetric::qc("Q1", "QC").throughput(10.0, 0.0).build());
    line.push(
        StationMetric::delivery("D1", "Dock")
            .throughput(10.0, 10.0)
            .utilization(120.0)
            .build(),
    );

    let analysis = BottleneckDetector::default().detect(&line);
    assert_eq!(analysis.skipped_stations.len(), 2);
    assert_eq!(analysis.station_scores.len(), 3);
    assert_eq!(analysis.system_throughput, 20.0);
}

#[test]
fn test_empty_input_is_idle() {
    let analysis = BottleneckDetector::default().detect(&[]);

    assert_eq!(analysis.overall_efficiency, 100.0);
    assert!(analysis.detected_bottlenecks.is_empty());
    assert!(analysis.primary_bottleneck.is_none());
    assert!(analysis
        .critical_path
        .iter()
        .all(|e| e.station_ids.is_empty() && e.score.is_none() && !e.constrained));
    assert_eq!(analysis.recommendations, vec![crate::i18n::t("bottleneck.idle_system")]);
}

// ==========================================
// 根因 / 影响 / 关键路径
// ==========================================

#[test]
fn test_root_causes_sorted_by_confidence() {
    let analysis = BottleneckDetector::default().detect(&three_station_line());
    let primary = analysis.primary_bottleneck.unwrap();

    // 缺口 60% / 排队 40 件 / 等待 120 分钟均达到严重档，同分保持规则顺序
    let kinds: Vec<RootCauseKind> = primary.root_causes.iter().map(|c| c.cause).collect();
    assert_eq!(
        kinds,
        vec![
            RootCauseKind::LowThroughput,
            RootCauseKind::QueueBuildup,
            RootCauseKind::ExcessiveWaitTime
        ]
    );
    assert!(primary.root_causes.iter().all(|c| c.confidence == 100.0));
    assert!(!primary.has_cause(RootCauseKind::OverUtilization));

    assert!((primary.impact.estimated_delay_hours - 4.0).abs() < 1e-9);
    assert_eq!(primary.impact.affected_orders, 1);
    assert!((primary.impact.throughput_loss_percent - 60.0).abs() < 1e-9);
}

#[test]
fn test_root_cause_confidence_tiers() {
    // 缺口 30% 与排队 12 件处于告警档，等待 10 分钟未触发
    let line = vec![StationMetric::sewing("S1", "Sewing Line 1")
        .throughput(35.0, 50.0)
        .queue(12, 10.0)
        .utilization(98.0)
        .operators(10, 7)
        .defect_rate(11.0)
        .build()];
    let mut config = DetectorConfig::default();
    config.bottleneck_threshold = 10.0;
    let analysis = BottleneckDetector::new(config, PipelineConfig::default()).detect(&line);
    let primary = analysis.primary_bottleneck.unwrap();

    let confidences: Vec<(RootCauseKind, f64)> = primary
        .root_causes
        .iter()
        .map(|c| (c.cause, c.confidence))
        .collect();
    assert_eq!(
        confidences,
        vec![
            (RootCauseKind::HighDefectRate, 100.0),
            (RootCauseKind::OperatorShortage, 90.0),
            (RootCauseKind::OverUtilization, 85.0),
            (RootCauseKind::LowThroughput, 60.0),
            (RootCauseKind::QueueBuildup, 60.0),
        ]
    );
}

fn low_threshold_detector() -> BottleneckDetector {
    let mut config = DetectorConfig::default();
    config.bottleneck_threshold = 10.0;
    BottleneckDetector::new(config, PipelineConfig::default())
}

#[test]
fn test_under_utilized_station_gets_reallocation_action() {
    let line = vec![StationMetric::sewing("S1", "Sewing Line 1")
        .throughput(10.0, 50.0)
        .utilization(20.0)
        .build()];
    let primary = low_threshold_detector().detect(&line).primary_bottleneck.unwrap();

    let under = primary
        .root_causes
        .iter()
        .find(|c| c.cause == RootCauseKind::UnderUtilization)
        .unwrap();
    assert_eq!(under.confidence, 80.0);

    // LOW_THROUGHPUT 在前: 先排查流程，再调配人员
    assert_eq!(primary.recommendations.len(), 2);
    assert_eq!(primary.recommendations[0].priority, Priority::High);
    assert_eq!(primary.recommendations[0].implementation_cost, ImplementationCost::Medium);
    let reallocate = &primary.recommendations[1];
    assert_eq!(reallocate.priority, Priority::Medium);
    assert_eq!(reallocate.implementation_cost, ImplementationCost::Low);
    assert!(reallocate.action.contains("Sewing Line 1"));
}

#[test]
fn test_over_utilized_station_gets_rotation_action() {
    let line = vec![StationMetric::sewing("S1", "Sewing Line 1")
        .throughput(50.0, 50.0)
        .utilization(99.0)
        .build()];
    let primary = low_threshold_detector().detect(&line).primary_bottleneck.unwrap();

    assert_eq!(primary.root_causes.len(), 1);
    assert_eq!(primary.root_causes[0].cause, RootCauseKind::OverUtilization);
    assert_eq!(primary.root_causes[0].confidence, 85.0);
    assert_eq!(primary.recommendations.len(), 1);
    assert_eq!(primary.recommendations[0].priority, Priority::High);
    assert_eq!(primary.recommendations[0].implementation_cost, ImplementationCost::Low);
}

#[test]
fn test_critical_station_escalates_shortage_and_queue_actions() {
    let line = vec![StationMetric::sewing("S1", "Sewing Line 1")
        .throughput(5.0, 50.0)
        .queue(50, 300.0)
        .utilization(94.0)
        .operators(10, 6)
        .defect_rate(5.0)
        .build()];
    let primary = BottleneckDetector::default().detect(&line).primary_bottleneck.unwrap();
    assert_eq!(primary.severity, Severity::Critical);

    let shortage = station_actions(
        &primary.station,
        &[RootCause {
            cause: RootCauseKind::OperatorShortage,
            confidence: 90.0,
            description: String::new(),
        }],
        Severity::High,
    );
    assert_eq!(shortage[0].priority, Priority::High);

    let urgent: Vec<Priority> = primary.recommendations.iter().map(|a| a.priority).collect();
    // 缺口 / 排队 / 缺员；等待时长无工位级措施
    assert_eq!(urgent, vec![Priority::High, Priority::Urgent, Priority::Urgent]);
}

#[test]
fn test_station_without_causes_keeps_monitoring() {
    let station = StationMetric::cutting("C1", "Cutting Table 1")
        .throughput(50.0, 50.0)
        .utilization(80.0)
        .build();
    let actions = station_actions(&station, &[], Severity::Medium);

    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].priority, Priority::Low);
    assert_eq!(actions[0].implementation_cost, ImplementationCost::Low);
    assert!(actions[0].action.contains("Cutting Table 1"));
}

#[test]
fn test_cost_impact_scales_with_score() {
    let analysis = BottleneckDetector::default().detect(&three_station_line());
    let primary = analysis.primary_bottleneck.unwrap();

    // score = 0.4*60 + 0.25*40 + 0.2*95 + 0.15*2 = 53.3; 4h * 5000 * 0.533
    assert!((primary.score - 53.3).abs() < 1e-9);
    assert!((primary.impact.cost_impact - 10_660.0).abs() < 1e-6);

    let mut config = DetectorConfig::default();
    config.cost_per_delay_hour = 0.0;
    let free = BottleneckDetector::new(config, PipelineConfig::default())
        .detect(&three_station_line());
    assert_eq!(free.primary_bottleneck.unwrap().impact.cost_impact, 0.0);
}

#[test]
fn test_critical_path_follows_stage_order() {
    let analysis = BottleneckDetector::default().detect(&three_station_line());
    let stages: Vec<PipelineStage> = analysis.critical_path.iter().map(|e| e.stage).collect();
    assert_eq!(stages, PipelineStage::DEFAULT_ORDER.to_vec());

    let sewing = &analysis.critical_path[2];
    assert_eq!(sewing.station_ids, vec!["S1"]);
    assert!(sewing.constrained && sewing.primary);

    let qc = &analysis.critical_path[3];
    assert!(qc.score.is_none() && !qc.primary);
}

#[test]
fn test_stage_outside_pipeline_still_scored() {
    let pipeline = PipelineConfig {
        stage_order: vec![PipelineStage::Cutting, PipelineStage::Sewing],
    };
    let detector = BottleneckDetector::new(DetectorConfig::default(), pipeline);
    let analysis = detector.detect(&three_station_line());

    assert_eq!(analysis.critical_path.len(), 2);
    assert!(analysis.score_for("F1").is_some());
}

// ==========================================
// 建议 / 延误预测
// ==========================================

#[test]
fn test_recommendations_for_demand_starved_station() {
    let line = vec![StationMetric::sewing("S1", "Sewing Line 1")
        .throughput(10.0, 50.0)
        .queue(15, 180.0)
        .utilization(40.0)
        .defect_rate(12.0)
        .build()];
    let analysis = BottleneckDetector::default().detect(&line);

    assert!(analysis.has_bottleneck());
    // 主瓶颈 + 再平衡 + 合批 + 质量 + 效率告警
    assert_eq!(analysis.recommendations.len(), 5);
    assert!(analysis.recommendations[0].contains("Sewing Line 1"));
}

#[test]
fn test_predicted_delays_for_jobs_at_bottleneck_stage() {
    let jobs = vec![
        job("J1", JobStage::Sewing, JobStatus::Pending),
        job("J2", JobStage::Sewing, JobStatus::Completed),
        job("J3", JobStage::Cutting, JobStatus::InProgress),
    ];
    let analysis = BottleneckDetector::default().detect_with_jobs(&three_station_line(), &jobs);

    assert_eq!(analysis.predicted_completion_delays.len(), 1);
    let delay = &analysis.predicted_completion_delays[0];
    assert_eq!(delay.job_id, "J1");
    assert_eq!(delay.station_id, "S1");
    assert!((delay.expected_delay_hours - 2.0).abs() < 1e-9);
}

#[test]
fn test_no_queue_data_means_no_prediction() {
    let line = vec![StationMetric::sewing("S1", "Sewing Line 1")
        .throughput(10.0, 50.0)
        .wait_time(180.0)
        .utilization(90.0)
        .build()];
    let jobs = vec![job("J1", JobStage::Sewing, JobStatus::Pending)];
    let analysis = BottleneckDetector::default().detect_with_jobs(&line, &jobs);

    assert!(analysis.has_bottleneck());
    assert!(analysis.predicted_completion_delays.is_empty());
}

// ==========================================
// 趋势分析
// ==========================================

fn snapshot(hours: i64, slow_throughput: f64) -> (DateTime<Utc>, Vec<StationMetric>) {
    let ts = base_time() + Duration::hours(hours);
    (
        ts,
        vec![
            StationMetric::cutting("C1", "Cut").throughput(50.0, 50.0).at(ts).build(),
            StationMetric::sewing("S1", "Sew")
                .throughput(slow_throughput, 50.0)
                .at(ts)
                .build(),
        ],
    )
}

#[test]
fn test_trend_worsening() {
    let detector = BottleneckDetector::default();
    let history = vec![
        snapshot(0, 45.0),
        snapshot(1, 45.0),
        snapshot(2, 30.0),
        snapshot(3, 30.0),
        snapshot(4, 30.0),
    ];
    let report = TrendAnalyzer::new(&detector).analyze(&history);

    assert_eq!(report.trend, EfficiencyTrend::Worsening);
    assert!((report.recent_efficiency - 60.0).abs() < 1e-9);
    assert!((report.historical_efficiency - 90.0).abs() < 1e-9);
    assert_eq!(report.history.len(), 5);
}

#[test]
fn test_trend_improving_with_unsorted_history() {
    let detector = BottleneckDetector::default();
    let history = vec![
        snapshot(4, 45.0),
        snapshot(0, 30.0),
        snapshot(3, 45.0),
        snapshot(1, 30.0),
        snapshot(2, 45.0),
    ];
    let report = TrendAnalyzer::new(&detector).analyze(&history);

    assert_eq!(report.trend, EfficiencyTrend::Improving);
    assert!(report.history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_trend_within_tolerance_is_stable() {
    let detector = BottleneckDetector::default();
    let history = vec![
        snapshot(0, 40.0),
        snapshot(1, 40.0),
        snapshot(2, 39.0),
        snapshot(3, 39.0),
        snapshot(4, 39.0),
    ];
    let report = TrendAnalyzer::new(&detector).analyze(&history);
    assert_eq!(report.trend, EfficiencyTrend::Stable);
}

#[test]
fn test_trend_without_history() {
    let detector = BottleneckDetector::default();
    let report = TrendAnalyzer::new(&detector).analyze(&[]);

    assert_eq!(report.trend, EfficiencyTrend::Stable);
    assert!(report.history.is_empty());
    assert!(report.recommendations.is_empty());
    assert_eq!(report.trend_analysis, crate::i18n::t("trend.no_history"));
}
