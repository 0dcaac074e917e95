use super::core::BottleneckDetector;
use crate::domain::bottleneck::{BottleneckTrendReport, EfficiencyTrend, TrendPoint};
use crate::domain::station::StationMetric;
use crate::domain::types::Severity;
use crate::i18n::{fmt_num, t, t_with_args};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, instrument};

// ==========================================
// TrendAnalyzer - 瓶颈趋势分析
// ==========================================
// 近期 = 最后 N 个快照（默认 3）的效率均值，历史 = 其余快照均值
// 差值超过容差（默认 ±5）判定改善/恶化
pub struct TrendAnalyzer<'a> {
    detector: &'a BottleneckDetector,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(detector: &'a BottleneckDetector) -> Self {
        Self { detector }
    }

    #[instrument(skip(self, history), fields(snapshots = history.len()))]
    pub fn analyze(
        &self,
        history: &[(DateTime<Utc>, Vec<StationMetric>)],
    ) -> BottleneckTrendReport {
        let cfg = self.detector.config();

        let mut ordered: Vec<&(DateTime<Utc>, Vec<StationMetric>)> = history.iter().collect();
        ordered.sort_by_key(|(ts, _)| *ts);

        let points: Vec<TrendPoint> = ordered
            .iter()
            .map(|(timestamp, metrics)| {
                let analysis = self.detector.detect(metrics);
                TrendPoint {
                    timestamp: *timestamp,
                    bottleneck_count: analysis.detected_bottlenecks.len(),
                    worst_severity: analysis
                        .detected_bottlenecks
                        .iter()
                        .map(|b| b.severity)
                        .max()
                        .unwrap_or(Severity::None),
                    primary_station: analysis
                        .primary_bottleneck
                        .map(|b| b.station.station_id),
                    efficiency: analysis.overall_efficiency,
                }
            })
            .collect();

        let window = cfg.trend_recent_window.max(1);
        let split = points.len().saturating_sub(window);
        let (older, recent) = points.split_at(split);

        let recent_efficiency = mean_efficiency(recent).unwrap_or(100.0);
        let historical_efficiency = mean_efficiency(older).unwrap_or(recent_efficiency);

        let trend = if older.is_empty() {
            EfficiencyTrend::Stable
        } else if recent_efficiency - historical_efficiency > cfg.trend_tolerance {
            EfficiencyTrend::Improving
        } else if historical_efficiency - recent_efficiency > cfg.trend_tolerance {
            EfficiencyTrend::Worsening
        } else {
            EfficiencyTrend::Stable
        };

        let efficiency_args = [
            ("recent", fmt_num(recent_efficiency)),
            ("historical", fmt_num(historical_efficiency)),
        ];
        let efficiency_args: Vec<(&str, &str)> =
            efficiency_args.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let trend_analysis = if older.is_empty() {
            t("trend.no_history")
        } else {
            match trend {
                EfficiencyTrend::Improving => t_with_args("trend.improving", &efficiency_args),
                EfficiencyTrend::Worsening => t_with_args("trend.worsening", &efficiency_args),
                EfficiencyTrend::Stable => t_with_args("trend.stable", &efficiency_args),
            }
        };

        let mut recommendations = Vec::new();
        if !older.is_empty() {
            recommendations.push(match trend {
                EfficiencyTrend::Improving => t("trend.improving_action"),
                EfficiencyTrend::Worsening => {
                    let station = most_frequent_primary(recent).unwrap_or_else(|| "-".to_string());
                    t_with_args("trend.worsening_action", &[("station", &station)])
                }
                EfficiencyTrend::Stable => t("trend.stable_action"),
            });
        }
        if points.len() >= 2 {
            let recurring = primary_counts(&points).into_iter().max_by_key(|(_, c)| *c);
            if let Some((station, count)) = recurring {
                if count * 2 >= points.len() {
                    recommendations.push(t_with_args(
                        "trend.recurring_station",
                        &[("station", &station), ("count", &count.to_string())],
                    ));
                }
            }
        }

        info!(
            trend = %trend,
            recent = recent_efficiency,
            historical = historical_efficiency,
            "瓶颈趋势分析完成"
        );

        BottleneckTrendReport {
            trend,
            recent_efficiency,
            historical_efficiency,
            trend_analysis,
            history: points,
            recommendations,
        }
    }
}

fn mean_efficiency(points: &[TrendPoint]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    Some(points.iter().map(|p| p.efficiency).sum::<f64>() / points.len() as f64)
}

/// 主瓶颈出现次数（按工位 ID 排序，保证同次数时结果确定）
fn primary_counts(points: &[TrendPoint]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for station in points.iter().filter_map(|p| p.primary_station.clone()) {
        *counts.entry(station).or_insert(0) += 1;
    }
    counts
}

fn most_frequent_primary(points: &[TrendPoint]) -> Option<String> {
    primary_counts(points)
        .into_iter()
        .max_by_key(|(_, c)| *c)
        .map(|(station, _)| station)
}
