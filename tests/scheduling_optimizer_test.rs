// ==========================================
// 排程优化引擎集成测试
// ==========================================
// 测试目标: 守恒 / 确定性 / 优先级 / 产能上限 / 典型场景
// ==========================================


use chrono::Duration;
use garment_aps::config::{IntelligenceConfig, SkillMatchMode};
use garment_aps::domain::schedule::{ConflictReason, UnscheduledReason};
use garment_aps::domain::types::{JobStage, JobStatus, Priority, ResourceType, Severity};
use garment_aps::engine::SchedulingOptimizer;
use garment_aps::i18n::t;
use std::collections::HashSet;
use test_helpers::{horizon_start, JobBuilder, ResourceBuilder};

fn mixed_jobs() -> Vec<garment_aps::Job> {
    vec![
        JobBuilder::new("J1").priority(Priority::High).hours(6.0).build(),
        JobBuilder::new("J2")
            .priority(Priority::Urgent)
            .hours(12.0)
            .deadline_in_days(2)
            .build(),
        JobBuilder::new("J3")
            .skill("SEWING")
            .stage(JobStage::Sewing)
            .hours(20.0)
            .build(),
        JobBuilder::new("J4").skill("EMBROIDERY").build(),
        JobBuilder::new("J5").status(JobStatus::Completed).build(),
        JobBuilder::new("J6").hours(0.0).build(),
        JobBuilder::new("J7")
            .priority(Priority::Low)
            .hours(500.0)
            .build(),
    ]
}

fn mixed_resources() -> Vec<garment_aps::Resource> {
    vec![
        ResourceBuilder::new("R1").build(),
        ResourceBuilder::new("R2")
            .skills(&["SEWING", "CUTTING"])
            .efficiency(80.0)
            .utilization(25.0)
            .build(),
        ResourceBuilder::new("M1")
            .resource_type(ResourceType::Machine)
            .skills(&["SEWING"])
            .capacity(10.0)
            .build(),
    ]
}

#[test]
fn test_every_job_is_scheduled_or_explained() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = mixed_jobs();
    let schedule = optimizer.optimize(&jobs, &mixed_resources(), horizon_start());

    assert_eq!(schedule.total_jobs, jobs.len());
    assert_eq!(
        schedule.scheduled_jobs + schedule.unscheduled_jobs.len(),
        schedule.total_jobs
    );

    let mut seen: HashSet<&str> = HashSet::new();
    for a in &schedule.assignments {
        assert!(seen.insert(a.job_id.as_str()), "作业 {} 重复分配", a.job_id);
    }
    for u in &schedule.unscheduled_jobs {
        assert!(seen.insert(u.job_id.as_str()), "作业 {} 同时出现在两个集合", u.job_id);
        assert!(!u.detail.is_empty());
    }
    assert_eq!(seen.len(), jobs.len());

    assert_eq!(
        schedule.unscheduled_for("J4").map(|u| u.reason),
        Some(UnscheduledReason::NoSkillMatch)
    );
    assert_eq!(
        schedule.unscheduled_for("J5").map(|u| u.reason),
        Some(UnscheduledReason::AlreadyCompleted)
    );
    assert_eq!(
        schedule.unscheduled_for("J6").map(|u| u.reason),
        Some(UnscheduledReason::InvalidJob)
    );
    assert_eq!(
        schedule.unscheduled_for("J7").map(|u| u.reason),
        Some(UnscheduledReason::CapacityExceeded)
    );
}

#[test]
fn test_same_input_same_schedule() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = mixed_jobs();
    let resources = mixed_resources();

    let first = optimizer.optimize(&jobs, &resources, horizon_start());
    let second = optimizer.optimize(&jobs, &resources, horizon_start());

    assert_eq!(first, second);
}

#[test]
fn test_assignments_respect_skills_and_horizon() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = mixed_jobs();
    let resources = mixed_resources();
    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    let horizon_end = horizon_start() + Duration::days(schedule.horizon_days as i64);
    for a in &schedule.assignments {
        let job = jobs.iter().find(|j| j.id == a.job_id).unwrap();
        let resource = resources.iter().find(|r| r.id == a.resource_id).unwrap();
        assert!(resource.has_any_skill(&job.required_skills));
        assert!(a.start_time >= horizon_start());
        assert!(a.end_time > a.start_time);
        assert!(a.end_time <= horizon_end);
        assert_eq!(a.on_time, a.end_time <= job.deadline);
    }
}

#[test]
fn test_committed_hours_never_exceed_available() {
    let optimizer = SchedulingOptimizer::default();
    let jobs: Vec<_> = (0..30)
        .map(|i| {
            JobBuilder::new(&format!("J{:02}", i))
                .hours(3.0 + (i % 7) as f64)
                .build()
        })
        .collect();
    let resources = vec![
        ResourceBuilder::new("R1").efficiency(75.0).build(),
        ResourceBuilder::new("R2").utilization(50.0).build(),
    ];

    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    assert_eq!(schedule.resource_loads.len(), 2);
    for load in &schedule.resource_loads {
        assert!(load.committed_hours <= load.available_hours + 1e-6);
        assert!(load.utilization_percent <= 100.0);
    }
    // R1: 8 * 0.75 * 14 天, R2: 8 * 0.5 * 14 天
    assert!((schedule.resource_loads[0].available_hours - 84.0).abs() < 1e-6);
    assert!((schedule.resource_loads[1].available_hours - 56.0).abs() < 1e-6);
}

#[test]
fn test_daily_capacity_discounted_by_efficiency() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = vec![JobBuilder::new("J1").hours(10.0).build()];
    let resources = vec![ResourceBuilder::new("R1").efficiency(50.0).build()];

    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    let a = schedule.assignment_for("J1").unwrap();
    assert_eq!(a.start_time, horizon_start());
    // 日有效产能 4h: 4 + 4 + 2
    assert_eq!(a.end_time, horizon_start() + Duration::hours(50));
}

#[test]
fn test_urgent_takes_single_slot_before_low() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = vec![
        JobBuilder::new("LOW")
            .priority(Priority::Low)
            .deadline_in_days(1)
            .build(),
        JobBuilder::new("URGENT")
            .priority(Priority::Urgent)
            .deadline_in_days(5)
            .build(),
    ];
    let resources = vec![ResourceBuilder::new("R1").build()];

    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    let urgent = schedule.assignment_for("URGENT").unwrap();
    let low = schedule.assignment_for("LOW").unwrap();
    assert_eq!(urgent.start_time, horizon_start());
    assert!(low.start_time >= urgent.end_time);
    assert_eq!(schedule.assignments[0].job_id, "URGENT");
}

#[test]
fn test_urgent_and_low_cutting_jobs_share_one_operator() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = vec![
        JobBuilder::new("J1")
            .priority(Priority::Urgent)
            .deadline_in_days(2)
            .hours(10.0)
            .build(),
        JobBuilder::new("J2")
            .priority(Priority::Low)
            .deadline_in_days(20)
            .hours(10.0)
            .build(),
    ];
    let resources = vec![ResourceBuilder::new("R1").build()];

    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    assert_eq!(schedule.scheduled_jobs, 2);
    assert!(schedule.unscheduled_jobs.is_empty());

    let j1 = schedule.assignment_for("J1").unwrap();
    let j2 = schedule.assignment_for("J2").unwrap();
    assert_eq!(j1.end_time, horizon_start() + Duration::hours(26));
    assert!(j1.on_time);
    assert_eq!(j2.start_time, j1.end_time);
    assert!(j2.on_time);
    assert!(schedule.at_risk_conflicts().next().is_none());
}

#[test]
fn test_embroidery_job_without_embroidery_resource_is_unscheduled() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = vec![JobBuilder::new("J1")
        .skill("EMBROIDERY")
        .stage(JobStage::Printing)
        .build()];
    let resources = vec![ResourceBuilder::new("R1").skills(&["CUTTING"]).build()];

    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    assert!(schedule.assignments.is_empty());
    let diag = schedule.unscheduled_for("J1").unwrap();
    assert_eq!(diag.reason, UnscheduledReason::NoSkillMatch);
    assert!(diag.detail.contains("EMBROIDERY"));
    assert!(!schedule.recommendations.is_empty());
}

#[test]
fn test_empty_jobs_scores_full() {
    let optimizer = SchedulingOptimizer::default();
    let resources = vec![ResourceBuilder::new("R1").build()];

    let schedule = optimizer.optimize(&[], &resources, horizon_start());

    assert_eq!(schedule.total_jobs, 0);
    assert_eq!(schedule.scheduled_jobs, 0);
    assert_eq!(schedule.optimization_score, 100.0);
    assert_eq!(schedule.recommendations, vec![t("optimizer.no_jobs")]);
}

#[test]
fn test_empty_resource_pool_leaves_all_jobs_unscheduled() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = vec![
        JobBuilder::new("J1").build(),
        JobBuilder::new("J2").hours(-1.0).build(),
    ];

    let schedule = optimizer.optimize(&jobs, &[], horizon_start());

    assert_eq!(schedule.scheduled_jobs, 0);
    assert_eq!(
        schedule.unscheduled_for("J1").map(|u| u.reason),
        Some(UnscheduledReason::NoResources)
    );
    assert_eq!(
        schedule.unscheduled_for("J2").map(|u| u.reason),
        Some(UnscheduledReason::InvalidJob)
    );
}

#[test]
fn test_invalid_resource_is_excluded_from_pool() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = vec![JobBuilder::new("J1").build()];
    let resources = vec![
        ResourceBuilder::new("BAD").capacity(0.0).build(),
        ResourceBuilder::new("R1").build(),
    ];

    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    assert_eq!(schedule.assignment_for("J1").map(|a| a.resource_id.as_str()), Some("R1"));
    assert!(schedule.resource_loads.iter().all(|l| l.resource_id != "BAD"));
}

#[test]
fn test_late_urgent_job_flagged_at_risk() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = vec![JobBuilder::new("J1")
        .priority(Priority::Urgent)
        .deadline_in_days(1)
        .hours(30.0)
        .build()];
    let resources = vec![ResourceBuilder::new("R1").build()];

    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    let a = schedule.assignment_for("J1").unwrap();
    assert!(!a.on_time);
    let risks: Vec<_> = schedule.at_risk_conflicts().collect();
    assert_eq!(risks.len(), 1);
    assert_eq!(risks[0].reason, ConflictReason::AtRisk);
    assert_eq!(risks[0].severity, Severity::Critical);
    assert_eq!(risks[0].job_ids, vec!["J1".to_string()]);
}

#[test]
fn test_dependency_starts_after_predecessor() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = vec![
        JobBuilder::new("CUT").hours(6.0).build(),
        JobBuilder::new("SEW")
            .skill("SEWING")
            .stage(JobStage::Sewing)
            .hours(4.0)
            .depends_on("CUT")
            .build(),
    ];
    let resources = vec![
        ResourceBuilder::new("R1").build(),
        ResourceBuilder::new("R2").skills(&["SEWING"]).build(),
    ];

    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    let cut = schedule.assignment_for("CUT").unwrap();
    let sew = schedule.assignment_for("SEW").unwrap();
    assert_eq!(sew.resource_id, "R2");
    assert!(sew.start_time >= cut.end_time);
    assert!(schedule
        .conflicts
        .iter()
        .all(|c| c.reason != ConflictReason::DependencyUnmet));
}

#[test]
fn test_completed_dependency_counts_as_satisfied() {
    let optimizer = SchedulingOptimizer::default();
    let jobs = vec![
        JobBuilder::new("CUT").status(JobStatus::Completed).build(),
        JobBuilder::new("SEW")
            .skill("SEWING")
            .depends_on("CUT")
            .build(),
    ];
    let resources = vec![ResourceBuilder::new("R1").skills(&["SEWING"]).build()];

    let schedule = optimizer.optimize(&jobs, &resources, horizon_start());

    assert_eq!(
        schedule.assignment_for("SEW").map(|a| a.start_time),
        Some(horizon_start())
    );
    assert!(schedule.conflicts.is_empty());
}

#[test]
fn test_all_skills_mode_requires_every_skill() {
    let mut config = IntelligenceConfig::default();
    config.optimizer.skill_match = SkillMatchMode::All;
    let optimizer = SchedulingOptimizer::from_config(&config);

    let mut job = JobBuilder::new("J1").build();
    job.required_skills.insert("PATTERN".to_string());
    let resources = vec![
        ResourceBuilder::new("R1").skills(&["CUTTING"]).build(),
        ResourceBuilder::new("R2").skills(&["CUTTING", "PATTERN"]).build(),
    ];

    let schedule = optimizer.optimize(&[job], &resources, horizon_start());

    assert_eq!(schedule.assignment_for("J1").map(|a| a.resource_id.as_str()), Some("R2"));
}
