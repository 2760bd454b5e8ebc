// ==========================================
// 组合批量重评集成测试
// ==========================================
// 测试目标: 只重评活动项目; 回写逐项目提交; 通知失败不影响回写
// ==========================================


use project_governance::api::{ApiError, PortfolioApi};
use project_governance::domain::{
    BudgetSnapshot, HealthIndicator, Phase, ProjectStatus, RiskImpact, RiskProbability,
};
use project_governance::engine::{
    GovernanceEvent, GovernanceEventKind, GovernanceEventSink, OptionalEventSink,
};
use project_governance::repository::{ActionLogEventSink, ActionLogRepository, ProjectRepository};
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_helpers::{active_project, create_test_db, now, open_test_connection, risk, seed_project};

struct FailingSink;

impl GovernanceEventSink for FailingSink {
    fn record(&self, _event: GovernanceEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        Err("mail gateway unreachable".into())
    }
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<GovernanceEvent>>,
}

impl GovernanceEventSink for CollectingSink {
    fn record(&self, event: GovernanceEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// 一个 Closed 项目 (预算严重超支) + 一个 Active 项目 (严重风险)
fn seed_closed_and_active(repo: &ProjectRepository) {
    let mut closed = active_project("CLOSED", Phase::ClosureLessonsLearned);
    closed.status = ProjectStatus::Closed;
    seed_project(repo, &closed, &[]).unwrap();
    repo.upsert_budget("CLOSED", &BudgetSnapshot::new(100.0, 300.0)).unwrap();

    seed_project(repo, &active_project("ACTIVE", Phase::Demand), &[]).unwrap();
    repo.insert_risk(&risk("R1", "ACTIVE", RiskProbability::Medium, RiskImpact::Critical))
        .unwrap();
}

#[test]
fn test_rescore_only_updates_active_projects() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_closed_and_active(&repo);

    let collecting = Arc::new(CollectingSink::default());
    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::with_sink(collecting.clone()));

    let report = api.rescore_portfolio(now()).unwrap();

    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.updated[0].project_id, "ACTIVE");
    assert_eq!(report.updated[0].indicator, HealthIndicator::Red);
    assert_eq!(report.changed_count(), 1);
    assert!(report.is_complete());

    let active = repo.find_project("ACTIVE").unwrap().unwrap();
    assert_eq!(active.health, HealthIndicator::Red);
    assert_eq!(active.last_scored_at, Some(now()));

    let closed = repo.find_project("CLOSED").unwrap().unwrap();
    assert_eq!(closed.health, HealthIndicator::Green);
    assert!(closed.last_scored_at.is_none());

    let events = collecting.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_kind, GovernanceEventKind::PortfolioRescored);
    assert!(events[0].project_id.is_none());
}

#[test]
fn test_failing_sink_does_not_abort_write_back() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_closed_and_active(&repo);

    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::with_sink(Arc::new(FailingSink)));
    let report = api.rescore_portfolio(now()).unwrap();

    assert_eq!(report.updated.len(), 1);
    assert_eq!(
        repo.find_project("ACTIVE").unwrap().unwrap().health,
        HealthIndicator::Red
    );
}

#[test]
fn test_per_project_write_failure_is_reported() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_project(&repo, &active_project("GOOD", Phase::Demand), &[]).unwrap();
    seed_project(&repo, &active_project("BAD", Phase::Demand), &[]).unwrap();

    // 模拟单个项目回写失败
    let conn = open_test_connection(&db_path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TRIGGER reject_bad_health BEFORE UPDATE OF health ON project
        WHEN NEW.project_id = 'BAD'
        BEGIN
            SELECT RAISE(ABORT, 'health write-back rejected');
        END;
        "#,
    )
    .unwrap();
    drop(conn);

    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::none());
    let report = api.rescore_portfolio(now()).unwrap();

    let updated: Vec<&str> = report.updated.iter().map(|r| r.project_id.as_str()).collect();
    assert_eq!(updated, vec!["GOOD"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].project_id, "BAD");
    assert!(report.failed[0].error.contains("rejected"));
    assert!(!report.is_complete());

    assert_eq!(
        repo.find_project("GOOD").unwrap().unwrap().last_scored_at,
        Some(now())
    );
    assert!(repo.find_project("BAD").unwrap().unwrap().last_scored_at.is_none());
}

#[test]
fn test_zero_time_budget_schedules_nothing() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_closed_and_active(&repo);

    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::none())
        .with_time_budget(Some(Duration::ZERO));
    let report = api.rescore_portfolio(now()).unwrap();

    assert!(report.updated.is_empty());
    assert_eq!(report.skipped, vec!["ACTIVE".to_string()]);
    assert!(repo.find_project("ACTIVE").unwrap().unwrap().last_scored_at.is_none());
}

#[test]
fn test_rescore_writes_audit_log() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_closed_and_active(&repo);

    let conn = Arc::new(Mutex::new(open_test_connection(&db_path).unwrap()));
    let action_log_repo = Arc::new(ActionLogRepository::new(conn));
    let audit_sink = Arc::new(ActionLogEventSink::new(action_log_repo.clone()));
    let sink = OptionalEventSink::with_sink(audit_sink);

    PortfolioApi::new(repo, sink).rescore_portfolio(now()).unwrap();

    let logs = action_log_repo.find_by_action_type("PORTFOLIO_RESCORED", 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].payload_json.as_ref().unwrap()["updated"], 1);
}

#[test]
fn test_update_progress_validates_range_and_rescores() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    let mut project = active_project("P1", Phase::Demand);
    project.start_date = test_helpers::date(2026, 1, 1);
    project.planned_end_date = test_helpers::date(2026, 12, 31);
    seed_project(&repo, &project, &[]).unwrap();

    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::none());

    assert!(matches!(
        api.update_progress("P1", 120, now()),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.update_progress("P1", -1, now()),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.update_progress(" ", 10, now()),
        Err(ApiError::InvalidInput(_))
    ));

    // 时间进度约 41.5%
    let result = api.update_progress("P1", 10, now()).unwrap();
    assert_eq!(result.indicator, HealthIndicator::Red);

    let result = api.update_progress("P1", 45, now()).unwrap();
    assert_eq!(result.previous, HealthIndicator::Red);
    assert_eq!(result.indicator, HealthIndicator::Green);
}

#[test]
fn test_rescore_project_rejects_closed_and_unknown() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_closed_and_active(&repo);
    let api = PortfolioApi::new(repo, OptionalEventSink::none());

    assert!(matches!(
        api.rescore_project("CLOSED", now()),
        Err(ApiError::BusinessRuleViolation(_))
    ));
    assert!(matches!(
        api.rescore_project("NOPE", now()),
        Err(ApiError::NotFound(_))
    ));

    // 只读评分不受状态限制
    let assessment = api.score_project("CLOSED", now()).unwrap();
    assert_eq!(assessment.red_score, 2);
}

#[tokio::test]
async fn test_concurrent_rescore_matches_sequential() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_closed_and_active(&repo);
    for i in 0..8 {
        let id = format!("BULK{}", i);
        seed_project(&repo, &active_project(&id, Phase::Demand), &[]).unwrap();
        if i % 2 == 0 {
            repo.upsert_budget(&id, &BudgetSnapshot::new(1_000.0, 1_150.0)).unwrap();
        }
    }

    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::none());
    let report = api.rescore_portfolio_concurrent(now()).await.unwrap();

    assert_eq!(report.updated.len(), 9);
    assert!(report.is_complete());
    assert!(report.updated.iter().all(|r| r.project_id != "CLOSED"));

    let amber = report
        .updated
        .iter()
        .filter(|r| r.indicator == HealthIndicator::Amber)
        .count();
    assert_eq!(amber, 4);

    for result in &report.updated {
        let persisted = repo.find_project(&result.project_id).unwrap().unwrap();
        assert_eq!(persisted.health, result.indicator);
    }
}

/// GOOD 正常; BAD 的开始日期格式损坏
fn seed_with_corrupt_project(db_path: &str, repo: &ProjectRepository) {
    seed_project(repo, &active_project("BAD", Phase::Demand), &[]).unwrap();
    seed_project(repo, &active_project("GOOD", Phase::Demand), &[]).unwrap();
    repo.insert_risk(&risk("R1", "GOOD", RiskProbability::High, RiskImpact::Critical))
        .unwrap();

    let conn = open_test_connection(db_path).unwrap();
    conn.execute(
        "UPDATE project SET start_date = '2026/01/15' WHERE project_id = 'BAD'",
        [],
    )
    .unwrap();
}

#[test]
fn test_corrupt_project_does_not_block_rescore() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_with_corrupt_project(&db_path, &repo);

    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::none());
    let report = api.rescore_portfolio(now()).unwrap();

    let updated: Vec<&str> = report.updated.iter().map(|r| r.project_id.as_str()).collect();
    assert_eq!(updated, vec!["GOOD"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].project_id, "BAD");
    assert!(report.failed[0].error.contains("start_date"));

    let good = repo.find_project("GOOD").unwrap().unwrap();
    assert_eq!(good.health, HealthIndicator::Red);
    assert_eq!(good.last_scored_at, Some(now()));
}

#[tokio::test]
async fn test_concurrent_rescore_reports_corrupt_project() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_with_corrupt_project(&db_path, &repo);

    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::none());
    let report = api.rescore_portfolio_concurrent(now()).await.unwrap();

    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.updated[0].project_id, "GOOD");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].project_id, "BAD");
    assert_eq!(
        repo.find_project("GOOD").unwrap().unwrap().last_scored_at,
        Some(now())
    );
}

#[tokio::test]
async fn test_concurrent_rescore_stops_scheduling_when_budget_spent() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    let ids: Vec<String> = (0..30).map(|i| format!("BULK{:02}", i)).collect();
    for id in &ids {
        seed_project(&repo, &active_project(id, Phase::Demand), &[]).unwrap();
    }

    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::none())
        .with_concurrency(1)
        .with_time_budget(Some(Duration::from_micros(1)));
    let report = api.rescore_portfolio_concurrent(now()).await.unwrap();

    assert!(report.failed.is_empty());
    assert!(!report.skipped.is_empty());
    assert!(!report.is_complete());

    // 已评分的在前, 预算耗尽后的全部跳过
    let mut order: Vec<String> = report.updated.iter().map(|r| r.project_id.clone()).collect();
    order.extend(report.skipped.iter().cloned());
    assert_eq!(order, ids);

    for project_id in &report.skipped {
        let project = repo.find_project(project_id).unwrap().unwrap();
        assert!(project.last_scored_at.is_none());
    }
}

#[tokio::test]
async fn test_concurrent_zero_budget_schedules_nothing() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_closed_and_active(&repo);

    let api = PortfolioApi::new(repo.clone(), OptionalEventSink::none())
        .with_time_budget(Some(Duration::ZERO));
    let report = api.rescore_portfolio_concurrent(now()).await.unwrap();

    assert!(report.updated.is_empty());
    assert_eq!(report.skipped, vec!["ACTIVE".to_string()]);
}
