// ==========================================
// 阶段切换 API 集成测试
// ==========================================
// 测试目标: 门禁拒绝不写库; 放行后回写阶段 + 即时重评 + 审计留痕
// ==========================================


use project_governance::api::{ApiError, GovernanceApi};
use project_governance::domain::{DeliverableKind, HealthIndicator, Phase, ProjectStatus};
use project_governance::engine::{GovernanceEvent, GovernanceEventSink, OptionalEventSink};
use project_governance::repository::{ActionLogEventSink, ActionLogRepository, ProjectRepository};
use std::error::Error;
use std::sync::{Arc, Mutex};
use test_helpers::{active_project, create_test_db, now, open_test_connection, seed_project};

struct FailingSink;

impl GovernanceEventSink for FailingSink {
    fn record(&self, _event: GovernanceEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        Err("audit store offline".into())
    }
}

struct Fixture {
    _temp_file: tempfile::NamedTempFile,
    repo: Arc<ProjectRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    api: GovernanceApi,
}

fn fixture() -> Fixture {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = Arc::new(Mutex::new(open_test_connection(&db_path).unwrap()));

    let repo = Arc::new(ProjectRepository::from_connection(conn.clone()));
    let action_log_repo = Arc::new(ActionLogRepository::new(conn));
    let audit_sink = Arc::new(ActionLogEventSink::new(action_log_repo.clone()));
    let sink = OptionalEventSink::with_sink(audit_sink);
    let api = GovernanceApi::new(repo.clone(), sink);

    Fixture {
        _temp_file: temp_file,
        repo,
        action_log_repo,
        api,
    }
}

#[test]
fn test_denied_transition_leaves_project_untouched() {
    let fx = fixture();
    seed_project(&fx.repo, &active_project("P1", Phase::AnalysisClarification), &[]).unwrap();

    let outcome = fx
        .api
        .request_transition("P1", Phase::PlanningValidation, "alice", now())
        .unwrap();

    assert!(!outcome.applied);
    assert!(!outcome.gate.allowed);
    assert_eq!(outcome.gate.missing, vec![DeliverableKind::ProjectCharter]);
    assert!(outcome.health.is_none());

    let project = fx.repo.find_project("P1").unwrap().unwrap();
    assert_eq!(project.phase, Phase::AnalysisClarification);
    assert!(project.last_scored_at.is_none());
    assert_eq!(fx.action_log_repo.count_by_project("P1").unwrap(), 0);
}

#[test]
fn test_allowed_transition_persists_phase_and_rescores() {
    let fx = fixture();
    seed_project(
        &fx.repo,
        &active_project("P1", Phase::AnalysisClarification),
        &[DeliverableKind::ProjectCharter],
    )
    .unwrap();

    let outcome = fx
        .api
        .request_transition("P1", Phase::PlanningValidation, "alice", now())
        .unwrap();

    assert!(outcome.applied);
    assert_eq!(outcome.health, Some(HealthIndicator::Green));

    let project = fx.repo.find_project("P1").unwrap().unwrap();
    assert_eq!(project.phase, Phase::PlanningValidation);
    assert_eq!(project.last_scored_at, Some(now()));

    let logs = fx.action_log_repo.find_by_project("P1").unwrap();
    let mut types: Vec<&str> = logs.iter().map(|l| l.action_type.as_str()).collect();
    types.sort();
    assert_eq!(types, vec!["HEALTH_RESCORED", "PHASE_TRANSITION"]);

    let transition = logs
        .iter()
        .find(|l| l.action_type == "PHASE_TRANSITION")
        .unwrap();
    assert_eq!(transition.actor, "alice");
    assert_eq!(
        transition.payload_json.as_ref().unwrap()["to"],
        "PLANNING_VALIDATION"
    );
}

#[test]
fn test_transition_without_requirements_passes() {
    let fx = fixture();
    seed_project(&fx.repo, &active_project("P1", Phase::Demand), &[]).unwrap();

    let outcome = fx
        .api
        .request_transition("P1", Phase::AnalysisClarification, "bob", now())
        .unwrap();
    assert!(outcome.applied);
    assert!(outcome.gate.required.is_empty());
}

#[test]
fn test_closed_project_transition_is_not_rescored() {
    let fx = fixture();
    let mut project = active_project("P1", Phase::ExecutionTracking);
    project.status = ProjectStatus::Closed;
    seed_project(&fx.repo, &project, &[]).unwrap();

    let outcome = fx
        .api
        .request_transition("P1", Phase::UatDeployment, "bob", now())
        .unwrap();
    assert!(outcome.applied);
    assert!(outcome.health.is_none());
    assert!(fx.repo.find_project("P1").unwrap().unwrap().last_scored_at.is_none());
}

#[test]
fn test_failing_sink_does_not_block_transition() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = Arc::new(ProjectRepository::new(&db_path).unwrap());
    seed_project(
        &repo,
        &active_project("P1", Phase::AnalysisClarification),
        &[DeliverableKind::ProjectCharter],
    )
    .unwrap();

    let api = GovernanceApi::new(repo.clone(), OptionalEventSink::with_sink(Arc::new(FailingSink)));
    let outcome = api
        .request_transition("P1", Phase::PlanningValidation, "carol", now())
        .unwrap();

    assert!(outcome.applied);
    assert_eq!(
        repo.find_project("P1").unwrap().unwrap().phase,
        Phase::PlanningValidation
    );
}

#[test]
fn test_input_errors() {
    let fx = fixture();

    assert!(matches!(
        fx.api.request_transition("", Phase::PlanningValidation, "x", now()),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        fx.api.evaluate_transition("GHOST", Phase::PlanningValidation),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_evaluate_transition_is_read_only() {
    let fx = fixture();
    seed_project(
        &fx.repo,
        &active_project("P1", Phase::PlanningValidation),
        &[DeliverableKind::Wbs, DeliverableKind::DetailedPlanning, DeliverableKind::RaciMatrix],
    )
    .unwrap();

    let result = fx
        .api
        .evaluate_transition("P1", Phase::ExecutionTracking)
        .unwrap();
    assert!(!result.allowed);
    assert_eq!(result.missing, vec![DeliverableKind::BudgetBaseline]);
    assert!(result.message.contains("Budget Baseline"));
    assert_eq!(
        fx.repo.find_project("P1").unwrap().unwrap().phase,
        Phase::PlanningValidation
    );
}
