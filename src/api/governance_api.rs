// ==========================================
// IT 项目治理核心 - 阶段切换 API
// ==========================================
// 职责: 门禁评估 → 阶段回写 → 即时重评 → 事件通知
// 红线: 事件通知失败不影响切换结果
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::error::{require_project_id, ApiError, ApiResult};
use crate::domain::project::ProjectAggregate;
use crate::domain::types::{HealthIndicator, Phase};
use crate::engine::events::{GovernanceEvent, GovernanceEventKind, OptionalEventSink};
use crate::engine::health_scorer::HealthScorer;
use crate::engine::phase_gate::{GateResult, PhaseGate};
use crate::repository::project_repo::ProjectRepository;

/// 阶段切换请求结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub project_id: String,
    pub gate: GateResult,
    /// 阶段是否已回写
    pub applied: bool,
    /// 切换后即时重评的健康度（未重评或回写失败时为 None）
    pub health: Option<HealthIndicator>,
}

// ==========================================
// GovernanceApi - 阶段切换 API
// ==========================================
pub struct GovernanceApi {
    project_repo: Arc<ProjectRepository>,
    gate: PhaseGate,
    scorer: HealthScorer,
    event_sink: OptionalEventSink,
}

impl GovernanceApi {
    pub fn new(project_repo: Arc<ProjectRepository>, event_sink: OptionalEventSink) -> Self {
        Self {
            project_repo,
            gate: PhaseGate::new(),
            scorer: HealthScorer::new(),
            event_sink,
        }
    }

    pub fn with_gate(mut self, gate: PhaseGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_scorer(mut self, scorer: HealthScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// 仅评估, 不回写
    pub fn evaluate_transition(&self, project_id: &str, target: Phase) -> ApiResult<GateResult> {
        let aggregate = self.load(project_id)?;
        Ok(self.gate.evaluate(&aggregate, target))
    }

    /// 请求阶段切换
    ///
    /// # 流程
    /// 1. 读取聚合快照并评估门禁
    /// 2. 拒绝: 直接返回 (applied = false), 不写库
    /// 3. 放行: 按评估时阶段条件回写 (被并发修改时返回 OptimisticLockFailure),
    ///    对可评分项目立即重评并回写健康度
    /// 4. 发送 PhaseTransitioned / HealthRescored 事件 (失败只告警)
    pub fn request_transition(
        &self,
        project_id: &str,
        target: Phase,
        actor: &str,
        now: NaiveDateTime,
    ) -> ApiResult<TransitionOutcome> {
        let mut aggregate = self.load(project_id)?;
        let project_id = aggregate.project.project_id.clone();
        let gate = self.gate.evaluate(&aggregate, target);

        if !gate.allowed {
            tracing::info!(
                project_id = %project_id,
                from = %gate.from,
                to = %gate.to,
                missing = ?gate.missing_labels(),
                "阶段切换被门禁拒绝"
            );
            return Ok(TransitionOutcome {
                project_id,
                gate,
                applied: false,
                health: None,
            });
        }

        // 条件回写: 阶段须仍为评估时的 from
        self.project_repo.update_phase(&project_id, gate.from, target)?;
        aggregate.project.phase = target;

        tracing::info!(
            project_id = %project_id,
            from = %gate.from,
            to = %gate.to,
            actor,
            "阶段切换完成"
        );

        self.event_sink.dispatch(GovernanceEvent::for_project(
            GovernanceEventKind::PhaseTransitioned,
            project_id.clone(),
            json!({
                "from": gate.from.to_db_str(),
                "to": gate.to.to_db_str(),
                "actor": actor,
            }),
            now,
        ));

        let health = self.rescore_after_transition(&aggregate, now);

        Ok(TransitionOutcome {
            project_id,
            gate,
            applied: true,
            health,
        })
    }

    fn rescore_after_transition(
        &self,
        aggregate: &ProjectAggregate,
        now: NaiveDateTime,
    ) -> Option<HealthIndicator> {
        if !aggregate.project.status.is_scorable() {
            return None;
        }

        let result = self.scorer.score_result(aggregate, now);
        // 阶段已提交, 健康度回写失败只告警
        if let Err(e) = self
            .project_repo
            .update_health(&result.project_id, result.indicator, result.scored_at)
        {
            tracing::warn!(
                project_id = %result.project_id,
                error = %e,
                "切换后健康度回写失败"
            );
            return None;
        }

        self.event_sink.dispatch(GovernanceEvent::for_project(
            GovernanceEventKind::HealthRescored,
            result.project_id.clone(),
            json!({
                "previous": result.previous.to_db_str(),
                "indicator": result.indicator.to_db_str(),
                "red_score": result.red_score,
                "amber_score": result.amber_score,
            }),
            now,
        ));

        Some(result.indicator)
    }

    fn load(&self, project_id: &str) -> ApiResult<ProjectAggregate> {
        let id = require_project_id(project_id)?;
        self.project_repo
            .load_aggregate(id)?
            .ok_or_else(|| ApiError::NotFound(format!("项目(id={})不存在", id)))
    }
}
