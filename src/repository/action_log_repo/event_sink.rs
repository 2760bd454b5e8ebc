// ==========================================
// 审计 sink 适配器
// ==========================================
// 将引擎层的 GovernanceEvent 落到 action_log 表
// ==========================================

use super::core::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::engine::events::{GovernanceEvent, GovernanceEventKind, GovernanceEventSink};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

const SYSTEM_ACTOR: &str = "system";

impl From<GovernanceEventKind> for ActionType {
    fn from(kind: GovernanceEventKind) -> Self {
        match kind {
            GovernanceEventKind::PhaseTransitioned => ActionType::PhaseTransition,
            GovernanceEventKind::HealthRescored => ActionType::HealthRescored,
            GovernanceEventKind::PortfolioRescored => ActionType::PortfolioRescored,
        }
    }
}

/// 基于 action_log 的审计 sink
pub struct ActionLogEventSink {
    repo: Arc<ActionLogRepository>,
}

impl ActionLogEventSink {
    pub fn new(repo: Arc<ActionLogRepository>) -> Self {
        Self { repo }
    }
}

impl GovernanceEventSink for ActionLogEventSink {
    fn record(&self, event: GovernanceEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        // payload 中携带 actor 时优先使用
        let actor = event
            .payload
            .get("actor")
            .and_then(|v| v.as_str())
            .unwrap_or(SYSTEM_ACTOR)
            .to_string();

        let log = ActionLog {
            action_id: Uuid::new_v4().to_string(),
            project_id: event.project_id,
            action_type: ActionType::from(event.event_kind).as_str().to_string(),
            action_ts: event.occurred_at,
            actor,
            payload_json: Some(event.payload),
            detail: None,
        };

        self.repo.insert(&log)?;
        Ok(())
    }
}
