// ==========================================
// IT 项目治理核心 - 引擎层
// ==========================================
// 职责: 阶段门禁 + 健康度评分, 纯计算不拼 SQL
// 红线: 所有规则必须输出可解释的结论 (缺失项 / 信号明细)
// ==========================================

pub mod deliverable_rules;
pub mod events;
pub mod health_scorer;
pub mod health_signals;
pub mod phase_gate;

// 重导出核心引擎
pub use deliverable_rules::DeliverableRequirementTable;
pub use events::{
    GovernanceEvent, GovernanceEventKind, GovernanceEventSink, NoOpEventSink, OptionalEventSink,
};
pub use health_scorer::{classify, BatchScoreOutcome, HealthAssessment, HealthScorer, ScoreResult};
pub use health_signals::{HealthThresholds, SignalContribution, SignalKind};
pub use phase_gate::{GateResult, PhaseGate};
