// ==========================================
// IT 项目治理核心 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod anomaly;
pub mod deliverable;
pub mod project;
pub mod risk;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use anomaly::Anomaly;
pub use deliverable::Deliverable;
pub use project::{BudgetSnapshot, Project, ProjectAggregate, SoftDeletable};
pub use risk::{ProjectRisk, RiskSeverity};
pub use types::{
    AnomalyPriority, AnomalyStatus, DeliverableKind, HealthIndicator, Phase, ProjectStatus,
    RiskImpact, RiskProbability, RiskStatus,
};
