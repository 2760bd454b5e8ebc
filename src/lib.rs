// ==========================================
// IT 项目治理核心 - 核心库
// ==========================================
// 两个决策引擎: 阶段门禁 (PhaseGate) + 组合健康度评分 (HealthScorer)
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AnomalyPriority, AnomalyStatus, DeliverableKind, HealthIndicator, Phase, ProjectStatus,
    RiskImpact, RiskProbability, RiskStatus,
};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Anomaly, BudgetSnapshot, Deliverable, Project, ProjectAggregate,
    ProjectRisk, SoftDeletable,
};

// 引擎
pub use engine::{
    DeliverableRequirementTable, GateResult, HealthAssessment, HealthScorer, HealthThresholds,
    PhaseGate, ScoreResult,
};

// API
pub use api::{GovernanceApi, PortfolioApi, RescoreReport, TransitionOutcome};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "IT 项目治理核心";
