// ==========================================
// IT 项目治理核心 - 领域类型定义
// ==========================================
// 阶段 / 状态 / 健康度 / 交付物类别 / 风险与异常等级
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 治理阶段 (Phase)
// ==========================================
// 顺序: Demand < AnalysisClarification < ... < ClosureLessonsLearned
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Demand,                // 需求
    AnalysisClarification, // 分析澄清
    PlanningValidation,    // 规划确认
    ExecutionTracking,     // 执行跟踪
    UatDeployment,         // 验收与上线
    ClosureLessonsLearned, // 收尾与经验总结
}

impl Phase {
    /// 全部阶段（按治理顺序）
    pub const ALL: [Phase; 6] = [
        Phase::Demand,
        Phase::AnalysisClarification,
        Phase::PlanningValidation,
        Phase::ExecutionTracking,
        Phase::UatDeployment,
        Phase::ClosureLessonsLearned,
    ];

    /// 阶段序号（0 起）
    pub fn ordinal(&self) -> usize {
        match self {
            Phase::Demand => 0,
            Phase::AnalysisClarification => 1,
            Phase::PlanningValidation => 2,
            Phase::ExecutionTracking => 3,
            Phase::UatDeployment => 4,
            Phase::ClosureLessonsLearned => 5,
        }
    }

    /// 前一阶段（Demand 没有前一阶段）
    pub fn previous(&self) -> Option<Phase> {
        match self.ordinal() {
            0 => None,
            n => Some(Phase::ALL[n - 1]),
        }
    }

    /// 下一阶段（ClosureLessonsLearned 没有下一阶段）
    pub fn next(&self) -> Option<Phase> {
        Phase::ALL.get(self.ordinal() + 1).copied()
    }

    /// 从字符串解析阶段
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DEMAND" => Some(Phase::Demand),
            "ANALYSIS_CLARIFICATION" => Some(Phase::AnalysisClarification),
            "PLANNING_VALIDATION" => Some(Phase::PlanningValidation),
            "EXECUTION_TRACKING" => Some(Phase::ExecutionTracking),
            "UAT_DEPLOYMENT" => Some(Phase::UatDeployment),
            "CLOSURE_LESSONS_LEARNED" => Some(Phase::ClosureLessonsLearned),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Phase::Demand => "DEMAND",
            Phase::AnalysisClarification => "ANALYSIS_CLARIFICATION",
            Phase::PlanningValidation => "PLANNING_VALIDATION",
            Phase::ExecutionTracking => "EXECUTION_TRACKING",
            Phase::UatDeployment => "UAT_DEPLOYMENT",
            Phase::ClosureLessonsLearned => "CLOSURE_LESSONS_LEARNED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 项目状态 (Project Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Draft,             // 草稿
    Active,            // 进行中
    Suspended,         // 暂停
    ClosureInProgress, // 收尾中
    Closed,            // 已关闭
    Cancelled,         // 已取消
}

impl ProjectStatus {
    /// 是否参与健康度评分
    ///
    /// Closed / Cancelled 项目不参与评分
    pub fn is_scorable(&self) -> bool {
        !matches!(self, ProjectStatus::Closed | ProjectStatus::Cancelled)
    }

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Some(ProjectStatus::Draft),
            "ACTIVE" => Some(ProjectStatus::Active),
            "SUSPENDED" => Some(ProjectStatus::Suspended),
            "CLOSURE_IN_PROGRESS" => Some(ProjectStatus::ClosureInProgress),
            "CLOSED" => Some(ProjectStatus::Closed),
            "CANCELLED" => Some(ProjectStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "DRAFT",
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Suspended => "SUSPENDED",
            ProjectStatus::ClosureInProgress => "CLOSURE_IN_PROGRESS",
            ProjectStatus::Closed => "CLOSED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 健康度指示 (Health Indicator)
// ==========================================
// 顺序: Green < Amber < Red
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthIndicator {
    #[default]
    Green, // 正常
    Amber, // 关注
    Red,   // 危险
}

impl HealthIndicator {
    /// 从字符串解析（未知值回落为 GREEN）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "AMBER" => HealthIndicator::Amber,
            "RED" => HealthIndicator::Red,
            _ => HealthIndicator::Green,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            HealthIndicator::Green => "GREEN",
            HealthIndicator::Amber => "AMBER",
            HealthIndicator::Red => "RED",
        }
    }
}

impl fmt::Display for HealthIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 交付物类别 (Deliverable Kind)
// ==========================================
// 固定目录; label() 为界面展示名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliverableKind {
    DemandForm,
    BusinessCase,
    ProjectCharter,
    FeasibilityStudy,
    RequirementsSpecification,
    Wbs,
    DetailedPlanning,
    RaciMatrix,
    BudgetBaseline,
    RiskRegister,
    CommunicationPlan,
    SteeringCommitteeMinutes,
    ProgressReport,
    ChangeRequest,
    TestPlan,
    TestReport,
    AcceptanceReport,
    DeploymentPlan,
    GoLiveReport,
    ClosureReport,
    LessonsLearned,
}

impl DeliverableKind {
    /// 完整目录
    pub const ALL: [DeliverableKind; 21] = [
        DeliverableKind::DemandForm,
        DeliverableKind::BusinessCase,
        DeliverableKind::ProjectCharter,
        DeliverableKind::FeasibilityStudy,
        DeliverableKind::RequirementsSpecification,
        DeliverableKind::Wbs,
        DeliverableKind::DetailedPlanning,
        DeliverableKind::RaciMatrix,
        DeliverableKind::BudgetBaseline,
        DeliverableKind::RiskRegister,
        DeliverableKind::CommunicationPlan,
        DeliverableKind::SteeringCommitteeMinutes,
        DeliverableKind::ProgressReport,
        DeliverableKind::ChangeRequest,
        DeliverableKind::TestPlan,
        DeliverableKind::TestReport,
        DeliverableKind::AcceptanceReport,
        DeliverableKind::DeploymentPlan,
        DeliverableKind::GoLiveReport,
        DeliverableKind::ClosureReport,
        DeliverableKind::LessonsLearned,
    ];

    /// 展示名称
    pub fn label(&self) -> &'static str {
        match self {
            DeliverableKind::DemandForm => "Demand Form",
            DeliverableKind::BusinessCase => "Business Case",
            DeliverableKind::ProjectCharter => "Project Charter",
            DeliverableKind::FeasibilityStudy => "Feasibility Study",
            DeliverableKind::RequirementsSpecification => "Requirements Specification",
            DeliverableKind::Wbs => "WBS",
            DeliverableKind::DetailedPlanning => "Detailed Planning",
            DeliverableKind::RaciMatrix => "RACI Matrix",
            DeliverableKind::BudgetBaseline => "Budget Baseline",
            DeliverableKind::RiskRegister => "Risk Register",
            DeliverableKind::CommunicationPlan => "Communication Plan",
            DeliverableKind::SteeringCommitteeMinutes => "Steering Committee Minutes",
            DeliverableKind::ProgressReport => "Progress Report",
            DeliverableKind::ChangeRequest => "Change Request",
            DeliverableKind::TestPlan => "Test Plan",
            DeliverableKind::TestReport => "Test Report",
            DeliverableKind::AcceptanceReport => "Acceptance Report",
            DeliverableKind::DeploymentPlan => "Deployment Plan",
            DeliverableKind::GoLiveReport => "Go-Live Report",
            DeliverableKind::ClosureReport => "Closure Report",
            DeliverableKind::LessonsLearned => "Lessons Learned",
        }
    }

    /// 从字符串解析交付物类别
    pub fn from_str(s: &str) -> Option<Self> {
        let key = s.trim().to_uppercase();
        DeliverableKind::ALL
            .iter()
            .copied()
            .find(|k| k.to_db_str() == key)
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DeliverableKind::DemandForm => "DEMAND_FORM",
            DeliverableKind::BusinessCase => "BUSINESS_CASE",
            DeliverableKind::ProjectCharter => "PROJECT_CHARTER",
            DeliverableKind::FeasibilityStudy => "FEASIBILITY_STUDY",
            DeliverableKind::RequirementsSpecification => "REQUIREMENTS_SPECIFICATION",
            DeliverableKind::Wbs => "WBS",
            DeliverableKind::DetailedPlanning => "DETAILED_PLANNING",
            DeliverableKind::RaciMatrix => "RACI_MATRIX",
            DeliverableKind::BudgetBaseline => "BUDGET_BASELINE",
            DeliverableKind::RiskRegister => "RISK_REGISTER",
            DeliverableKind::CommunicationPlan => "COMMUNICATION_PLAN",
            DeliverableKind::SteeringCommitteeMinutes => "STEERING_COMMITTEE_MINUTES",
            DeliverableKind::ProgressReport => "PROGRESS_REPORT",
            DeliverableKind::ChangeRequest => "CHANGE_REQUEST",
            DeliverableKind::TestPlan => "TEST_PLAN",
            DeliverableKind::TestReport => "TEST_REPORT",
            DeliverableKind::AcceptanceReport => "ACCEPTANCE_REPORT",
            DeliverableKind::DeploymentPlan => "DEPLOYMENT_PLAN",
            DeliverableKind::GoLiveReport => "GO_LIVE_REPORT",
            DeliverableKind::ClosureReport => "CLOSURE_REPORT",
            DeliverableKind::LessonsLearned => "LESSONS_LEARNED",
        }
    }
}

impl fmt::Display for DeliverableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 风险概率 / 风险影响 / 风险状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskProbability {
    Low,
    Medium,
    High,
}

impl RiskProbability {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(RiskProbability::Low),
            "MEDIUM" => Some(RiskProbability::Medium),
            "HIGH" => Some(RiskProbability::High),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RiskProbability::Low => "LOW",
            RiskProbability::Medium => "MEDIUM",
            RiskProbability::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskImpact {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskImpact {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(RiskImpact::Low),
            "MEDIUM" => Some(RiskImpact::Medium),
            "HIGH" => Some(RiskImpact::High),
            "CRITICAL" => Some(RiskImpact::Critical),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RiskImpact::Low => "LOW",
            RiskImpact::Medium => "MEDIUM",
            RiskImpact::High => "HIGH",
            RiskImpact::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskStatus {
    Open,      // 未关闭
    Mitigated, // 已缓解
    Closed,    // 已关闭
}

impl RiskStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Some(RiskStatus::Open),
            "MITIGATED" => Some(RiskStatus::Mitigated),
            "CLOSED" => Some(RiskStatus::Closed),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RiskStatus::Open => "OPEN",
            RiskStatus::Mitigated => "MITIGATED",
            RiskStatus::Closed => "CLOSED",
        }
    }
}

// ==========================================
// 异常优先级 / 异常状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl AnomalyPriority {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(AnomalyPriority::Low),
            "MEDIUM" => Some(AnomalyPriority::Medium),
            "HIGH" => Some(AnomalyPriority::High),
            "CRITICAL" => Some(AnomalyPriority::Critical),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AnomalyPriority::Low => "LOW",
            AnomalyPriority::Medium => "MEDIUM",
            AnomalyPriority::High => "HIGH",
            AnomalyPriority::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyStatus {
    Open,       // 新建
    InProgress, // 处理中
    Resolved,   // 已解决
}

impl AnomalyStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Some(AnomalyStatus::Open),
            "IN_PROGRESS" => Some(AnomalyStatus::InProgress),
            "RESOLVED" => Some(AnomalyStatus::Resolved),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AnomalyStatus::Open => "OPEN",
            AnomalyStatus::InProgress => "IN_PROGRESS",
            AnomalyStatus::Resolved => "RESOLVED",
        }
    }
}
