// ==========================================
// IT 项目治理核心 - 项目聚合领域模型
// ==========================================
// 聚合根: Project
// 聚合成员: BudgetSnapshot / Deliverable / ProjectRisk / Anomaly
// 红线: 评分只读取一个完整一致的聚合快照
// ==========================================

use crate::domain::anomaly::Anomaly;
use crate::domain::deliverable::Deliverable;
use crate::domain::risk::ProjectRisk;
use crate::domain::types::{DeliverableKind, HealthIndicator, Phase, ProjectStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// SoftDeletable - 逻辑删除能力
// ==========================================
/// 子实体只做逻辑删除，信号提取器统一通过 `is_active` 过滤
pub trait SoftDeletable {
    /// 是否已被逻辑删除
    fn is_deleted(&self) -> bool;

    /// 是否仍然有效（未删除）
    fn is_active(&self) -> bool {
        !self.is_deleted()
    }
}

// ==========================================
// Project - 项目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,                    // 项目ID
    pub code: String,                          // 项目编号
    pub name: String,                          // 项目名称
    pub phase: Phase,                          // 当前阶段
    pub status: ProjectStatus,                 // 项目状态
    pub progress_pct: i32,                     // 进度百分比 (0-100, 允许回调)
    pub start_date: Option<NaiveDate>,         // 开始日期
    pub planned_end_date: Option<NaiveDate>,   // 计划结束日期
    pub health: HealthIndicator,               // 健康度 (默认 GREEN)
    pub last_scored_at: Option<NaiveDateTime>, // 最近评分时间
}

impl Project {
    /// 以默认值创建新项目（Demand 阶段 / Draft 状态 / GREEN）
    pub fn new(
        project_id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            code: code.into(),
            name: name.into(),
            phase: Phase::Demand,
            status: ProjectStatus::Draft,
            progress_pct: 0,
            start_date: None,
            planned_end_date: None,
            health: HealthIndicator::default(),
            last_scored_at: None,
        }
    }
}

// ==========================================
// BudgetSnapshot - 预算快照（每个项目至多一条）
// ==========================================
/// 金额以最小货币单位（分）保存, 偏差判定全程整数运算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub planned_cents: i64,  // 计划预算 (>= 0)
    pub consumed_cents: i64, // 已消耗预算 (>= 0)
}

impl BudgetSnapshot {
    /// 按元录入, 四舍五入到分
    pub fn new(planned: f64, consumed: f64) -> Self {
        Self::from_cents(to_cents(planned), to_cents(consumed))
    }

    pub fn from_cents(planned_cents: i64, consumed_cents: i64) -> Self {
        Self {
            planned_cents,
            consumed_cents,
        }
    }

    /// 计划预算为 0 时预算信号不适用
    pub fn is_applicable(&self) -> bool {
        self.planned_cents > 0
    }

    /// 偏差绝对值（分）
    pub fn deviation_cents(&self) -> i64 {
        (self.consumed_cents - self.planned_cents).abs()
    }

    pub fn planned(&self) -> f64 {
        self.planned_cents as f64 / 100.0
    }

    pub fn consumed(&self) -> f64 {
        self.consumed_cents as f64 / 100.0
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

// ==========================================
// ProjectAggregate - 项目聚合快照
// ==========================================
/// 门禁与评分的唯一输入
///
/// 仓储层在单个事务内读出整个聚合，之后不可变地交给引擎。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAggregate {
    pub project: Project,
    pub budget: Option<BudgetSnapshot>,
    pub deliverables: Vec<Deliverable>,
    pub risks: Vec<ProjectRisk>,
    pub anomalies: Vec<Anomaly>,
}

impl ProjectAggregate {
    /// 只有项目本身、无任何子实体的聚合
    pub fn bare(project: Project) -> Self {
        Self {
            project,
            budget: None,
            deliverables: Vec::new(),
            risks: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project.project_id
    }

    /// 有效交付物中出现过的类别（去重，版本/日期不影响）
    pub fn present_deliverable_kinds(&self) -> HashSet<DeliverableKind> {
        self.deliverables
            .iter()
            .filter(|d| d.is_active())
            .map(|d| d.kind)
            .collect()
    }

    pub fn active_risks(&self) -> impl Iterator<Item = &ProjectRisk> {
        self.risks.iter().filter(|r| r.is_active())
    }

    pub fn active_anomalies(&self) -> impl Iterator<Item = &Anomaly> {
        self.anomalies.iter().filter(|a| a.is_active())
    }
}
