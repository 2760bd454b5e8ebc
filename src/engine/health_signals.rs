// ==========================================
// IT 项目治理核心 - 健康度信号提取
// ==========================================
// 四个互相独立的纯函数, 各自向 red / amber 两个累计分贡献整数
// - 预算信号: 预算偏差
// - 进度信号: 时间进度 vs 完成进度
// - 风险信号: 风险登记严重度
// - 异常/状态/交付物信号
// 红线: 数据缺失视为"信号不适用", 绝不报错
// ==========================================

use crate::domain::project::{BudgetSnapshot, Project, ProjectAggregate};
use crate::domain::risk::{ProjectRisk, RiskSeverity};
use crate::domain::types::ProjectStatus;
use crate::domain::anomaly::Anomaly;
use crate::engine::deliverable_rules::DeliverableRequirementTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

// ==========================================
// HealthThresholds - 阈值
// ==========================================
// 严格大于才触发 (等于阈值不触发), 判定按万分比整数比较
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthThresholds {
    pub budget_red_pct: f64,
    pub budget_amber_pct: f64,
    pub schedule_red_lag_pct: f64,
    pub schedule_amber_lag_pct: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            budget_red_pct: 20.0,
            budget_amber_pct: 10.0,
            schedule_red_lag_pct: 20.0,
            schedule_amber_lag_pct: 10.0,
        }
    }
}

// ==========================================
// 信号类型与贡献
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Budget,
    Schedule,
    Risk,
    AnomalyStatusDeliverable,
}

/// 单个信号的贡献 (detail 用于可解释性)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContribution {
    pub signal: SignalKind,
    pub red: u32,
    pub amber: u32,
    pub detail: JsonValue,
}

impl SignalContribution {
    fn none(signal: SignalKind, detail: JsonValue) -> Self {
        Self {
            signal,
            red: 0,
            amber: 0,
            detail,
        }
    }
}

// ==========================================
// 预算信号
// ==========================================

/// 预算偏差百分比（仅用于展示）; 计划预算为 0 或缺失时返回 None
pub fn budget_variance_pct(budget: Option<&BudgetSnapshot>) -> Option<f64> {
    let budget = budget.filter(|b| b.is_applicable())?;
    Some(budget.deviation_cents() as f64 * 100.0 / budget.planned_cents as f64)
}

/// 比值 `numerator / denominator` 是否严格大于 `threshold_pct`
///
/// numerator 已乘 100 (百分比口径), denominator > 0;
/// 阈值换算为万分比后整数比较, 边界值不受浮点误差影响
fn exceeds_pct(numerator: i128, denominator: i128, threshold_pct: f64) -> bool {
    let threshold_bp = (threshold_pct * 100.0).round() as i128;
    numerator * 100 > threshold_bp * denominator
}

/// 预算信号
///
/// # 规则
/// - 偏差 > 20%: red += 2
/// - 否则偏差 > 10%: amber += 1
pub fn budget_signal(
    budget: Option<&BudgetSnapshot>,
    thresholds: &HealthThresholds,
) -> SignalContribution {
    let Some(budget) = budget.filter(|b| b.is_applicable()) else {
        return SignalContribution::none(SignalKind::Budget, json!({ "applicable": false }));
    };

    let deviation = i128::from(budget.deviation_cents()) * 100;
    let planned = i128::from(budget.planned_cents);
    let (red, amber) = if exceeds_pct(deviation, planned, thresholds.budget_red_pct) {
        (2, 0)
    } else if exceeds_pct(deviation, planned, thresholds.budget_amber_pct) {
        (0, 1)
    } else {
        (0, 0)
    };

    SignalContribution {
        signal: SignalKind::Budget,
        red,
        amber,
        detail: json!({
            "applicable": true,
            "variance_pct": budget_variance_pct(Some(budget)),
        }),
    }
}

// ==========================================
// 进度信号
// ==========================================

/// 进度滞后（整数口径）: 返回 (滞后 × 总工期, 总工期)
///
/// 需要开始与计划结束日期, 且总工期与已用天数均 > 0
fn schedule_lag_ratio(project: &Project, today: NaiveDate) -> Option<(i128, i128)> {
    let start = project.start_date?;
    let planned_end = project.planned_end_date?;

    let total_days = (planned_end - start).num_days();
    let elapsed_days = (today - start).num_days();
    if total_days <= 0 || elapsed_days <= 0 {
        return None;
    }

    let total = i128::from(total_days);
    let lag_scaled = i128::from(elapsed_days) * 100 - i128::from(project.progress_pct) * total;
    Some((lag_scaled, total))
}

/// 进度滞后百分点 (时间进度% - 完成进度%), 仅用于展示
pub fn schedule_lag_pct(project: &Project, today: NaiveDate) -> Option<f64> {
    schedule_lag_ratio(project, today).map(|(lag_scaled, total)| lag_scaled as f64 / total as f64)
}

/// 进度信号
///
/// # 规则
/// - 滞后 > 20: red += 2
/// - 滞后 > 10: amber += 1
/// - 超前 (负滞后) 不抵扣
pub fn schedule_signal(
    project: &Project,
    today: NaiveDate,
    thresholds: &HealthThresholds,
) -> SignalContribution {
    let Some((lag_scaled, total)) = schedule_lag_ratio(project, today) else {
        return SignalContribution::none(SignalKind::Schedule, json!({ "applicable": false }));
    };

    let (red, amber) = if exceeds_pct(lag_scaled, total, thresholds.schedule_red_lag_pct) {
        (2, 0)
    } else if exceeds_pct(lag_scaled, total, thresholds.schedule_amber_lag_pct) {
        (0, 1)
    } else {
        (0, 0)
    };

    SignalContribution {
        signal: SignalKind::Schedule,
        red,
        amber,
        detail: json!({
            "applicable": true,
            "lag_pct": lag_scaled as f64 / total as f64,
            "progress_pct": project.progress_pct,
        }),
    }
}

// ==========================================
// 风险信号
// ==========================================

/// 风险信号
///
/// # 规则
/// - 每个严重风险 (Critical 影响 + High/Medium 概率): red += 1, 不封顶
/// - 每个偏高风险 ((High, High) 或 (Critical 影响, Low 概率)): amber += 1
/// - 只排除逻辑删除, 不看风险生命周期状态
pub fn risk_signal<'a>(risks: impl IntoIterator<Item = &'a ProjectRisk>) -> SignalContribution {
    let mut critical_count: u32 = 0;
    let mut elevated_count: u32 = 0;

    for risk in risks {
        if risk.is_critical() {
            critical_count += 1;
        }
        if risk.is_elevated() {
            elevated_count += 1;
        }
    }

    SignalContribution {
        signal: SignalKind::Risk,
        red: critical_count,
        amber: elevated_count,
        detail: json!({
            "critical_count": critical_count,
            "elevated_count": elevated_count,
        }),
    }
}

// ==========================================
// 异常 / 状态 / 交付物信号
// ==========================================

/// 异常、项目状态与交付物完整度信号
///
/// # 规则
/// - 每个未处理严重异常: red += 1, 不封顶
/// - 状态 Suspended: red += 2; 否则 ClosureInProgress: amber += 1
/// - 进入当前阶段所需交付物有任一缺失: amber += 1 (固定 1 分)
pub fn anomaly_signal(
    aggregate: &ProjectAggregate,
    table: &DeliverableRequirementTable,
) -> SignalContribution {
    let open_critical = count_open_critical(aggregate.active_anomalies());

    let mut red = open_critical;
    let mut amber = 0;

    match aggregate.project.status {
        ProjectStatus::Suspended => red += 2,
        ProjectStatus::ClosureInProgress => amber += 1,
        _ => {}
    }

    let present = aggregate.present_deliverable_kinds();
    let missing: Vec<&'static str> = table
        .required_for_current_phase(aggregate.project.phase)
        .iter()
        .filter(|kind| !present.contains(kind))
        .map(|kind| kind.label())
        .collect();
    if !missing.is_empty() {
        amber += 1;
    }

    SignalContribution {
        signal: SignalKind::AnomalyStatusDeliverable,
        red,
        amber,
        detail: json!({
            "open_critical_anomalies": open_critical,
            "status": aggregate.project.status.to_db_str(),
            "missing_deliverables": missing,
        }),
    }
}

fn count_open_critical<'a>(anomalies: impl Iterator<Item = &'a Anomaly>) -> u32 {
    anomalies.filter(|a| a.is_open_critical()).count() as u32
}
