// ==========================================
// IT 项目治理核心 - 阶段门禁引擎
// ==========================================
// 职责: 判断项目能否切换到目标阶段
// 输入: 项目聚合快照 + 目标阶段
// 输出: GateResult (放行/拒绝 + 缺失交付物列表 + 提示)
// 红线: 纯查询, 不写库; 任何输入组合都返回确定结论
// ==========================================

use crate::domain::project::ProjectAggregate;
use crate::domain::types::{DeliverableKind, Phase};
use crate::engine::deliverable_rules::DeliverableRequirementTable;
use crate::i18n;
use serde::{Deserialize, Serialize};

// ==========================================
// GateResult - 门禁结论
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub allowed: bool,
    pub from: Phase,
    pub to: Phase,
    pub required: Vec<DeliverableKind>,
    pub missing: Vec<DeliverableKind>,
    pub message: String,
}

impl GateResult {
    /// 缺失交付物的展示名称
    pub fn missing_labels(&self) -> Vec<&'static str> {
        self.missing.iter().map(|k| k.label()).collect()
    }
}

// ==========================================
// PhaseGate - 阶段门禁
// ==========================================
pub struct PhaseGate {
    table: DeliverableRequirementTable,
}

impl PhaseGate {
    /// 使用标准要求表
    pub fn new() -> Self {
        Self {
            table: DeliverableRequirementTable::standard(),
        }
    }

    /// 使用自定义要求表
    pub fn with_table(table: DeliverableRequirementTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &DeliverableRequirementTable {
        &self.table
    }

    /// 评估阶段切换
    ///
    /// # 规则
    /// 1. 查 (当前阶段, 目标阶段) 的必需类别, 为空直接放行
    /// 2. 收集有效交付物中已有的类别 (任意数量 >= 1 即满足)
    /// 3. missing = required - present, 保持要求表顺序
    /// 4. allowed = missing 为空
    pub fn evaluate(&self, aggregate: &ProjectAggregate, target: Phase) -> GateResult {
        let from = aggregate.project.phase;
        let required = self.table.required(from, target).to_vec();

        if required.is_empty() {
            tracing::debug!(
                project_id = %aggregate.project_id(),
                from = %from,
                to = %target,
                "无强制交付物要求, 直接放行"
            );
            return GateResult {
                allowed: true,
                from,
                to: target,
                required,
                missing: Vec::new(),
                message: allowed_message(from, target),
            };
        }

        let present = aggregate.present_deliverable_kinds();
        let missing: Vec<DeliverableKind> = required
            .iter()
            .copied()
            .filter(|kind| !present.contains(kind))
            .collect();

        let allowed = missing.is_empty();
        let message = if allowed {
            allowed_message(from, target)
        } else {
            denied_message(from, target, &missing)
        };

        tracing::debug!(
            project_id = %aggregate.project_id(),
            from = %from,
            to = %target,
            allowed,
            missing = missing.len(),
            "阶段门禁评估完成"
        );

        GateResult {
            allowed,
            from,
            to: target,
            required,
            missing,
            message,
        }
    }
}

impl Default for PhaseGate {
    fn default() -> Self {
        Self::new()
    }
}

fn allowed_message(from: Phase, to: Phase) -> String {
    i18n::t_with_args(
        "gate.allowed",
        &[
            ("from", &i18n::phase_label(from)),
            ("to", &i18n::phase_label(to)),
        ],
    )
}

fn denied_message(from: Phase, to: Phase, missing: &[DeliverableKind]) -> String {
    let items = missing
        .iter()
        .map(|k| format!("\"{}\"", k.label()))
        .collect::<Vec<_>>()
        .join(", ");

    i18n::t_with_args(
        "gate.missing_deliverables",
        &[
            ("items", &items),
            ("from", &i18n::phase_label(from)),
            ("to", &i18n::phase_label(to)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deliverable::Deliverable;
    use crate::domain::project::Project;
    use chrono::NaiveDate;

    fn aggregate_in(phase: Phase, kinds: &[DeliverableKind]) -> ProjectAggregate {
        let mut project = Project::new("P001", "PRJ-001", "CRM rollout");
        project.phase = phase;
        let mut agg = ProjectAggregate::bare(project);
        agg.deliverables = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| Deliverable {
                deliverable_id: format!("D{}", i),
                project_id: "P001".to_string(),
                kind: *kind,
                file_name: format!("{}.docx", kind.to_db_str()),
                version: 1,
                uploaded_at: NaiveDate::from_ymd_opt(2026, 3, 1)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
                deleted: false,
            })
            .collect();
        agg
    }

    #[test]
    fn test_charter_required_with_zero_deliverables() {
        let gate = PhaseGate::new();
        let agg = aggregate_in(Phase::AnalysisClarification, &[]);

        let result = gate.evaluate(&agg, Phase::PlanningValidation);

        assert!(!result.allowed);
        assert_eq!(result.missing, vec![DeliverableKind::ProjectCharter]);
        assert_eq!(result.missing_labels(), vec!["Project Charter"]);
        assert!(result.message.contains("Project Charter"));
    }

    #[test]
    fn test_planning_to_execution_missing_budget_baseline() {
        let gate = PhaseGate::new();
        let agg = aggregate_in(
            Phase::PlanningValidation,
            &[
                DeliverableKind::Wbs,
                DeliverableKind::DetailedPlanning,
                DeliverableKind::RaciMatrix,
            ],
        );

        let result = gate.evaluate(&agg, Phase::ExecutionTracking);

        assert!(!result.allowed);
        assert_eq!(result.missing, vec![DeliverableKind::BudgetBaseline]);
        assert!(result.message.contains("Budget Baseline"));
        assert!(!result.message.contains("RACI Matrix"));
    }

    #[test]
    fn test_missing_order_follows_table() {
        let gate = PhaseGate::new();
        let agg = aggregate_in(Phase::UatDeployment, &[DeliverableKind::AcceptanceReport]);

        let result = gate.evaluate(&agg, Phase::ClosureLessonsLearned);

        assert_eq!(
            result.missing,
            vec![DeliverableKind::TestPlan, DeliverableKind::GoLiveReport]
        );
    }

    #[test]
    fn test_deleted_deliverable_does_not_count() {
        let gate = PhaseGate::new();
        let mut agg = aggregate_in(
            Phase::AnalysisClarification,
            &[DeliverableKind::ProjectCharter],
        );
        agg.deliverables[0].deleted = true;

        let result = gate.evaluate(&agg, Phase::PlanningValidation);
        assert!(!result.allowed);
    }

    #[test]
    fn test_empty_requirement_and_phase_jump_pass_through() {
        let gate = PhaseGate::new();

        let agg = aggregate_in(Phase::Demand, &[]);
        assert!(gate.evaluate(&agg, Phase::AnalysisClarification).allowed);
        assert!(gate.evaluate(&agg, Phase::UatDeployment).allowed);

        let agg = aggregate_in(Phase::ExecutionTracking, &[]);
        let result = gate.evaluate(&agg, Phase::UatDeployment);
        assert!(result.allowed);
        assert!(result.required.is_empty());
    }

    #[test]
    fn test_adding_missing_deliverable_only_opens_gate() {
        let gate = PhaseGate::new();
        let mut kinds = vec![DeliverableKind::Wbs, DeliverableKind::DetailedPlanning];
        let mut latest_allowed = false;

        for next in [DeliverableKind::RaciMatrix, DeliverableKind::BudgetBaseline] {
            let before = gate.evaluate(
                &aggregate_in(Phase::PlanningValidation, &kinds),
                Phase::ExecutionTracking,
            );
            kinds.push(next);
            let after = gate.evaluate(
                &aggregate_in(Phase::PlanningValidation, &kinds),
                Phase::ExecutionTracking,
            );

            assert!(after.missing.len() < before.missing.len());
            assert!(!(before.allowed && !after.allowed));
            latest_allowed = after.allowed;
        }

        assert!(latest_allowed);
    }

    #[test]
    fn test_duplicate_versions_satisfy_once() {
        let gate = PhaseGate::new();
        let agg = aggregate_in(
            Phase::AnalysisClarification,
            &[DeliverableKind::ProjectCharter, DeliverableKind::ProjectCharter],
        );
        let result = gate.evaluate(&agg, Phase::PlanningValidation);
        assert!(result.allowed);
        assert!(result.missing.is_empty());
    }
}
