// ==========================================
// IT 项目治理核心 - 交付物要求表
// ==========================================
// 键: (当前阶段, 目标阶段) 有序对, 精确匹配
// 值: 必需交付物类别列表 (顺序即提示顺序)
// 红线: 表不做传递闭包, 跨阶段跳转返回空集
// ==========================================

use crate::domain::types::{DeliverableKind, Phase};
use std::collections::HashMap;
use std::sync::OnceLock;

// ==========================================
// DeliverableRequirementTable
// ==========================================
#[derive(Debug, Clone)]
pub struct DeliverableRequirementTable {
    rules: HashMap<(Phase, Phase), Vec<DeliverableKind>>,
}

impl DeliverableRequirementTable {
    /// 空表（所有切换均放行）
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// 标准治理规则
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(Phase::Demand, Phase::AnalysisClarification, &[])
            .with_rule(
                Phase::AnalysisClarification,
                Phase::PlanningValidation,
                &[DeliverableKind::ProjectCharter],
            )
            .with_rule(
                Phase::PlanningValidation,
                Phase::ExecutionTracking,
                &[
                    DeliverableKind::Wbs,
                    DeliverableKind::DetailedPlanning,
                    DeliverableKind::RaciMatrix,
                    DeliverableKind::BudgetBaseline,
                ],
            )
            .with_rule(Phase::ExecutionTracking, Phase::UatDeployment, &[])
            .with_rule(
                Phase::UatDeployment,
                Phase::ClosureLessonsLearned,
                &[
                    DeliverableKind::TestPlan,
                    DeliverableKind::AcceptanceReport,
                    DeliverableKind::GoLiveReport,
                ],
            )
    }

    /// 全局共享的标准表
    pub fn shared() -> &'static DeliverableRequirementTable {
        static TABLE: OnceLock<DeliverableRequirementTable> = OnceLock::new();
        TABLE.get_or_init(DeliverableRequirementTable::standard)
    }

    /// 追加/覆盖一条规则（重复类别只保留首次出现）
    pub fn with_rule(mut self, from: Phase, to: Phase, kinds: &[DeliverableKind]) -> Self {
        let mut ordered: Vec<DeliverableKind> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !ordered.contains(kind) {
                ordered.push(*kind);
            }
        }
        self.rules.insert((from, to), ordered);
        self
    }

    /// 查询切换所需交付物
    ///
    /// 未登记的阶段对返回空切片
    pub fn required(&self, from: Phase, to: Phase) -> &[DeliverableKind] {
        self.rules
            .get(&(from, to))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 到达当前阶段时应已具备的交付物
    ///
    /// 即进入该阶段的那次切换 (previous, phase) 的要求; Demand 为空
    pub fn required_for_current_phase(&self, phase: Phase) -> &[DeliverableKind] {
        match phase.previous() {
            Some(prev) => self.required(prev, phase),
            None => &[],
        }
    }
}

impl Default for DeliverableRequirementTable {
    fn default() -> Self {
        Self::standard()
    }
}
