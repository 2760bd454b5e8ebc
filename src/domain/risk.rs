// ==========================================
// IT 项目治理核心 - 风险登记领域模型
// ==========================================
// 风险信号只按逻辑删除过滤, 不看生命周期状态
// ==========================================

use crate::domain::project::SoftDeletable;
use crate::domain::types::{RiskImpact, RiskProbability, RiskStatus};
use serde::{Deserialize, Serialize};

// ==========================================
// ProjectRisk - 风险登记项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRisk {
    pub risk_id: String,
    pub project_id: String,
    pub title: String,
    pub probability: RiskProbability, // 发生概率
    pub impact: RiskImpact,           // 影响程度
    pub status: RiskStatus,           // 生命周期状态（评分不使用）
    pub deleted: bool,
}

// ==========================================
// Trait: RiskSeverity
// ==========================================
// 用途: 风险信号的分类规则
pub trait RiskSeverity {
    /// 严重: 影响 Critical 且概率 High / Medium
    fn is_critical(&self) -> bool;

    /// 偏高: (High, High) 或 (影响 Critical, 概率 Low)
    fn is_elevated(&self) -> bool;
}

impl RiskSeverity for ProjectRisk {
    fn is_critical(&self) -> bool {
        self.impact == RiskImpact::Critical
            && matches!(self.probability, RiskProbability::High | RiskProbability::Medium)
    }

    fn is_elevated(&self) -> bool {
        (self.impact == RiskImpact::High && self.probability == RiskProbability::High)
            || (self.impact == RiskImpact::Critical && self.probability == RiskProbability::Low)
    }
}

impl SoftDeletable for ProjectRisk {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(probability: RiskProbability, impact: RiskImpact) -> ProjectRisk {
        ProjectRisk {
            risk_id: "R1".to_string(),
            project_id: "P1".to_string(),
            title: "vendor delay".to_string(),
            probability,
            impact,
            status: RiskStatus::Open,
            deleted: false,
        }
    }

    #[test]
    fn test_severity_matrix() {
        use RiskImpact as I;
        use RiskProbability as P;

        assert!(risk(P::High, I::Critical).is_critical());
        assert!(risk(P::Medium, I::Critical).is_critical());
        assert!(!risk(P::Low, I::Critical).is_critical());
        assert!(risk(P::Low, I::Critical).is_elevated());

        assert!(risk(P::High, I::High).is_elevated());
        assert!(!risk(P::Medium, I::High).is_elevated());
        assert!(!risk(P::High, I::Medium).is_elevated());
        assert!(!risk(P::High, I::Critical).is_elevated());
    }
}
