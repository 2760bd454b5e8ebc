// ==========================================
// IT 项目治理核心 - 异常领域模型
// ==========================================

use crate::domain::project::SoftDeletable;
use crate::domain::types::{AnomalyPriority, AnomalyStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub anomaly_id: String,
    pub project_id: String,
    pub title: String,
    pub priority: AnomalyPriority,
    pub status: AnomalyStatus,
    pub deleted: bool,
}

impl Anomaly {
    /// 未处理的严重异常（计入红色分）
    pub fn is_open_critical(&self) -> bool {
        self.status == AnomalyStatus::Open && self.priority == AnomalyPriority::Critical
    }
}

impl SoftDeletable for Anomaly {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
