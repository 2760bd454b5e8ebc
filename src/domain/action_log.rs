// ==========================================
// IT 项目治理核心 - 操作日志领域模型
// ==========================================
// 用途: 审计追踪（阶段切换 / 健康度重评）
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,             // 日志ID
    pub project_id: Option<String>,    // 关联项目 (组合级操作可为None)
    pub action_type: String,           // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,      // 操作时间戳
    pub actor: String,                 // 操作人
    pub payload_json: Option<JsonValue>, // 操作负载 (JSON)
    pub detail: Option<String>,        // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    PhaseTransition,   // 阶段切换成功
    HealthRescored,    // 单项目重评
    PortfolioRescored, // 组合批量重评
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::PhaseTransition => "PHASE_TRANSITION",
            ActionType::HealthRescored => "HEALTH_RESCORED",
            ActionType::PortfolioRescored => "PORTFOLIO_RESCORED",
        }
    }
}
