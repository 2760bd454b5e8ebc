// ==========================================
// IT 项目治理核心 - API 层
// ==========================================
// 职责: 编排 仓储读取 → 引擎计算 → 回写 → 事件通知
// ==========================================

pub mod error;
pub mod governance_api;
pub mod portfolio_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use governance_api::{GovernanceApi, TransitionOutcome};
pub use portfolio_api::{PortfolioApi, RescoreFailure, RescoreReport};
