// ==========================================
// IT 项目治理核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod project_repo;

// 重导出核心仓储
pub use action_log_repo::{ActionLogEventSink, ActionLogRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use project_repo::{ActiveAggregates, AggregateLoadFailure, ProjectRepository};
