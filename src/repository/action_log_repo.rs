// ==========================================
// IT 项目治理核心 - 操作日志数据仓储
// ==========================================
// 依据: action_log 表
// 红线: 阶段切换与健康度回写必须留痕
// ==========================================

mod core;
mod event_sink;
mod queries;


pub use core::ActionLogRepository;
pub use event_sink::ActionLogEventSink;
