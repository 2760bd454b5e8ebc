// ==========================================
// IT 项目治理核心 - 配置层
// ==========================================
// 职责: 健康度阈值 / 批量重评预算 / 提示语言的可覆写配置
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod health_config_trait;

pub use config_manager::{config_keys, ConfigManager};
pub use health_config_trait::HealthConfigReader;
