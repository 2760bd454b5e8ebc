// ==========================================
// IT 项目治理核心 - 健康度配置读取 Trait
// ==========================================
// 职责: 定义评分与批量重评所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::health_signals::HealthThresholds;
use async_trait::async_trait;
use std::error::Error;
use std::time::Duration;

// ==========================================
// HealthConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait HealthConfigReader: Send + Sync {
    /// 获取健康度阈值
    ///
    /// # 默认值
    /// - 预算: 红 20 / 黄 10 (%)
    /// - 进度滞后: 红 20 / 黄 10 (百分点)
    async fn get_health_thresholds(&self) -> Result<HealthThresholds, Box<dyn Error>>;

    /// 获取批量重评的时间预算
    ///
    /// # 返回
    /// - None: 不限时
    ///
    /// # 默认值
    /// - 未配置 (不限时)
    async fn get_rescore_time_budget(&self) -> Result<Option<Duration>, Box<dyn Error>>;

    /// 获取提示语言
    ///
    /// # 默认值
    /// - en
    async fn get_message_locale(&self) -> Result<String, Box<dyn Error>>;
}
