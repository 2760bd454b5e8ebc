// ==========================================
// IT 项目治理核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::health_config_trait::HealthConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::health_signals::HealthThresholds;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const GLOBAL_SCOPE: &str = "global";
const SUPPORTED_LOCALES: [&str; 2] = ["en", "zh-CN"];

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入/覆盖 global scope 的配置值
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置（按键排序）
    pub fn list_global_config(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 读取非负数值配置; 缺失或格式错误时返回默认值
    fn get_non_negative_f64(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// HealthConfigReader Trait 实现
// ==========================================
#[async_trait]
impl HealthConfigReader for ConfigManager {
    async fn get_health_thresholds(&self) -> Result<HealthThresholds, Box<dyn Error>> {
        let defaults = HealthThresholds::default();
        Ok(HealthThresholds {
            budget_red_pct: self
                .get_non_negative_f64(config_keys::BUDGET_RED_PCT, defaults.budget_red_pct)?,
            budget_amber_pct: self
                .get_non_negative_f64(config_keys::BUDGET_AMBER_PCT, defaults.budget_amber_pct)?,
            schedule_red_lag_pct: self.get_non_negative_f64(
                config_keys::SCHEDULE_RED_LAG_PCT,
                defaults.schedule_red_lag_pct,
            )?,
            schedule_amber_lag_pct: self.get_non_negative_f64(
                config_keys::SCHEDULE_AMBER_LAG_PCT,
                defaults.schedule_amber_lag_pct,
            )?,
        })
    }

    async fn get_rescore_time_budget(&self) -> Result<Option<Duration>, Box<dyn Error>> {
        let Some(raw) = self.get_global_config_value(config_keys::RESCORE_TIME_BUDGET_MS)? else {
            return Ok(None);
        };

        match raw.trim().parse::<u64>() {
            Ok(ms) => Ok(Some(Duration::from_millis(ms))),
            Err(_) => {
                tracing::warn!(
                    config_key = config_keys::RESCORE_TIME_BUDGET_MS,
                    raw_value = %raw,
                    "时间预算配置格式错误，按不限时处理"
                );
                Ok(None)
            }
        }
    }

    async fn get_message_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self
            .get_global_config_value(config_keys::MESSAGE_LOCALE)?
            .unwrap_or_else(|| "en".to_string());
        let value = value.trim();

        if SUPPORTED_LOCALES.contains(&value) {
            Ok(value.to_string())
        } else {
            Ok("en".to_string())
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 预算偏差阈值 (%)
    pub const BUDGET_RED_PCT: &str = "health_budget_red_pct";
    pub const BUDGET_AMBER_PCT: &str = "health_budget_amber_pct";

    // 进度滞后阈值 (百分点)
    pub const SCHEDULE_RED_LAG_PCT: &str = "health_schedule_red_lag_pct";
    pub const SCHEDULE_AMBER_LAG_PCT: &str = "health_schedule_amber_lag_pct";

    // 批量重评
    pub const RESCORE_TIME_BUDGET_MS: &str = "rescore_time_budget_ms";

    // 提示语言 (en / zh-CN)
    pub const MESSAGE_LOCALE: &str = "message_locale";
}
