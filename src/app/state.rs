// ==========================================
// IT 项目治理核心 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{GovernanceApi, PortfolioApi};
use crate::config::{ConfigManager, HealthConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::events::OptionalEventSink;
use crate::engine::health_scorer::HealthScorer;
use crate::engine::health_signals::HealthThresholds;
use crate::i18n;
use crate::repository::{ActionLogEventSink, ActionLogRepository, ProjectRepository};

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub project_repo: Arc<ProjectRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
    pub config_manager: Arc<ConfigManager>,

    /// 阶段切换API
    pub governance_api: Arc<GovernanceApi>,

    /// 组合健康度API
    pub portfolio_api: Arc<PortfolioApi>,
}

impl AppState {
    /// 创建AppState实例
    ///
    /// # 说明
    /// - 建表幂等, 新库自动初始化
    /// - 配置读取失败时使用默认值, 不阻塞启动
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let project_repo = Arc::new(ProjectRepository::from_connection(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 读取配置
        // ==========================================
        let thresholds = match config_manager.get_health_thresholds().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("健康度阈值读取失败, 使用默认值: {}", e);
                HealthThresholds::default()
            }
        };
        let time_budget = match config_manager.get_rescore_time_budget().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("批量重评时间预算读取失败, 按不限时处理: {}", e);
                None
            }
        };
        match config_manager.get_message_locale().await {
            Ok(locale) => i18n::set_locale(&locale),
            Err(e) => tracing::warn!("提示语言读取失败, 保持当前语言: {}", e),
        }

        // ==========================================
        // 初始化API层
        // ==========================================
        let audit_sink = Arc::new(ActionLogEventSink::new(action_log_repo.clone()));
        let event_sink = OptionalEventSink::with_sink(audit_sink);
        let scorer = HealthScorer::with_thresholds(thresholds);

        let governance_api = Arc::new(
            GovernanceApi::new(project_repo.clone(), event_sink.clone())
                .with_scorer(scorer.clone()),
        );
        let portfolio_api = Arc::new(
            PortfolioApi::new(project_repo.clone(), event_sink)
                .with_scorer(scorer)
                .with_time_budget(time_budget),
        );

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            project_repo,
            action_log_repo,
            config_manager,
            governance_api,
            portfolio_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PROJECT_GOVERNANCE_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("PROJECT_GOVERNANCE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./project_governance.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("project-governance");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("project_governance.db");
        }
    }

    path.to_string_lossy().to_string()
}
