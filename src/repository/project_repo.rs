// ==========================================
// IT 项目治理核心 - 项目聚合数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 聚合读取在单个事务内完成, 保证评分看到一致快照
// 子实体只做逻辑删除
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::anomaly::Anomaly;
use crate::domain::deliverable::Deliverable;
use crate::domain::project::{BudgetSnapshot, Project, ProjectAggregate};
use crate::domain::risk::ProjectRisk;
use crate::domain::types::{
    AnomalyPriority, AnomalyStatus, DeliverableKind, HealthIndicator, Phase, ProjectStatus,
    RiskImpact, RiskProbability, RiskStatus,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const PROJECT_COLUMNS: &str = "project_id, code, name, phase, status, progress_pct, \
     start_date, planned_end_date, health, last_scored_at";

// ==========================================
// ProjectRepository - 项目聚合仓储
// ==========================================
/// 项目聚合仓储
/// 职责: 管理 project / budget_snapshot / deliverable / project_risk / anomaly 表
pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
    /// 创建新的 ProjectRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 项目写入
    // ==========================================

    /// 新建项目
    pub fn insert_project(&self, project: &Project) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO project (
                project_id, code, name, phase, status, progress_pct,
                start_date, planned_end_date, health, last_scored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                project.project_id,
                project.code,
                project.name,
                project.phase.to_db_str(),
                project.status.to_db_str(),
                project.progress_pct,
                project.start_date.map(|d| d.format(DATE_FMT).to_string()),
                project.planned_end_date.map(|d| d.format(DATE_FMT).to_string()),
                project.health.to_db_str(),
                project.last_scored_at.map(|t| t.format(DATETIME_FMT).to_string()),
            ],
        )?;
        Ok(())
    }

    /// 回写阶段（带当前阶段检查）
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: 当前阶段已不是 from (其他请求已切换)
    /// - `RepositoryError::NotFound`: project_id 不存在
    pub fn update_phase(&self, project_id: &str, from: Phase, to: Phase) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE project
            SET phase = ?1, updated_at = datetime('now')
            WHERE project_id = ?2 AND phase = ?3
            "#,
            params![to.to_db_str(), project_id, from.to_db_str()],
        )?;

        if rows == 0 {
            let actual: Option<String> = conn
                .query_row(
                    "SELECT phase FROM project WHERE project_id = ?1",
                    params![project_id],
                    |row| row.get(0),
                )
                .optional()?;

            return match actual {
                Some(actual) => Err(RepositoryError::OptimisticLockFailure {
                    project_id: project_id.to_string(),
                    expected: from.to_db_str().to_string(),
                    actual,
                }),
                None => Err(RepositoryError::not_found("Project", project_id)),
            };
        }
        Ok(())
    }

    /// 回写健康度与评分时间
    pub fn update_health(
        &self,
        project_id: &str,
        health: HealthIndicator,
        scored_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE project
            SET health = ?1, last_scored_at = ?2, updated_at = datetime('now')
            WHERE project_id = ?3
            "#,
            params![
                health.to_db_str(),
                scored_at.format(DATETIME_FMT).to_string(),
                project_id
            ],
        )?;
        ensure_updated(rows, "Project", project_id)
    }

    /// 更新项目状态
    pub fn update_status(&self, project_id: &str, status: ProjectStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE project SET status = ?1, updated_at = datetime('now') WHERE project_id = ?2",
            params![status.to_db_str(), project_id],
        )?;
        ensure_updated(rows, "Project", project_id)
    }

    /// 更新进度（允许回调）
    pub fn update_progress(&self, project_id: &str, progress_pct: i32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE project
            SET progress_pct = ?1, updated_at = datetime('now')
            WHERE project_id = ?2
            "#,
            params![progress_pct, project_id],
        )?;
        ensure_updated(rows, "Project", project_id)
    }

    /// 写入/覆盖预算快照
    pub fn upsert_budget(&self, project_id: &str, budget: &BudgetSnapshot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO budget_snapshot (project_id, planned_cents, consumed_cents)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(project_id) DO UPDATE SET planned_cents = ?2, consumed_cents = ?3
            "#,
            params![project_id, budget.planned_cents, budget.consumed_cents],
        )?;
        Ok(())
    }

    // ==========================================
    // 子实体写入
    // ==========================================

    /// 登记上传的交付物
    pub fn insert_deliverable(&self, deliverable: &Deliverable) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO deliverable (
                deliverable_id, project_id, kind, file_name, version, uploaded_at, deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                deliverable.deliverable_id,
                deliverable.project_id,
                deliverable.kind.to_db_str(),
                deliverable.file_name,
                deliverable.version,
                deliverable.uploaded_at.format(DATETIME_FMT).to_string(),
                deliverable.deleted,
            ],
        )?;
        Ok(())
    }

    pub fn soft_delete_deliverable(&self, deliverable_id: &str) -> RepositoryResult<()> {
        self.soft_delete("deliverable", "deliverable_id", "Deliverable", deliverable_id)
    }

    pub fn insert_risk(&self, risk: &ProjectRisk) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO project_risk (
                risk_id, project_id, title, probability, impact, status, deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                risk.risk_id,
                risk.project_id,
                risk.title,
                risk.probability.to_db_str(),
                risk.impact.to_db_str(),
                risk.status.to_db_str(),
                risk.deleted,
            ],
        )?;
        Ok(())
    }

    pub fn soft_delete_risk(&self, risk_id: &str) -> RepositoryResult<()> {
        self.soft_delete("project_risk", "risk_id", "ProjectRisk", risk_id)
    }

    pub fn insert_anomaly(&self, anomaly: &Anomaly) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO anomaly (
                anomaly_id, project_id, title, priority, status, deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                anomaly.anomaly_id,
                anomaly.project_id,
                anomaly.title,
                anomaly.priority.to_db_str(),
                anomaly.status.to_db_str(),
                anomaly.deleted,
            ],
        )?;
        Ok(())
    }

    pub fn update_anomaly_status(
        &self,
        anomaly_id: &str,
        status: AnomalyStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE anomaly SET status = ?1 WHERE anomaly_id = ?2",
            params![status.to_db_str(), anomaly_id],
        )?;
        ensure_updated(rows, "Anomaly", anomaly_id)
    }

    pub fn soft_delete_anomaly(&self, anomaly_id: &str) -> RepositoryResult<()> {
        self.soft_delete("anomaly", "anomaly_id", "Anomaly", anomaly_id)
    }

    /// 逻辑删除（table / id_column 只接受内部常量）
    fn soft_delete(
        &self,
        table: &'static str,
        id_column: &'static str,
        entity: &str,
        id: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let sql = format!("UPDATE {} SET deleted = 1 WHERE {} = ?1", table, id_column);
        let rows = conn.execute(&sql, params![id])?;
        ensure_updated(rows, entity, id)
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 按ID查询项目（不含子实体）
    pub fn find_project(&self, project_id: &str) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;
        find_project_in(&conn, project_id)
    }

    /// 读取完整聚合快照
    ///
    /// # 返回
    /// - Ok(Some(ProjectAggregate)): 项目存在
    /// - Ok(None): 项目不存在
    ///
    /// # 说明
    /// - 项目与所有子实体在同一个读事务内读取
    /// - 逻辑删除的子实体同样返回, 由引擎通过 is_active 过滤
    pub fn load_aggregate(&self, project_id: &str) -> RepositoryResult<Option<ProjectAggregate>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let aggregate = load_aggregate_in(&tx, project_id)?;
        tx.commit()?;
        Ok(aggregate)
    }

    /// 读取所有参与评分的项目聚合（排除 CLOSED / CANCELLED）
    ///
    /// # 说明
    /// - 全部项目在同一个读事务内逐个读取
    /// - 单个项目数据损坏只记入 failures, 不影响其余项目
    pub fn list_active_aggregates(&self) -> RepositoryResult<ActiveAggregates> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let project_ids = {
            let mut stmt = tx.prepare(
                r#"
                SELECT project_id FROM project
                WHERE status NOT IN ('CLOSED', 'CANCELLED')
                ORDER BY code ASC
                "#,
            )?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };

        let mut loaded = ActiveAggregates::default();
        for project_id in project_ids {
            match load_aggregate_in(&tx, &project_id) {
                Ok(Some(aggregate)) => loaded.aggregates.push(aggregate),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        project_id = %project_id,
                        error = %error,
                        "项目聚合读取失败, 跳过该项目"
                    );
                    loaded.failures.push(AggregateLoadFailure { project_id, error });
                }
            }
        }

        tx.commit()?;
        Ok(loaded)
    }
}

/// 单个项目聚合读取失败
#[derive(Debug)]
pub struct AggregateLoadFailure {
    pub project_id: String,
    pub error: RepositoryError,
}

/// 批量读取结果（按项目编号排序）
#[derive(Debug, Default)]
pub struct ActiveAggregates {
    pub aggregates: Vec<ProjectAggregate>,
    pub failures: Vec<AggregateLoadFailure>,
}

// ==========================================
// 行映射
// ==========================================

struct ProjectRow {
    project_id: String,
    code: String,
    name: String,
    phase: String,
    status: String,
    progress_pct: i32,
    start_date: Option<String>,
    planned_end_date: Option<String>,
    health: String,
    last_scored_at: Option<String>,
}

fn map_project_row(row: &Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok(ProjectRow {
        project_id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        phase: row.get(3)?,
        status: row.get(4)?,
        progress_pct: row.get(5)?,
        start_date: row.get(6)?,
        planned_end_date: row.get(7)?,
        health: row.get(8)?,
        last_scored_at: row.get(9)?,
    })
}

impl ProjectRow {
    fn into_project(self) -> RepositoryResult<Project> {
        Ok(Project {
            phase: parse_enum("phase", &self.phase, Phase::from_str)?,
            status: parse_enum("status", &self.status, ProjectStatus::from_str)?,
            start_date: parse_opt_date("start_date", self.start_date.as_deref())?,
            planned_end_date: parse_opt_date("planned_end_date", self.planned_end_date.as_deref())?,
            health: HealthIndicator::from_str(&self.health),
            last_scored_at: match self.last_scored_at.as_deref() {
                Some(raw) => Some(parse_datetime("last_scored_at", raw)?),
                None => None,
            },
            project_id: self.project_id,
            code: self.code,
            name: self.name,
            progress_pct: self.progress_pct,
        })
    }
}

fn find_project_in(conn: &Connection, project_id: &str) -> RepositoryResult<Option<Project>> {
    let sql = format!("SELECT {} FROM project WHERE project_id = ?1", PROJECT_COLUMNS);
    let row = conn
        .query_row(&sql, params![project_id], map_project_row)
        .optional()?;
    row.map(ProjectRow::into_project).transpose()
}

fn load_aggregate_in(
    conn: &Connection,
    project_id: &str,
) -> RepositoryResult<Option<ProjectAggregate>> {
    match find_project_in(conn, project_id)? {
        Some(project) => Ok(Some(load_children(conn, project)?)),
        None => Ok(None),
    }
}

fn load_children(conn: &Connection, project: Project) -> RepositoryResult<ProjectAggregate> {
    let project_id = project.project_id.clone();
    Ok(ProjectAggregate {
        budget: load_budget(conn, &project_id)?,
        deliverables: load_deliverables(conn, &project_id)?,
        risks: load_risks(conn, &project_id)?,
        anomalies: load_anomalies(conn, &project_id)?,
        project,
    })
}

fn load_budget(conn: &Connection, project_id: &str) -> RepositoryResult<Option<BudgetSnapshot>> {
    let budget = conn
        .query_row(
            "SELECT planned_cents, consumed_cents FROM budget_snapshot WHERE project_id = ?1",
            params![project_id],
            |row| Ok(BudgetSnapshot::from_cents(row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(budget)
}

fn load_deliverables(conn: &Connection, project_id: &str) -> RepositoryResult<Vec<Deliverable>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT deliverable_id, kind, file_name, version, uploaded_at, deleted
        FROM deliverable
        WHERE project_id = ?1
        ORDER BY uploaded_at ASC, deliverable_id ASC
        "#,
    )?;
    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(deliverable_id, kind, file_name, version, uploaded_at, deleted)| {
            Ok::<_, RepositoryError>(Deliverable {
                kind: parse_enum("deliverable.kind", &kind, DeliverableKind::from_str)?,
                uploaded_at: parse_datetime("deliverable.uploaded_at", &uploaded_at)?,
                deliverable_id,
                project_id: project_id.to_string(),
                file_name,
                version,
                deleted,
            })
        })
        .collect::<RepositoryResult<Vec<_>>>()
}

fn load_risks(conn: &Connection, project_id: &str) -> RepositoryResult<Vec<ProjectRisk>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT risk_id, title, probability, impact, status, deleted
        FROM project_risk
        WHERE project_id = ?1
        ORDER BY risk_id ASC
        "#,
    )?;
    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(risk_id, title, probability, impact, status, deleted)| {
            Ok::<_, RepositoryError>(ProjectRisk {
                probability: parse_enum(
                    "risk.probability",
                    &probability,
                    RiskProbability::from_str,
                )?,
                impact: parse_enum("risk.impact", &impact, RiskImpact::from_str)?,
                status: parse_enum("risk.status", &status, RiskStatus::from_str)?,
                risk_id,
                project_id: project_id.to_string(),
                title,
                deleted,
            })
        })
        .collect::<RepositoryResult<Vec<_>>>()
}

fn load_anomalies(conn: &Connection, project_id: &str) -> RepositoryResult<Vec<Anomaly>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT anomaly_id, title, priority, status, deleted
        FROM anomaly
        WHERE project_id = ?1
        ORDER BY anomaly_id ASC
        "#,
    )?;
    let rows = stmt
        .query_map(params![project_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(anomaly_id, title, priority, status, deleted)| {
            Ok::<_, RepositoryError>(Anomaly {
                priority: parse_enum("anomaly.priority", &priority, AnomalyPriority::from_str)?,
                status: parse_enum("anomaly.status", &status, AnomalyStatus::from_str)?,
                anomaly_id,
                project_id: project_id.to_string(),
                title,
                deleted,
            })
        })
        .collect::<RepositoryResult<Vec<_>>>()
}

// ==========================================
// 解析辅助
// ==========================================

fn ensure_updated(rows: usize, entity: &str, id: &str) -> RepositoryResult<()> {
    if rows == 0 {
        return Err(RepositoryError::not_found(entity, id));
    }
    Ok(())
}

fn parse_enum<T>(field: &str, raw: &str, parse: impl Fn(&str) -> Option<T>) -> RepositoryResult<T> {
    parse(raw).ok_or_else(|| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("无法识别的取值: {}", raw),
    })
}

fn parse_opt_date(field: &str, raw: Option<&str>) -> RepositoryResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, DATE_FMT)
            .map(Some)
            .map_err(|e| RepositoryError::FieldValueError {
                field: field.to_string(),
                message: format!("日期格式错误 ({}): {}", s, e),
            }),
        None => Ok(None),
    }
}

fn parse_datetime(field: &str, raw: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FMT).map_err(|e| {
        RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("时间格式错误 ({}): {}", raw, e),
        }
    })
}
