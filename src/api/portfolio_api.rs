// ==========================================
// IT 项目治理核心 - 组合健康度 API
// ==========================================
// 职责: 单项目评分 / 进度更新 / 组合批量重评
// 红线: 批量回写按项目独立提交, 单个失败不阻断其余项目
// ==========================================

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::error::{require_project_id, ApiError, ApiResult};
use crate::domain::project::ProjectAggregate;
use crate::engine::events::{GovernanceEvent, GovernanceEventKind, OptionalEventSink};
use crate::engine::health_scorer::{
    BatchScoreOutcome, HealthAssessment, HealthScorer, ScoreResult,
};
use crate::repository::project_repo::{AggregateLoadFailure, ProjectRepository};

/// 并行评分默认并发度
const DEFAULT_CONCURRENCY: usize = 4;

/// 单个项目回写失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescoreFailure {
    pub project_id: String,
    pub error: String,
}

/// 组合批量重评报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescoreReport {
    pub scored_at: NaiveDateTime,
    /// 已回写的项目
    pub updated: Vec<ScoreResult>,
    /// 评分或回写失败的项目
    pub failed: Vec<RescoreFailure>,
    /// 时间预算耗尽未调度的项目
    pub skipped: Vec<String>,
}

impl From<AggregateLoadFailure> for RescoreFailure {
    fn from(failure: AggregateLoadFailure) -> Self {
        Self {
            project_id: failure.project_id,
            error: failure.error.to_string(),
        }
    }
}

impl RescoreReport {
    pub fn changed_count(&self) -> usize {
        self.updated.iter().filter(|r| r.changed()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

// ==========================================
// PortfolioApi - 组合健康度 API
// ==========================================
pub struct PortfolioApi {
    project_repo: Arc<ProjectRepository>,
    scorer: HealthScorer,
    event_sink: OptionalEventSink,
    time_budget: Option<Duration>,
    concurrency: usize,
}

/// 并行评分中单个任务的结局
enum ScheduledScore {
    Scored(ScoreResult),
    Skipped(String),
    Failed(RescoreFailure),
}

impl PortfolioApi {
    pub fn new(project_repo: Arc<ProjectRepository>, event_sink: OptionalEventSink) -> Self {
        Self {
            project_repo,
            scorer: HealthScorer::new(),
            event_sink,
            time_budget: None,
            concurrency: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(DEFAULT_CONCURRENCY),
        }
    }

    pub fn with_scorer(mut self, scorer: HealthScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// 批量重评的时间预算 (None = 不限时)
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    /// 并行评分同时在途的任务数 (至少 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    // ==========================================
    // 单项目
    // ==========================================

    /// 计算健康度明细（只读, 不回写）
    pub fn score_project(
        &self,
        project_id: &str,
        now: NaiveDateTime,
    ) -> ApiResult<HealthAssessment> {
        let aggregate = self.load(project_id)?;
        Ok(self.scorer.assess(&aggregate, now))
    }

    /// 重评单个项目并回写
    pub fn rescore_project(&self, project_id: &str, now: NaiveDateTime) -> ApiResult<ScoreResult> {
        let aggregate = self.load(project_id)?;
        if !aggregate.project.status.is_scorable() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "项目(id={})状态为{}, 不参与评分",
                aggregate.project.project_id, aggregate.project.status
            )));
        }

        let result = self.scorer.score_result(&aggregate, now);
        self.project_repo
            .update_health(&result.project_id, result.indicator, result.scored_at)?;

        self.event_sink.dispatch(GovernanceEvent::for_project(
            GovernanceEventKind::HealthRescored,
            result.project_id.clone(),
            json!({
                "previous": result.previous.to_db_str(),
                "indicator": result.indicator.to_db_str(),
                "red_score": result.red_score,
                "amber_score": result.amber_score,
            }),
            now,
        ));

        Ok(result)
    }

    /// 更新进度 (0-100, 允许回调) 并重评
    pub fn update_progress(
        &self,
        project_id: &str,
        progress_pct: i32,
        now: NaiveDateTime,
    ) -> ApiResult<ScoreResult> {
        let id = require_project_id(project_id)?;
        if !(0..=100).contains(&progress_pct) {
            return Err(ApiError::InvalidInput(format!(
                "进度必须在0-100之间: {}",
                progress_pct
            )));
        }

        self.project_repo.update_progress(id, progress_pct)?;
        self.rescore_project(id, now)
    }

    // ==========================================
    // 组合批量重评
    // ==========================================

    /// 批量重评所有参与评分的项目
    ///
    /// # 流程
    /// 1. 单事务逐项目读取活动项目聚合; 读取失败的项目记入 failed
    /// 2. 纯计算评分 (可选时间预算)
    /// 3. 逐项目回写; 失败记入 failed, 其余照常提交
    /// 4. 发送一次 PortfolioRescored 事件
    pub fn rescore_portfolio(&self, now: NaiveDateTime) -> ApiResult<RescoreReport> {
        let loaded = self.project_repo.list_active_aggregates()?;
        let failed = loaded.failures.into_iter().map(RescoreFailure::from).collect();

        let outcome = match self.time_budget {
            Some(budget) => self.scorer.rescore_all_within(&loaded.aggregates, now, budget),
            None => BatchScoreOutcome {
                results: self.scorer.rescore_all(&loaded.aggregates, now),
                skipped: Vec::new(),
            },
        };

        Ok(persist_scores(
            &self.project_repo,
            &self.event_sink,
            outcome.results,
            failed,
            outcome.skipped,
            now,
        ))
    }

    /// 批量重评（并行计算）
    ///
    /// # 说明
    /// - 读库与回写在阻塞线程池执行, 不占用异步运行时线程
    /// - 同时在途的评分任务不超过 concurrency
    /// - 时间预算在每个任务真正开始时检查, 耗尽后剩余项目记入 skipped
    pub async fn rescore_portfolio_concurrent(
        &self,
        now: NaiveDateTime,
    ) -> ApiResult<RescoreReport> {
        let repo = Arc::clone(&self.project_repo);
        let loaded = tokio::task::spawn_blocking(move || repo.list_active_aggregates())
            .await
            .map_err(|e| ApiError::InternalError(format!("聚合读取任务异常退出: {}", e)))??;
        let mut failed: Vec<RescoreFailure> =
            loaded.failures.into_iter().map(RescoreFailure::from).collect();

        let scorer = Arc::new(self.scorer.clone());
        let budget = self.time_budget;
        let started = Instant::now();

        let outcomes: Vec<ScheduledScore> = stream::iter(loaded.aggregates)
            .map(|aggregate| {
                let scorer = Arc::clone(&scorer);
                async move {
                    let project_id = aggregate.project.project_id.clone();
                    if budget.is_some_and(|budget| started.elapsed() >= budget) {
                        return ScheduledScore::Skipped(project_id);
                    }

                    let handle =
                        tokio::task::spawn_blocking(move || scorer.score_result(&aggregate, now));
                    match handle.await {
                        Ok(result) => ScheduledScore::Scored(result),
                        Err(e) => {
                            tracing::error!(
                                project_id = %project_id,
                                error = %e,
                                "评分任务异常退出"
                            );
                            ScheduledScore::Failed(RescoreFailure {
                                project_id,
                                error: e.to_string(),
                            })
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                ScheduledScore::Scored(result) => results.push(result),
                ScheduledScore::Skipped(project_id) => skipped.push(project_id),
                ScheduledScore::Failed(failure) => failed.push(failure),
            }
        }

        if !skipped.is_empty() {
            tracing::warn!(
                scheduled = results.len() + failed.len(),
                skipped = skipped.len(),
                "批量评分时间预算耗尽, 剩余项目未调度"
            );
        }

        let repo = Arc::clone(&self.project_repo);
        let event_sink = self.event_sink.clone();
        tokio::task::spawn_blocking(move || {
            persist_scores(&repo, &event_sink, results, failed, skipped, now)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("健康度回写任务异常退出: {}", e)))
    }

    fn load(&self, project_id: &str) -> ApiResult<ProjectAggregate> {
        let id = require_project_id(project_id)?;
        self.project_repo
            .load_aggregate(id)?
            .ok_or_else(|| ApiError::NotFound(format!("项目(id={})不存在", id)))
    }
}

/// 逐项目回写健康度, 单个失败不阻断其余项目
fn persist_scores(
    project_repo: &ProjectRepository,
    event_sink: &OptionalEventSink,
    results: Vec<ScoreResult>,
    mut failed: Vec<RescoreFailure>,
    skipped: Vec<String>,
    now: NaiveDateTime,
) -> RescoreReport {
    let mut updated = Vec::with_capacity(results.len());

    for result in results {
        match project_repo.update_health(&result.project_id, result.indicator, result.scored_at) {
            Ok(()) => updated.push(result),
            Err(e) => {
                tracing::warn!(
                    project_id = %result.project_id,
                    error = %e,
                    "健康度回写失败, 继续处理其余项目"
                );
                failed.push(RescoreFailure {
                    project_id: result.project_id,
                    error: e.to_string(),
                });
            }
        }
    }

    let report = RescoreReport {
        scored_at: now,
        updated,
        failed,
        skipped,
    };

    tracing::info!(
        updated = report.updated.len(),
        changed = report.changed_count(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "组合健康度重评完成"
    );

    event_sink.dispatch(GovernanceEvent::portfolio(
        GovernanceEventKind::PortfolioRescored,
        json!({
            "updated": report.updated.len(),
            "changed": report.changed_count(),
            "failed": report.failed.iter().map(|f| f.project_id.as_str()).collect::<Vec<_>>(),
            "skipped": report.skipped.len(),
        }),
        now,
    ));

    report
}
