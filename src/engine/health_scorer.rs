// ==========================================
// IT 项目治理核心 - 组合健康度评分引擎
// ==========================================
// 职责: 汇总四个信号得到三态健康度 (GREEN / AMBER / RED)
// 输入: 项目聚合快照 + 显式注入的当前时间
// 输出: HealthAssessment / ScoreResult
// 红线: 无内部可变状态; 任何可选字段组合都返回确定结论
// ==========================================

use crate::domain::project::ProjectAggregate;
use crate::domain::types::HealthIndicator;
use crate::engine::deliverable_rules::DeliverableRequirementTable;
use crate::engine::health_signals::{
    anomaly_signal, budget_signal, risk_signal, schedule_signal, HealthThresholds,
    SignalContribution,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// ==========================================
// 输出结构
// ==========================================

/// 单项目评估明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub indicator: HealthIndicator,
    pub red_score: u32,
    pub amber_score: u32,
    pub signals: Vec<SignalContribution>,
}

/// 批量评分中单个项目的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub project_id: String,
    pub previous: HealthIndicator,
    pub indicator: HealthIndicator,
    pub red_score: u32,
    pub amber_score: u32,
    pub scored_at: NaiveDateTime,
}

impl ScoreResult {
    pub fn changed(&self) -> bool {
        self.previous != self.indicator
    }
}

/// 带时间预算的批量评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchScoreOutcome {
    pub results: Vec<ScoreResult>,
    /// 因时间预算耗尽而未调度的项目
    pub skipped: Vec<String>,
}

impl BatchScoreOutcome {
    pub fn budget_exhausted(&self) -> bool {
        !self.skipped.is_empty()
    }
}

// ==========================================
// HealthScorer - 健康度评分器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    thresholds: HealthThresholds,
    table: DeliverableRequirementTable,
}

impl HealthScorer {
    /// 默认阈值 + 标准交付物要求表
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: HealthThresholds) -> Self {
        Self {
            thresholds,
            table: DeliverableRequirementTable::standard(),
        }
    }

    pub fn with_table(mut self, table: DeliverableRequirementTable) -> Self {
        self.table = table;
        self
    }

    pub fn thresholds(&self) -> &HealthThresholds {
        &self.thresholds
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算健康度
    pub fn score(&self, aggregate: &ProjectAggregate, now: NaiveDateTime) -> HealthIndicator {
        self.assess(aggregate, now).indicator
    }

    /// 计算健康度及各信号明细
    pub fn assess(&self, aggregate: &ProjectAggregate, now: NaiveDateTime) -> HealthAssessment {
        let signals = vec![
            budget_signal(aggregate.budget.as_ref(), &self.thresholds),
            schedule_signal(&aggregate.project, now.date(), &self.thresholds),
            risk_signal(aggregate.active_risks()),
            anomaly_signal(aggregate, &self.table),
        ];

        let red_score: u32 = signals.iter().map(|s| s.red).sum();
        let amber_score: u32 = signals.iter().map(|s| s.amber).sum();
        let indicator = classify(red_score, amber_score);

        tracing::debug!(
            project_id = %aggregate.project_id(),
            red_score,
            amber_score,
            indicator = %indicator,
            "健康度评估完成"
        );

        HealthAssessment {
            indicator,
            red_score,
            amber_score,
            signals,
        }
    }

    /// 单项目评分结果
    pub fn score_result(&self, aggregate: &ProjectAggregate, now: NaiveDateTime) -> ScoreResult {
        let assessment = self.assess(aggregate, now);
        ScoreResult {
            project_id: aggregate.project.project_id.clone(),
            previous: aggregate.project.health,
            indicator: assessment.indicator,
            red_score: assessment.red_score,
            amber_score: assessment.amber_score,
            scored_at: now,
        }
    }

    /// 批量评分
    ///
    /// Closed / Cancelled 项目不参与; 项目之间互不依赖
    pub fn rescore_all(
        &self,
        aggregates: &[ProjectAggregate],
        now: NaiveDateTime,
    ) -> Vec<ScoreResult> {
        aggregates
            .iter()
            .filter(|agg| agg.project.status.is_scorable())
            .map(|agg| self.score_result(agg, now))
            .collect()
    }

    /// 带时间预算的批量评分
    ///
    /// 预算耗尽后不再调度后续项目; 已算出的结果照常返回
    pub fn rescore_all_within(
        &self,
        aggregates: &[ProjectAggregate],
        now: NaiveDateTime,
        budget: Duration,
    ) -> BatchScoreOutcome {
        let started = Instant::now();
        let mut results = Vec::new();
        let mut skipped = Vec::new();

        for agg in aggregates.iter().filter(|agg| agg.project.status.is_scorable()) {
            if started.elapsed() >= budget {
                skipped.push(agg.project.project_id.clone());
                continue;
            }
            results.push(self.score_result(agg, now));
        }

        if !skipped.is_empty() {
            tracing::warn!(
                scored = results.len(),
                skipped = skipped.len(),
                budget_ms = budget.as_millis() as u64,
                "批量评分时间预算耗尽, 剩余项目未调度"
            );
        }

        BatchScoreOutcome { results, skipped }
    }
}

/// 红/黄累计分 → 三态健康度
///
/// # 优先级 (先命中先返回)
/// 1. red > 0 → RED
/// 2. amber > 1 || (red == 0 && amber > 0) → AMBER
/// 3. 其余 → GREEN
pub fn classify(red_score: u32, amber_score: u32) -> HealthIndicator {
    if red_score > 0 {
        return HealthIndicator::Red;
    }
    // 第二个子句在 red == 0 时覆盖第一个, 保持原样
    if amber_score > 1 || (red_score == 0 && amber_score > 0) {
        return HealthIndicator::Amber;
    }
    HealthIndicator::Green
}
