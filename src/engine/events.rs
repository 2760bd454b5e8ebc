// ==========================================
// IT 项目治理核心 - 治理事件发布
// ==========================================
// 职责: 定义通知/审计 sink trait, 实现依赖倒置
// 说明: Engine 层定义 trait, 审计仓储实现适配器
// 红线: fire-and-forget, 失败只记录日志, 不重试, 不中断切换或回写
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 治理事件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEventKind {
    /// 阶段切换成功
    PhaseTransitioned,
    /// 单项目健康度重评
    HealthRescored,
    /// 组合批量重评完成
    PortfolioRescored,
}

impl GovernanceEventKind {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &'static str {
        match self {
            GovernanceEventKind::PhaseTransitioned => "PhaseTransitioned",
            GovernanceEventKind::HealthRescored => "HealthRescored",
            GovernanceEventKind::PortfolioRescored => "PortfolioRescored",
        }
    }
}

/// 治理事件
///
/// 对应 record(eventKind, projectId, payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceEvent {
    pub event_kind: GovernanceEventKind,
    /// 组合级事件为 None
    pub project_id: Option<String>,
    pub payload: JsonValue,
    pub occurred_at: NaiveDateTime,
}

impl GovernanceEvent {
    /// 项目级事件
    pub fn for_project(
        event_kind: GovernanceEventKind,
        project_id: impl Into<String>,
        payload: JsonValue,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self {
            event_kind,
            project_id: Some(project_id.into()),
            payload,
            occurred_at,
        }
    }

    /// 组合级事件
    pub fn portfolio(
        event_kind: GovernanceEventKind,
        payload: JsonValue,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self {
            event_kind,
            project_id: None,
            payload,
            occurred_at,
        }
    }
}

// ==========================================
// 事件 Sink Trait
// ==========================================

/// 治理事件接收者 (通知 / 审计)
pub trait GovernanceEventSink: Send + Sync {
    /// 记录事件
    ///
    /// # 返回
    /// - `Err`: 记录失败, 由调用方记录日志后吞掉
    fn record(&self, event: GovernanceEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作 sink
///
/// 用于不需要通知/审计的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventSink;

impl GovernanceEventSink for NoOpEventSink {
    fn record(&self, event: GovernanceEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventSink: 跳过事件 - event_kind={}, project_id={:?}",
            event.event_kind.as_str(),
            event.project_id
        );
        Ok(())
    }
}

/// 可选的 sink 包装
///
/// 简化 Option<Arc<dyn GovernanceEventSink>> 的使用, 并统一"记录失败只告警"的语义
#[derive(Clone)]
pub struct OptionalEventSink {
    inner: Option<Arc<dyn GovernanceEventSink>>,
}

impl OptionalEventSink {
    pub fn with_sink(sink: Arc<dyn GovernanceEventSink>) -> Self {
        Self { inner: Some(sink) }
    }

    /// 不发送任何事件
    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    /// 发送事件; 失败记录 warn 日志后返回 false
    pub fn dispatch(&self, event: GovernanceEvent) -> bool {
        let Some(sink) = &self.inner else {
            tracing::debug!(
                "OptionalEventSink: 未配置 sink, 跳过事件 - event_kind={}",
                event.event_kind.as_str()
            );
            return false;
        };

        let kind = event.event_kind;
        let project_id = event.project_id.clone();
        match sink.record(event) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    event_kind = kind.as_str(),
                    project_id = ?project_id,
                    error = %e,
                    "治理事件记录失败, 已忽略"
                );
                false
            }
        }
    }
}

impl Default for OptionalEventSink {
    fn default() -> Self {
        Self::none()
    }
}
