// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::collection::Collection;
use serde_json::Value;

/// 响应分类结果
///
/// 不落盘，只驱动控制流
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    /// 200 且响应体为合法 JSON
    Accept(Value),
    /// 丢弃本任务，等待下一次运行
    Skip(String),
    /// 5xx：暂停固定时长后丢弃
    PauseAndRetryOnce,
    /// 401/403：终止整个运行
    FatalAbort(String),
}

/// 单个任务的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// 已写入存储
    Stored,
    /// 写入前发现记录已存在（并发写同一键）
    AlreadyCached,
    /// 被跳过
    Skipped(String),
    /// 服务端错误，暂停后丢弃
    Paused,
    /// 致命错误，整个运行终止
    Aborted(String),
    /// 运行已终止，任务未被准入
    Cancelled,
    /// 响应成功但写入存储失败
    WriteFailed(String),
}

impl TaskOutcome {
    /// 用于指标标签
    pub fn label(&self) -> &'static str {
        match self {
            TaskOutcome::Stored => "stored",
            TaskOutcome::AlreadyCached => "already_cached",
            TaskOutcome::Skipped(_) => "skipped",
            TaskOutcome::Paused => "paused",
            TaskOutcome::Aborted(_) => "aborted",
            TaskOutcome::Cancelled => "cancelled",
            TaskOutcome::WriteFailed(_) => "write_failed",
        }
    }
}

/// 阶段执行报告
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StageReport {
    pub stage: String,
    /// 抽取到的去重键数量
    pub discovered: usize,
    /// 因已缓存而未调度的键数量
    pub cached: usize,
    pub scheduled: usize,
    pub stored: usize,
    pub skipped: usize,
    pub paused: usize,
    pub cancelled: usize,
    pub write_failures: usize,
    /// 第一个致命错误的原因
    pub abort: Option<String>,
}

impl StageReport {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Stored => self.stored += 1,
            // Another writer stored it first; the record exists either way.
            TaskOutcome::AlreadyCached => self.cached += 1,
            TaskOutcome::Skipped(_) => self.skipped += 1,
            TaskOutcome::Paused => self.paused += 1,
            TaskOutcome::Cancelled => self.cancelled += 1,
            TaskOutcome::WriteFailed(_) => self.write_failures += 1,
            TaskOutcome::Aborted(reason) => {
                if self.abort.is_none() {
                    self.abort = Some(reason);
                }
            }
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }
}

/// 流水线运行结果
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(Vec<StageReport>),
    Aborted {
        stage: String,
        reason: String,
        reports: Vec<StageReport>,
    },
}

impl RunOutcome {
    pub fn reports(&self) -> &[StageReport] {
        match self {
            RunOutcome::Completed(reports) | RunOutcome::Aborted { reports, .. } => reports,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RunOutcome::Aborted { .. })
    }

    pub fn report_for(&self, collection: Collection) -> Option<&StageReport> {
        self.reports()
            .iter()
            .find(|r| r.stage == collection.dir_name())
    }
}
