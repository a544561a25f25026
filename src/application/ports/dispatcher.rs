//! Dispatcher Port - 有界并发的生成任务调度
//!
//! 固定大小的 slot 池 + FIFO 排队 + 每任务截止时间

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tempfile::TempPath;
use thiserror::Error;

use super::ResolvedReference;
use crate::domain::generation::{GenerationTask, TaskId};

/// 调度错误（引擎内部错误在此归一化，不会泄漏到 HTTP 层）
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Service overloaded: {in_flight} tasks admitted, limit {limit}")]
    Overloaded { in_flight: usize, limit: usize },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Engine failure: {0}")]
    EngineFailure(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// 生成结果产物
///
/// 输出文件归调用方所有，drop 时删除
#[derive(Debug)]
pub struct GeneratedAudio {
    task_id: TaskId,
    path: TempPath,
    /// 从提交到完成的总耗时（含排队）
    elapsed: Duration,
    /// 引擎执行耗时（不含排队）
    engine_time: Duration,
}

impl GeneratedAudio {
    pub fn new(task_id: TaskId, path: TempPath, elapsed: Duration, engine_time: Duration) -> Self {
        Self {
            task_id,
            path,
            elapsed,
            engine_time,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn engine_time(&self) -> Duration {
        self.engine_time
    }
}

/// 调度统计信息
#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    pub pool_size: usize,
    /// pool_size + queue_bound
    pub capacity: usize,
    /// 正在占用 slot 的任务（包括调用方已超时但引擎仍在运行的任务）
    pub in_flight: usize,
    /// 已接纳、等待 slot 的任务
    pub queued: usize,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub rejected: u64,
}

/// Dispatcher Port
#[async_trait]
pub trait DispatcherPort: Send + Sync {
    /// 提交任务并等待结果；截止时间从 `task.submitted_at()` 起算
    async fn submit(
        &self,
        task: GenerationTask,
        reference: &ResolvedReference,
        deadline: Duration,
    ) -> Result<GeneratedAudio, DispatchError>;

    fn stats(&self) -> DispatchStats;
}
