//! Task Dispatcher - 有界并发的生成任务调度
//!
//! - 接纳上限 pool_size + queue_bound，超出直接拒绝
//! - slot 按 FIFO 分配，引擎调用在 blocking 线程池执行
//! - 截止时间从任务提交时刻起算，超时后调用方立即返回，
//!   引擎调用继续执行直到返回，之后才释放 slot 与接纳名额
//! - 已过期的任务不会被接纳，也不会在拿到 slot 后启动引擎调用

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::{Builder, TempPath};

use super::slot::SlotPool;
use crate::application::ports::{
    ConversionRequest, DispatchError, DispatchStats, DispatcherPort, EngineError, GeneratedAudio,
    ResolvedReference, SynthesisRequest, VoiceEnginePort,
};
use crate::domain::generation::GenerationTask;

/// 调度器配置
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// 并发执行的引擎调用数
    pub pool_size: usize,
    /// 等待 slot 的最大任务数
    pub queue_bound: usize,
    /// slot scratch 目录与输出目录的根
    pub work_dir: PathBuf,
    /// 基础说话人
    pub speaker_id: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            pool_size: 1,
            queue_bound: 8,
            work_dir: PathBuf::from("data/work"),
            speaker_id: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    rejected: AtomicU64,
}

/// 接纳名额，drop 时归还
struct Admission {
    admitted: Arc<AtomicUsize>,
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.admitted.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 任务调度器
pub struct TaskDispatcher {
    engine: Arc<dyn VoiceEnginePort>,
    config: DispatcherConfig,
    slots: SlotPool,
    admitted: Arc<AtomicUsize>,
    counters: Counters,
}

impl TaskDispatcher {
    /// 创建调度器并准备 `slot-{i}` 与 `outputs` 目录
    pub fn new(engine: Arc<dyn VoiceEnginePort>, config: DispatcherConfig) -> std::io::Result<Self> {
        let pool_size = config.pool_size.max(1);
        std::fs::create_dir_all(config.work_dir.join("outputs"))?;
        for index in 0..pool_size {
            std::fs::create_dir_all(config.work_dir.join(format!("slot-{}", index)))?;
        }

        tracing::info!(
            pool_size,
            queue_bound = config.queue_bound,
            work_dir = %config.work_dir.display(),
            "TaskDispatcher initialized"
        );

        Ok(Self {
            engine,
            slots: SlotPool::new(pool_size),
            config: DispatcherConfig {
                pool_size,
                ..config
            },
            admitted: Arc::new(AtomicUsize::new(0)),
            counters: Counters::default(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.config.pool_size + self.config.queue_bound
    }

    fn admit(&self) -> Result<Admission, DispatchError> {
        let limit = self.capacity();
        match self
            .admitted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < limit).then_some(n + 1)
            }) {
            Ok(_) => Ok(Admission {
                admitted: self.admitted.clone(),
            }),
            Err(in_flight) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                Err(DispatchError::Overloaded { in_flight, limit })
            }
        }
    }

    fn intermediate_path(&self, slot: usize) -> PathBuf {
        self.config
            .work_dir
            .join(format!("slot-{}", slot))
            .join("intermediate.wav")
    }

    fn outputs_dir(&self) -> PathBuf {
        self.config.work_dir.join("outputs")
    }

    /// 排队等待 slot，然后在 blocking 线程池执行 synthesize + convert
    async fn run(
        &self,
        task: &GenerationTask,
        reference: &ResolvedReference,
        admission: Admission,
        expires_at: Option<Instant>,
        deadline: Duration,
    ) -> Result<(TempPath, Duration), DispatchError> {
        let slot = self.slots.acquire().await?;

        // 排队期间已过期则直接归还 slot
        if is_expired(expires_at) {
            return Err(DispatchError::Timeout(deadline));
        }

        tracing::debug!(
            task_id = %task.id(),
            slot = slot.index(),
            queued_ms = task.submitted_at().elapsed().as_millis() as u64,
            "Task acquired worker slot"
        );

        let engine = self.engine.clone();
        let intermediate = self.intermediate_path(slot.index());
        let outputs = self.outputs_dir();
        let prefix = format!("{}-", task.id());
        let text = task.text().to_string();
        let speed = task.speed();
        let speaker_id = self.config.speaker_id;
        let target = reference.embedding.clone();

        let handle = tokio::task::spawn_blocking(move || {
            // slot 与接纳名额跟随引擎调用的生命周期，而不是调用方
            let _slot = slot;
            let _admission = admission;
            let started = Instant::now();

            // 调用方放弃等待时输出随返回值一起被清理
            let output = Builder::new()
                .prefix(&prefix)
                .suffix(".wav")
                .tempfile_in(&outputs)
                .map_err(EngineError::Io)?
                .into_temp_path();
            let base = engine.base_embedding()?;
            engine.synthesize(&SynthesisRequest {
                text: &text,
                speaker_id,
                speed,
                output_path: &intermediate,
            })?;
            engine.convert(&ConversionRequest {
                source_audio: &intermediate,
                source_embedding: &base,
                target_embedding: &target,
                output_path: &output,
            })?;

            Ok::<_, EngineError>((output, started.elapsed()))
        });

        match handle.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(EngineError::Unavailable(msg))) => Err(DispatchError::EngineUnavailable(msg)),
            Ok(Err(e)) => Err(DispatchError::EngineFailure(e.to_string())),
            Err(e) if e.is_panic() => Err(DispatchError::EngineFailure(
                "engine call panicked".to_string(),
            )),
            Err(e) => Err(DispatchError::EngineFailure(e.to_string())),
        }
    }
}

fn is_expired(expires_at: Option<Instant>) -> bool {
    expires_at.is_some_and(|at| Instant::now() >= at)
}

#[async_trait]
impl DispatcherPort for TaskDispatcher {
    async fn submit(
        &self,
        task: GenerationTask,
        reference: &ResolvedReference,
        deadline: Duration,
    ) -> Result<GeneratedAudio, DispatchError> {
        let expires_at = task.expires_at(deadline);

        let result = if is_expired(expires_at) {
            Err(DispatchError::Timeout(deadline))
        } else {
            let admission = self.admit().inspect_err(|e| {
                tracing::warn!(task_id = %task.id(), error = %e, "Task rejected");
            })?;

            let run = self.run(&task, reference, admission, expires_at, deadline);
            match expires_at {
                Some(at) => tokio::time::timeout_at(at.into(), run)
                    .await
                    .unwrap_or_else(|_| Err(DispatchError::Timeout(deadline))),
                None => run.await,
            }
        };

        match result {
            Ok((path, engine_time)) => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                Ok(GeneratedAudio::new(
                    task.id(),
                    path,
                    task.submitted_at().elapsed(),
                    engine_time,
                ))
            }
            Err(DispatchError::Timeout(_)) => {
                self.counters.timed_out.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    task_id = %task.id(),
                    deadline_ms = deadline.as_millis() as u64,
                    "Generation deadline exceeded"
                );
                Err(DispatchError::Timeout(deadline))
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(task_id = %task.id(), error = %e, "Generation failed");
                Err(e)
            }
        }
    }

    fn stats(&self) -> DispatchStats {
        let in_flight = self.slots.busy();
        let admitted = self.admitted.load(Ordering::SeqCst);
        DispatchStats {
            pool_size: self.slots.size(),
            capacity: self.capacity(),
            in_flight,
            queued: admitted.saturating_sub(in_flight),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            timed_out: self.counters.timed_out.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }
}
