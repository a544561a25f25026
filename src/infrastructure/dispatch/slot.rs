//! Worker slot 池
//!
//! 信号量控制并发数，空闲 slot 编号单独维护，
//! 每个 slot 对应一个独立的 scratch 目录

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::application::ports::DispatchError;

pub struct SlotPool {
    semaphore: Arc<Semaphore>,
    free: Arc<Mutex<VecDeque<usize>>>,
    size: usize,
}

impl SlotPool {
    pub fn new(size: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            free: Arc::new(Mutex::new((0..size).collect())),
            size,
        }
    }

    /// 按到达顺序等待空闲 slot（tokio Semaphore 是公平的）
    pub async fn acquire(&self) -> Result<WorkerSlot, DispatchError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::EngineUnavailable("worker pool closed".to_string()))?;

        let index = self.free.lock().pop_front().ok_or_else(|| {
            DispatchError::EngineFailure("no free slot index for acquired permit".to_string())
        })?;

        Ok(WorkerSlot {
            index,
            free: self.free.clone(),
            permit: Some(permit),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 当前被占用的 slot 数
    pub fn busy(&self) -> usize {
        self.size.saturating_sub(self.semaphore.available_permits())
    }
}

/// 已占用的 slot，drop 时释放且只释放一次
#[derive(Debug)]
pub struct WorkerSlot {
    index: usize,
    free: Arc<Mutex<VecDeque<usize>>>,
    permit: Option<OwnedSemaphorePermit>,
}

impl WorkerSlot {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        // 先归还编号再释放 permit，下一个持有者一定能拿到编号
        if let Some(permit) = self.permit.take() {
            self.free.lock().push_back(self.index);
            drop(permit);
        }
    }
}
