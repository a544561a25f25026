//! Per-name 异步锁表
//!
//! 不同名称之间互不阻塞；某个名称没有持有者时条目会被回收，表不会无限增长

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::voice::VoiceName;

#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<VoiceName, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取 `name` 的临界区，guard drop 时释放
    ///
    /// 不可重入：持有期间不得再次 lock 同一个名称
    pub async fn lock(&self, name: &VoiceName) -> KeyGuard<'_> {
        // 先 clone 出 Arc，不在 await 期间持有分片锁
        let mutex = self.locks.entry(name.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        KeyGuard {
            owner: self,
            name: name.clone(),
            guard: Some(guard),
        }
    }

    /// 当前表中的条目数
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

pub struct KeyGuard<'a> {
    owner: &'a KeyLocks,
    name: VoiceName,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // 只剩表自身持有引用时回收
        self.owner
            .locks
            .remove_if(&self.name, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
