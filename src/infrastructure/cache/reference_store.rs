//! LRU 条目存储
//!
//! 缓存变更的唯一临界区是这里的 `parking_lot::Mutex`，
//! 持锁期间不做任何 IO 或引擎调用

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{CacheStats, ReferenceInvalidator, ResolvedReference};
use crate::domain::voice::VoiceName;

pub struct ReferenceStore {
    entries: Mutex<LruCache<VoiceName, Arc<ResolvedReference>>>,
    capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ReferenceStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// 查询并刷新 LRU 位置（不计入命中统计）
    pub fn lookup(&self, name: &VoiceName) -> Option<Arc<ResolvedReference>> {
        self.entries.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &VoiceName) -> bool {
        self.entries.lock().contains(name)
    }

    /// 插入条目，超出容量时淘汰最久未使用的条目
    pub fn insert(&self, reference: Arc<ResolvedReference>) {
        let name = reference.name.clone();
        let evicted = self.entries.lock().push(name.clone(), reference);
        if let Some((evicted_name, _)) = evicted {
            if evicted_name != name {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(voice = %evicted_name, "Reference evicted from cache");
            }
        }
    }

    pub fn remove(&self, name: &VoiceName) -> bool {
        self.entries.lock().pop(name).is_some()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity.get(),
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            eviction_count: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// 注册表在 per-name 临界区内调用，这里不能再获取 KeyLocks
impl ReferenceInvalidator for ReferenceStore {
    fn invalidate(&self, name: &VoiceName) {
        if self.remove(name) {
            tracing::debug!(voice = %name, "Reference invalidated");
        }
    }
}
