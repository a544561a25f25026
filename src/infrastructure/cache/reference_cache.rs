//! Reference Cache 实现
//!
//! resolve 在 per-name 临界区内完成「检查 -> 查询注册表 -> 提取 embedding -> 写入」，
//! 注册表的 put / delete 持有同一把锁完成「写入 -> 失效」，
//! 因此进行中的 resolve 不会在删除或替换之后写回旧条目

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::{KeyLocks, ReferenceStore};
use crate::application::ports::{
    CacheStats, EngineError, ReferenceCachePort, ReferenceInvalidator, RegistryError,
    ResolveError, ResolvedReference, VoiceEnginePort, VoiceRegistryPort,
};
use crate::domain::voice::VoiceName;

pub struct ReferenceCache {
    store: Arc<ReferenceStore>,
    registry: Arc<dyn VoiceRegistryPort>,
    engine: Arc<dyn VoiceEnginePort>,
    locks: Arc<KeyLocks>,
}

impl ReferenceCache {
    pub fn new(
        store: Arc<ReferenceStore>,
        registry: Arc<dyn VoiceRegistryPort>,
        engine: Arc<dyn VoiceEnginePort>,
        locks: Arc<KeyLocks>,
    ) -> Self {
        Self {
            store,
            registry,
            engine,
            locks,
        }
    }

    async fn load(&self, name: &VoiceName) -> Result<Arc<ResolvedReference>, ResolveError> {
        let resource = self.registry.get(name).await.map_err(|e| match e {
            RegistryError::NotFound(name) => ResolveError::NotFound(name),
            RegistryError::Storage(msg) => ResolveError::Registry(msg),
        })?;

        let engine = self.engine.clone();
        let path = resource.path.clone();
        let embedding = tokio::task::spawn_blocking(move || engine.extract_embedding(&path))
            .await
            .map_err(|e| ResolveError::Extraction(format!("extraction task failed: {}", e)))?
            .map_err(|e| match e {
                EngineError::Unavailable(msg) => ResolveError::EngineUnavailable(msg),
                other => ResolveError::Extraction(other.to_string()),
            })?;

        Ok(Arc::new(ResolvedReference {
            name: resource.name,
            path: resource.path,
            embedding,
            resolved_at: Utc::now(),
        }))
    }
}

#[async_trait]
impl ReferenceCachePort for ReferenceCache {
    async fn resolve(&self, name: &VoiceName) -> Result<Arc<ResolvedReference>, ResolveError> {
        if let Some(hit) = self.store.lookup(name) {
            self.store.record_hit();
            return Ok(hit);
        }

        let _guard = self.locks.lock(name).await;

        // 等锁期间可能已有其他请求完成了解析
        if let Some(hit) = self.store.lookup(name) {
            self.store.record_hit();
            return Ok(hit);
        }
        self.store.record_miss();

        let started = std::time::Instant::now();
        let reference = self.load(name).await?;
        self.store.insert(reference.clone());

        tracing::info!(
            voice = %name,
            embedding_dim = reference.embedding.dim(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Reference voice resolved"
        );

        Ok(reference)
    }

    async fn invalidate(&self, name: &VoiceName) {
        let _guard = self.locks.lock(name).await;
        self.store.invalidate(name);
    }

    fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}
