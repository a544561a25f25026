//! Reference Cache Port - 音色名称到已解析参考（路径 + embedding）的缓存
//!
//! 失效由注册表变更同步触发，而不是依赖 TTL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use super::Embedding;
use crate::domain::voice::VoiceName;

/// 解析错误
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Reference voice not found: {0}")]
    NotFound(VoiceName),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Failed to extract embedding: {0}")]
    Extraction(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// 已解析的参考音色
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
    pub name: VoiceName,
    pub path: PathBuf,
    pub embedding: Embedding,
    pub resolved_at: DateTime<Utc>,
}

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
}

/// Reference Cache Port
#[async_trait]
pub trait ReferenceCachePort: Send + Sync {
    /// 命中直接返回；未命中则查询注册表、提取 embedding 并写入缓存
    async fn resolve(&self, name: &VoiceName) -> Result<Arc<ResolvedReference>, ResolveError>;

    /// 移除条目，幂等
    async fn invalidate(&self, name: &VoiceName);

    fn stats(&self) -> CacheStats;
}
