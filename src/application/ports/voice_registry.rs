//! Voice Registry Port - 参考音色的持久化注册表
//!
//! 注册表是唯一的事实来源，缓存位于其前面

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use super::NormalizedAudio;
use crate::domain::voice::VoiceName;

/// Registry 错误
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Voice not found: {0}")]
    NotFound(VoiceName),

    /// 写入 / 重命名失败，注册表保持变更前状态
    #[error("Storage error: {0}")]
    Storage(String),
}

/// 规范化存储的参考音频
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceResource {
    pub name: VoiceName,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

/// 注册表变更的同步通知
///
/// 调用发生在注册表的 per-name 临界区内，实现不得再获取同一个 key 的锁
pub trait ReferenceInvalidator: Send + Sync {
    fn invalidate(&self, name: &VoiceName);
}

/// Voice Registry Port
#[async_trait]
pub trait VoiceRegistryPort: Send + Sync {
    /// 原子替换 `name` 下的资源，返回前已完成缓存失效
    async fn put(
        &self,
        name: &VoiceName,
        audio: &NormalizedAudio,
    ) -> Result<VoiceResource, RegistryError>;

    async fn get(&self, name: &VoiceName) -> Result<VoiceResource, RegistryError>;

    /// 顺序为文件系统枚举顺序，不保证稳定
    async fn list(&self) -> Result<Vec<VoiceName>, RegistryError>;

    /// 删除资源，不存在时返回 false；返回前已完成缓存失效
    async fn delete(&self, name: &VoiceName) -> Result<bool, RegistryError>;
}
