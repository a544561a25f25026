//! File Voice Registry - 文件系统参考音色注册表
//!
//! 布局: `{voices_dir}/{name}.wav`
//!
//! 写入先落到同目录的隐藏临时文件，fsync 后 rename 覆盖目标，
//! 读者只会看到完整的旧文件或完整的新文件

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{
    NormalizedAudio, ReferenceInvalidator, RegistryError, VoiceRegistryPort, VoiceResource,
};
use crate::domain::voice::{AudioFormat, VoiceName};
use crate::infrastructure::cache::KeyLocks;

/// 规范存储格式
const CANONICAL_FORMAT: AudioFormat = AudioFormat::Wav;

pub struct FileVoiceRegistry {
    voices_dir: PathBuf,
    locks: Arc<KeyLocks>,
    invalidator: Arc<dyn ReferenceInvalidator>,
}

impl FileVoiceRegistry {
    /// 创建注册表，确保目录存在
    pub fn new(
        voices_dir: impl AsRef<Path>,
        locks: Arc<KeyLocks>,
        invalidator: Arc<dyn ReferenceInvalidator>,
    ) -> Result<Self, RegistryError> {
        let voices_dir = voices_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&voices_dir)
            .map_err(|e| RegistryError::Storage(format!("create {}: {}", voices_dir.display(), e)))?;

        Ok(Self {
            voices_dir,
            locks,
            invalidator,
        })
    }

    pub fn voices_dir(&self) -> &Path {
        &self.voices_dir
    }

    fn resource_path(&self, name: &VoiceName) -> PathBuf {
        self.voices_dir
            .join(format!("{}.{}", name, CANONICAL_FORMAT.extension()))
    }

    /// 以 `.` 开头，不会被 list 枚举到
    fn temp_path(&self, name: &VoiceName) -> PathBuf {
        self.voices_dir
            .join(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
    }

    async fn write_replace(&self, source: &Path, target: &Path, temp: &Path) -> std::io::Result<()> {
        fs::copy(source, temp).await?;
        fs::File::open(temp).await?.sync_all().await?;
        fs::rename(temp, target).await
    }

    async fn describe(&self, name: &VoiceName) -> Result<VoiceResource, RegistryError> {
        let path = self.resource_path(name);
        let metadata = match fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(RegistryError::NotFound(name.clone())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RegistryError::NotFound(name.clone()))
            }
            Err(e) => return Err(RegistryError::Storage(e.to_string())),
        };

        let updated_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(VoiceResource {
            name: name.clone(),
            path,
            size_bytes: metadata.len(),
            updated_at,
        })
    }
}

#[async_trait]
impl VoiceRegistryPort for FileVoiceRegistry {
    async fn put(
        &self,
        name: &VoiceName,
        audio: &NormalizedAudio,
    ) -> Result<VoiceResource, RegistryError> {
        let _guard = self.locks.lock(name).await;

        let target = self.resource_path(name);
        let temp = self.temp_path(name);
        if let Err(e) = self.write_replace(audio.path(), &target, &temp).await {
            let _ = fs::remove_file(&temp).await;
            tracing::error!(voice = %name, error = %e, "Failed to store reference voice");
            return Err(RegistryError::Storage(e.to_string()));
        }

        self.invalidator.invalidate(name);
        tracing::debug!(voice = %name, path = %target.display(), "Reference voice written");

        self.describe(name).await
    }

    async fn get(&self, name: &VoiceName) -> Result<VoiceResource, RegistryError> {
        self.describe(name).await
    }

    async fn list(&self) -> Result<Vec<VoiceName>, RegistryError> {
        let mut entries = match fs::read_dir(&self.voices_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RegistryError::Storage(e.to_string())),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RegistryError::Storage(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = VoiceName::from_file_path(&entry.path(), CANONICAL_FORMAT) {
                names.push(name);
            }
        }

        Ok(names)
    }

    async fn delete(&self, name: &VoiceName) -> Result<bool, RegistryError> {
        let _guard = self.locks.lock(name).await;

        let removed = match fs::remove_file(self.resource_path(name)).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(RegistryError::Storage(e.to_string())),
        };
        self.invalidator.invalidate(name);

        if removed {
            tracing::debug!(voice = %name, "Reference voice removed");
        }
        Ok(removed)
    }
}
