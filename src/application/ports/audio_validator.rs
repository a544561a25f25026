//! Audio Validator Port - 上传音频校验与规范化

use std::path::Path;
use std::time::Duration;
use tempfile::TempPath;
use thiserror::Error;

/// 校验错误
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio file is empty")]
    Empty,

    #[error("Audio is too short: {actual_secs:.1}s, minimum is {minimum_secs}s")]
    TooShort { actual_secs: f64, minimum_secs: u64 },

    #[error("Audio file is corrupt: {0}")]
    Corrupt(String),

    #[error("Staging error: {0}")]
    Staging(String),
}

/// 未经校验的上传内容
#[derive(Debug, Clone)]
pub struct RawUpload {
    /// 客户端提供的文件名（只用于推断扩展名）
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 已规范化的音频（16-bit PCM 单声道 WAV）
///
/// 持有 staging 区的临时文件，drop 时自动删除
#[derive(Debug)]
pub struct NormalizedAudio {
    path: TempPath,
    duration: Duration,
    sample_rate: u32,
}

impl NormalizedAudio {
    pub fn new(path: TempPath, duration: Duration, sample_rate: u32) -> Self {
        Self {
            path,
            duration,
            sample_rate,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Audio Validator Port
///
/// CPU 密集的同步操作，调用方负责放到 blocking 线程池
pub trait AudioValidatorPort: Send + Sync {
    /// 校验格式与时长，并转换为规范存储格式
    ///
    /// 原始字节只写入私有 staging 文件，任何退出路径都会删除该文件
    fn validate_and_normalize(&self, upload: RawUpload) -> Result<NormalizedAudio, ValidationError>;
}
