//! Voice Engine Port - 语音合成 / 音色转换引擎抽象
//!
//! 引擎调用是不可中断的阻塞操作，调用方必须在 blocking 线程池中执行
//! （`tokio::task::spawn_blocking`），具体实现在 infrastructure/adapters 层

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    /// 引擎未初始化或不可达
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// 合成 / 转换失败（模型错误、参考音频异常等）
    #[error("engine failure: {0}")]
    Failure(String),

    /// embedding 提取失败（静音或无法识别的音频）
    #[error("embedding extraction failed: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 音色 embedding（固定长度的数值向量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub speaker_id: u32,
    pub speed: f32,
    /// 输出路径由调用方分配（每个 slot 独立）
    pub output_path: &'a Path,
}

/// 音色转换请求
#[derive(Debug, Clone)]
pub struct ConversionRequest<'a> {
    pub source_audio: &'a Path,
    pub source_embedding: &'a Embedding,
    pub target_embedding: &'a Embedding,
    pub output_path: &'a Path,
}

/// 引擎运行环境信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    pub engine: String,
    pub device: String,
    pub accelerator_available: bool,
}

/// Voice Engine Port
///
/// 外部语音引擎的阻塞式契约。实现可以假定单次调用在单线程内完成，
/// 但必须允许多个调用并发执行（每个 slot 一个）。
pub trait VoiceEnginePort: Send + Sync {
    /// 文本合成，写入 `output_path`，返回实际产物路径
    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<PathBuf, EngineError>;

    /// 音色转换，写入 `output_path`，返回实际产物路径
    fn convert(&self, request: &ConversionRequest<'_>) -> Result<PathBuf, EngineError>;

    /// 从参考音频提取目标音色 embedding
    fn extract_embedding(&self, audio_path: &Path) -> Result<Embedding, EngineError>;

    /// 基础说话人的固定 embedding（转换的 source embedding）
    fn base_embedding(&self) -> Result<Embedding, EngineError>;

    /// 设备信息
    fn info(&self) -> Result<EngineInfo, EngineError>;
}
