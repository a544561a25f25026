//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::voice::AudioFormat;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 合成引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 调度配置
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// 参考 embedding 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 上传音频校验配置
    #[serde(default)]
    pub validation: ValidationConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 请求体上限（字节）
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8585
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 引擎实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// 远程推理 sidecar
    #[default]
    Http,
    /// 进程内假引擎，不依赖模型
    Fake,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Fake => write!(f, "fake"),
        }
    }
}

/// 合成引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: EngineKind,

    /// sidecar 基础 URL
    #[serde(default = "default_engine_url")]
    pub url: String,

    /// 单次引擎调用的 HTTP 超时（秒）
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

fn default_engine_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_engine_timeout() -> u64 {
    300
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            url: default_engine_url(),
            timeout_secs: default_engine_timeout(),
        }
    }
}

/// 调度配置
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// 引擎槽位数
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// 槽位之外允许排队的任务数
    #[serde(default = "default_queue_bound")]
    pub queue_bound: usize,

    /// 生成请求截止时间（秒）
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// 中间文件与输出目录
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_pool_size() -> usize {
    1
}

fn default_queue_bound() -> usize {
    8
}

fn default_deadline_secs() -> u64 {
    120
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("data/work")
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            queue_bound: default_queue_bound(),
            deadline_secs: default_deadline_secs(),
            work_dir: default_work_dir(),
        }
    }
}

impl DispatchConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

/// 参考 embedding 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 最多保留的条目数
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_capacity() -> usize {
    32
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 参考音色存储目录
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,

    /// 上传暂存目录
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// 上传文件最大大小（字节），默认 20MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("resources")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("data/staging")
}

fn default_max_upload_size() -> usize {
    20 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            voices_dir: default_voices_dir(),
            staging_dir: default_staging_dir(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// 上传音频校验配置
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// 最短时长（秒）
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: u64,

    /// 允许上传的格式
    #[serde(default = "default_allowed_formats")]
    pub allowed_formats: Vec<AudioFormat>,

    /// 规范化后的采样率（Hz）
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_min_duration_secs() -> u64 {
    30
}

fn default_allowed_formats() -> Vec<AudioFormat> {
    vec![AudioFormat::Mp3, AudioFormat::Wav]
}

fn default_sample_rate() -> u32 {
    22050
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration_secs(),
            allowed_formats: default_allowed_formats(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl ValidationConfig {
    pub fn min_duration(&self) -> Duration {
        Duration::from_secs(self.min_duration_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
