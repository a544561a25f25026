//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, EngineKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 生成截止时间上限（秒）
const MAX_DEADLINE_SECS: u64 = 24 * 60 * 60;

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXGATE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXGATE_SERVER__PORT=8080`
/// - `VOXGATE_ENGINE__KIND=fake`
/// - `VOXGATE_ENGINE__URL=http://engine:8000`
/// - `VOXGATE_DISPATCH__POOL_SIZE=2`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 默认值由 serde(default) 提供，这里只放会被环境变量覆盖的标量
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8585)?
        .set_default("engine.kind", "http")?
        .set_default("engine.url", "http://localhost:8000")?
        .set_default("engine.timeout_secs", 300)?
        .set_default("dispatch.pool_size", 1)?
        .set_default("dispatch.queue_bound", 8)?
        .set_default("dispatch.deadline_secs", 120)?
        .set_default("dispatch.work_dir", "data/work")?
        .set_default("cache.capacity", 32)?
        .set_default("storage.voices_dir", "resources")?
        .set_default("storage.staging_dir", "data/staging")?
        .set_default("storage.max_upload_size", 20 * 1024 * 1024)?
        .set_default("validation.min_duration_secs", 30)?
        .set_default("validation.sample_rate", 22050)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: VOXGATE_ENGINE__URL=http://engine:8000
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("VOXGATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let fail = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return fail("Server port cannot be 0");
    }
    if config.engine.kind == EngineKind::Http && config.engine.url.trim().is_empty() {
        return fail("Engine URL cannot be empty");
    }
    if config.dispatch.pool_size == 0 {
        return fail("Dispatch pool size cannot be 0");
    }
    if config.dispatch.deadline_secs == 0 {
        return fail("Generation deadline cannot be 0");
    }
    if config.dispatch.deadline_secs > MAX_DEADLINE_SECS {
        return Err(ConfigError::ValidationError(format!(
            "Generation deadline cannot exceed {}s",
            MAX_DEADLINE_SECS
        )));
    }
    if config.cache.capacity == 0 {
        return fail("Cache capacity cannot be 0");
    }
    if config.validation.sample_rate == 0 {
        return fail("Sample rate cannot be 0");
    }
    if config.validation.allowed_formats.is_empty() {
        return fail("At least one upload format must be allowed");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Engine: {} ({})", config.engine.kind, config.engine.url);
    tracing::info!("Engine Timeout: {}s", config.engine.timeout_secs);
    tracing::info!(
        "Dispatch: {} slot(s), queue bound {}, deadline {}s",
        config.dispatch.pool_size,
        config.dispatch.queue_bound,
        config.dispatch.deadline_secs
    );
    tracing::info!("Work Directory: {:?}", config.dispatch.work_dir);
    tracing::info!("Reference Cache Capacity: {}", config.cache.capacity);
    tracing::info!("Voices Directory: {:?}", config.storage.voices_dir);
    tracing::info!(
        "Upload: max {} bytes, min {}s, formats {:?}",
        config.storage.max_upload_size,
        config.validation.min_duration_secs,
        config.validation.allowed_formats
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
