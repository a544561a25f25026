//! voxgate - 语音合成 / 音色转换网关
//!
//! 装配顺序: 配置 -> 日志 -> 引擎 -> 注册表/缓存 -> 调度器 -> HTTP

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;

use voxgate::application::VoiceEnginePort;
use voxgate::config::{load_config_from_path, print_config, AppConfig, EngineKind};
use voxgate::infrastructure::adapters::{
    AudioValidatorConfig, FakeVoiceEngine, FakeVoiceEngineConfig, HttpVoiceEngine,
    HttpVoiceEngineConfig, SymphoniaAudioValidator,
};
use voxgate::infrastructure::http::{AppState, HttpServer, ServerConfig, StateOptions};
use voxgate::infrastructure::{
    DispatcherConfig, FileVoiceRegistry, KeyLocks, ReferenceCache, ReferenceStore, TaskDispatcher,
};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "voxgate", version, about = "Speech synthesis and voice conversion gateway")]
struct Args {
    /// 配置文件路径（缺省时搜索 config.toml / config.local.toml）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖配置中的日志级别
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 优先级：环境变量 > 配置文件 > 默认值
    let mut config = load_config_from_path(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    if let Some(level) = args.log_level {
        config.log.level = level;
    }

    init_tracing(&config);

    tracing::info!("voxgate v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    for dir in [
        &config.storage.voices_dir,
        &config.storage.staging_dir,
        &config.dispatch.work_dir,
    ] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let engine = build_engine(&config)?;

    // 注册表与缓存共享同一把按名称的锁
    let locks = Arc::new(KeyLocks::new());
    let capacity = NonZeroUsize::new(config.cache.capacity)
        .context("cache.capacity must be greater than 0")?;
    let store = Arc::new(ReferenceStore::new(capacity));
    let registry = Arc::new(FileVoiceRegistry::new(
        &config.storage.voices_dir,
        locks.clone(),
        store.clone(),
    )?);
    let cache = Arc::new(ReferenceCache::new(
        store,
        registry.clone(),
        engine.clone(),
        locks,
    ));

    let validator = Arc::new(SymphoniaAudioValidator::new(AudioValidatorConfig {
        staging_dir: config.storage.staging_dir.clone(),
        allowed_formats: config.validation.allowed_formats.clone(),
        min_duration: config.validation.min_duration(),
        sample_rate: config.validation.sample_rate,
    }));

    let dispatcher = Arc::new(
        TaskDispatcher::new(
            engine.clone(),
            DispatcherConfig {
                pool_size: config.dispatch.pool_size,
                queue_bound: config.dispatch.queue_bound,
                work_dir: config.dispatch.work_dir.clone(),
                ..Default::default()
            },
        )
        .context("Failed to prepare dispatcher work directory")?,
    );

    let state = AppState::new(
        validator,
        registry,
        cache,
        dispatcher,
        engine,
        StateOptions {
            max_upload_size: config.storage.max_upload_size,
            generation_deadline: config.dispatch.deadline(),
        },
    );

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        max_body_bytes: config.server.max_body_bytes,
    };
    let server = HttpServer::new(server_config, state);

    server.run_with_shutdown(shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},voxgate={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_engine(config: &AppConfig) -> anyhow::Result<Arc<dyn VoiceEnginePort>> {
    let engine: Arc<dyn VoiceEnginePort> = match config.engine.kind {
        EngineKind::Http => {
            let engine_config = HttpVoiceEngineConfig::new(&config.engine.url)
                .with_timeout(config.engine.timeout_secs);
            Arc::new(HttpVoiceEngine::new(engine_config)?)
        }
        EngineKind::Fake => {
            tracing::warn!("Using fake voice engine, generated audio is synthetic");
            Arc::new(FakeVoiceEngine::new(FakeVoiceEngineConfig {
                sample_rate: config.validation.sample_rate,
                ..Default::default()
            }))
        }
    };
    Ok(engine)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Received shutdown signal");
}
