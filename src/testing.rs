//! 测试夹具：WAV 生成与完整组件装配

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::application::commands::handlers::{GenerateAudioHandler, UploadVoiceHandler};
use crate::application::commands::UploadVoice;
use crate::domain::voice::{AudioFormat, VoiceName};
use crate::infrastructure::adapters::{
    AudioValidatorConfig, FakeVoiceEngine, SymphoniaAudioValidator,
};
use crate::infrastructure::cache::{KeyLocks, ReferenceCache, ReferenceStore};
use crate::infrastructure::dispatch::{DispatcherConfig, TaskDispatcher};
use crate::infrastructure::http::{AppState, StateOptions};
use crate::infrastructure::persistence::FileVoiceRegistry;

/// 16-bit PCM 正弦波 WAV；`freq` 为 0 时是全静音
pub(crate) fn sine_wav(secs: f32, sample_rate: u32, channels: u16, freq: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (secs * sample_rate as f32) as usize;
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let v = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.5;
            for _ in 0..channels {
                writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[derive(Debug, Clone)]
pub(crate) struct HarnessConfig {
    pub pool_size: usize,
    pub queue_bound: usize,
    pub cache_capacity: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            pool_size: 1,
            queue_bound: 8,
            cache_capacity: 32,
        }
    }
}

/// 与 main 相同的装配方式，全部落在临时目录中
pub(crate) struct Harness {
    _dir: TempDir,
    pub engine: Arc<FakeVoiceEngine>,
    pub validator: Arc<SymphoniaAudioValidator>,
    pub registry: Arc<FileVoiceRegistry>,
    pub store: Arc<ReferenceStore>,
    pub cache: Arc<ReferenceCache>,
    pub dispatcher: Arc<TaskDispatcher>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(HarnessConfig::default())
    }

    pub fn with_config(config: HarnessConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(FakeVoiceEngine::with_defaults());
        let validator = Arc::new(SymphoniaAudioValidator::new(AudioValidatorConfig {
            staging_dir: dir.path().join("staging"),
            allowed_formats: vec![AudioFormat::Mp3, AudioFormat::Wav],
            min_duration: Duration::from_secs(30),
            sample_rate: 8000,
        }));

        let locks = Arc::new(KeyLocks::new());
        let store = Arc::new(ReferenceStore::new(
            NonZeroUsize::new(config.cache_capacity).unwrap(),
        ));
        let registry = Arc::new(
            FileVoiceRegistry::new(dir.path().join("voices"), locks.clone(), store.clone())
                .unwrap(),
        );
        let cache = Arc::new(ReferenceCache::new(
            store.clone(),
            registry.clone(),
            engine.clone(),
            locks,
        ));
        let dispatcher = Arc::new(
            TaskDispatcher::new(
                engine.clone(),
                DispatcherConfig {
                    pool_size: config.pool_size,
                    queue_bound: config.queue_bound,
                    work_dir: dir.path().join("work"),
                    speaker_id: 0,
                },
            )
            .unwrap(),
        );

        Self {
            _dir: dir,
            engine,
            validator,
            registry,
            store,
            cache,
            dispatcher,
        }
    }

    pub fn upload_handler(&self) -> UploadVoiceHandler {
        UploadVoiceHandler::new(self.validator.clone(), self.registry.clone(), 20 * 1024 * 1024)
    }

    pub fn generate_handler(&self, deadline: Duration) -> GenerateAudioHandler {
        GenerateAudioHandler::new(self.cache.clone(), self.dispatcher.clone(), deadline)
    }

    /// 上传一段 45 秒的参考音频
    pub async fn store_voice(&self, name: &str, freq: f32) {
        self.upload_handler()
            .handle(UploadVoice {
                name: VoiceName::new(name).unwrap(),
                file_name: format!("{}.wav", name),
                bytes: sine_wav(45.0, 8000, 1, freq),
            })
            .await
            .unwrap();
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.validator.clone(),
            self.registry.clone(),
            self.cache.clone(),
            self.dispatcher.clone(),
            self.engine.clone(),
            StateOptions::default(),
        )
    }
}
