//! Fake Voice Engine - 本地确定性引擎
//!
//! 不加载任何模型：合成输出正弦波 WAV，转换按目标 embedding 缩放幅度，
//! embedding 由音频内容的 md5 派生。延迟和失败可在运行时注入，
//! 开发环境和测试都使用它

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::ports::{
    ConversionRequest, Embedding, EngineError, EngineInfo, SynthesisRequest, VoiceEnginePort,
};

const BASE_SPEAKER_SEED: &[u8] = b"voxgate-base-speaker";

/// Fake Voice Engine 配置
#[derive(Debug, Clone)]
pub struct FakeVoiceEngineConfig {
    /// 输出采样率
    pub sample_rate: u32,
    /// 每个字符对应的合成时长（毫秒）
    pub ms_per_char: u64,
    /// 合成输出的最长时长
    pub max_output: Duration,
}

impl Default for FakeVoiceEngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            ms_per_char: 60,
            max_output: Duration::from_secs(5),
        }
    }
}

/// Fake Voice Engine
pub struct FakeVoiceEngine {
    config: FakeVoiceEngineConfig,
    synthesis_latency_ms: AtomicU64,
    extraction_latency_ms: AtomicU64,
    failure: Mutex<Option<String>>,
    available: AtomicBool,
    active: AtomicUsize,
    max_active: AtomicUsize,
    synthesis_count: AtomicUsize,
    extraction_count: AtomicUsize,
    synthesized_texts: Mutex<Vec<String>>,
    intermediate_paths: Mutex<Vec<PathBuf>>,
}

/// 记录并发度的 RAII guard
struct ActiveCall<'a> {
    engine: &'a FakeVoiceEngine,
}

impl<'a> ActiveCall<'a> {
    fn enter(engine: &'a FakeVoiceEngine) -> Self {
        let now = engine.active.fetch_add(1, Ordering::SeqCst) + 1;
        engine.max_active.fetch_max(now, Ordering::SeqCst);
        Self { engine }
    }
}

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        self.engine.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeVoiceEngine {
    pub fn new(config: FakeVoiceEngineConfig) -> Self {
        tracing::info!(sample_rate = config.sample_rate, "FakeVoiceEngine initialized");
        Self {
            config,
            synthesis_latency_ms: AtomicU64::new(0),
            extraction_latency_ms: AtomicU64::new(0),
            failure: Mutex::new(None),
            available: AtomicBool::new(true),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            synthesis_count: AtomicUsize::new(0),
            extraction_count: AtomicUsize::new(0),
            synthesized_texts: Mutex::new(Vec::new()),
            intermediate_paths: Mutex::new(Vec::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeVoiceEngineConfig::default())
    }

    // ------------------------------------------------------------------
    // 注入
    // ------------------------------------------------------------------

    pub fn set_synthesis_latency(&self, latency: Duration) {
        self.synthesis_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_extraction_latency(&self, latency: Duration) {
        self.extraction_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// 设置后所有合成 / 转换调用都返回 `EngineError::Failure`
    pub fn set_failure(&self, message: Option<String>) {
        *self.failure.lock() = message;
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    // ------------------------------------------------------------------
    // 观测
    // ------------------------------------------------------------------

    /// 同时在执行的合成调用的历史最大值
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn synthesis_count(&self) -> usize {
        self.synthesis_count.load(Ordering::SeqCst)
    }

    pub fn extraction_count(&self) -> usize {
        self.extraction_count.load(Ordering::SeqCst)
    }

    /// 按开始执行顺序排列的合成文本
    pub fn synthesized_texts(&self) -> Vec<String> {
        self.synthesized_texts.lock().clone()
    }

    pub fn intermediate_paths(&self) -> Vec<PathBuf> {
        self.intermediate_paths.lock().clone()
    }

    // ------------------------------------------------------------------

    fn ensure_available(&self) -> Result<(), EngineError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::Unavailable("fake engine switched off".to_string()))
        }
    }

    fn injected_failure(&self) -> Result<(), EngineError> {
        match self.failure.lock().as_ref() {
            Some(msg) => Err(EngineError::Failure(msg.clone())),
            None => Ok(()),
        }
    }

    fn sleep(latency_ms: &AtomicU64) {
        let ms = latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }

    fn write_wav(&self, path: &Path, samples: &[f32]) -> Result<(), EngineError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).map_err(hound_error)?;
        for &s in samples {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .map_err(hound_error)?;
        }
        writer.finalize().map_err(hound_error)
    }
}

fn hound_error(err: hound::Error) -> EngineError {
    match err {
        hound::Error::IoError(e) => EngineError::Io(e),
        other => EngineError::Failure(other.to_string()),
    }
}

/// md5 摘要展开为 16 维向量，取值范围 [-1, 1]
fn digest_embedding(bytes: &[u8]) -> Embedding {
    let digest = md5::compute(bytes);
    Embedding::new(
        digest
            .0
            .iter()
            .map(|&b| b as f32 / 127.5 - 1.0)
            .collect(),
    )
}

fn read_samples(path: &Path) -> Result<Vec<f32>, EngineError> {
    let mut reader = hound::WavReader::open(path).map_err(hound_error)?;
    reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
        .collect::<Result<Vec<_>, _>>()
        .map_err(hound_error)
}

impl VoiceEnginePort for FakeVoiceEngine {
    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<PathBuf, EngineError> {
        self.ensure_available()?;
        let _active = ActiveCall::enter(self);
        self.synthesis_count.fetch_add(1, Ordering::SeqCst);
        self.synthesized_texts.lock().push(request.text.to_string());
        self.intermediate_paths
            .lock()
            .push(request.output_path.to_path_buf());

        Self::sleep(&self.synthesis_latency_ms);
        self.injected_failure()?;

        let chars = request.text.chars().count() as u64;
        let millis = ((chars * self.config.ms_per_char) as f32 / request.speed) as u64;
        let duration = Duration::from_millis(millis.max(1)).min(self.config.max_output);
        let frames = (duration.as_secs_f64() * self.config.sample_rate as f64) as usize;
        let freq = 180.0 + request.speaker_id as f32 * 20.0;
        let samples: Vec<f32> = (0..frames)
            .map(|i| {
                let t = i as f32 / self.config.sample_rate as f32;
                (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.4
            })
            .collect();

        self.write_wav(request.output_path, &samples)?;
        tracing::debug!(
            text_len = request.text.len(),
            output = %request.output_path.display(),
            "FakeVoiceEngine: synthesized"
        );
        Ok(request.output_path.to_path_buf())
    }

    fn convert(&self, request: &ConversionRequest<'_>) -> Result<PathBuf, EngineError> {
        self.ensure_available()?;
        self.injected_failure()?;

        let source = read_samples(request.source_audio)?;
        let gain = 0.5
            + 0.5
                * request
                    .target_embedding
                    .values()
                    .first()
                    .map(|v| v.abs())
                    .unwrap_or(1.0);
        let converted: Vec<f32> = source.iter().map(|s| s * gain).collect();

        self.write_wav(request.output_path, &converted)?;
        Ok(request.output_path.to_path_buf())
    }

    fn extract_embedding(&self, audio_path: &Path) -> Result<Embedding, EngineError> {
        self.ensure_available()?;
        self.extraction_count.fetch_add(1, Ordering::SeqCst);
        Self::sleep(&self.extraction_latency_ms);

        let samples = read_samples(audio_path)
            .map_err(|e| EngineError::Extraction(format!("cannot read reference: {}", e)))?;
        if samples.iter().all(|s| s.abs() < f32::EPSILON) {
            return Err(EngineError::Extraction(
                "no voiced segments detected".to_string(),
            ));
        }

        let bytes = std::fs::read(audio_path)?;
        Ok(digest_embedding(&bytes))
    }

    fn base_embedding(&self) -> Result<Embedding, EngineError> {
        self.ensure_available()?;
        Ok(digest_embedding(BASE_SPEAKER_SEED))
    }

    fn info(&self) -> Result<EngineInfo, EngineError> {
        self.ensure_available()?;
        Ok(EngineInfo {
            engine: "fake".to_string(),
            device: "cpu".to_string(),
            accelerator_available: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sine_wav;
    use tempfile::tempdir;

    #[test]
    fn test_synthesize_then_convert() {
        let dir = tempdir().unwrap();
        let engine = FakeVoiceEngine::with_defaults();
        let intermediate = dir.path().join("intermediate.wav");
        let output = dir.path().join("out.wav");

        let path = engine
            .synthesize(&SynthesisRequest {
                text: "hello world",
                speaker_id: 0,
                speed: 1.0,
                output_path: &intermediate,
            })
            .unwrap();
        assert_eq!(path, intermediate);

        let base = engine.base_embedding().unwrap();
        let target = Embedding::new(vec![0.2; 16]);
        engine
            .convert(&ConversionRequest {
                source_audio: &intermediate,
                source_embedding: &base,
                target_embedding: &target,
                output_path: &output,
            })
            .unwrap();

        let reader = hound::WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert!(reader.duration() > 0);
        assert_eq!(engine.synthesis_count(), 1);
        assert_eq!(engine.synthesized_texts(), vec!["hello world".to_string()]);
    }

    #[test]
    fn test_embeddings_are_deterministic_and_distinct() {
        let dir = tempdir().unwrap();
        let engine = FakeVoiceEngine::with_defaults();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        std::fs::write(&a, sine_wav(1.0, 8000, 1, 220.0)).unwrap();
        std::fs::write(&b, sine_wav(1.0, 8000, 1, 440.0)).unwrap();

        let ea1 = engine.extract_embedding(&a).unwrap();
        let ea2 = engine.extract_embedding(&a).unwrap();
        let eb = engine.extract_embedding(&b).unwrap();
        assert_eq!(ea1, ea2);
        assert_ne!(ea1, eb);
        assert_eq!(ea1.dim(), 16);
        assert_eq!(engine.extraction_count(), 3);
    }

    #[test]
    fn test_silent_reference_fails_extraction() {
        let dir = tempdir().unwrap();
        let engine = FakeVoiceEngine::with_defaults();
        let silent = dir.path().join("silent.wav");
        std::fs::write(&silent, sine_wav(1.0, 8000, 1, 0.0)).unwrap();

        assert!(matches!(
            engine.extract_embedding(&silent),
            Err(EngineError::Extraction(_))
        ));
    }

    #[test]
    fn test_injected_failure_and_availability() {
        let dir = tempdir().unwrap();
        let engine = FakeVoiceEngine::with_defaults();
        let out = dir.path().join("x.wav");
        let request = SynthesisRequest {
            text: "hi",
            speaker_id: 0,
            speed: 1.0,
            output_path: &out,
        };

        engine.set_failure(Some("boom".to_string()));
        assert!(matches!(engine.synthesize(&request), Err(EngineError::Failure(m)) if m == "boom"));
        engine.set_failure(None);
        assert!(engine.synthesize(&request).is_ok());

        engine.set_available(false);
        assert!(matches!(engine.info(), Err(EngineError::Unavailable(_))));
    }
}
