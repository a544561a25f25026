//! HTTP Voice Engine - 调用外部语音引擎 sidecar
//!
//! 实现 VoiceEnginePort，引擎契约是阻塞式的，这里用构造时捕获的
//! tokio runtime handle 在 blocking 线程内驱动异步 reqwest 请求
//!
//! Sidecar API:
//! POST {base}/synthesize          JSON {text, speaker_id, speed}      -> audio/wav
//! POST {base}/convert             multipart {audio, source_embedding, target_embedding} -> audio/wav
//! POST {base}/extract-embedding   multipart {audio}                   -> {"embedding": [..]}
//! GET  {base}/base-embedding                                          -> {"embedding": [..]}
//! GET  {base}/system-info                                             -> {engine, device, accelerator_available}

use parking_lot::Mutex;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Handle;

use crate::application::ports::{
    ConversionRequest, Embedding, EngineError, EngineInfo, SynthesisRequest, VoiceEnginePort,
};

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SynthesizeBody<'a> {
    text: &'a str,
    speaker_id: u32,
    speed: f32,
}

#[derive(Debug, Deserialize)]
struct EmbeddingBody {
    embedding: Vec<f32>,
}

/// HTTP 引擎客户端配置
#[derive(Debug, Clone)]
pub struct HttpVoiceEngineConfig {
    /// sidecar 基础 URL
    pub base_url: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for HttpVoiceEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 300,
        }
    }
}

impl HttpVoiceEngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 语音引擎
pub struct HttpVoiceEngine {
    client: Client,
    config: HttpVoiceEngineConfig,
    handle: Handle,
    base_embedding: Mutex<Option<Embedding>>,
}

impl HttpVoiceEngine {
    /// 必须在 tokio runtime 内调用
    pub fn new(config: HttpVoiceEngineConfig) -> Result<Self, EngineError> {
        let handle = Handle::try_current()
            .map_err(|e| EngineError::Unavailable(format!("no tokio runtime: {}", e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            config: HttpVoiceEngineConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            handle,
            base_embedding: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// 在当前 blocking 线程上驱动 future
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }

    async fn check(response: Result<Response, reqwest::Error>) -> Result<Response, EngineError> {
        let response = response.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            Err(EngineError::Unavailable(error_text))
        } else {
            Err(EngineError::Failure(format!("HTTP {}: {}", status, error_text)))
        }
    }

    async fn write_audio(response: Response, output_path: &Path) -> Result<PathBuf, EngineError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| EngineError::Failure(format!("Failed to read audio: {}", e)))?;
        tokio::fs::write(output_path, &bytes).await?;
        Ok(output_path.to_path_buf())
    }

    async fn audio_part(path: &Path) -> Result<Part, EngineError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();
        Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| EngineError::Failure(e.to_string()))
    }

    fn embedding_json(embedding: &Embedding) -> Result<String, EngineError> {
        serde_json::to_string(embedding.values()).map_err(|e| EngineError::Failure(e.to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> EngineError {
    if e.is_connect() {
        EngineError::Unavailable(format!("Cannot connect to voice engine: {}", e))
    } else if e.is_timeout() {
        EngineError::Failure(format!("Voice engine request timed out: {}", e))
    } else {
        EngineError::Failure(e.to_string())
    }
}

impl VoiceEnginePort for HttpVoiceEngine {
    fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<PathBuf, EngineError> {
        let body = SynthesizeBody {
            text: request.text,
            speaker_id: request.speaker_id,
            speed: request.speed,
        };
        tracing::debug!(
            url = %self.url("/synthesize"),
            text_len = request.text.len(),
            "Sending synthesis request"
        );

        self.block_on(async {
            let response =
                Self::check(self.client.post(self.url("/synthesize")).json(&body).send().await)
                    .await?;
            Self::write_audio(response, request.output_path).await
        })
    }

    fn convert(&self, request: &ConversionRequest<'_>) -> Result<PathBuf, EngineError> {
        let source = Self::embedding_json(request.source_embedding)?;
        let target = Self::embedding_json(request.target_embedding)?;

        self.block_on(async {
            let form = Form::new()
                .part("audio", Self::audio_part(request.source_audio).await?)
                .text("source_embedding", source)
                .text("target_embedding", target);
            let response = Self::check(
                self.client
                    .post(self.url("/convert"))
                    .multipart(form)
                    .send()
                    .await,
            )
            .await?;
            Self::write_audio(response, request.output_path).await
        })
    }

    fn extract_embedding(&self, audio_path: &Path) -> Result<Embedding, EngineError> {
        self.block_on(async {
            let form = Form::new().part("audio", Self::audio_part(audio_path).await?);
            let response = self
                .client
                .post(self.url("/extract-embedding"))
                .multipart(form)
                .send()
                .await;
            let response = Self::check(response).await.map_err(|e| match e {
                EngineError::Failure(msg) => EngineError::Extraction(msg),
                other => other,
            })?;
            let body: EmbeddingBody = response
                .json()
                .await
                .map_err(|e| EngineError::Extraction(format!("invalid response: {}", e)))?;
            Ok::<_, EngineError>(Embedding::new(body.embedding))
        })
    }

    fn base_embedding(&self) -> Result<Embedding, EngineError> {
        if let Some(cached) = self.base_embedding.lock().as_ref() {
            return Ok(cached.clone());
        }

        let embedding = self.block_on(async {
            let response =
                Self::check(self.client.get(self.url("/base-embedding")).send().await).await?;
            let body: EmbeddingBody = response
                .json()
                .await
                .map_err(|e| EngineError::Failure(format!("invalid response: {}", e)))?;
            Ok::<_, EngineError>(Embedding::new(body.embedding))
        })?;

        *self.base_embedding.lock() = Some(embedding.clone());
        Ok(embedding)
    }

    fn info(&self) -> Result<EngineInfo, EngineError> {
        self.block_on(async {
            let response =
                Self::check(self.client.get(self.url("/system-info")).send().await).await?;
            response
                .json::<EngineInfo>()
                .await
                .map_err(|e| EngineError::Failure(format!("invalid response: {}", e)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_config_default() {
        let config = HttpVoiceEngineConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 300);

        let config = HttpVoiceEngineConfig::new("http://engine:9000").with_timeout(10);
        assert_eq!(config.base_url, "http://engine:9000");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_requires_runtime() {
        assert!(HttpVoiceEngine::new(HttpVoiceEngineConfig::default()).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unreachable_engine_is_unavailable() {
        let engine =
            Arc::new(HttpVoiceEngine::new(HttpVoiceEngineConfig::new("http://127.0.0.1:9/")).unwrap());
        assert_eq!(engine.url("/system-info"), "http://127.0.0.1:9/system-info");

        let result = tokio::task::spawn_blocking(move || engine.info())
            .await
            .unwrap();
        assert!(matches!(result, Err(EngineError::Unavailable(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_talks_to_sidecar() {
        let base_calls = Arc::new(AtomicUsize::new(0));
        let counter = base_calls.clone();
        let app = Router::new()
            .route(
                "/base-embedding",
                get(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Json(serde_json::json!({ "embedding": [0.5, -0.5] })) }
                }),
            )
            .route(
                "/system-info",
                get(|| async {
                    Json(serde_json::json!({
                        "engine": "openvoice",
                        "device": "cuda:0",
                        "accelerator_available": true
                    }))
                }),
            )
            .route("/synthesize", post(|| async { vec![1u8, 2, 3, 4] }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let engine = Arc::new(
            HttpVoiceEngine::new(HttpVoiceEngineConfig::new(format!("http://{}", addr))).unwrap(),
        );
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");

        let (info, first, second, written) = tokio::task::spawn_blocking({
            let engine = engine.clone();
            let out = out.clone();
            move || {
                let info = engine.info().unwrap();
                let first = engine.base_embedding().unwrap();
                let second = engine.base_embedding().unwrap();
                let written = engine
                    .synthesize(&SynthesisRequest {
                        text: "hello",
                        speaker_id: 0,
                        speed: 1.0,
                        output_path: &out,
                    })
                    .unwrap();
                (info, first, second, written)
            }
        })
        .await
        .unwrap();

        assert_eq!(info.device, "cuda:0");
        assert!(info.accelerator_available);
        assert_eq!(first, second);
        assert_eq!(first.values(), &[0.5, -0.5]);
        assert_eq!(base_calls.load(Ordering::SeqCst), 1);
        assert_eq!(written, out);
        assert_eq!(std::fs::read(&out).unwrap(), vec![1, 2, 3, 4]);
    }
}
