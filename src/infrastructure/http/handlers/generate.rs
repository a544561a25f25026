//! Generate HTTP Handler

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::application::GenerateAudio;
use crate::infrastructure::http::dto::GenerateAudioRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 生成语音，返回 WAV 附件
pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateAudioRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))?;

    let command = GenerateAudio {
        text: req.text.unwrap_or_default(),
        reference_speaker: req.reference_speaker.unwrap_or_default(),
        speed: req.speed,
    };
    let result = state.generate_audio_handler.handle(command).await?;

    // 读入内存后输出文件随 result 一起删除
    let audio = tokio::fs::read(result.audio.path())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read generated audio: {}", e)))?;
    let task_id = result.audio.task_id();
    drop(result);

    let file_name = format!("generated_speech_{}.wav", Utc::now().timestamp());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(header::CONTENT_LENGTH, audio.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .header("x-task-id", task_id.to_string())
        .body(Body::from(audio))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
