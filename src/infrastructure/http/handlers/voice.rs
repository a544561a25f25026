//! Reference Voice HTTP Handlers

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::{DeleteVoice, GetVoice, ListVoices, UploadVoice};
use crate::domain::voice::{AudioFormat, VoiceName};
use crate::infrastructure::http::dto::{ApiResponse, UploadedVoiceDto, VoiceDto, VoiceListDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

fn parse_name(raw: &str) -> Result<VoiceName, ApiError> {
    VoiceName::new(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// 上传参考音色（multipart: name + file），同名覆盖
pub async fn upload_voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadedVoiceDto>>), ApiError> {
    let mut name: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "name" => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read name: {}", e)))?,
                );
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("'name' is required".to_string()))?;
    let name = parse_name(name.trim())?;
    let (file_name, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("'file' is required".to_string()))?;

    let command = UploadVoice {
        name,
        file_name,
        bytes,
    };
    let result = state.upload_voice_handler.handle(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UploadedVoiceDto::from(result))),
    ))
}

/// 获取音色列表
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<VoiceListDto>>, ApiError> {
    let voices = state.list_voices_handler.handle(ListVoices).await?;
    Ok(Json(ApiResponse::success(VoiceListDto {
        total: voices.len(),
        voices,
    })))
}

/// 获取音色详情
pub async fn get_voice(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<VoiceDto>>, ApiError> {
    let query = GetVoice {
        name: parse_name(&name)?,
    };
    let result = state.get_voice_handler.handle(query).await?;
    Ok(Json(ApiResponse::success(VoiceDto::from(result))))
}

/// 删除音色
pub async fn delete_voice(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let command = DeleteVoice {
        name: parse_name(&name)?,
    };
    state.delete_voice_handler.handle(command).await?;
    Ok(Json(ApiResponse::ok()))
}

/// 下载规范化后的参考音频
pub async fn download_voice_audio(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let name = parse_name(&name)?;
    let voice = state
        .get_voice_handler
        .handle(GetVoice { name: name.clone() })
        .await?;

    // 打开之后即使被替换或删除，已打开的句柄仍读到完整的旧文件
    let file = tokio::fs::File::open(&voice.path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("Reference voice not found: {}", name))
        } else {
            ApiError::Internal(format!("Failed to open audio file: {}", e))
        }
    })?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get file metadata: {}", e)))?
        .len();

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, AudioFormat::Wav.mime_type())
        .header(header::CONTENT_LENGTH, file_size)
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}.{}\"",
                name,
                AudioFormat::Wav.extension()
            ),
        )
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
