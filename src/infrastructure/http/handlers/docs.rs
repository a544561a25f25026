//! API Documentation Handler

use axum::Json;
use serde_json::{json, Value};

use crate::infrastructure::http::dto::ApiResponse;

/// 首页 - API 文档
pub async fn index() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "name": "Voice Generation API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/generate-audio": {
                "method": "POST",
                "content_type": "application/json",
                "description": "Generate speech from text with voice cloning",
                "parameters": {
                    "text": "Text to convert to speech",
                    "reference_speaker": "Name of a registered reference voice",
                    "speed": "(optional) Speech speed multiplier between 0.5 and 2.0 (default: 1.0)"
                }
            },
            "/reference-voices": {
                "method": "GET | POST",
                "content_type": "multipart/form-data",
                "description": "List reference voices, or upload one (fields: name, file; mp3 or wav, at least 30 seconds)"
            },
            "/reference-voices/{name}": {
                "method": "GET | DELETE",
                "description": "Reference voice metadata, or delete it"
            },
            "/reference-voices/{name}/audio": {
                "method": "GET",
                "description": "Download the stored reference audio"
            },
            "/health": {
                "method": "GET",
                "description": "Health check endpoint"
            },
            "/system-info": {
                "method": "GET",
                "description": "Engine device info plus dispatch and cache statistics"
            }
        }
    })))
}
