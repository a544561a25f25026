//! System Handlers - 健康检查与系统信息

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::application::GetSystemInfo;
use crate::infrastructure::http::dto::{ApiResponse, SystemInfoDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// Health 响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub version: &'static str,
}

/// 存活检查，不访问引擎
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// 引擎设备信息 + 调度与缓存统计，引擎不可用时返回 503
pub async fn system_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemInfoDto>>, ApiError> {
    let info = state.system_info_handler.handle(GetSystemInfo).await?;
    Ok(Json(ApiResponse::success(info.into())))
}
