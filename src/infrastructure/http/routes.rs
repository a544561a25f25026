//! HTTP Routes
//!
//! API Endpoints:
//! - /                                GET     API 文档
//! - /generate-audio                  POST    生成语音（返回 WAV 附件）
//! - /reference-voices                GET     列出参考音色
//! - /reference-voices                POST    上传参考音色（multipart: name, file）
//! - /reference-voices/:name          GET     参考音色详情
//! - /reference-voices/:name          DELETE  删除参考音色
//! - /reference-voices/:name/audio    GET     下载参考音频
//! - /health                          GET     存活检查
//! - /system-info                     GET     引擎信息 + 调度/缓存统计

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/generate-audio", post(handlers::generate_audio))
        .merge(voice_routes())
        .route("/health", get(handlers::health))
        .route("/system-info", get(handlers::system_info))
}

/// Reference voice 路由
fn voice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/reference-voices",
            get(handlers::list_voices).post(handlers::upload_voice),
        )
        .route(
            "/reference-voices/:name",
            get(handlers::get_voice).delete(handlers::delete_voice),
        )
        .route(
            "/reference-voices/:name/audio",
            get(handlers::download_voice_audio),
        )
}
