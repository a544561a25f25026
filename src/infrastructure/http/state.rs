//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态，在 main 中构造一次

use std::sync::Arc;
use std::time::Duration;

use crate::application::{
    // Command handlers
    DeleteVoiceHandler, GenerateAudioHandler, UploadVoiceHandler,
    // Query handlers
    GetSystemInfoHandler, GetVoiceHandler, ListVoicesHandler,
    // Ports
    AudioValidatorPort, DispatcherPort, ReferenceCachePort, VoiceEnginePort, VoiceRegistryPort,
};

/// 请求级限制
#[derive(Debug, Clone)]
pub struct StateOptions {
    /// 单个上传文件的最大字节数
    pub max_upload_size: usize,
    /// 生成请求的截止时间
    pub generation_deadline: Duration,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            max_upload_size: 20 * 1024 * 1024,
            generation_deadline: Duration::from_secs(120),
        }
    }
}

/// 应用状态
pub struct AppState {
    // ========== Command Handlers ==========
    pub generate_audio_handler: GenerateAudioHandler,
    pub upload_voice_handler: UploadVoiceHandler,
    pub delete_voice_handler: DeleteVoiceHandler,

    // ========== Query Handlers ==========
    pub get_voice_handler: GetVoiceHandler,
    pub list_voices_handler: ListVoicesHandler,
    pub system_info_handler: GetSystemInfoHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        validator: Arc<dyn AudioValidatorPort>,
        registry: Arc<dyn VoiceRegistryPort>,
        cache: Arc<dyn ReferenceCachePort>,
        dispatcher: Arc<dyn DispatcherPort>,
        engine: Arc<dyn VoiceEnginePort>,
        options: StateOptions,
    ) -> Self {
        Self {
            // Command handlers
            generate_audio_handler: GenerateAudioHandler::new(
                cache.clone(),
                dispatcher.clone(),
                options.generation_deadline,
            ),
            upload_voice_handler: UploadVoiceHandler::new(
                validator,
                registry.clone(),
                options.max_upload_size,
            ),
            delete_voice_handler: DeleteVoiceHandler::new(registry.clone()),

            // Query handlers
            get_voice_handler: GetVoiceHandler::new(registry.clone()),
            list_voices_handler: ListVoicesHandler::new(registry),
            system_info_handler: GetSystemInfoHandler::new(engine, dispatcher, cache),
        }
    }
}
