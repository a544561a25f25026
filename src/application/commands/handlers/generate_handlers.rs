//! Generate Command Handlers

use std::sync::Arc;
use std::time::Duration;

use crate::application::commands::GenerateAudio;
use crate::application::error::ApplicationError;
use crate::application::ports::{DispatchError, DispatcherPort, GeneratedAudio, ReferenceCachePort};
use crate::domain::generation::GenerationTask;
use crate::domain::voice::VoiceName;

/// 生成语音响应
#[derive(Debug)]
pub struct GenerateAudioResponse {
    pub voice: VoiceName,
    pub audio: GeneratedAudio,
}

/// GenerateAudio Handler
///
/// 校验输入 -> 解析参考音色（缓存）-> 提交到调度器
pub struct GenerateAudioHandler {
    cache: Arc<dyn ReferenceCachePort>,
    dispatcher: Arc<dyn DispatcherPort>,
    deadline: Duration,
}

impl GenerateAudioHandler {
    pub fn new(
        cache: Arc<dyn ReferenceCachePort>,
        dispatcher: Arc<dyn DispatcherPort>,
        deadline: Duration,
    ) -> Self {
        Self {
            cache,
            dispatcher,
            deadline,
        }
    }

    pub async fn handle(
        &self,
        command: GenerateAudio,
    ) -> Result<GenerateAudioResponse, ApplicationError> {
        if command.text.trim().is_empty() {
            return Err(ApplicationError::validation("'text' is required"));
        }
        if command.reference_speaker.trim().is_empty() {
            return Err(ApplicationError::validation("'reference_speaker' is required"));
        }

        let voice = VoiceName::new(command.reference_speaker)?;
        // 截止时间从这里开始计算，包含解析参考音色的时间
        let task = GenerationTask::new(command.text, voice.clone(), command.speed)?;
        let task_id = task.id();

        let resolve = self.cache.resolve(&voice);
        let reference = match task.expires_at(self.deadline) {
            Some(at) => tokio::time::timeout_at(at.into(), resolve)
                .await
                .map_err(|_| {
                    tracing::warn!(
                        task_id = %task_id,
                        voice = %voice,
                        "Deadline exceeded while resolving reference voice"
                    );
                    DispatchError::Timeout(self.deadline)
                })??,
            None => resolve.await?,
        };
        let audio = self.dispatcher.submit(task, &reference, self.deadline).await?;

        tracing::info!(
            task_id = %task_id,
            voice = %voice,
            elapsed_ms = audio.elapsed().as_millis() as u64,
            engine_ms = audio.engine_time().as_millis() as u64,
            "Speech generated"
        );

        Ok(GenerateAudioResponse { voice, audio })
    }
}
