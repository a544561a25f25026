//! Voice Command Handlers

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::application::commands::{DeleteVoice, UploadVoice};
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioValidatorPort, RawUpload, VoiceRegistryPort};
use crate::domain::voice::VoiceName;

// ============================================================================
// UploadVoice
// ============================================================================

/// 上传音色响应
#[derive(Debug, Clone)]
pub struct UploadVoiceResponse {
    pub name: VoiceName,
    pub size_bytes: u64,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub updated_at: DateTime<Utc>,
}

/// UploadVoice Handler
///
/// 校验在 blocking 线程池执行，通过后才进入注册表
pub struct UploadVoiceHandler {
    validator: Arc<dyn AudioValidatorPort>,
    registry: Arc<dyn VoiceRegistryPort>,
    max_upload_size: usize,
}

impl UploadVoiceHandler {
    pub fn new(
        validator: Arc<dyn AudioValidatorPort>,
        registry: Arc<dyn VoiceRegistryPort>,
        max_upload_size: usize,
    ) -> Self {
        Self {
            validator,
            registry,
            max_upload_size,
        }
    }

    pub async fn handle(
        &self,
        command: UploadVoice,
    ) -> Result<UploadVoiceResponse, ApplicationError> {
        if command.bytes.len() > self.max_upload_size {
            return Err(ApplicationError::validation(format!(
                "File too large: {} bytes, maximum is {} bytes",
                command.bytes.len(),
                self.max_upload_size
            )));
        }

        let upload = RawUpload {
            file_name: command.file_name,
            bytes: command.bytes,
        };
        let validator = self.validator.clone();
        let normalized =
            tokio::task::spawn_blocking(move || validator.validate_and_normalize(upload))
                .await
                .map_err(|e| ApplicationError::internal(format!("validation task failed: {}", e)))??;

        let resource = self.registry.put(&command.name, &normalized).await?;

        tracing::info!(
            voice = %resource.name,
            size_bytes = resource.size_bytes,
            duration_secs = normalized.duration().as_secs_f64(),
            "Reference voice stored"
        );

        Ok(UploadVoiceResponse {
            name: resource.name,
            size_bytes: resource.size_bytes,
            duration_secs: normalized.duration().as_secs_f64(),
            sample_rate: normalized.sample_rate(),
            updated_at: resource.updated_at,
        })
    }
}

// ============================================================================
// DeleteVoice
// ============================================================================

/// DeleteVoice Handler
pub struct DeleteVoiceHandler {
    registry: Arc<dyn VoiceRegistryPort>,
}

impl DeleteVoiceHandler {
    pub fn new(registry: Arc<dyn VoiceRegistryPort>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, command: DeleteVoice) -> Result<(), ApplicationError> {
        let deleted = self.registry.delete(&command.name).await?;
        if !deleted {
            return Err(ApplicationError::not_found("Reference voice", &command.name));
        }

        tracing::info!(voice = %command.name, "Reference voice deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sine_wav, Harness};

    fn upload(name: &str, secs: f32, freq: f32) -> UploadVoice {
        UploadVoice {
            name: VoiceName::new(name).unwrap(),
            file_name: format!("{}.wav", name),
            bytes: sine_wav(secs, 8000, 1, freq),
        }
    }

    #[tokio::test]
    async fn test_upload_stores_canonical_resource() {
        let h = Harness::new();
        let handler = h.upload_handler();

        let resp = handler.handle(upload("alice", 45.0, 220.0)).await.unwrap();
        assert_eq!(resp.name.as_str(), "alice");
        assert!(resp.duration_secs >= 44.9);
        assert!(resp.size_bytes > 0);

        let stored = h.registry.get(&resp.name).await.unwrap();
        assert!(stored.path.ends_with("alice.wav"));
        assert_eq!(stored.size_bytes, resp.size_bytes);
    }

    #[tokio::test]
    async fn test_too_short_upload_leaves_no_entry() {
        let h = Harness::new();
        let handler = h.upload_handler();

        let err = handler.handle(upload("bob", 5.0, 220.0)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert!(err.to_string().contains("too short"));

        let names = h.registry.list().await.unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_before_validation() {
        let h = Harness::new();
        let handler = UploadVoiceHandler::new(h.validator.clone(), h.registry.clone(), 1024);

        let err = handler.handle(upload("carol", 45.0, 220.0)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(msg) if msg.contains("too large")));
    }

    #[tokio::test]
    async fn test_delete_missing_voice_is_not_found() {
        let h = Harness::new();
        let handler = DeleteVoiceHandler::new(h.registry.clone());

        let err = handler
            .handle(DeleteVoice {
                name: VoiceName::new("ghost").unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_existing_voice() {
        let h = Harness::new();
        h.upload_handler()
            .handle(upload("dave", 45.0, 330.0))
            .await
            .unwrap();

        let handler = DeleteVoiceHandler::new(h.registry.clone());
        let name = VoiceName::new("dave").unwrap();
        handler
            .handle(DeleteVoice { name: name.clone() })
            .await
            .unwrap();

        assert!(h.registry.get(&name).await.is_err());
    }
}
