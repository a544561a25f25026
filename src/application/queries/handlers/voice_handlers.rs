//! Voice Query Handlers

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{VoiceRegistryPort, VoiceResource};
use crate::application::queries::{GetVoice, ListVoices};

// ============================================================================
// Response DTOs
// ============================================================================

/// 音色详情响应
#[derive(Debug, Clone)]
pub struct VoiceResponse {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub updated_at: String,
}

impl From<VoiceResource> for VoiceResponse {
    fn from(resource: VoiceResource) -> Self {
        Self {
            name: resource.name.to_string(),
            path: resource.path,
            size_bytes: resource.size_bytes,
            updated_at: resource.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GetVoice Handler
pub struct GetVoiceHandler {
    registry: Arc<dyn VoiceRegistryPort>,
}

impl GetVoiceHandler {
    pub fn new(registry: Arc<dyn VoiceRegistryPort>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, query: GetVoice) -> Result<VoiceResponse, ApplicationError> {
        let resource = self.registry.get(&query.name).await?;
        Ok(VoiceResponse::from(resource))
    }
}

/// ListVoices Handler
pub struct ListVoicesHandler {
    registry: Arc<dyn VoiceRegistryPort>,
}

impl ListVoicesHandler {
    pub fn new(registry: Arc<dyn VoiceRegistryPort>) -> Self {
        Self { registry }
    }

    /// 名称按字典序返回，便于客户端展示
    pub async fn handle(&self, _query: ListVoices) -> Result<Vec<String>, ApplicationError> {
        let mut names = self.registry.list().await?;
        names.sort();
        Ok(names.into_iter().map(String::from).collect())
    }
}
