//! System Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    CacheStats, DispatchStats, DispatcherPort, EngineInfo, ReferenceCachePort, VoiceEnginePort,
};
use crate::application::queries::GetSystemInfo;

/// 系统信息响应
#[derive(Debug, Clone)]
pub struct SystemInfoResponse {
    pub engine: EngineInfo,
    pub dispatch: DispatchStats,
    pub cache: CacheStats,
}

/// GetSystemInfo Handler
pub struct GetSystemInfoHandler {
    engine: Arc<dyn VoiceEnginePort>,
    dispatcher: Arc<dyn DispatcherPort>,
    cache: Arc<dyn ReferenceCachePort>,
}

impl GetSystemInfoHandler {
    pub fn new(
        engine: Arc<dyn VoiceEnginePort>,
        dispatcher: Arc<dyn DispatcherPort>,
        cache: Arc<dyn ReferenceCachePort>,
    ) -> Self {
        Self {
            engine,
            dispatcher,
            cache,
        }
    }

    /// 引擎不可达时返回 EngineUnavailable
    pub async fn handle(&self, _query: GetSystemInfo) -> Result<SystemInfoResponse, ApplicationError> {
        let engine = self.engine.clone();
        let info = tokio::task::spawn_blocking(move || engine.info())
            .await
            .map_err(|e| ApplicationError::internal(format!("engine info task failed: {}", e)))?
            .map_err(|e| ApplicationError::EngineUnavailable(e.to_string()))?;

        Ok(SystemInfoResponse {
            engine: info,
            dispatch: self.dispatcher.stats(),
            cache: self.cache.stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn test_system_info_reports_stats() {
        let h = Harness::new();
        let handler = GetSystemInfoHandler::new(h.engine.clone(), h.dispatcher.clone(), h.cache.clone());

        let info = handler.handle(GetSystemInfo).await.unwrap();
        assert_eq!(info.engine.engine, "fake");
        assert_eq!(info.dispatch.pool_size, 1);
        assert_eq!(info.cache.capacity, 32);
    }

    #[tokio::test]
    async fn test_unavailable_engine() {
        let h = Harness::new();
        h.engine.set_available(false);
        let handler = GetSystemInfoHandler::new(h.engine.clone(), h.dispatcher.clone(), h.cache.clone());

        let err = handler.handle(GetSystemInfo).await.unwrap_err();
        assert!(matches!(err, ApplicationError::EngineUnavailable(_)));
    }
}
