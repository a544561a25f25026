//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{
    CacheStats, DispatchStats, EngineInfo, SystemInfoResponse, UploadVoiceResponse, VoiceResponse,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
///
/// `{"status": "ok"|"error", "timestamp": <unix 秒>, "data"?, "error"?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 当前 unix 时间（秒，带小数）
pub fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            status: "ok",
            timestamp: unix_timestamp(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            status: "ok",
            timestamp: unix_timestamp(),
            data: None,
            error: None,
        }
    }

    /// 错误响应
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            status: "error",
            timestamp: unix_timestamp(),
            data: None,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// Generate DTOs
// ============================================================================

/// 字段全部可选，缺失时由 handler 给出明确的 400
#[derive(Debug, Deserialize)]
pub struct GenerateAudioRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reference_speaker: Option<String>,
    #[serde(default)]
    pub speed: Option<f32>,
}

// ============================================================================
// Voice DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadedVoiceDto {
    pub name: String,
    pub size_bytes: u64,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub updated_at: String,
}

impl From<UploadVoiceResponse> for UploadedVoiceDto {
    fn from(r: UploadVoiceResponse) -> Self {
        Self {
            name: r.name.to_string(),
            size_bytes: r.size_bytes,
            duration_secs: r.duration_secs,
            sample_rate: r.sample_rate,
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoiceDto {
    pub name: String,
    pub size_bytes: u64,
    pub updated_at: String,
}

impl From<VoiceResponse> for VoiceDto {
    fn from(r: VoiceResponse) -> Self {
        Self {
            name: r.name,
            size_bytes: r.size_bytes,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoiceListDto {
    pub voices: Vec<String>,
    pub total: usize,
}

// ============================================================================
// System DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DispatchStatsDto {
    pub pool_size: usize,
    pub capacity: usize,
    pub in_flight: usize,
    pub queued: usize,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub rejected: u64,
}

impl From<DispatchStats> for DispatchStatsDto {
    fn from(s: DispatchStats) -> Self {
        Self {
            pool_size: s.pool_size,
            capacity: s.capacity,
            in_flight: s.in_flight,
            queued: s.queued,
            completed: s.completed,
            failed: s.failed,
            timed_out: s.timed_out,
            rejected: s.rejected,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStatsDto {
    pub entries: usize,
    pub capacity: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsDto {
    fn from(s: CacheStats) -> Self {
        let lookups = s.hit_count + s.miss_count;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            s.hit_count as f64 / lookups as f64
        };
        Self {
            entries: s.entries,
            capacity: s.capacity,
            hit_count: s.hit_count,
            miss_count: s.miss_count,
            eviction_count: s.eviction_count,
            hit_rate,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SystemInfoDto {
    pub system_info: EngineInfo,
    pub dispatch: DispatchStatsDto,
    pub cache: CacheStatsDto,
}

impl From<SystemInfoResponse> for SystemInfoDto {
    fn from(r: SystemInfoResponse) -> Self {
        Self {
            system_info: r.engine,
            dispatch: r.dispatch.into(),
            cache: r.cache.into(),
        }
    }
}
