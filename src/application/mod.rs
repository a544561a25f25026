//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（VoiceEngine、AudioValidator、VoiceRegistry、ReferenceCache、Dispatcher）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Generate commands
    GenerateAudio,
    // Voice commands
    DeleteVoice,
    UploadVoice,
    // Handlers
    handlers::{
        DeleteVoiceHandler, GenerateAudioHandler, GenerateAudioResponse, UploadVoiceHandler,
        UploadVoiceResponse,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Audio validator
    AudioValidatorPort,
    NormalizedAudio,
    RawUpload,
    ValidationError,
    // Dispatcher
    DispatchError,
    DispatchStats,
    DispatcherPort,
    GeneratedAudio,
    // Reference cache
    CacheStats,
    ReferenceCachePort,
    ResolveError,
    ResolvedReference,
    // Voice engine
    ConversionRequest,
    Embedding,
    EngineError,
    EngineInfo,
    SynthesisRequest,
    VoiceEnginePort,
    // Voice registry
    ReferenceInvalidator,
    RegistryError,
    VoiceRegistryPort,
    VoiceResource,
};

pub use queries::{
    // System queries
    GetSystemInfo,
    // Voice queries
    GetVoice,
    ListVoices,
    // Handlers
    handlers::{
        GetSystemInfoHandler, GetVoiceHandler, ListVoicesHandler, SystemInfoResponse,
        VoiceResponse,
    },
};
