//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_validator;
mod dispatcher;
mod reference_cache;
mod voice_engine;
mod voice_registry;

pub use audio_validator::{AudioValidatorPort, NormalizedAudio, RawUpload, ValidationError};
pub use dispatcher::{DispatchError, DispatchStats, DispatcherPort, GeneratedAudio};
pub use reference_cache::{CacheStats, ReferenceCachePort, ResolveError, ResolvedReference};
pub use voice_engine::{
    ConversionRequest, Embedding, EngineError, EngineInfo, SynthesisRequest, VoiceEnginePort,
};
pub use voice_registry::{
    ReferenceInvalidator, RegistryError, VoiceRegistryPort, VoiceResource,
};
