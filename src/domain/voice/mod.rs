//! Voice Context - 参考音色限界上下文
//!
//! 职责:
//! - 音色名称校验（路径安全）
//! - 允许的音频格式

mod errors;
mod value_objects;

pub use errors::VoiceError;
pub use value_objects::{AudioFormat, VoiceName};
