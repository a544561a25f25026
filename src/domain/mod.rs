//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Voice Context: 参考音色标识与音频格式
//! - Generation Context: 生成任务与结果

pub mod generation;
pub mod voice;
