//! Generation Context - 语音生成任务
//!
//! 职责:
//! - GenerationTask 不可变请求记录
//! - 语速等参数校验

mod errors;
mod task;

pub use errors::GenerationError;
pub use task::{GenerationTask, TaskId, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED};
