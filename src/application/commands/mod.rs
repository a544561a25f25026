//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：上传 / 删除参考音色、生成语音

mod generate_commands;
mod voice_commands;

pub mod handlers;

pub use generate_commands::*;
pub use voice_commands::*;
