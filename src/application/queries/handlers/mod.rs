//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod system_handlers;
mod voice_handlers;

pub use system_handlers::*;
pub use voice_handlers::*;
