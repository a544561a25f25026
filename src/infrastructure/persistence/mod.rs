//! Persistence Layer - 数据持久化
//!
//! 参考音色注册表的文件系统实现

mod file_registry;

pub use file_registry::FileVoiceRegistry;
