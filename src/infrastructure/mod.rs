//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod cache;
pub mod dispatch;
pub mod http;
pub mod persistence;

pub use cache::{KeyLocks, ReferenceCache, ReferenceStore};
pub use dispatch::{DispatcherConfig, TaskDispatcher};
pub use persistence::FileVoiceRegistry;
