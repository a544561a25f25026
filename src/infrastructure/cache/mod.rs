//! Reference Cache - 音色名称到已解析参考的有界 LRU 缓存
//!
//! - key_locks: 注册表与缓存共享的 per-name 临界区
//! - reference_store: LRU 存储本体，同时作为注册表的失效回调
//! - reference_cache: 解析逻辑（未命中时查询注册表并提取 embedding）

mod key_locks;
mod reference_cache;
mod reference_store;

pub use key_locks::{KeyGuard, KeyLocks};
pub use reference_cache::ReferenceCache;
pub use reference_store::ReferenceStore;
