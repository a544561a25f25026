//! voxgate - 语音合成 / 音色转换网关
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice Context: 音色名称与音频格式
//! - Generation Context: 生成任务与结果
//!
//! 应用层 (application/):
//! - Ports: 端口定义（VoiceEngine, VoiceRegistry, AudioValidator, ReferenceCache, Dispatcher）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Adapters: 引擎客户端, 上传音频校验
//! - Cache: 参考 embedding LRU 缓存
//! - Dispatch: 有界引擎槽位调度
//! - Persistence: 文件系统音色注册表

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{load_config, AppConfig};
