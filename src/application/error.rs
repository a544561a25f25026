//! 应用层错误定义
//!
//! 统一的命令/查询错误类型。各端口错误在此归一化为少数几类，
//! HTTP 层只需要根据类别映射状态码

use thiserror::Error;

use crate::application::ports::{DispatchError, RegistryError, ResolveError, ValidationError};
use crate::domain::generation::GenerationError;
use crate::domain::voice::VoiceError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 输入校验失败（格式、时长、参数）
    #[error("{0}")]
    ValidationError(String),

    /// 接纳上限已满
    #[error("{0}")]
    Overloaded(String),

    /// 超过截止时间
    #[error("{0}")]
    Timeout(String),

    /// 引擎执行失败
    #[error("{0}")]
    EngineFailure(String),

    /// 引擎不可用
    #[error("{0}")]
    EngineUnavailable(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<ValidationError> for ApplicationError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Staging(msg) => Self::StorageError(msg),
            other => Self::ValidationError(other.to_string()),
        }
    }
}

impl From<RegistryError> for ApplicationError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(name) => Self::not_found("Reference voice", name),
            RegistryError::Storage(msg) => Self::StorageError(msg),
        }
    }
}

impl From<ResolveError> for ApplicationError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(name) => Self::not_found("Reference voice", name),
            ResolveError::Registry(msg) => Self::StorageError(msg),
            ResolveError::Extraction(msg) => {
                Self::EngineFailure(format!("Error processing reference speaker: {}", msg))
            }
            ResolveError::EngineUnavailable(msg) => Self::EngineUnavailable(msg),
        }
    }
}

impl From<DispatchError> for ApplicationError {
    fn from(err: DispatchError) -> Self {
        match err {
            e @ DispatchError::Overloaded { .. } => Self::Overloaded(e.to_string()),
            e @ DispatchError::Timeout(_) => Self::Timeout(e.to_string()),
            DispatchError::EngineFailure(msg) => Self::EngineFailure(msg),
            DispatchError::EngineUnavailable(msg) => Self::EngineUnavailable(msg),
        }
    }
}

impl From<GenerationError> for ApplicationError {
    fn from(err: GenerationError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<VoiceError> for ApplicationError {
    fn from(err: VoiceError) -> Self {
        Self::ValidationError(err.to_string())
    }
}
