//! Generation Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("'text' is required")]
    EmptyText,

    #[error("speed must be between {min} and {max}, got {value}")]
    InvalidSpeed { value: f32, min: f32, max: f32 },
}
