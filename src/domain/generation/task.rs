//! Generation Context - GenerationTask

use std::time::{Duration, Instant};
use uuid::Uuid;

use super::GenerationError;
use crate::domain::voice::VoiceName;

pub const DEFAULT_SPEED: f32 = 1.0;
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

/// 生成任务唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 生成任务
///
/// 不变量:
/// - 提交后不可修改（字段私有，只提供 getter）
/// - text 非空，speed 位于 [MIN_SPEED, MAX_SPEED]
/// - submitted_at 是截止时间的计算起点
#[derive(Debug)]
pub struct GenerationTask {
    id: TaskId,
    text: String,
    voice: VoiceName,
    speed: f32,
    submitted_at: Instant,
}

impl GenerationTask {
    pub fn new(
        text: impl Into<String>,
        voice: VoiceName,
        speed: Option<f32>,
    ) -> Result<Self, GenerationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyText);
        }

        let speed = speed.unwrap_or(DEFAULT_SPEED);
        if !speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(GenerationError::InvalidSpeed {
                value: speed,
                min: MIN_SPEED,
                max: MAX_SPEED,
            });
        }

        Ok(Self {
            id: TaskId::new(),
            text,
            voice,
            speed,
            submitted_at: Instant::now(),
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice(&self) -> &VoiceName {
        &self.voice
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    /// 截止时刻，`Instant` 溢出时返回 None（不设上限）
    pub fn expires_at(&self, deadline: Duration) -> Option<Instant> {
        self.submitted_at.checked_add(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice() -> VoiceName {
        VoiceName::new("alice").unwrap()
    }

    #[test]
    fn test_task_creation_defaults_speed() {
        let task = GenerationTask::new("Hello there", voice(), None).unwrap();
        assert_eq!(task.text(), "Hello there");
        assert_eq!(task.voice().as_str(), "alice");
        assert_eq!(task.speed(), DEFAULT_SPEED);
        assert!(task.submitted_at() <= Instant::now());
    }

    #[test]
    fn test_blank_text_rejected() {
        let err = GenerationTask::new("   ", voice(), None).unwrap_err();
        assert_eq!(err, GenerationError::EmptyText);
    }

    #[test]
    fn test_speed_bounds() {
        assert!(GenerationTask::new("hi", voice(), Some(0.5)).is_ok());
        assert!(GenerationTask::new("hi", voice(), Some(2.0)).is_ok());
        assert!(GenerationTask::new("hi", voice(), Some(3.0)).is_err());
        assert!(GenerationTask::new("hi", voice(), Some(f32::NAN)).is_err());
    }

    #[test]
    fn test_task_ids_are_unique() {
        let a = GenerationTask::new("a", voice(), None).unwrap();
        let b = GenerationTask::new("b", voice(), None).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_expires_at_counts_from_submission() {
        let task = GenerationTask::new("hi", voice(), None).unwrap();
        assert_eq!(
            task.expires_at(Duration::from_secs(5)),
            Some(task.submitted_at() + Duration::from_secs(5))
        );
        assert_eq!(task.expires_at(Duration::MAX), None);
    }
}
