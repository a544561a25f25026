//! Voice Engine Adapters

mod fake_engine;
mod http_engine;

pub use fake_engine::{FakeVoiceEngine, FakeVoiceEngineConfig};
pub use http_engine::{HttpVoiceEngine, HttpVoiceEngineConfig};
