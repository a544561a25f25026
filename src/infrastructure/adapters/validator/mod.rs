//! Audio Validator Adapter

mod symphonia_validator;

pub use symphonia_validator::{AudioValidatorConfig, SymphoniaAudioValidator};
