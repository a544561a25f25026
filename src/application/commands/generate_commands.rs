//! Generate Commands

/// 生成语音命令
///
/// 字段保持原始输入形态，校验在 handler 中完成
#[derive(Debug, Clone)]
pub struct GenerateAudio {
    pub text: String,
    pub reference_speaker: String,
    pub speed: Option<f32>,
}
