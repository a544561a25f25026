//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::VoiceError;

/// 音色名称最大长度（字节）
const MAX_NAME_LEN: usize = 100;

/// 音色名称
///
/// 不变量:
/// - 非空，长度不超过 100 字节
/// - 仅包含 ASCII 字母、数字、`-`、`_`、`.`
/// - 不以 `.` 开头（不会落到隐藏文件或 `..` 上）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoiceName(String);

impl VoiceName {
    pub fn new(name: impl Into<String>) -> Result<Self, VoiceError> {
        let name = name.into();
        if name.is_empty() {
            return Err(VoiceError::InvalidName("name cannot be empty".to_string()));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(VoiceError::InvalidName(format!(
                "name cannot exceed {} characters",
                MAX_NAME_LEN
            )));
        }
        if name.starts_with('.') {
            return Err(VoiceError::InvalidName(format!(
                "name cannot start with '.': {}",
                name
            )));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(VoiceError::InvalidName(format!(
                "name contains forbidden character {:?}: {}",
                bad, name
            )));
        }
        Ok(Self(name))
    }

    /// 从规范音频文件名还原音色名称（`alice.wav` -> `alice`）
    pub fn from_file_path(path: &Path, format: AudioFormat) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if AudioFormat::from_extension(ext)? != format {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        Self::new(stem).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for VoiceName {
    type Err = VoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VoiceName {
    type Error = VoiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VoiceName> for String {
    fn from(name: VoiceName) -> Self {
        name.0
    }
}

/// 音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            _ => None,
        }
    }

    /// 从上传文件名推断格式
    pub fn from_file_name(file_name: &str) -> Result<Self, VoiceError> {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| VoiceError::UnsupportedFormat(file_name.to_string()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = VoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| VoiceError::UnsupportedFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_names() {
        for name in ["alice", "Bob_2", "narrator-en.v1", "x"] {
            assert!(VoiceName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_rejects_path_unsafe_names() {
        for name in ["", "..", ".hidden", "a/b", "a\\b", "white space", "名字"] {
            assert!(VoiceName::new(name).is_err(), "{name:?} should be rejected");
        }
        assert!(VoiceName::new("a".repeat(101)).is_err());
    }

    #[test]
    fn test_name_from_canonical_path() {
        let path = PathBuf::from("/voices/alice.wav");
        assert_eq!(
            VoiceName::from_file_path(&path, AudioFormat::Wav).unwrap().as_str(),
            "alice"
        );
        let tmp = PathBuf::from("/voices/.alice.1234.tmp");
        assert!(VoiceName::from_file_path(&tmp, AudioFormat::Wav).is_none());
        let mp3 = PathBuf::from("/voices/alice.mp3");
        assert!(VoiceName::from_file_path(&mp3, AudioFormat::Wav).is_none());
    }

    #[test]
    fn test_serde_validates() {
        let name: VoiceName = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(name.as_str(), "alice");
        assert!(serde_json::from_str::<VoiceName>("\"../etc\"").is_err());
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(AudioFormat::from_file_name("clip.MP3").unwrap(), AudioFormat::Mp3);
        assert!(AudioFormat::from_file_name("clip.txt").is_err());
        assert!(AudioFormat::from_file_name("noext").is_err());
    }
}
