//! Voice Commands

use crate::domain::voice::VoiceName;

/// 上传（或替换）参考音色命令
#[derive(Debug, Clone)]
pub struct UploadVoice {
    pub name: VoiceName,
    /// 客户端文件名，只用于判断格式
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 删除参考音色命令
#[derive(Debug, Clone)]
pub struct DeleteVoice {
    pub name: VoiceName,
}
