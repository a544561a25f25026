//! Voice Queries

use crate::domain::voice::VoiceName;

/// 获取音色详情查询
#[derive(Debug, Clone)]
pub struct GetVoice {
    pub name: VoiceName,
}

/// 列出所有音色查询
#[derive(Debug, Clone)]
pub struct ListVoices;
