//! System Queries

/// 引擎设备信息 + 调度与缓存统计
#[derive(Debug, Clone)]
pub struct GetSystemInfo;
