//! 媒体类型定义.

/// 媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// 视频流
    Video,
    /// 其他数据流
    Data,
}
