//! 像素格式定义.
//!
//! 定义了视频帧中像素的存储格式. Bink 系列码流只产出
//! 8 位平面 YUV 4:2:0, 带或不带独立的 alpha 平面.

use std::fmt;

/// 像素格式
///
/// 命名规则: 颜色空间 + 排列方式 (P=Planar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// 未指定
    None,
    /// YUV 4:2:0 平面格式, 8 位
    Yuv420p,
    /// YUV 4:2:0 平面格式 + alpha 平面, 8 位
    Yuva420p,
}

impl PixelFormat {
    /// 平面数量
    pub const fn plane_count(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Yuv420p => 3,
            Self::Yuva420p => 4,
        }
    }

    /// 获取色度子采样 (log2 水平, log2 垂直)
    ///
    /// YUV420 返回 (1, 1), 表示色度分辨率为亮度的 1/2 x 1/2.
    pub const fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::None => (0, 0),
            Self::Yuv420p | Self::Yuva420p => (1, 1),
        }
    }

    /// 是否带 alpha 平面
    pub const fn has_alpha(&self) -> bool {
        matches!(self, Self::Yuva420p)
    }

    /// 格式名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Yuv420p => "yuv420p",
            Self::Yuva420p => "yuva420p",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_count() {
        assert_eq!(PixelFormat::Yuv420p.plane_count(), 3);
        assert_eq!(PixelFormat::Yuva420p.plane_count(), 4);
        assert!(PixelFormat::Yuva420p.has_alpha());
        assert!(!PixelFormat::Yuv420p.has_alpha());
    }
}
