//! 解码器参数.
//!
//! 描述从容器格式中提取的解码器配置信息.

use ying_core::{PixelFormat, Rational};

use crate::codec_id::CodecId;

/// 解码器参数
///
/// 传递给解码器的配置信息, 通常由容器解封装层提供.
#[derive(Debug, Clone)]
pub struct CodecParameters {
    /// 编解码器标识
    pub codec_id: CodecId,
    /// 容器中的编解码器 FourCC 标签
    ///
    /// Bink2 码流的配置字节位于标签最高字节 (如 "KB2f"/"KB2g"/"KB2h"),
    /// 决定码流语法变体.
    pub codec_tag: u32,
    /// 额外数据 (Bink2: 4 字节小端标志字, bit 20 表示带 alpha 平面)
    pub extra_data: Vec<u8>,
    /// 码率 (bits/s)
    pub bit_rate: u64,
    /// 媒体类型特定参数
    pub params: CodecParamsType,
}

/// 媒体类型特定参数
#[derive(Debug, Clone)]
pub enum CodecParamsType {
    /// 视频参数
    Video(VideoCodecParams),
    /// 无特定参数
    None,
}

/// 视频解码器参数
#[derive(Debug, Clone)]
pub struct VideoCodecParams {
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 像素格式
    pub pixel_format: PixelFormat,
    /// 帧率
    pub frame_rate: Rational,
    /// 采样宽高比 (SAR)
    pub sample_aspect_ratio: Rational,
}

impl CodecParameters {
    /// 获取视频参数 (如果是视频流)
    pub fn video(&self) -> Option<&VideoCodecParams> {
        match &self.params {
            CodecParamsType::Video(v) => Some(v),
            _ => None,
        }
    }
}
