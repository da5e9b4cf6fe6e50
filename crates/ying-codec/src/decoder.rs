//! 解码器 trait 定义.
//!
//! 所有解码器实现必须实现 `Decoder` trait.

use ying_core::YingResult;

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::frame::VideoFrame;
use crate::packet::Packet;

/// 解码器 trait
///
/// 定义了解码器的统一接口.
///
/// 解码流程:
/// 1. 调用 `open()` 提供容器侧参数
/// 2. 调用 `send_packet()` 送入压缩数据
/// 3. 调用 `receive_frame()` 取出解码后的帧
/// 4. 重复以上步骤直到所有数据处理完毕
pub trait Decoder: Send {
    /// 获取解码器标识
    fn codec_id(&self) -> CodecId;

    /// 获取解码器名称
    fn name(&self) -> &str;

    /// 使用参数配置解码器
    ///
    /// 必须在解码前调用, 提供尺寸、FourCC 标签和额外数据.
    fn open(&mut self, params: &CodecParameters) -> YingResult<()>;

    /// 送入一个压缩数据包进行解码
    ///
    /// # 返回
    /// - `Ok(())`: 数据包已接受
    /// - `Err(YingError::InvalidData)`: 码流损坏, 本帧解码中止
    fn send_packet(&mut self, packet: &Packet) -> YingResult<()>;

    /// 从解码器取出一帧解码数据
    ///
    /// # 返回
    /// - `Ok(frame)`: 成功取出一帧
    /// - `Err(YingError::NeedMoreData)`: 需要送入更多数据包
    fn receive_frame(&mut self) -> YingResult<VideoFrame>;

    /// 刷新解码器, 清空内部状态
    ///
    /// 用于 seek 后重置解码器状态.
    fn flush(&mut self);
}
