//! # ying-codec
//!
//! Ying 视频解码框架解码器库, 提供解码器框架与 Packet/Frame 抽象.
//!
//! 本 crate 定义了解码器注册、解码流程的核心抽象, 并内置
//! Bink video 2 软件解码器 (码流语法变体 KB2f/KB2g 及后续).
//!
//! ## 使用示例
//!
//! ```rust
//! use ying_codec::{CodecRegistry, CodecId};
//!
//! let mut reg = CodecRegistry::new();
//! ying_codec::register_all(&mut reg);
//!
//! let decoder = reg.create_decoder(CodecId::Bink2Video).unwrap();
//! ```

pub mod codec_id;
pub mod codec_parameters;
pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod packet;
pub mod registry;

// 重导出常用类型
pub use codec_id::CodecId;
pub use codec_parameters::{CodecParameters, CodecParamsType, VideoCodecParams};
pub use decoder::Decoder;
pub use frame::{PictureType, VideoFrame};
pub use packet::Packet;
pub use registry::CodecRegistry;

/// 注册所有内置解码器
pub fn register_all(registry: &mut CodecRegistry) {
    decoders::register_all_decoders(registry);
}
