//! # Ying (影)
//!
//! 纯 Rust 实现的 Bink 游戏视频解码框架.
//!
//! Ying 提供从压缩数据包到平面 YUV(A) 像素帧的软件解码能力:
//! - **解码器框架**: Decoder trait, Packet/Frame 抽象与注册表
//! - **Bink video 2**: 码流语法变体 KB2f/KB2g 及后续标签的块解码
//!
//! 容器解封装、像素格式协商与硬件加速路径由宿主媒体管线负责,
//! 本框架只消费压缩字节缓冲并产出已知布局的解码帧.
//!
//! # 快速开始
//!
//! ```rust
//! use ying::codec::CodecId;
//!
//! let registry = ying::default_codec_registry();
//! let decoder = registry.create_decoder(CodecId::Bink2Video).unwrap();
//! assert_eq!(decoder.name(), "binkvideo2");
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `ying-core` | 核心类型与工具 |
//! | `ying-codec` | 解码器框架与 Bink2 解码器 |

/// 核心类型与工具
pub use ying_core as core;

/// 解码器框架
pub use ying_codec as codec;

/// 获取 Ying 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置解码器的注册表
pub fn default_codec_registry() -> ying_codec::CodecRegistry {
    let mut registry = ying_codec::CodecRegistry::new();
    ying_codec::register_all(&mut registry);
    registry
}
