//! Bink video 2 解码集成测试
//!
//! 用手工装配的码流验证完整解码管线:
//! - 变体 G 关键帧: 全 INTRA, CBP 全零, DC 预测产出均匀灰 (128)
//! - 变体 F 关键帧: 同上, 两个 slice 按声明结束偏移重对齐
//! - 变体 G 帧间帧: 全 SKIP, 输出与关键帧逐字节一致
//! - 帧间帧缺少参考帧时拒绝解码

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use ying_codec::codec_id::CodecId;
    use ying_codec::codec_parameters::{CodecParameters, CodecParamsType, VideoCodecParams};
    use ying_codec::decoder::Decoder;
    use ying_codec::packet::Packet;
    use ying_core::{PixelFormat, Rational, YingError};

    /// 按 LSB-first 位序把 (值, 位数) 序列打包成字节流
    fn pack_bits(fields: &[(u32, u32)]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut pos = 0usize;
        for &(val, n) in fields {
            for i in 0..n {
                if buf.len() <= pos / 8 {
                    buf.push(0);
                }
                if (val >> i) & 1 != 0 {
                    buf[pos / 8] |= 1 << (pos % 8);
                }
                pos += 1;
            }
        }
        buf
    }

    /// 打开指定 FourCC 标签的 64x64 Bink2 解码器
    fn open_decoder(tag: &[u8; 4]) -> Box<dyn Decoder> {
        let _ = env_logger::builder().is_test(true).try_init();

        let registry = ying::default_codec_registry();
        let mut decoder = registry
            .create_decoder(CodecId::Bink2Video)
            .expect("创建 Bink2 解码器失败");

        let params = CodecParameters {
            codec_id: CodecId::Bink2Video,
            codec_tag: u32::from_le_bytes(*tag),
            extra_data: vec![0, 0, 0, 0],
            bit_rate: 0,
            params: CodecParamsType::Video(VideoCodecParams {
                width: 64,
                height: 64,
                pixel_format: PixelFormat::Yuv420p,
                frame_rate: Rational::new(30, 1),
                sample_aspect_ratio: Rational::new(1, 1),
            }),
        };
        decoder.open(&params).expect("打开解码器失败");
        decoder
    }

    /// 变体 G 的一个 INTRA 宏块: 量化增量 0, 各平面 CBP 空, DC 增量全零
    fn intra_mb_g() -> Vec<(u32, u32)> {
        vec![
            (1, 1), // 量化增量一元码终止: dq = 0
            (1, 1), // 亮度 CBP: 保持上一宏块 (0)
            (0, 1), // 无高半复制位
            (0, 1), // 亮度 DC 增量整组为零
            (1, 1), // V CBP: 按复用模式表派生 (0)
            (0, 1), // V DC 增量整组为零
            (1, 1), // U CBP
            (0, 1), // U DC 增量
        ]
    }

    /// 变体 F 的一个平面: CBP 整体复用 (0), 量化增量 0, DC 位宽 0
    ///
    /// 角部宏块 (量化指数 8) 追加 8 位 DC 细化项, 置零.
    fn intra_plane_f(corner: bool) -> Vec<(u32, u32)> {
        let mut fields = vec![
            (1, 1), // CBP 转义位
            (1, 1), // 整体复用上一宏块 CBP (0)
            (1, 1), // 量化增量码字: 幅值 0
            (0, 3), // DC 位宽 0, 增量全零
        ];
        if corner {
            fields.push((0, 8)); // 角部 DC 细化项为零
        }
        fields
    }

    /// 变体 G 关键帧数据包: 64x64, 单 slice, 4 个全 INTRA 宏块
    fn keyframe_packet_g() -> Packet {
        let mut fields = Vec::new();
        for _ in 0..4 {
            fields.extend(intra_mb_g());
        }
        let mut data = vec![0u8; 4]; // 帧标志字: 无边信息位图
        data.extend(pack_bits(&fields));

        let mut pkt = Packet::from_data(Bytes::from(data));
        pkt.is_keyframe = true;
        pkt
    }

    /// 变体 F 关键帧数据包: 64x64 固定二分为两个 slice, 各一行宏块
    fn keyframe_packet_f() -> Packet {
        let mut slice = Vec::new();
        for corner in [true, false] {
            for _ in 0..3 {
                slice.extend(intra_plane_f(corner));
            }
        }
        let payload = pack_bits(&slice);

        // 帧标志字 + slice 0 的绝对结束偏移 + 两段 slice 数据
        let mut data = vec![0u8; 4];
        data.extend((8 + payload.len() as u32).to_le_bytes());
        data.extend(&payload);
        data.extend(&payload);

        let mut pkt = Packet::from_data(Bytes::from(data));
        pkt.is_keyframe = true;
        pkt
    }

    /// 变体 G 帧间帧数据包: 4 个全 SKIP 宏块
    ///
    /// 每行类型最近使用表重新播种为 {MOTION, RESIDUE, SKIP, INTRA},
    /// 行内第一个 SKIP 经一元码 3 选中并逐次提升.
    fn all_skip_packet_g() -> Packet {
        let mut fields = Vec::new();
        for _ in 0..2 {
            fields.push((0b000, 3)); // 行首: SKIP 位于秩 2
            fields.push((0b10, 2)); // 提升后位于秩 1
        }
        let mut data = vec![0u8; 4];
        data.extend(pack_bits(&fields));

        let mut pkt = Packet::from_data(Bytes::from(data));
        pkt.is_keyframe = false;
        pkt
    }

    /// 断言帧的所有平面为均匀灰: 亮度 64x64, 色度 32x32, 全 128
    fn assert_flat_gray(frame: &ying_codec::VideoFrame) {
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 64);
        assert_eq!(frame.pixel_format, PixelFormat::Yuv420p);
        for (plane, data) in frame.data.iter().enumerate() {
            let expect_len = if plane == 0 { 64 * 64 } else { 32 * 32 };
            assert_eq!(data.len(), expect_len, "平面 {plane} 尺寸错误");
            assert!(
                data.iter().all(|&p| p == 128),
                "平面 {plane} 非均匀灰: {:?}",
                &data[..16]
            );
        }
    }

    #[test]
    fn test_g关键帧解码为均匀灰() {
        let mut decoder = open_decoder(b"KB2g");
        decoder.send_packet(&keyframe_packet_g()).expect("解码失败");
        let frame = decoder.receive_frame().expect("取帧失败");
        assert!(frame.is_keyframe);
        assert_flat_gray(&frame);
    }

    #[test]
    fn test_f关键帧双slice解码为均匀灰() {
        let mut decoder = open_decoder(b"KB2f");
        decoder.send_packet(&keyframe_packet_f()).expect("解码失败");
        let frame = decoder.receive_frame().expect("取帧失败");
        assert!(frame.is_keyframe);
        assert_flat_gray(&frame);
    }

    #[test]
    fn test_g全skip帧间帧与关键帧逐字节一致() {
        let mut decoder = open_decoder(b"KB2g");
        decoder.send_packet(&keyframe_packet_g()).expect("关键帧解码失败");
        let keyframe = decoder.receive_frame().expect("取关键帧失败");

        decoder.send_packet(&all_skip_packet_g()).expect("帧间帧解码失败");
        let inter = decoder.receive_frame().expect("取帧间帧失败");

        assert!(!inter.is_keyframe);
        for (plane, (a, b)) in keyframe.data.iter().zip(&inter.data).enumerate() {
            assert_eq!(a, b, "平面 {plane} 与关键帧不一致");
        }
    }

    #[test]
    fn test_帧间帧缺少参考帧被拒绝() {
        let mut decoder = open_decoder(b"KB2g");
        let result = decoder.send_packet(&all_skip_packet_g());
        assert!(
            matches!(result, Err(YingError::InvalidData(_))),
            "应以无效数据拒绝: {result:?}"
        );
    }

    #[test]
    fn test_无数据时receive_frame返回need_more_data() {
        let mut decoder = open_decoder(b"KB2g");
        assert!(matches!(
            decoder.receive_frame(),
            Err(YingError::NeedMoreData)
        ));
    }
}
