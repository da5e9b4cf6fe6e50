//! Slice 解码: 宏块循环骨架
//!
//! 两个码流变体共享同一宏块循环 (边界标志计算, 类型记录, INTRA 边缘
//! 平均的 4 种邻居情形, SKIP 拷贝, 行边界状态交换); 熵编码与数值域的
//! 差异由 `Bink2Profile` 的两个实现提供.

use ying_core::{YingError, YingResult};

use crate::frame::VideoFrame;

use super::bitreader::BitReader;
use super::types::{BlockType, MbContext, MbFlags, PingPong, Row};

/// 平面索引 (帧内存储顺序)
pub(super) const PLANE_Y: usize = 0;
pub(super) const PLANE_U: usize = 1;
pub(super) const PLANE_V: usize = 2;
pub(super) const PLANE_A: usize = 3;

/// 一个 slice 的解码参数
pub(super) struct SliceParams {
    /// 起始行 (含)
    pub start: usize,
    /// 结束行 (不含), 32 对齐
    pub end: usize,
    /// 声明宽度 (像素)
    pub width: usize,
    /// 声明高度 (像素)
    pub height: usize,
    pub has_alpha: bool,
}

/// 码流变体提供给宏块循环的操作集
pub(super) trait Bink2Profile {
    /// slice 开始: 重置上一行预测状态
    fn begin_slice(&mut self);
    /// 行开始: 重置当前行预测状态与行内进位 (CBP/量化基值/类型模型)
    fn begin_row(&mut self);
    /// 行结束: current/prev 预测状态乒乓交换
    fn end_row(&mut self);
    /// 解码宏块类型
    fn decode_block_type(&mut self, gb: &mut BitReader) -> YingResult<BlockType>;
    /// 用邻居宏块的重建像素均值顶替其 DC 预测数组 (INTRA 边缘平滑)
    fn average_neighbor(&mut self, frame: &VideoFrame, row: Row, col: usize, x: usize, y: usize);
    /// INTRA 宏块参与运动向量预测 (零增量), 供后续邻居使用
    fn predict_intra_mv(&mut self, mb: &MbContext);
    /// INTRA 宏块: 各平面 CBP/量化/DC/AC 解码与重建
    fn decode_intra_mb(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        mb: &MbContext,
    ) -> YingResult<()>;
    /// SKIP 宏块的预测状态延续 (像素拷贝由循环完成)
    fn note_skip_mb(&mut self, mb: &MbContext);
    /// MOTION 宏块: 向量解码/预测 + 各平面运动补偿
    fn decode_motion_mb(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        reference: &VideoFrame,
        mb: &MbContext,
    ) -> YingResult<()>;
    /// RESIDUE 宏块: MOTION + 残差叠加
    fn decode_residue_mb(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        reference: &VideoFrame,
        mb: &MbContext,
    ) -> YingResult<()>;
}

/// 行间块拷贝
pub(super) fn copy_block(
    dst: &mut [u8],
    dpos: usize,
    dstride: usize,
    src: &[u8],
    spos: usize,
    sstride: usize,
    w: usize,
    h: usize,
) {
    for j in 0..h {
        let d = dpos + j * dstride;
        let s = spos + j * sstride;
        dst[d..d + w].copy_from_slice(&src[s..s + w]);
    }
}

/// SKIP 宏块: 从参考帧原位拷贝所有平面
fn copy_skip_mb(frame: &mut VideoFrame, reference: &VideoFrame, x: usize, y: usize, has_alpha: bool) {
    let stride = frame.linesize[PLANE_Y];
    let sstride = reference.linesize[PLANE_Y];
    copy_block(
        &mut frame.data[PLANE_Y], y * stride + x, stride,
        &reference.data[PLANE_Y], y * sstride + x, sstride,
        32, 32,
    );
    for plane in [PLANE_U, PLANE_V] {
        let stride = frame.linesize[plane];
        let sstride = reference.linesize[plane];
        copy_block(
            &mut frame.data[plane], (y / 2) * stride + x / 2, stride,
            &reference.data[plane], (y / 2) * sstride + x / 2, sstride,
            16, 16,
        );
    }
    if has_alpha {
        let stride = frame.linesize[PLANE_A];
        let sstride = reference.linesize[PLANE_A];
        copy_block(
            &mut frame.data[PLANE_A], y * stride + x, stride,
            &reference.data[PLANE_A], y * sstride + x, sstride,
            32, 32,
        );
    }
}

/// 解码一个 slice: [start, end) 的宏块行, 按 32x32 步进
pub(super) fn decode_slice<P: Bink2Profile>(
    p: &mut P,
    gb: &mut BitReader,
    frame: &mut VideoFrame,
    reference: Option<&VideoFrame>,
    params: &SliceParams,
    keyframe: bool,
) -> YingResult<()> {
    let mb_cols = params.width.div_ceil(32);
    // 宏块类型的行间双缓冲; 首行不读上一行, 初值无影响
    let mut types = PingPong::<BlockType>::new(mb_cols);

    p.begin_slice();

    let mut y = params.start;
    while y < params.end {
        p.begin_row();

        let mut x = 0usize;
        while x < params.width {
            let col = x / 32;
            let flags = MbFlags::new(x, y, params.start, params.width);
            let bt = if keyframe {
                BlockType::Intra
            } else {
                p.decode_block_type(gb)?
            };
            types.current_mut()[col] = bt;
            let mb = MbContext { col, x, y, flags };

            match bt {
                BlockType::Intra => {
                    // 非 INTRA 的因果邻居: 以其重建像素的块均值顶替 DC, 平滑预测断层
                    if !flags.left_col
                        && !flags.top_row
                        && types.prev()[col - 1] != BlockType::Intra
                    {
                        p.average_neighbor(frame, Row::Prev, col - 1, x - 32, y - 32);
                    }
                    if !flags.left_col && types.current()[col - 1] != BlockType::Intra {
                        p.average_neighbor(frame, Row::Cur, col - 1, x - 32, y);
                    }
                    if flags.left_col
                        && !flags.top_row
                        && col + 1 < mb_cols
                        && types.prev()[col + 1] != BlockType::Intra
                    {
                        p.average_neighbor(frame, Row::Prev, col + 1, x + 32, y - 32);
                    }
                    if !flags.top_row && types.prev()[col] != BlockType::Intra {
                        p.average_neighbor(frame, Row::Prev, col, x, y - 32);
                    }

                    p.predict_intra_mv(&mb);
                    p.decode_intra_mb(gb, frame, &mb)?;
                }
                BlockType::Skip => {
                    p.note_skip_mb(&mb);
                    let reference = reference
                        .ok_or_else(|| YingError::InvalidData("SKIP 宏块缺少参考帧".into()))?;
                    copy_skip_mb(frame, reference, x, y, params.has_alpha);
                }
                BlockType::Motion => {
                    let reference = reference
                        .ok_or_else(|| YingError::InvalidData("MOTION 宏块缺少参考帧".into()))?;
                    p.decode_motion_mb(gb, frame, reference, &mb)?;
                }
                BlockType::Residue => {
                    let reference = reference
                        .ok_or_else(|| YingError::InvalidData("RESIDUE 宏块缺少参考帧".into()))?;
                    p.decode_residue_mb(gb, frame, reference, &mb)?;
                }
            }

            x += 32;
        }

        p.end_row();
        types.swap();
        y += 32;
    }
    Ok(())
}
