//! 码流变体 G (标签 KB2g 及之后): 定点数值域
//!
//! 宏块类型经由每行重置的最近使用表自适应编码; 量化指数按宏块级
//! 绝对预测 (三邻居取中, 角部基值 16), 合法范围 [0, 37);
//! DC/AC/逆变换在整数域完成, 支持 alpha 平面的运动补偿.

use ying_core::{YingError, YingResult};

use crate::frame::VideoFrame;

use super::ac::decode_ac_g;
use super::bitreader::BitReader;
use super::cbp::{decode_cbp_chroma_g, decode_cbp_luma_g};
use super::dc::read_tdc_g;
use super::idct::{idct_add_g, idct_put_g};
use super::motion::{decode_mv_g, mcompensate_chroma, mcompensate_luma, predict_mv_g};
use super::pred::{average_chroma, average_luma, mid_pred, predict_dc_chroma, predict_dc_luma};
use super::slice::{Bink2Profile, PLANE_A, PLANE_U, PLANE_V, PLANE_Y};
use super::tables::{
    BINK2G_CHROMA_INTRA_QMAT, BINK2G_INTER_QMAT, BINK2G_LUMA_INTRA_QMAT, BINK2G_SCAN, LUMA_REPOS,
};
use super::types::{
    BlockType, DcState, FrameFlags, MVectors, MbContext, MbFlags, PingPong, QuantPair, Row,
};

/// 行内进位: 每分量的上一宏块 CBP 与类型最近使用表
#[derive(Clone, Copy)]
struct RowCarry {
    cbp_intra: [u32; 4],
    cbp_inter: [u32; 4],
    type_mru: [BlockType; 4],
}

/// 每行的类型模型种子: {MOTION, RESIDUE, SKIP, INTRA}
const TYPE_MRU_SEED: [BlockType; 4] = [
    BlockType::Motion,
    BlockType::Residue,
    BlockType::Skip,
    BlockType::Intra,
];

impl Default for RowCarry {
    fn default() -> Self {
        Self {
            cbp_intra: [0; 4],
            cbp_inter: [0; 4],
            type_mru: TYPE_MRU_SEED,
        }
    }
}

pub(super) struct Bink2gProfile {
    width: usize,
    height: usize,
    has_alpha: bool,
    /// 帧标志: 亮度 CBP 为空时不编码高半复制位
    implicit_empty_cbp: bool,
    dc: PingPong<DcState<i32>>,
    mv: PingPong<MVectors>,
    q: PingPong<QuantPair>,
    row: RowCarry,
}

impl Bink2gProfile {
    pub fn new(mb_cols: usize, width: usize, height: usize, has_alpha: bool) -> Self {
        Self {
            width,
            height,
            has_alpha,
            implicit_empty_cbp: false,
            dc: PingPong::new(mb_cols),
            mv: PingPong::new(mb_cols),
            q: PingPong::new(mb_cols),
            row: RowCarry::default(),
        }
    }

    /// 每帧更新帧级标志
    pub fn set_frame_flags(&mut self, flags: FrameFlags) {
        self.implicit_empty_cbp = flags.contains(FrameFlags::IMPLICIT_EMPTY_CBP);
    }

    /// 量化指数增量: 一元码 + 两级逃逸 + 条件符号位
    fn decode_dq(gb: &mut BitReader) -> i32 {
        let mut dq = gb.read_unary(true, 4) as i32;
        if dq == 3 {
            dq += gb.read_bit() as i32;
        } else if dq == 4 {
            dq += gb.read_bits(5) as i32 + 1;
        }
        gb.read_signed(dq)
    }

    /// 帧内量化指数的邻居预测 (角部基值 16, 其余取因果邻居或三值中值)
    fn predicted_intra_q(&self, mb: &MbContext) -> i32 {
        let flags = mb.flags;
        let col = mb.col;
        if flags.corner() {
            16
        } else if flags.top_row {
            self.q.current()[col - 1].intra_q
        } else if flags.left_col {
            self.q.prev()[col].intra_q
        } else {
            mid_pred(
                self.q.prev()[col].intra_q,
                self.q.current()[col - 1].intra_q,
                self.q.prev()[col - 1].intra_q,
            )
        }
    }

    /// 帧间量化指数的邻居预测
    fn predicted_inter_q(&self, mb: &MbContext) -> i32 {
        let flags = mb.flags;
        let col = mb.col;
        if flags.corner() {
            16
        } else if flags.top_row {
            self.q.current()[col - 1].inter_q
        } else if flags.left_col {
            self.q.prev()[col].inter_q
        } else {
            mid_pred(
                self.q.prev()[col].inter_q,
                self.q.current()[col - 1].inter_q,
                self.q.prev()[col - 1].inter_q,
            )
        }
    }

    fn predict_dc(
        &mut self,
        col: usize,
        comp: usize,
        is_luma: bool,
        tdc: &[i32; 16],
        flags: MbFlags,
        mindc: i32,
        maxdc: i32,
    ) -> [i32; 16] {
        let l = self.dc.current()[col.saturating_sub(1)].dc[comp];
        let t = self.dc.prev()[col].dc[comp];
        let lt = self.dc.prev()[col.saturating_sub(1)].dc[comp];
        let mut dc = [0i32; 16];
        if is_luma {
            predict_dc_luma(&mut dc, tdc, &l, &t, &lt, flags, mindc, maxdc);
        } else {
            predict_dc_chroma(&mut dc, tdc, &l, &t, &lt, flags, mindc, maxdc);
        }
        self.dc.current_mut()[col].dc[comp] = dc;
        dc
    }

    fn decode_intra_luma(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        mb: &MbContext,
        comp: usize,
        plane: usize,
        q: i32,
    ) -> YingResult<()> {
        let cbp = decode_cbp_luma_g(gb, self.row.cbp_intra[comp], self.implicit_empty_cbp);
        self.row.cbp_intra[comp] = cbp;

        let tdc = read_tdc_g(gb, q, 16);
        let dc = self.predict_dc(mb.col, comp, true, &tdc, mb.flags, 0, 2047);

        let stride = frame.linesize[plane];
        let data = &mut frame.data[plane];
        for i in 0..4 {
            let mut block = [[0i16; 64]; 4];
            decode_ac_g(
                gb,
                &BINK2G_SCAN,
                &mut block,
                cbp >> (4 * i),
                q,
                &BINK2G_LUMA_INTRA_QMAT,
            )?;
            for j in 0..4 {
                block[j][0] = (dc[i * 4 + j] * 8 + 32) as i16;
                let r = LUMA_REPOS[i * 4 + j] as usize;
                let pos = (mb.y + (r >> 2) * 8) * stride + mb.x + (r & 3) * 8;
                idct_put_g(data, pos, stride, &mut block[j]);
            }
        }
        Ok(())
    }

    fn decode_intra_chroma(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        mb: &MbContext,
        comp: usize,
        plane: usize,
        q: i32,
    ) -> YingResult<()> {
        let cbp = decode_cbp_chroma_g(gb, self.row.cbp_intra[comp]);
        self.row.cbp_intra[comp] = cbp;

        let tdc = read_tdc_g(gb, q, 4);
        let dc = self.predict_dc(mb.col, comp, false, &tdc, mb.flags, 0, 2047);

        let stride = frame.linesize[plane];
        let data = &mut frame.data[plane];
        let mut block = [[0i16; 64]; 4];
        decode_ac_g(gb, &BINK2G_SCAN, &mut block, cbp, q, &BINK2G_CHROMA_INTRA_QMAT)?;
        for j in 0..4 {
            block[j][0] = (dc[j] * 8 + 32) as i16;
            let pos = (mb.y / 2 + (j >> 1) * 8) * stride + mb.x / 2 + (j & 1) * 8;
            idct_put_g(data, pos, stride, &mut block[j]);
        }
        Ok(())
    }

    fn decode_inter_luma(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        mb: &MbContext,
        comp: usize,
        plane: usize,
        q: i32,
    ) -> YingResult<()> {
        let cbp = decode_cbp_luma_g(gb, self.row.cbp_inter[comp], self.implicit_empty_cbp);
        self.row.cbp_inter[comp] = cbp;

        let tdc = read_tdc_g(gb, q, 16);
        let dc = self.predict_dc(mb.col, comp, true, &tdc, MbFlags::no_neighbors(), -1023, 1023);

        let stride = frame.linesize[plane];
        let data = &mut frame.data[plane];
        for i in 0..4 {
            let mut block = [[0i16; 64]; 4];
            decode_ac_g(
                gb,
                &BINK2G_SCAN,
                &mut block,
                cbp >> (4 * i),
                q,
                &BINK2G_INTER_QMAT,
            )?;
            for j in 0..4 {
                block[j][0] = (dc[i * 4 + j] * 8 + 32) as i16;
                let r = LUMA_REPOS[i * 4 + j] as usize;
                let pos = (mb.y + (r >> 2) * 8) * stride + mb.x + (r & 3) * 8;
                idct_add_g(data, pos, stride, &mut block[j]);
            }
        }
        Ok(())
    }

    fn decode_inter_chroma(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        mb: &MbContext,
        comp: usize,
        plane: usize,
        q: i32,
    ) -> YingResult<()> {
        let cbp = decode_cbp_chroma_g(gb, self.row.cbp_inter[comp]);
        self.row.cbp_inter[comp] = cbp;

        let tdc = read_tdc_g(gb, q, 4);
        let dc = self.predict_dc(mb.col, comp, false, &tdc, MbFlags::no_neighbors(), -1023, 1023);

        let stride = frame.linesize[plane];
        let data = &mut frame.data[plane];
        let mut block = [[0i16; 64]; 4];
        decode_ac_g(gb, &BINK2G_SCAN, &mut block, cbp, q, &BINK2G_INTER_QMAT)?;
        for j in 0..4 {
            block[j][0] = (dc[j] * 8 + 32) as i16;
            let pos = (mb.y / 2 + (j >> 1) * 8) * stride + mb.x / 2 + (j & 1) * 8;
            idct_add_g(data, pos, stride, &mut block[j]);
        }
        Ok(())
    }

    /// 对 Y/V/U (以及 alpha) 平面做运动补偿
    fn mcompensate(&self, frame: &mut VideoFrame, reference: &VideoFrame, mb: &MbContext) {
        let mv = self.mv.current()[mb.col];
        let (w, h) = (self.width as i32, self.height as i32);
        mcompensate_luma(
            &mv, mb.x, mb.y,
            &mut frame.data[PLANE_Y], frame.linesize[PLANE_Y],
            &reference.data[PLANE_Y], reference.linesize[PLANE_Y],
            w, h,
        );
        mcompensate_chroma(
            &mv, mb.x / 2, mb.y / 2,
            &mut frame.data[PLANE_V], frame.linesize[PLANE_V],
            &reference.data[PLANE_V], reference.linesize[PLANE_V],
            w / 2, h / 2,
        );
        mcompensate_chroma(
            &mv, mb.x / 2, mb.y / 2,
            &mut frame.data[PLANE_U], frame.linesize[PLANE_U],
            &reference.data[PLANE_U], reference.linesize[PLANE_U],
            w / 2, h / 2,
        );
        if self.has_alpha {
            mcompensate_luma(
                &mv, mb.x, mb.y,
                &mut frame.data[PLANE_A], frame.linesize[PLANE_A],
                &reference.data[PLANE_A], reference.linesize[PLANE_A],
                w, h,
            );
        }
    }
}

impl Bink2Profile for Bink2gProfile {
    fn begin_slice(&mut self) {
        self.q.reset_prev();
        self.mv.reset_prev();
    }

    fn begin_row(&mut self) {
        self.q.reset_current();
        self.mv.reset_current();
        self.row = RowCarry::default();
    }

    fn end_row(&mut self) {
        self.mv.swap();
        self.q.swap();
        self.dc.swap();
    }

    /// 一元码从最近使用表选择类型; 命中非首位时与前一位交换提升
    /// (自适应模型的一部分, 交换规则必须原样保持)
    fn decode_block_type(&mut self, gb: &mut BitReader) -> YingResult<BlockType> {
        let lru = &mut self.row.type_mru;
        Ok(match gb.read_unary(true, 3) {
            0 => lru[0],
            1 => {
                let v = lru[1];
                lru.swap(0, 1);
                v
            }
            2 => {
                let v = lru[3];
                lru.swap(2, 3);
                v
            }
            _ => {
                let v = lru[2];
                lru.swap(1, 2);
                v
            }
        })
    }

    fn average_neighbor(&mut self, frame: &VideoFrame, row: Row, col: usize, x: usize, y: usize) {
        let has_alpha = self.has_alpha;
        let dcs = match row {
            Row::Prev => &mut self.dc.prev_mut()[col],
            Row::Cur => &mut self.dc.current_mut()[col],
        };
        average_luma(&frame.data[PLANE_Y], frame.linesize[PLANE_Y], x, y, &mut dcs.dc[0]);
        average_chroma(
            &frame.data[PLANE_V], frame.linesize[PLANE_V],
            x / 2, y / 2, &mut dcs.dc[1],
        );
        average_chroma(
            &frame.data[PLANE_U], frame.linesize[PLANE_U],
            x / 2, y / 2, &mut dcs.dc[2],
        );
        if has_alpha {
            average_luma(&frame.data[PLANE_A], frame.linesize[PLANE_A], x, y, &mut dcs.dc[3]);
        }
    }

    fn predict_intra_mv(&mut self, mb: &MbContext) {
        let mv = MVectors::default();
        let (cur, prev) = self.mv.split_mut();
        predict_mv_g(cur, prev, mb.col, mb.flags, &mv);
    }

    fn decode_intra_mb(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        mb: &MbContext,
    ) -> YingResult<()> {
        let inter_q = self.predicted_inter_q(mb);
        self.q.current_mut()[mb.col].inter_q = inter_q;
        let dq = Self::decode_dq(gb);
        let q = self.predicted_intra_q(mb) + dq;
        self.q.current_mut()[mb.col].intra_q = q;
        if !(0..37).contains(&q) {
            return Err(YingError::InvalidData(format!("帧内量化指数越界: {q}")));
        }

        self.decode_intra_luma(gb, frame, mb, 0, PLANE_Y, q)?;
        self.decode_intra_chroma(gb, frame, mb, 1, PLANE_V, q)?;
        self.decode_intra_chroma(gb, frame, mb, 2, PLANE_U, q)?;
        if self.has_alpha {
            self.decode_intra_luma(gb, frame, mb, 3, PLANE_A, q)?;
        }
        Ok(())
    }

    fn note_skip_mb(&mut self, mb: &MbContext) {
        let inter_q = self.predicted_inter_q(mb);
        let intra_q = self.predicted_intra_q(mb);
        let slot = &mut self.q.current_mut()[mb.col];
        slot.inter_q = inter_q;
        slot.intra_q = intra_q;
    }

    fn decode_motion_mb(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        reference: &VideoFrame,
        mb: &MbContext,
    ) -> YingResult<()> {
        let intra_q = self.predicted_intra_q(mb);
        let inter_q = self.predicted_inter_q(mb);
        let slot = &mut self.q.current_mut()[mb.col];
        slot.intra_q = intra_q;
        slot.inter_q = inter_q;

        let mut mv = MVectors::default();
        decode_mv_g(gb, &mut mv)?;
        let (cur, prev) = self.mv.split_mut();
        predict_mv_g(cur, prev, mb.col, mb.flags, &mv);
        self.mcompensate(frame, reference, mb);
        Ok(())
    }

    fn decode_residue_mb(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        reference: &VideoFrame,
        mb: &MbContext,
    ) -> YingResult<()> {
        let intra_q = self.predicted_intra_q(mb);
        self.q.current_mut()[mb.col].intra_q = intra_q;

        let mut mv = MVectors::default();
        decode_mv_g(gb, &mut mv)?;
        let (cur, prev) = self.mv.split_mut();
        predict_mv_g(cur, prev, mb.col, mb.flags, &mv);

        let dq = Self::decode_dq(gb);
        let q = self.predicted_inter_q(mb) + dq;
        self.q.current_mut()[mb.col].inter_q = q;
        if !(0..37).contains(&q) {
            return Err(YingError::InvalidData(format!("帧间量化指数越界: {q}")));
        }

        self.mcompensate(frame, reference, mb);

        self.decode_inter_luma(gb, frame, mb, 0, PLANE_Y, q)?;
        if gb.read_bit() {
            self.decode_inter_chroma(gb, frame, mb, 1, PLANE_V, q)?;
            self.decode_inter_chroma(gb, frame, mb, 2, PLANE_U, q)?;
        } else {
            // 色度残差缺省, 进位 CBP 清零
            self.row.cbp_inter[1] = 0;
            self.row.cbp_inter[2] = 0;
        }
        if self.has_alpha {
            self.decode_inter_luma(gb, frame, mb, 3, PLANE_A, q)?;
        }
        Ok(())
    }
}
