//! 码流变体 F (标签 KB2f 及更早): 浮点数值域
//!
//! 宏块类型为定长 2 位字段; 量化指数按平面独立, 以增量 VLC 编码,
//! 行首基值 8, 合法范围 [0, 16); DC/AC/逆变换全部在 f32 域完成.

use ying_core::{YingError, YingResult};

use crate::frame::VideoFrame;

use super::ac::decode_ac_f;
use super::bitreader::BitReader;
use super::cbp::{decode_cbp_chroma_f, decode_cbp_luma_f};
use super::dc::read_tdc_f;
use super::idct::{idct_add_f, idct_put_f};
use super::motion::{decode_mv_f, mcompensate_chroma, mcompensate_luma, predict_mv_f};
use super::pred::{average_chroma, average_luma, predict_dc_chroma, predict_dc_luma};
use super::slice::{Bink2Profile, PLANE_A, PLANE_U, PLANE_V, PLANE_Y};
use super::tables::{
    BINK2F_AC_QUANT, BINK2F_CHROMA_QMAT, BINK2F_CHROMA_SCAN, BINK2F_LUMA_INTER_QMAT,
    BINK2F_LUMA_INTRA_QMAT, BINK2F_LUMA_SCAN, LUMA_REPOS,
};
use super::types::{BlockType, DcState, MVectors, MbContext, MbFlags, PingPong, Row};
use super::vlc::vlcs;

/// 行内进位: 每分量的上一宏块 CBP 与量化指数
#[derive(Clone, Copy)]
struct RowCarry {
    cbp_intra: [u32; 4],
    cbp_inter: [u32; 4],
    intra_q: [i32; 4],
    inter_q: [i32; 4],
}

impl Default for RowCarry {
    fn default() -> Self {
        Self {
            cbp_intra: [0; 4],
            cbp_inter: [0; 4],
            intra_q: [8; 4],
            inter_q: [8; 4],
        }
    }
}

pub(super) struct Bink2fProfile {
    width: usize,
    height: usize,
    has_alpha: bool,
    dc: PingPong<DcState<f32>>,
    mv: PingPong<MVectors>,
    row: RowCarry,
}

impl Bink2fProfile {
    pub fn new(mb_cols: usize, width: usize, height: usize, has_alpha: bool) -> Self {
        Self {
            width,
            height,
            has_alpha,
            dc: PingPong::new(mb_cols),
            mv: PingPong::new(mb_cols),
            row: RowCarry::default(),
        }
    }

    /// 量化指数增量: VLC 幅值 + 条件符号位
    fn decode_delta_q(gb: &mut BitReader) -> YingResult<i32> {
        let dq = vlcs()
            .quant_f
            .decode(gb)
            .ok_or_else(|| YingError::InvalidData("量化增量码字无效".into()))? as i32;
        Ok(gb.read_signed(dq))
    }

    /// DC 空间预测并存入当前行状态
    fn predict_dc(
        &mut self,
        col: usize,
        comp: usize,
        is_luma: bool,
        tdc: &[f32; 16],
        flags: MbFlags,
        mindc: f32,
        maxdc: f32,
    ) -> [f32; 16] {
        let l = self.dc.current()[col.saturating_sub(1)].dc[comp];
        let t = self.dc.prev()[col].dc[comp];
        let lt = self.dc.prev()[col.saturating_sub(1)].dc[comp];
        let mut dc = [0f32; 16];
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
    ) -> YingResult<()> {
        let cbp = decode_cbp_luma_f(gb, self.row.cbp_intra[comp]);
        self.row.cbp_intra[comp] = cbp;
        let dq = Self::decode_delta_q(gb)?;
        let q = self.row.intra_q[comp] + dq;
        if !(0..16).contains(&q) {
            return Err(YingError::InvalidData(format!("帧内量化指数越界: {q}")));
        }
        self.row.intra_q[comp] = q;

        let tdc = read_tdc_f(gb, q as usize, 16, mb.flags.corner());
        let dc = self.predict_dc(mb.col, comp, true, &tdc, mb.flags, 0.0, 2047.0);

        let stride = frame.linesize[plane];
        let data = &mut frame.data[plane];
        for i in 0..4 {
            let mut block = [[0f32; 64]; 4];
            decode_ac_f(
                gb,
                &BINK2F_LUMA_SCAN,
                &mut block,
                cbp >> (4 * i),
                BINK2F_AC_QUANT[q as usize],
                &BINK2F_LUMA_INTRA_QMAT,
            )?;
            for j in 0..4 {
                block[j][0] = dc[i * 4 + j] * 0.125;
                let r = LUMA_REPOS[i * 4 + j] as usize;
                let pos = (mb.y + (r >> 2) * 8) * stride + mb.x + (r & 3) * 8;
                idct_put_f(data, pos, stride, &mut block[j]);
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
    ) -> YingResult<()> {
        let cbp = decode_cbp_chroma_f(gb, self.row.cbp_intra[comp]);
        self.row.cbp_intra[comp] = cbp;
        let dq = Self::decode_delta_q(gb)?;
        let q = self.row.intra_q[comp] + dq;
        if !(0..16).contains(&q) {
            return Err(YingError::InvalidData(format!("帧内量化指数越界: {q}")));
        }
        self.row.intra_q[comp] = q;

        let tdc = read_tdc_f(gb, q as usize, 4, mb.flags.corner());
        let dc = self.predict_dc(mb.col, comp, false, &tdc, mb.flags, 0.0, 2047.0);

        let stride = frame.linesize[plane];
        let data = &mut frame.data[plane];
        let mut block = [[0f32; 64]; 4];
        decode_ac_f(
            gb,
            &BINK2F_CHROMA_SCAN,
            &mut block,
            cbp,
            BINK2F_AC_QUANT[q as usize],
            &BINK2F_CHROMA_QMAT,
        )?;
        for j in 0..4 {
            block[j][0] = dc[j] * 0.125;
            let pos = (mb.y / 2 + (j >> 1) * 8) * stride + mb.x / 2 + (j & 1) * 8;
            idct_put_f(data, pos, stride, &mut block[j]);
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
    ) -> YingResult<()> {
        let cbp = decode_cbp_luma_f(gb, self.row.cbp_inter[comp]);
        self.row.cbp_inter[comp] = cbp;
        let dq = Self::decode_delta_q(gb)?;
        let q = self.row.inter_q[comp] + dq;
        if !(0..16).contains(&q) {
            return Err(YingError::InvalidData(format!("帧间量化指数越界: {q}")));
        }
        self.row.inter_q[comp] = q;

        // 残差 DC 无空间邻居, 按角部情形以 0 为种子
        let tdc = read_tdc_f(gb, q as usize, 16, false);
        let dc = self.predict_dc(
            mb.col,
            comp,
            true,
            &tdc,
            MbFlags::no_neighbors(),
            -1023.0,
            1023.0,
        );

        let stride = frame.linesize[plane];
        let data = &mut frame.data[plane];
        for i in 0..4 {
            let mut block = [[0f32; 64]; 4];
            decode_ac_f(
                gb,
                &BINK2F_LUMA_SCAN,
                &mut block,
                cbp >> (4 * i),
                BINK2F_AC_QUANT[q as usize],
                &BINK2F_LUMA_INTER_QMAT,
            )?;
            for j in 0..4 {
                block[j][0] = dc[i * 4 + j] * 0.125;
                let r = LUMA_REPOS[i * 4 + j] as usize;
                let pos = (mb.y + (r >> 2) * 8) * stride + mb.x + (r & 3) * 8;
                idct_add_f(data, pos, stride, &mut block[j]);
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
    ) -> YingResult<()> {
        let cbp = decode_cbp_chroma_f(gb, self.row.cbp_inter[comp]);
        self.row.cbp_inter[comp] = cbp;
        let dq = Self::decode_delta_q(gb)?;
        let q = self.row.inter_q[comp] + dq;
        if !(0..16).contains(&q) {
            return Err(YingError::InvalidData(format!("帧间量化指数越界: {q}")));
        }
        self.row.inter_q[comp] = q;

        let tdc = read_tdc_f(gb, q as usize, 4, false);
        let dc = self.predict_dc(
            mb.col,
            comp,
            false,
            &tdc,
            MbFlags::no_neighbors(),
            -1023.0,
            1023.0,
        );

        let stride = frame.linesize[plane];
        let data = &mut frame.data[plane];
        let mut block = [[0f32; 64]; 4];
        decode_ac_f(
            gb,
            &BINK2F_CHROMA_SCAN,
            &mut block,
            cbp,
            BINK2F_AC_QUANT[q as usize],
            &BINK2F_CHROMA_QMAT,
        )?;
        for j in 0..4 {
            block[j][0] = dc[j] * 0.125;
            let pos = (mb.y / 2 + (j >> 1) * 8) * stride + mb.x / 2 + (j & 1) * 8;
            idct_add_f(data, pos, stride, &mut block[j]);
        }
        Ok(())
    }

    /// 对 Y/V/U 平面做运动补偿 (F 变体不补偿 alpha 平面)
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
    }
}

impl Bink2Profile for Bink2fProfile {
    fn begin_slice(&mut self) {
        self.mv.reset_prev();
    }

    fn begin_row(&mut self) {
        self.mv.reset_current();
        self.row = RowCarry::default();
    }

    fn end_row(&mut self) {
        self.mv.swap();
        self.dc.swap();
    }

    fn decode_block_type(&mut self, gb: &mut BitReader) -> YingResult<BlockType> {
        Ok(BlockType::from_index(gb.read_bits(2)))
    }

    fn average_neighbor(&mut self, frame: &VideoFrame, row: Row, col: usize, x: usize, y: usize) {
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
        // F 变体不填充 alpha 分量的 DC
    }

    fn predict_intra_mv(&mut self, mb: &MbContext) {
        let mv = MVectors::default();
        let (cur, prev) = self.mv.split_mut();
        predict_mv_f(cur, prev, mb.col, mb.flags, &mv);
    }

    fn decode_intra_mb(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        mb: &MbContext,
    ) -> YingResult<()> {
        self.decode_intra_luma(gb, frame, mb, 0, PLANE_Y)?;
        self.decode_intra_chroma(gb, frame, mb, 1, PLANE_V)?;
        self.decode_intra_chroma(gb, frame, mb, 2, PLANE_U)?;
        if self.has_alpha {
            self.decode_intra_luma(gb, frame, mb, 3, PLANE_A)?;
        }
        Ok(())
    }

    fn note_skip_mb(&mut self, _mb: &MbContext) {}

    fn decode_motion_mb(
        &mut self,
        gb: &mut BitReader,
        frame: &mut VideoFrame,
        reference: &VideoFrame,
        mb: &MbContext,
    ) -> YingResult<()> {
        let mut mv = MVectors::default();
        decode_mv_f(gb, mb.flags, &mut mv);
        let (cur, prev) = self.mv.split_mut();
        predict_mv_f(cur, prev, mb.col, mb.flags, &mv);
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
        let mut mv = MVectors::default();
        decode_mv_f(gb, mb.flags, &mut mv);
        let (cur, prev) = self.mv.split_mut();
        predict_mv_f(cur, prev, mb.col, mb.flags, &mv);
        self.mcompensate(frame, reference, mb);

        self.decode_inter_luma(gb, frame, mb, 0, PLANE_Y)?;
        self.decode_inter_chroma(gb, frame, mb, 1, PLANE_V)?;
        self.decode_inter_chroma(gb, frame, mb, 2, PLANE_U)?;
        if self.has_alpha {
            self.decode_inter_luma(gb, frame, mb, 3, PLANE_A)?;
        }
        Ok(())
    }
}
