//! DC 增量的熵解码

use super::bitreader::BitReader;
use super::tables::{BINK2F_DC_QUANT, BINK2G_DC_PAT, Q_DC_BITS};

/// Profile F: 读取并量化 DC 增量
///
/// 3 位公共位宽 (7 为逃逸再加 2 位), 每 4 个值先读幅值再读条件符号位.
/// `refine_corner` 为真时 (帧内角部宏块) 追加一个粗粒度 DC 细化项,
/// 位宽由量化指数的位预算决定.
pub(super) fn read_tdc_f(
    gb: &mut BitReader,
    q: usize,
    num_dc: usize,
    refine_corner: bool,
) -> [f32; 16] {
    let mut tdc = [0f32; 16];

    let mut dc_bits = gb.read_bits(3);
    if dc_bits == 7 {
        dc_bits += gb.read_bits(2);
    }
    if dc_bits != 0 {
        for j in (0..num_dc).step_by(4) {
            for i in 0..4 {
                tdc[j + i] = gb.read_bits(dc_bits) as f32;
            }
            for i in 0..4 {
                if tdc[j + i] != 0.0 && gb.read_bit() {
                    tdc[j + i] = -tdc[j + i];
                }
            }
        }
    }

    if refine_corner {
        let bits = (Q_DC_BITS[q] as u32 - 1) + dc_bits;
        if bits < 10 {
            let raw = (gb.read_bits(10 - bits) as i32) << dc_bits;
            tdc[0] += gb.read_signed(raw) as f32;
        }
    }

    for v in tdc.iter_mut().take(num_dc) {
        *v *= BINK2F_DC_QUANT[q];
    }
    tdc
}

/// Profile G: 读取并量化 DC 增量
///
/// 每个值为一元码 (上限 12) + 逃逸扩展, 按 DC 量化步长表缩放.
/// 前导位为 0 时整组增量为零.
pub(super) fn read_tdc_g(gb: &mut BitReader, q: i32, num_dc: usize) -> [i32; 16] {
    let mut tdc = [0i32; 16];
    let pat = BINK2G_DC_PAT[q.max(8) as usize];

    if gb.read_bit() {
        for v in tdc.iter_mut().take(num_dc) {
            let mut cnt = gb.read_unary(false, 12) as i32;
            if cnt > 3 {
                cnt = (1 << (cnt - 3)) + gb.read_bits((cnt - 3) as u32) as i32 + 2;
            }
            cnt = gb.read_signed(cnt);
            *v = (cnt * pat + 0x200) >> 10;
        }
    }
    tdc
}
