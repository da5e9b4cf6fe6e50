//! 运动向量解码, 预测与运动补偿
//!
//! 亮度为半像素精度 (6 抽头半像素滤波), 色度为四分之一像素精度
//! (2 抽头三种权重). 参考窗口起点落在帧外时子块保持原样不补偿.
//! 滤波抽头的线性地址越出平面缓冲区时夹取到缓冲区边界.

use ying_core::{YingError, YingResult};

use super::bitreader::BitReader;
use super::pred::{clip_uint8, mid_pred};
use super::types::{MVectors, MbFlags};
use super::vlc::vlcs;

// ============================================================================
// 运动向量熵解码
// ============================================================================

/// Profile F: 定宽字段读取 4 个向量的增量
///
/// 每分量: 3 位公共位宽 (7 为逃逸加 2 位), 4 个幅值 + 4 个条件符号位;
/// 角部宏块追加一个 5 位粗偏移项 (x16), 统一加到 4 个向量上.
pub(super) fn decode_mv_f(gb: &mut BitReader, flags: MbFlags, mv: &mut MVectors) {
    for i in 0..2 {
        let mut bits = gb.read_bits(3);
        if bits == 7 {
            bits += gb.read_bits(2);
        }
        if bits != 0 {
            for j in 0..4 {
                mv.v[j][i] = gb.read_bits(bits) as i32;
            }
            for j in 0..4 {
                if mv.v[j][i] != 0 && gb.read_bit() {
                    mv.v[j][i] = -mv.v[j][i];
                }
            }
        }

        let mut val = 0;
        if flags.corner() {
            val = gb.read_bits(5) as i32 * 16;
            val = gb.read_signed(val);
        }
        for j in 0..4 {
            mv.v[j][i] += val;
        }
    }
    mv.nb_vectors = 4;
}

/// Profile G: VLC 读取 1 或 4 个向量的增量
///
/// 码表符号 8-14 映射为负值, 15 为之字形逃逸 (一元码定位宽).
pub(super) fn decode_mv_g(gb: &mut BitReader, mv: &mut MVectors) -> YingResult<()> {
    let num_mvs = if gb.read_bit() { 1 } else { 4 };
    mv.nb_vectors = num_mvs;

    for i in 0..2 {
        for j in 0..num_mvs {
            let sym = vlcs()
                .mv_g
                .decode(gb)
                .ok_or_else(|| YingError::InvalidData("运动向量码字无效".into()))?;
            let mut val = sym as i32;
            if val >= 8 && val != 15 {
                val -= 15;
            }
            if val == 15 {
                let bits = gb.read_unary(true, 12) + 4;
                let v = gb.read_bits(bits) as i32 + (1 << bits) - 1;
                val = if v & 1 != 0 { -(v >> 1) - 1 } else { v >> 1 };
            }
            mv.v[j][i] = val;
        }
    }
    Ok(())
}

// ============================================================================
// 运动向量预测
// ============================================================================

/// Profile F: 对解码增量叠加因果邻居的三值中值预测
///
/// 邻居集合按 (top_row, left_col) 的 4 种组合选取; 预测结果写入
/// 当前行状态, 供右侧与下一行宏块继续预测.
pub(super) fn predict_mv_f(
    cur: &mut [MVectors],
    prev: &[MVectors],
    col: usize,
    flags: MbFlags,
    mv: &MVectors,
) {
    let l = cur[col.saturating_sub(1)];
    let lt = prev[col.saturating_sub(1)];
    let t = prev[col];
    let mut c = MVectors {
        nb_vectors: mv.nb_vectors,
        ..Default::default()
    };

    if !flags.top_row {
        if flags.left_col {
            for i in 0..2 {
                c.v[0][i] = mv.v[0][i] + mid_pred(t.v[0][i], t.v[2][i], t.v[3][i]);
                c.v[1][i] = mv.v[1][i] + mid_pred(t.v[2][i], t.v[3][i], c.v[0][i]);
                c.v[2][i] = mv.v[2][i] + mid_pred(t.v[2][i], c.v[0][i], c.v[1][i]);
                c.v[3][i] = mv.v[3][i] + mid_pred(c.v[0][i], c.v[1][i], c.v[2][i]);
            }
        } else {
            for i in 0..2 {
                c.v[0][i] = mv.v[0][i] + mid_pred(lt.v[3][i], t.v[2][i], l.v[1][i]);
                c.v[1][i] = mv.v[1][i] + mid_pred(t.v[2][i], t.v[3][i], c.v[0][i]);
                c.v[2][i] = mv.v[2][i] + mid_pred(t.v[2][i], c.v[0][i], c.v[1][i]);
                c.v[3][i] = mv.v[3][i] + mid_pred(c.v[0][i], c.v[1][i], c.v[2][i]);
            }
        }
    } else if flags.left_col {
        c.v = mv.v;
    } else {
        for i in 0..2 {
            c.v[0][i] = mv.v[0][i] + mid_pred(l.v[0][i], l.v[1][i], l.v[3][i]);
            c.v[2][i] = mv.v[2][i] + mid_pred(l.v[1][i], l.v[3][i], c.v[0][i]);
            c.v[1][i] = mv.v[1][i] + mid_pred(l.v[1][i], c.v[0][i], c.v[2][i]);
            c.v[3][i] = mv.v[3][i] + mid_pred(c.v[0][i], c.v[1][i], c.v[2][i]);
        }
    }
    cur[col] = c;
}

/// Profile G: 与 F 同构的预测, 但左上角与内部情形的邻居集合不同,
/// 且支持单向量模式 (一个预测向量广播到 4 个子块)
pub(super) fn predict_mv_g(
    cur: &mut [MVectors],
    prev: &[MVectors],
    col: usize,
    flags: MbFlags,
    mv: &MVectors,
) {
    let l = cur[col.saturating_sub(1)];
    let lt = prev[col.saturating_sub(1)];
    let t = prev[col];

    if mv.nb_vectors == 1 {
        let mut m = *mv;
        if flags.top_row {
            if !flags.left_col {
                for i in 0..2 {
                    m.v[0][i] += mid_pred(l.v[0][i], l.v[1][i], l.v[3][i]);
                }
            }
        } else if !flags.left_col {
            for i in 0..2 {
                m.v[0][i] += mid_pred(lt.v[3][i], t.v[2][i], l.v[1][i]);
            }
        } else {
            for i in 0..2 {
                m.v[0][i] += mid_pred(t.v[0][i], t.v[2][i], t.v[3][i]);
            }
        }
        cur[col] = MVectors {
            v: [m.v[0]; 4],
            nb_vectors: 1,
        };
        return;
    }

    let mut c = MVectors {
        nb_vectors: mv.nb_vectors,
        ..Default::default()
    };
    if !flags.top_row {
        if flags.left_col {
            for i in 0..2 {
                c.v[0][i] = mv.v[0][i] + mid_pred(t.v[0][i], t.v[2][i], t.v[3][i]);
                c.v[1][i] = mv.v[1][i] + mid_pred(t.v[2][i], t.v[3][i], c.v[0][i]);
                c.v[2][i] = mv.v[2][i] + mid_pred(t.v[2][i], c.v[0][i], c.v[1][i]);
                c.v[3][i] = mv.v[3][i] + mid_pred(c.v[0][i], c.v[1][i], c.v[2][i]);
            }
        } else {
            for i in 0..2 {
                c.v[0][i] = mv.v[0][i] + mid_pred(t.v[2][i], lt.v[3][i], l.v[1][i]);
                c.v[1][i] = mv.v[1][i] + mid_pred(t.v[2][i], t.v[3][i], c.v[0][i]);
                c.v[2][i] = mv.v[2][i] + mid_pred(l.v[1][i], l.v[3][i], c.v[0][i]);
                c.v[3][i] = mv.v[3][i] + mid_pred(c.v[0][i], c.v[1][i], c.v[2][i]);
            }
        }
    } else if flags.left_col {
        for i in 0..2 {
            c.v[0][i] = mv.v[0][i];
            c.v[1][i] = mv.v[1][i] + mv.v[0][i];
            c.v[2][i] = mv.v[2][i] + mv.v[0][i];
            c.v[3][i] = mv.v[3][i] + mid_pred(c.v[0][i], c.v[1][i], c.v[2][i]);
        }
    } else {
        for i in 0..2 {
            c.v[0][i] = mv.v[0][i] + mid_pred(l.v[0][i], l.v[1][i], l.v[3][i]);
            c.v[2][i] = mv.v[2][i] + mid_pred(l.v[1][i], l.v[3][i], c.v[0][i]);
            c.v[1][i] = mv.v[1][i] + mid_pred(l.v[1][i], c.v[0][i], c.v[2][i]);
            c.v[3][i] = mv.v[3][i] + mid_pred(c.v[0][i], c.v[1][i], c.v[2][i]);
        }
    }
    cur[col] = c;
}

// ============================================================================
// 分像素滤波
// ============================================================================

/// 线性寻址取样, 越界夹取到缓冲区边界
#[inline]
fn px(src: &[u8], idx: isize) -> i32 {
    src[idx.clamp(0, src.len() as isize - 1) as usize] as i32
}

/// 色度 2 抽头滤波, 三种权重 (6:2 / 1:1 / 2:6)
#[inline]
fn cfilter(kind: u32, a: i32, b: i32) -> i32 {
    match kind {
        1 => (6 * a + 2 * b + 4) >> 3,
        2 => (a + b + 1) >> 1,
        _ => (2 * a + 6 * b + 4) >> 3,
    }
}

/// 亮度半像素 6 抽头滤波 (抽头 1/2, -2, 19/2, 19/2, -2, 1/2)
#[inline]
fn lfilter(src: &[u8], p: isize, step: isize) -> i32 {
    let a = (px(src, p) + px(src, p + step)) * 19 >> 1;
    let b = (px(src, p - step) + px(src, p + 2 * step)) * 2;
    let c = (px(src, p - 2 * step) + px(src, p + 3 * step)) >> 1;
    (a - b + c + 8) >> 4
}

/// 色度 8x8 子块分像素补偿 (相位 mode: 低 2 位水平, 高 2 位垂直)
fn mc_chroma_block(
    dst: &mut [u8],
    dpos: usize,
    dstride: usize,
    src: &[u8],
    sstride: usize,
    width: i32,
    height: i32,
    mv_x: i32,
    mv_y: i32,
    mode: u32,
) {
    if mv_x < 0 || mv_x >= width || mv_y < 0 || mv_y >= height {
        return;
    }
    let ss = sstride as isize;
    let base = mv_x as isize + mv_y as isize * ss;
    let h = mode & 3;
    let v = mode >> 2;

    if mode == 0 {
        for j in 0..8usize {
            for i in 0..8usize {
                dst[dpos + j * dstride + i] = px(src, base + j as isize * ss + i as isize) as u8;
            }
        }
    } else if v == 0 {
        for j in 0..8usize {
            for i in 0..8usize {
                let p = base + j as isize * ss + i as isize;
                dst[dpos + j * dstride + i] = clip_uint8(cfilter(h, px(src, p), px(src, p + 1)));
            }
        }
    } else if h == 0 {
        for j in 0..8usize {
            for i in 0..8usize {
                let p = base + j as isize * ss + i as isize;
                dst[dpos + j * dstride + i] = clip_uint8(cfilter(v, px(src, p), px(src, p + ss)));
            }
        }
    } else {
        // 水平-垂直级联, 中间缓冲 9 行
        let mut temp = [0u8; 8 * 9];
        for (r, row) in temp.chunks_exact_mut(8).enumerate() {
            for (i, t) in row.iter_mut().enumerate() {
                let p = base + r as isize * ss + i as isize;
                *t = clip_uint8(cfilter(h, px(src, p), px(src, p + 1)));
            }
        }
        for j in 0..8usize {
            for i in 0..8usize {
                dst[dpos + j * dstride + i] = clip_uint8(cfilter(
                    v,
                    temp[j * 8 + i] as i32,
                    temp[(j + 1) * 8 + i] as i32,
                ));
            }
        }
    }
}

/// 亮度 16x16 子块分像素补偿 (相位 mode: 位 0 水平, 位 1 垂直)
fn mc_luma_block(
    dst: &mut [u8],
    dpos: usize,
    dstride: usize,
    src: &[u8],
    sstride: usize,
    width: i32,
    height: i32,
    mv_x: i32,
    mv_y: i32,
    mode: u32,
) {
    if mv_x < 0 || mv_x >= width || mv_y < 0 || mv_y >= height {
        return;
    }
    let ss = sstride as isize;
    let base = mv_x as isize + mv_y as isize * ss;

    match mode {
        0 => {
            for j in 0..16usize {
                for i in 0..16usize {
                    dst[dpos + j * dstride + i] =
                        px(src, base + j as isize * ss + i as isize) as u8;
                }
            }
        }
        1 => {
            for j in 0..16usize {
                for i in 0..16usize {
                    dst[dpos + j * dstride + i] =
                        clip_uint8(lfilter(src, base + j as isize * ss + i as isize, 1));
                }
            }
        }
        2 => {
            for j in 0..16usize {
                for i in 0..16usize {
                    dst[dpos + j * dstride + i] =
                        clip_uint8(lfilter(src, base + j as isize * ss + i as isize, ss));
                }
            }
        }
        _ => {
            // 先水平滤波出 21 行中间块, 再垂直滤波
            let mut temp = [0u8; 21 * 16];
            let tbase = base - 2 * ss;
            for (r, row) in temp.chunks_exact_mut(16).enumerate() {
                for (j, t) in row.iter_mut().enumerate() {
                    *t = clip_uint8(lfilter(src, tbase + r as isize * ss + j as isize, 1));
                }
            }
            for j in 0..16usize {
                for i in 0..16usize {
                    dst[dpos + j * dstride + i] =
                        clip_uint8(lfilter(&temp, ((j + 2) * 16 + i) as isize, 16));
                }
            }
        }
    }
}

// ============================================================================
// 宏块级补偿入口
// ============================================================================

/// 亮度平面 4 个 16x16 子块的运动补偿 (半像素精度)
pub(super) fn mcompensate_luma(
    mv: &MVectors,
    x: usize,
    y: usize,
    dst: &mut [u8],
    dstride: usize,
    src: &[u8],
    sstride: usize,
    width: i32,
    height: i32,
) {
    for k in 0..4 {
        let sub_x = (k & 1) * 16;
        let sub_y = (k >> 1) * 16;
        let mv_x = (mv.v[k][0] >> 1) + (x + sub_x) as i32;
        let mv_y = (mv.v[k][1] >> 1) + (y + sub_y) as i32;
        let mode = (mv.v[k][0] & 1) as u32 | (((mv.v[k][1] & 1) as u32) << 1);
        let dpos = (y + sub_y) * dstride + x + sub_x;
        mc_luma_block(dst, dpos, dstride, src, sstride, width, height, mv_x, mv_y, mode);
    }
}

/// 色度平面 4 个 8x8 子块的运动补偿 (四分之一像素精度)
pub(super) fn mcompensate_chroma(
    mv: &MVectors,
    x: usize,
    y: usize,
    dst: &mut [u8],
    dstride: usize,
    src: &[u8],
    sstride: usize,
    width: i32,
    height: i32,
) {
    for k in 0..4 {
        let sub_x = (k & 1) * 8;
        let sub_y = (k >> 1) * 8;
        let mv_x = (mv.v[k][0] >> 2) + (x + sub_x) as i32;
        let mv_y = (mv.v[k][1] >> 2) + (y + sub_y) as i32;
        let mode = (mv.v[k][0] & 3) as u32 | (((mv.v[k][1] & 3) as u32) << 2);
        let dpos = (y + sub_y) * dstride + x + sub_x;
        mc_chroma_block(dst, dpos, dstride, src, sstride, width, height, mv_x, mv_y, mode);
    }
}
