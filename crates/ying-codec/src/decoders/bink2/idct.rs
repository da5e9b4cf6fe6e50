//! 8x8 可分离逆变换
//!
//! Profile F 为浮点蝶形 (AAN 系数), Profile G 为移位近似的定点蝶形.
//! 两者都提供 put (覆写目的块) 与 add (叠加到目的块, 残差累加) 两种输出.

use super::pred::clip_uint8;

// ============================================================================
// Profile F: 浮点
// ============================================================================

const SQRT2: f32 = 1.414_213_5;
const C_A: f32 = 1.847_759;
const C_B: f32 = 2.613_126;
const C_C: f32 = 1.082_392_2;

fn idct_1d_f(blk: &mut [f32; 64], off: usize, step: usize) {
    let t00 = blk[off + 2 * step] + blk[off + 6 * step];
    let t01 = (blk[off + 2 * step] - blk[off + 6 * step]) * SQRT2 - t00;
    let t02 = blk[off] + blk[off + 4 * step];
    let t03 = blk[off] - blk[off + 4 * step];
    let t04 = blk[off + 3 * step] + blk[off + 5 * step];
    let t05 = blk[off + 3 * step] - blk[off + 5 * step];
    let t06 = blk[off + step] + blk[off + 7 * step];
    let t07 = blk[off + step] - blk[off + 7 * step];
    let t08 = t02 + t00;
    let t09 = t02 - t00;
    let t10 = t03 + t01;
    let t11 = t03 - t01;
    let t12 = t06 + t04;
    let t13 = (t06 - t04) * SQRT2;
    let t14 = (t07 - t05) * C_A;
    let t15 = t05 * C_B + t14 - t12;
    let t16 = t13 - t15;
    let t17 = t07 * C_C - t14 + t16;

    blk[off] = t08 + t12;
    blk[off + step] = t10 + t15;
    blk[off + 2 * step] = t11 + t16;
    blk[off + 3 * step] = t09 - t17;
    blk[off + 4 * step] = t09 + t17;
    blk[off + 5 * step] = t11 - t16;
    blk[off + 6 * step] = t10 - t15;
    blk[off + 7 * step] = t08 - t12;
}

/// 浮点 IDCT, 覆写输出
///
/// DC 项预加 512.5 的舍入偏置, 输出时减 512 再截断裁剪.
pub(super) fn idct_put_f(dst: &mut [u8], pos: usize, stride: usize, block: &mut [f32; 64]) {
    block[0] += 512.5;

    for i in 0..8 {
        idct_1d_f(block, i, 8);
    }
    for i in 0..8 {
        idct_1d_f(block, i * 8, 1);
        for j in 0..8 {
            dst[pos + i * stride + j] = clip_uint8((block[i * 8 + j] - 512.0) as i32);
        }
    }
}

/// 浮点 IDCT, 叠加输出 (RESIDUE 残差累加)
pub(super) fn idct_add_f(dst: &mut [u8], pos: usize, stride: usize, block: &mut [f32; 64]) {
    block[0] += 512.5;

    for i in 0..8 {
        idct_1d_f(block, i, 8);
    }
    for i in 0..8 {
        idct_1d_f(block, i * 8, 1);
        for j in 0..8 {
            let p = pos + i * stride + j;
            dst[p] = clip_uint8((dst[p] as f32 + block[i * 8 + j] - 512.0) as i32);
        }
    }
}

// ============================================================================
// Profile G: 定点
// ============================================================================

fn mul_a(v: i32) -> i32 {
    v + (v >> 2)
}

fn mul_b(v: i32) -> i32 {
    v >> 1
}

fn mul_c(v: i32) -> i32 {
    v - (v >> 2) - (v >> 4)
}

fn mul_d(v: i32) -> i32 {
    v + (v >> 2) - (v >> 4)
}

fn mul_e(v: i32) -> i32 {
    v >> 2
}

fn idct_1d_g(blk: &mut [i16; 64], off: usize, step: usize, shift: u32) {
    let x = |k: usize| blk[off + k * step] as i32;
    let tmp00 = x(3) + x(5);
    let tmp01 = x(3) - x(5);
    let tmp02 = mul_a(x(2)) + mul_b(x(6));
    let tmp03 = mul_b(x(2)) - mul_a(x(6));
    let tmp0 = (x(0) + x(4)) + tmp02;
    let tmp1 = (x(0) + x(4)) - tmp02;
    let tmp2 = x(0) - x(4);
    let tmp3 = x(1) + tmp00;
    let tmp4 = x(1) - tmp00;
    let tmp5 = tmp01 + x(7);
    let tmp6 = tmp01 - x(7);
    let tmp7 = tmp4 + mul_c(tmp6);
    let tmp8 = mul_c(tmp4) - tmp6;
    let tmp9 = mul_d(tmp3) + mul_e(tmp5);
    let tmp10 = mul_e(tmp3) - mul_d(tmp5);
    let tmp11 = tmp2 + tmp03;
    let tmp12 = tmp2 - tmp03;

    blk[off] = ((tmp0 + tmp9) >> shift) as i16;
    blk[off + step] = ((tmp11 + tmp7) >> shift) as i16;
    blk[off + 2 * step] = ((tmp12 + tmp8) >> shift) as i16;
    blk[off + 3 * step] = ((tmp1 + tmp10) >> shift) as i16;
    blk[off + 4 * step] = ((tmp1 - tmp10) >> shift) as i16;
    blk[off + 5 * step] = ((tmp12 - tmp8) >> shift) as i16;
    blk[off + 6 * step] = ((tmp11 - tmp7) >> shift) as i16;
    blk[off + 7 * step] = ((tmp0 - tmp9) >> shift) as i16;
}

/// 定点 IDCT, 覆写输出
///
/// 第一遍无移位, 第二遍右移 6; 输出按转置顺序取值.
pub(super) fn idct_put_g(dst: &mut [u8], pos: usize, stride: usize, block: &mut [i16; 64]) {
    for i in 0..8 {
        idct_1d_g(block, i, 8, 0);
    }
    for i in 0..8 {
        idct_1d_g(block, i * 8, 1, 6);
    }
    for i in 0..8 {
        for j in 0..8 {
            dst[pos + i * stride + j] = clip_uint8(block[j * 8 + i] as i32);
        }
    }
}

/// 定点 IDCT, 叠加输出
pub(super) fn idct_add_g(dst: &mut [u8], pos: usize, stride: usize, block: &mut [i16; 64]) {
    for i in 0..8 {
        idct_1d_g(block, i, 8, 0);
    }
    for i in 0..8 {
        idct_1d_g(block, i * 8, 1, 6);
    }
    for i in 0..8 {
        for j in 0..8 {
            let p = pos + i * stride + j;
            dst[p] = clip_uint8(dst[p] as i32 + block[j * 8 + i] as i32);
        }
    }
}
