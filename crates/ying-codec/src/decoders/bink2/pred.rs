//! DC 空间预测与中值预测函数
//!
//! Profile F 在浮点域预测 DC, Profile G 在整数域, 决策树完全相同,
//! 因此梯形展开只写一份, 对数值域做泛型.

use super::types::MbFlags;

/// DC 预测的数值域: Profile F 用 f32, Profile G 用 i32
pub(super) trait DcNum:
    Copy
    + Default
    + PartialOrd
    + core::ops::Add<Output = Self>
    + core::ops::Sub<Output = Self>
{
    const ZERO: Self;
    /// 无邻居可用时的角部种子值
    const BASE: Self;
    fn from_i32(v: i32) -> Self;
}

impl DcNum for f32 {
    const ZERO: Self = 0.0;
    const BASE: Self = 1024.0;
    fn from_i32(v: i32) -> Self {
        v as f32
    }
}

impl DcNum for i32 {
    const ZERO: Self = 0;
    const BASE: Self = 1024;
    fn from_i32(v: i32) -> Self {
        v
    }
}

fn vmax<T: PartialOrd>(a: T, b: T) -> T {
    if a > b { a } else { b }
}

fn vmin<T: PartialOrd>(a: T, b: T) -> T {
    if a > b { b } else { a }
}

/// 三值取中 (运动向量与量化指数预测)
pub(super) fn mid_pred(a: i32, b: i32, c: i32) -> i32 {
    a.max(b).min(c.max(a.min(b)))
}

/// 梯度约束中值预测: clamp(C + B - A) 到 [min3, max3]
pub(super) fn dc_mpred<T: DcNum>(a: T, b: T, c: T) -> T {
    vmin(vmax(c + b - a, vmin(vmin(a, b), c)), vmax(vmax(a, b), c))
}

/// 两值外推预测: clamp(2A - B) 到 [min(A,B), max(A,B)]
pub(super) fn dc_mpred2<T: DcNum>(a: T, b: T) -> T {
    vmin(vmax(a, b), vmax(vmin(a, b), a + a - b))
}

/// 8 位像素裁剪
pub(super) fn clip_uint8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// 亮度 16 点 DC 网格的空间预测
///
/// 解码出的增量 `tdc` 逐点叠加到预测值上并裁剪到 [mindc, maxdc].
/// 邻居数组 `l`/`t`/`lt` 为左/上/左上宏块的 DC 网格 (调用方已按
/// 列 0 夹取), 按 (left_col, top_row) 的 4 种组合选择预测源.
pub(super) fn predict_dc_luma<T: DcNum>(
    dc: &mut [T; 16],
    tdc: &[T; 16],
    l: &[T; 16],
    t: &[T; 16],
    lt: &[T; 16],
    flags: MbFlags,
    mindc: T,
    maxdc: T,
) {
    let clip = |v: T| vmin(vmax(v, mindc), maxdc);
    if flags.corner() {
        let seed = if mindc < T::ZERO { T::ZERO } else { T::BASE };
        dc[0] = clip(seed + tdc[0]);
        dc[1] = clip(dc[0] + tdc[1]);
        dc[2] = clip(dc_mpred2(dc[0], dc[1]) + tdc[2]);
        dc[3] = clip(dc_mpred(dc[0], dc[2], dc[1]) + tdc[3]);
        dc[4] = clip(dc_mpred2(dc[1], dc[3]) + tdc[4]);
        dc[5] = clip(dc[4] + tdc[5]);
        dc[6] = clip(dc_mpred(dc[1], dc[3], dc[4]) + tdc[6]);
        dc[7] = clip(dc_mpred(dc[4], dc[6], dc[5]) + tdc[7]);
        dc[8] = clip(dc_mpred2(dc[2], dc[3]) + tdc[8]);
        dc[9] = clip(dc_mpred(dc[2], dc[8], dc[3]) + tdc[9]);
        dc[10] = clip(dc_mpred2(dc[8], dc[9]) + tdc[10]);
        dc[11] = clip(dc_mpred(dc[8], dc[10], dc[9]) + tdc[11]);
        dc[12] = clip(dc_mpred(dc[3], dc[9], dc[6]) + tdc[12]);
        dc[13] = clip(dc_mpred(dc[6], dc[12], dc[7]) + tdc[13]);
        dc[14] = clip(dc_mpred(dc[9], dc[11], dc[12]) + tdc[14]);
        dc[15] = clip(dc_mpred(dc[12], dc[14], dc[13]) + tdc[15]);
    } else if flags.top_row {
        dc[0] = clip(dc_mpred2(l[5], l[7]) + tdc[0]);
        dc[1] = clip(dc[0] + tdc[1]);
        dc[2] = clip(dc_mpred(l[5], l[7], dc[0]) + tdc[2]);
        dc[3] = clip(dc_mpred(dc[0], dc[2], dc[1]) + tdc[3]);
        dc[4] = clip(dc_mpred2(dc[1], dc[3]) + tdc[4]);
        dc[5] = clip(dc[4] + tdc[5]);
        dc[6] = clip(dc_mpred(dc[1], dc[3], dc[4]) + tdc[6]);
        dc[7] = clip(dc_mpred(dc[4], dc[6], dc[5]) + tdc[7]);
        dc[8] = clip(dc_mpred(l[7], l[13], dc[2]) + tdc[8]);
        dc[9] = clip(dc_mpred(dc[2], dc[8], dc[3]) + tdc[9]);
        dc[10] = clip(dc_mpred(l[13], l[15], dc[8]) + tdc[10]);
        dc[11] = clip(dc_mpred(dc[8], dc[10], dc[9]) + tdc[11]);
        dc[12] = clip(dc_mpred(dc[3], dc[9], dc[6]) + tdc[12]);
        dc[13] = clip(dc_mpred(dc[6], dc[12], dc[7]) + tdc[13]);
        dc[14] = clip(dc_mpred(dc[9], dc[11], dc[12]) + tdc[14]);
        dc[15] = clip(dc_mpred(dc[12], dc[14], dc[13]) + tdc[15]);
    } else if flags.left_col {
        dc[0] = clip(dc_mpred2(t[10], t[11]) + tdc[0]);
        dc[1] = clip(dc_mpred(t[10], dc[0], t[11]) + tdc[1]);
        dc[2] = clip(dc_mpred2(dc[0], dc[1]) + tdc[2]);
        dc[3] = clip(dc_mpred(dc[0], dc[2], dc[1]) + tdc[3]);
        dc[4] = clip(dc_mpred(t[11], dc[1], t[14]) + tdc[4]);
        dc[5] = clip(dc_mpred(t[14], dc[4], t[15]) + tdc[5]);
        dc[6] = clip(dc_mpred(dc[1], dc[3], dc[4]) + tdc[6]);
        dc[7] = clip(dc_mpred(dc[4], dc[6], dc[5]) + tdc[7]);
        dc[8] = clip(dc_mpred2(dc[2], dc[3]) + tdc[8]);
        dc[9] = clip(dc_mpred(dc[2], dc[8], dc[3]) + tdc[9]);
        dc[10] = clip(dc_mpred2(dc[8], dc[9]) + tdc[10]);
        dc[11] = clip(dc_mpred(dc[8], dc[10], dc[9]) + tdc[11]);
        dc[12] = clip(dc_mpred(dc[3], dc[9], dc[6]) + tdc[12]);
        dc[13] = clip(dc_mpred(dc[6], dc[12], dc[7]) + tdc[13]);
        dc[14] = clip(dc_mpred(dc[9], dc[11], dc[12]) + tdc[14]);
        dc[15] = clip(dc_mpred(dc[12], dc[14], dc[13]) + tdc[15]);
    } else {
        dc[0] = clip(dc_mpred(lt[15], l[5], t[10]) + tdc[0]);
        dc[1] = clip(dc_mpred(t[10], dc[0], t[11]) + tdc[1]);
        dc[2] = clip(dc_mpred(l[5], l[7], dc[0]) + tdc[2]);
        dc[3] = clip(dc_mpred(dc[0], dc[2], dc[1]) + tdc[3]);
        dc[4] = clip(dc_mpred(t[11], dc[1], t[14]) + tdc[4]);
        dc[5] = clip(dc_mpred(t[14], dc[4], t[15]) + tdc[5]);
        dc[6] = clip(dc_mpred(dc[1], dc[3], dc[4]) + tdc[6]);
        dc[7] = clip(dc_mpred(dc[4], dc[6], dc[5]) + tdc[7]);
        dc[8] = clip(dc_mpred(l[7], l[13], dc[2]) + tdc[8]);
        dc[9] = clip(dc_mpred(dc[2], dc[8], dc[3]) + tdc[9]);
        dc[10] = clip(dc_mpred(l[13], l[15], dc[8]) + tdc[10]);
        dc[11] = clip(dc_mpred(dc[8], dc[10], dc[9]) + tdc[11]);
        dc[12] = clip(dc_mpred(dc[3], dc[9], dc[6]) + tdc[12]);
        dc[13] = clip(dc_mpred(dc[6], dc[12], dc[7]) + tdc[13]);
        dc[14] = clip(dc_mpred(dc[9], dc[11], dc[12]) + tdc[14]);
        dc[15] = clip(dc_mpred(dc[12], dc[14], dc[13]) + tdc[15]);
    }
}

/// 色度 2x2 DC 网格的空间预测 (邻居组合与亮度相同)
pub(super) fn predict_dc_chroma<T: DcNum>(
    dc: &mut [T; 16],
    tdc: &[T; 16],
    l: &[T; 16],
    t: &[T; 16],
    lt: &[T; 16],
    flags: MbFlags,
    mindc: T,
    maxdc: T,
) {
    let clip = |v: T| vmin(vmax(v, mindc), maxdc);
    if flags.corner() {
        let seed = if mindc < T::ZERO { T::ZERO } else { T::BASE };
        dc[0] = clip(seed + tdc[0]);
        dc[1] = clip(dc[0] + tdc[1]);
        dc[2] = clip(dc_mpred2(dc[0], dc[1]) + tdc[2]);
        dc[3] = clip(dc_mpred(dc[0], dc[2], dc[1]) + tdc[3]);
    } else if flags.top_row {
        dc[0] = clip(dc_mpred2(l[1], l[3]) + tdc[0]);
        dc[1] = clip(dc[0] + tdc[1]);
        dc[2] = clip(dc_mpred(l[1], l[3], dc[0]) + tdc[2]);
        dc[3] = clip(dc_mpred(dc[0], dc[2], dc[1]) + tdc[3]);
    } else if flags.left_col {
        dc[0] = clip(dc_mpred2(t[2], t[3]) + tdc[0]);
        dc[1] = clip(dc_mpred(t[2], dc[0], t[3]) + tdc[1]);
        dc[2] = clip(dc_mpred2(dc[0], dc[1]) + tdc[2]);
        dc[3] = clip(dc_mpred(dc[0], dc[2], dc[1]) + tdc[3]);
    } else {
        dc[0] = clip(dc_mpred(lt[3], l[1], t[2]) + tdc[0]);
        dc[1] = clip(dc_mpred(t[2], dc[0], t[3]) + tdc[1]);
        dc[2] = clip(dc_mpred(l[1], l[3], dc[0]) + tdc[2]);
        dc[3] = clip(dc_mpred(dc[0], dc[2], dc[1]) + tdc[3]);
    }
}

// ============================================================================
// INTRA 边缘平均填充 (非 INTRA 邻居的 DC 顶替值)
// ============================================================================

/// 8x8 块的三级成对平均, 得到一个近似均值 (和, 未除)
fn average_block(plane: &[u8], pos: usize, stride: usize) -> i32 {
    let mut sum = 0;
    for i in 0..8 {
        let p = pos + i;
        let avg_a = (plane[p] as i32 + plane[p + stride] as i32 + 1) >> 1;
        let avg_b = (plane[p + 2 * stride] as i32 + plane[p + 3 * stride] as i32 + 1) >> 1;
        let avg_c = (plane[p + 4 * stride] as i32 + plane[p + 5 * stride] as i32 + 1) >> 1;
        let avg_d = (plane[p + 6 * stride] as i32 + plane[p + 7 * stride] as i32 + 1) >> 1;
        let avg_e = (avg_a + avg_b + 1) >> 1;
        let avg_f = (avg_c + avg_d + 1) >> 1;
        sum += (avg_e + avg_f + 1) >> 1;
    }
    sum
}

/// 以重建像素均值填充亮度 16 点 DC 网格
pub(super) fn average_luma<T: DcNum>(
    plane: &[u8],
    stride: usize,
    x: usize,
    y: usize,
    dc: &mut [T; 16],
) {
    use super::tables::LUMA_REPOS;
    for (i, slot) in dc.iter_mut().enumerate() {
        let r = LUMA_REPOS[i] as usize;
        let pos = (y + (r >> 2) * 8) * stride + x + (r & 3) * 8;
        *slot = T::from_i32(average_block(plane, pos, stride));
    }
}

/// 以重建像素均值填充色度 4 点 DC 网格
pub(super) fn average_chroma<T: DcNum>(
    plane: &[u8],
    stride: usize,
    x: usize,
    y: usize,
    dc: &mut [T; 16],
) {
    for i in 0..4 {
        let pos = (y + (i >> 1) * 8) * stride + x + (i & 1) * 8;
        dc[i] = T::from_i32(average_block(plane, pos, stride));
    }
}
