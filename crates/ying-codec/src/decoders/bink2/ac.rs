//! AC 系数的熵解码与反量化
//!
//! 按扫描序从索引 1 开始, 交替读取幅值与零游程. 游程符号 13 表示
//! 接下来 7 个系数连续非零 (无游程码), 符号 11 逃逸为 6 位原始游程,
//! 符号 12 为终止.

use ying_core::{YingError, YingResult};

use super::bitreader::BitReader;
use super::tables::{AC_NEXT_SKIPS, BINK2F_SKIPS, BINK2G_SKIPS};
use super::vlc::vlcs;

fn invalid_ac() -> YingError {
    YingError::InvalidData("AC 码字无效".into())
}

/// Profile F: 解码一组 4 个 8x8 子块的 AC 系数 (浮点反量化)
///
/// `cbp` 低 4 位标记子块是否携带数据, 位 16+i 选择第二套码表.
/// 系数 = 幅值 x AC 量化值 x 反量化矩阵[扫描位置].
pub(super) fn decode_ac_f(
    gb: &mut BitReader,
    scan: &[u8; 64],
    block: &mut [[f32; 64]; 4],
    cbp: u32,
    q: f32,
    qmat: &[f32; 64],
) -> YingResult<()> {
    let v = vlcs();
    let mut cbp = cbp;

    for i in 0..4 {
        if cbp & 1 != 0 {
            let (val_vlc, skip_vlc) = if cbp & 0x10000 != 0 {
                (&v.ac_val_f[1], &v.ac_skip_f[1])
            } else {
                (&v.ac_val_f[0], &v.ac_skip_f[0])
            };

            let mut next = 0i32;
            let mut idx = 1usize;
            while idx < 64 {
                let mut val = val_vlc.decode(gb).ok_or_else(invalid_ac)? as i32;
                if val >= 4 {
                    let bits = (val - 3) as u32;
                    val = gb.read_bits(bits) as i32 + (1 << bits) + 2;
                }
                val = gb.read_signed(val);

                let sc = scan[idx] as usize;
                block[i][sc] = val as f32 * q * qmat[sc];
                if idx > 62 {
                    break;
                }
                idx += 1;
                next -= 1;
                if next < 1 {
                    let sym = skip_vlc.decode(gb).ok_or_else(invalid_ac)? as usize;
                    next = AC_NEXT_SKIPS[sym] as i32;
                    let mut skip = BINK2F_SKIPS[sym] as usize;
                    if skip == 11 {
                        skip = gb.read_bits(6) as usize;
                    }
                    idx += skip;
                }
            }
        }
        cbp >>= 1;
    }
    Ok(())
}

/// Profile G: 解码一组 4 个 8x8 子块的 AC 系数 (定点反量化)
///
/// 幅值为一元码 + 逃逸; 系数 = (幅值 x 矩阵[档][位置] << (q >> 2) + 64) >> 7,
/// 档位取量化指数低 2 位. 游程在幅值之前读取.
pub(super) fn decode_ac_g(
    gb: &mut BitReader,
    scan: &[u8; 64],
    block: &mut [[i16; 64]; 4],
    cbp: u32,
    q: i32,
    qmat: &[[u16; 64]; 4],
) -> YingResult<()> {
    if cbp & 0xF == 0 {
        return Ok(());
    }

    let skip_vlc = if cbp & 0xFFFF_0000 != 0 {
        &vlcs().ac_skip_g[1]
    } else {
        &vlcs().ac_skip_g[0]
    };
    let level = &qmat[(q & 3) as usize];
    let scale = q >> 2;

    let mut cbp = cbp;
    for i in 0..4 {
        if cbp & 1 != 0 {
            let mut next = 0i32;
            let mut idx = 1usize;
            while idx < 64 {
                next -= 1;
                if next < 1 {
                    let sym = skip_vlc.decode(gb).ok_or_else(invalid_ac)? as usize;
                    next = AC_NEXT_SKIPS[sym] as i32;
                    let mut skip = BINK2G_SKIPS[sym] as usize;
                    if skip == 11 {
                        skip = gb.read_bits(6) as usize;
                    }
                    idx += skip;
                    if idx >= 64 {
                        break;
                    }
                }

                let mut val = gb.read_unary(false, 12) as i32 + 1;
                if val > 3 {
                    let bits = (val - 3) as u32;
                    val = gb.read_bits(bits) as i32 + (1 << bits) + 2;
                }
                val = gb.read_signed(val);
                let sc = scan[idx] as usize;
                block[i][sc] = ((((val as i64 * level[sc] as i64) << scale) + 64) >> 7) as i16;
                idx += 1;
            }
        }
        cbp >>= 1;
    }
    Ok(())
}
