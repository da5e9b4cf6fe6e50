//! VLC (变长编码) 表定义与解码
//!
//! 所有码表以 (码长, 码字) 对的形式给出, 码字按小端位序 (LSB-first)
//! 从码流读出. 解码表在进程内只构建一次, 此后只读共享.

use std::sync::OnceLock;

use super::bitreader::BitReader;

/// 查找表覆盖的最大码长
pub(super) const VLC_MAX_BITS: u32 = 9;

/// VLC 解码表
///
/// 平坦查找表: peek(VLC_MAX_BITS) 直接索引得到 (码长, 符号).
/// 码长 0 表示该位型不对应任何码字.
pub(super) struct Vlc {
    lut: Box<[(u8, u8)]>,
}

impl Vlc {
    /// 从 (码字, 码长) 表构建
    ///
    /// 每个码字左侧 (高位方向) 补齐所有可能的后续位组合.
    fn build(codes: &[u16], bits: &[u8]) -> Self {
        let mut lut = vec![(0u8, 0u8); 1 << VLC_MAX_BITS].into_boxed_slice();
        for (sym, (&code, &len)) in codes.iter().zip(bits).enumerate() {
            debug_assert!(len > 0 && (len as u32) <= VLC_MAX_BITS);
            let padding = VLC_MAX_BITS - len as u32;
            for high in 0..(1usize << padding) {
                lut[code as usize | (high << len)] = (len, sym as u8);
            }
        }
        Self { lut }
    }

    /// 解码一个符号, 消耗对应码长的位
    ///
    /// 码流中出现表外位型时返回 None (合法码流不会发生, 但必须检查).
    pub fn decode(&self, gb: &mut BitReader) -> Option<u8> {
        let (len, sym) = self.lut[gb.peek_bits(VLC_MAX_BITS) as usize];
        if len == 0 {
            return None;
        }
        gb.skip_bits(len as u32);
        Some(sym)
    }
}

// ============================================================================
// Profile F 码表
// ============================================================================

/// 量化增量码表 (符号即增量幅值 0-15)
pub(super) const BINK2F_QUANT_CODES: [u16; 16] = [
    0x01, 0x02, 0x04, 0x08, 0x10, 0x30, 0x50, 0x70,
    0x00, 0x20, 0x40, 0x60, 0x80, 0xA0, 0xC0, 0xE0,
];

pub(super) const BINK2F_QUANT_BITS: [u8; 16] = [1, 2, 3, 4, 7, 7, 7, 7, 8, 8, 8, 8, 8, 8, 8, 8];

/// AC 幅值类别码表, 两套 (按子块 CBP 高半掩码选择)
pub(super) const BINK2F_AC_VAL_CODES: [[u16; 13]; 2] = [
    [
        0x04, 0x01, 0x02, 0x00, 0x08, 0x18, 0xF8, 0x178, 0x138,
        0x38, 0x1B8, 0x78, 0xB8,
    ],
    [
        0x0A, 0x01, 0x04, 0x08, 0x06, 0x00, 0x02, 0x1A, 0x2A,
        0x16A, 0x1EA, 0x6A, 0xEA,
    ],
];

pub(super) const BINK2F_AC_VAL_BITS: [[u8; 13]; 2] = [
    [3, 1, 2, 4, 5, 6, 8, 9, 9, 9, 9, 9, 9],
    [6, 1, 3, 4, 3, 4, 4, 5, 7, 9, 9, 9, 9],
];

/// AC 零游程码表
pub(super) const BINK2F_AC_SKIP_CODES: [[u16; 14]; 2] = [
    [
        0x00, 0x01, 0x0D, 0x15, 0x45, 0x85, 0xA5, 0x165,
        0x65, 0x1E5, 0xE5, 0x25, 0x03, 0x05,
    ],
    [
        0x00, 0x01, 0x03, 0x07, 0x1F, 0x1B, 0x0F, 0x2F,
        0x5B, 0xDB, 0x1DB, 0x3B, 0x05, 0x0B,
    ],
];

pub(super) const BINK2F_AC_SKIP_BITS: [[u8; 14]; 2] = [
    [1, 3, 4, 5, 7, 8, 8, 9, 9, 9, 9, 8, 2, 8],
    [1, 3, 4, 4, 5, 7, 6, 6, 8, 9, 9, 6, 3, 5],
];

// ============================================================================
// Profile G 码表
// ============================================================================

pub(super) const BINK2G_AC_SKIP_CODES: [[u16; 14]; 2] = [
    [
        0x01, 0x00, 0x004, 0x02C, 0x06C, 0x0C, 0x4C,
        0xAC, 0xEC, 0x12C, 0x16C, 0x1AC, 0x02, 0x1C,
    ],
    [
        0x01, 0x04, 0x00, 0x08, 0x02, 0x32, 0x0A,
        0x12, 0x3A, 0x7A, 0xFA, 0x72, 0x06, 0x1A,
    ],
];

pub(super) const BINK2G_AC_SKIP_BITS: [[u8; 14]; 2] = [
    [1, 3, 4, 9, 9, 7, 7, 9, 8, 9, 9, 9, 2, 5],
    [1, 3, 4, 4, 5, 7, 5, 6, 7, 8, 8, 7, 3, 6],
];

/// 运动向量分量码表 (符号 0-15, 8-14 映射为负值, 15 为逃逸)
pub(super) const BINK2G_MV_CODES: [u16; 16] = [
    0x01, 0x06, 0x0C, 0x1C, 0x18, 0x38, 0x58, 0x78,
    0x68, 0x48, 0x28, 0x08, 0x14, 0x04, 0x02, 0x00,
];

pub(super) const BINK2G_MV_BITS: [u8; 16] = [1, 3, 5, 5, 7, 7, 7, 7, 7, 7, 7, 7, 5, 5, 3, 4];

// ============================================================================
// 一次性构建的解码表集合
// ============================================================================

/// Bink2 全部 VLC 解码表
pub(super) struct Bink2Vlcs {
    /// Profile F 量化增量
    pub quant_f: Vlc,
    /// Profile F AC 幅值 (两套)
    pub ac_val_f: [Vlc; 2],
    /// Profile F AC 零游程 (两套)
    pub ac_skip_f: [Vlc; 2],
    /// Profile G AC 零游程 (两套)
    pub ac_skip_g: [Vlc; 2],
    /// Profile G 运动向量分量
    pub mv_g: Vlc,
}

/// 全局解码表 (延迟初始化, 进程生命周期内只读)
static VLCS: OnceLock<Bink2Vlcs> = OnceLock::new();

pub(super) fn vlcs() -> &'static Bink2Vlcs {
    VLCS.get_or_init(|| Bink2Vlcs {
        quant_f: Vlc::build(&BINK2F_QUANT_CODES, &BINK2F_QUANT_BITS),
        ac_val_f: [
            Vlc::build(&BINK2F_AC_VAL_CODES[0], &BINK2F_AC_VAL_BITS[0]),
            Vlc::build(&BINK2F_AC_VAL_CODES[1], &BINK2F_AC_VAL_BITS[1]),
        ],
        ac_skip_f: [
            Vlc::build(&BINK2F_AC_SKIP_CODES[0], &BINK2F_AC_SKIP_BITS[0]),
            Vlc::build(&BINK2F_AC_SKIP_CODES[1], &BINK2F_AC_SKIP_BITS[1]),
        ],
        ac_skip_g: [
            Vlc::build(&BINK2G_AC_SKIP_CODES[0], &BINK2G_AC_SKIP_BITS[0]),
            Vlc::build(&BINK2G_AC_SKIP_CODES[1], &BINK2G_AC_SKIP_BITS[1]),
        ],
        mv_g: Vlc::build(&BINK2G_MV_CODES, &BINK2G_MV_BITS),
    })
}
