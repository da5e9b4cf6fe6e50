//! 类型定义 (宏块类型, 边界标志, 运动向量, 行间预测状态)

use bitflags::bitflags;

/// extradata 标志字: 码流带独立 alpha 平面
pub(super) const BINK_FLAG_ALPHA: u32 = 0x0010_0000;

bitflags! {
    /// 压缩包头部的 32 位帧级标志字中已知的位
    ///
    /// 其余位含义未知, 原样保留.
    #[derive(Debug, Clone, Copy)]
    pub(super) struct FrameFlags: u32 {
        /// 存在行/列 CBP 边信息位图
        const EDGE_CBP_PRESENT = 0x10000;
        /// 行 CBP 位图缺省 (不在码流中)
        const ROW_CBP_ABSENT = 0x8000;
        /// 列 CBP 位图缺省
        const COL_CBP_ABSENT = 0x4000;
        /// 亮度 CBP 为空时不编码高半复制位
        const IMPLICIT_EMPTY_CBP = 0x40000;
    }
}

/// 宏块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum BlockType {
    /// 帧内 DCT 块
    #[default]
    Intra,
    /// 跳过块 (从参考帧原位拷贝)
    Skip,
    /// 运动补偿块 (带位移的参考帧拷贝)
    Motion,
    /// 运动补偿 + 残差叠加块
    Residue,
}

impl BlockType {
    /// 从 2 位类型字段映射
    pub fn from_index(v: u32) -> Self {
        match v & 3 {
            0 => Self::Intra,
            1 => Self::Skip,
            2 => Self::Motion,
            _ => Self::Residue,
        }
    }
}

/// 宏块边界标志
///
/// 每个宏块计算一次, 代替按位或的整数标志. 预测器按
/// (left_col, top_row) 的 4 种组合选择不同的邻居集合.
#[derive(Debug, Clone, Copy)]
pub(super) struct MbFlags {
    /// 位于 slice 首行
    pub top_row: bool,
    /// 位于帧最左列
    pub left_col: bool,
    /// 位于第二列
    #[allow(dead_code)]
    pub second_col: bool,
    /// 右边缘宏块 (部分超出声明宽度)
    #[allow(dead_code)]
    pub right_edge: bool,
}

impl MbFlags {
    pub fn new(x: usize, y: usize, slice_start: usize, width: usize) -> Self {
        Self {
            top_row: y == slice_start,
            left_col: x == 0,
            second_col: x == 32,
            right_edge: x + 32 >= width,
        }
    }

    /// 帧/slice 左上角宏块
    pub fn corner(&self) -> bool {
        self.top_row && self.left_col
    }

    /// 无空间邻居的合成标志 (帧间残差 DC 预测走角部情形)
    pub fn no_neighbors() -> Self {
        Self {
            top_row: true,
            left_col: true,
            second_col: false,
            right_edge: false,
        }
    }
}

/// 宏块位置上下文
pub(super) struct MbContext {
    /// 宏块列索引
    pub col: usize,
    /// 亮度平面左上角横坐标
    pub x: usize,
    /// 亮度平面左上角纵坐标 (帧内绝对行)
    pub y: usize,
    pub flags: MbFlags,
}

/// 一个宏块的运动向量组 (4 个子块 x 两个分量)
#[derive(Debug, Clone, Copy)]
pub(super) struct MVectors {
    pub v: [[i32; 2]; 4],
    /// 码流中实际编码的向量个数 (Profile G 单向量模式为 1)
    pub nb_vectors: usize,
}

impl Default for MVectors {
    fn default() -> Self {
        Self {
            v: [[0; 2]; 4],
            nb_vectors: 0,
        }
    }
}

/// 每宏块列的 DC 预测值 (4 个分量, 亮度 16 点 / 色度 4 点)
#[derive(Debug, Clone, Copy)]
pub(super) struct DcState<T> {
    pub dc: [[T; 16]; 4],
}

impl<T: Copy + Default> Default for DcState<T> {
    fn default() -> Self {
        Self {
            dc: [[T::default(); 16]; 4],
        }
    }
}

/// Profile G 的量化指数预测状态
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct QuantPair {
    pub intra_q: i32,
    pub inter_q: i32,
}

/// 行选择: 上一行或当前行的预测状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Row {
    Prev,
    Cur,
}

/// 行间预测状态的双缓冲
///
/// current 为正在解码的行, prev 为上一行的定稿值.
/// 行边界处通过 active 索引翻转完成交换, 避免指针交换式的别名问题.
pub(super) struct PingPong<T> {
    bufs: [Vec<T>; 2],
    active: usize,
}

impl<T: Clone + Default> PingPong<T> {
    pub fn new(cols: usize) -> Self {
        Self {
            bufs: [vec![T::default(); cols], vec![T::default(); cols]],
            active: 0,
        }
    }

    pub fn current(&self) -> &[T] {
        &self.bufs[self.active]
    }

    pub fn current_mut(&mut self) -> &mut [T] {
        &mut self.bufs[self.active]
    }

    pub fn prev(&self) -> &[T] {
        &self.bufs[self.active ^ 1]
    }

    pub fn prev_mut(&mut self) -> &mut [T] {
        &mut self.bufs[self.active ^ 1]
    }

    /// 同时借出可写的当前行与只读的上一行
    pub fn split_mut(&mut self) -> (&mut [T], &[T]) {
        let [a, b] = &mut self.bufs;
        if self.active == 0 {
            (a.as_mut_slice(), b.as_slice())
        } else {
            (b.as_mut_slice(), a.as_slice())
        }
    }

    /// 行边界交换: current 变为 prev
    pub fn swap(&mut self) {
        self.active ^= 1;
    }

    pub fn reset_current(&mut self) {
        self.bufs[self.active].fill(T::default());
    }

    pub fn reset_prev(&mut self) {
        self.bufs[self.active ^ 1].fill(T::default());
    }
}
