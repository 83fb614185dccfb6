//! 通用常量.

/// BraTS 分割标签取值.
///
/// 类别编号不连续 (没有 3), 这是数据集本身的约定.
pub mod label {
    /// 背景.
    pub const BRATS_BACKGROUND: u8 = 0;

    /// 坏死肿瘤核心 (NCR/NET).
    pub const BRATS_NECROTIC: u8 = 1;

    /// 瘤周水肿 (ED).
    pub const BRATS_EDEMA: u8 = 2;

    /// 增强肿瘤 (ET).
    pub const BRATS_ENHANCING: u8 = 4;

    /// 单类别模式下的前景值.
    pub const FOREGROUND: u8 = 1;

    /// BraTS 的全部肿瘤类别, 升序.
    pub const BRATS_TUMOR_CLASSES: [u8; 3] = [BRATS_NECROTIC, BRATS_EDEMA, BRATS_ENHANCING];
}

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道暗灰色.
    pub const DARK_GRAY: u8 = 0b_0100_0000;

    /// 单通道灰色.
    pub const GRAY: u8 = 0b_1000_0000;

    /// 单通道亮灰色.
    pub const LIGHT_GRAY: u8 = 0b_1100_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;
}

/// 目标尺寸超过该值时, 补零目标使用 [`PAD_LARGE`], 否则使用 [`PAD_SMALL`].
pub const PAD_THRESHOLD: usize = 256;

/// 大尺寸输出时的补零目标边长.
pub const PAD_LARGE: usize = 256;

/// 小尺寸输出时的补零目标边长.
pub const PAD_SMALL: usize = 224;

/// 默认规范尺寸.
pub const DEFAULT_TARGET_SIZE: usize = 256;

/// 背景层默认降采样步长.
pub const DEFAULT_BACKGROUND_STRIDE: usize = 10;

/// 默认点大小.
pub const DEFAULT_MARKER_SIZE: u32 = 3;

/// 标签文件在路径中替代扫描类型的记号.
pub const SEGMENTATION_TOKEN: &str = "seg";
