//! MRI scan/label 水平切片视图.

use crate::Idx2d;
use ndarray::iter::IndexedIter;
use ndarray::{ArrayView2, Ix2};

/// 不可变、借用的二维水平 MRI 扫描切片.
pub struct ScanSlice<'a> {
    /// 底层数据的轻量级视图.
    data: ArrayView2<'a, f32>,
}

/// 不可变、借用的二维水平分割标签切片.
pub struct LabelSlice<'a> {
    /// 底层数据的轻量级视图.
    data: ArrayView2<'a, u8>,
}

macro_rules! impl_slice_immut {
    ($slice: ident, $elem: ty) => {
        impl<'a> $slice<'a> {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: ArrayView2<'a, $elem>) -> Self {
                Self { data }
            }

            /// 获取带 (高, 宽) 索引的像素迭代器, 行优先.
            #[inline]
            pub fn indexed_iter(&self) -> IndexedIter<'_, $elem, Ix2> {
                self.data.indexed_iter()
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                self.data.dim()
            }
        }
    };
}

impl_slice_immut!(ScanSlice, f32);
impl_slice_immut!(LabelSlice, u8);

impl ScanSlice<'_> {
    /// 切片内的最大强度. 空切片或全 NaN 时返回 `None`.
    pub fn max(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f32::max)
    }
}
