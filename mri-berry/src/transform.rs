//! 二维切片的规范化变换: 对称补零 + 缩放.
//!
//! 先补零到方形再缩放, 可以保证任意输出尺寸下都不会产生宽高比畸变.

use crate::consts::{PAD_LARGE, PAD_SMALL, PAD_THRESHOLD};
use crate::Idx2d;
use ndarray::{s, Array2, ArrayView2};
use num::Zero;
use std::num::NonZeroUsize;

/// 补零目标的选择规则.
///
/// 目标尺寸 `> threshold` 时补零到 `large`, 否则补零到 `small`.
/// 默认值来自 BraTS 的两种常用输出尺寸.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PadPolicy {
    /// 阈值.
    pub threshold: usize,

    /// 大尺寸补零目标.
    pub large: usize,

    /// 小尺寸补零目标.
    pub small: usize,
}

impl Default for PadPolicy {
    #[inline]
    fn default() -> Self {
        Self {
            threshold: PAD_THRESHOLD,
            large: PAD_LARGE,
            small: PAD_SMALL,
        }
    }
}

impl PadPolicy {
    /// 给定规范尺寸, 求补零目标边长.
    #[inline]
    pub fn pad_size(&self, target: usize) -> usize {
        if target > self.threshold {
            self.large
        } else {
            self.small
        }
    }
}

/// 求一个方向上的 (前, 后) 补零量. 已经不小于 `min_len` 时不补.
///
/// 多出的一个像素补在后面.
#[inline]
fn pad_amount(len: usize, min_len: usize) -> (usize, usize) {
    let total = min_len.saturating_sub(len);
    let before = total / 2;
    (before, total - before)
}

/// 将二维图像用零对称补齐到至少 `min_side × min_side`.
///
/// 已经足够大的方向保持不变, 不做裁剪.
pub fn pad_symmetric<T: Copy + Zero>(img: ArrayView2<T>, min_side: usize) -> Array2<T> {
    let (h, w) = img.dim();
    let (top, bottom) = pad_amount(h, min_side);
    let (left, right) = pad_amount(w, min_side);

    let mut out = Array2::zeros((h + top + bottom, w + left + right));
    out.slice_mut(s![top..top + h, left..left + w]).assign(&img);
    out
}

/// 目标像素 `dst` 在源图像上的采样坐标 (像素中心对齐), 截断到 `[0, src_len - 1]`.
#[inline]
fn center_aligned(dst: usize, scale: f32, src_len: usize) -> f32 {
    let x = (dst as f32 + 0.5) * scale - 0.5;
    x.clamp(0.0, (src_len - 1) as f32)
}

/// 双线性插值采样. `y`, `x` 必须已经落在图像范围内.
#[inline]
fn bilinear_interpolate(img: &ArrayView2<f32>, y: f32, x: f32) -> f32 {
    let (height, width) = img.dim();

    let y0 = y.floor() as usize;
    let x0 = x.floor() as usize;
    let y1 = (y0 + 1).min(height - 1);
    let x1 = (x0 + 1).min(width - 1);

    let dy = y - y0 as f32;
    let dx = x - x0 as f32;
    let one_minus_dx = 1.0 - dx;
    let one_minus_dy = 1.0 - dy;

    let v00 = img[[y0, x0]];
    let v01 = img[[y0, x1]];
    let v10 = img[[y1, x0]];
    let v11 = img[[y1, x1]];

    let v0 = v00.mul_add(one_minus_dx, v01 * dx);
    let v1 = v10.mul_add(one_minus_dx, v11 * dx);

    v0.mul_add(one_minus_dy, v1 * dy)
}

/// 用双线性插值将强度图像缩放为 `(out_h, out_w)`.
///
/// 空图像缩放结果为全零.
pub fn resize_bilinear(img: ArrayView2<f32>, (out_h, out_w): Idx2d) -> Array2<f32> {
    let (h, w) = img.dim();
    if h == 0 || w == 0 {
        return Array2::zeros((out_h, out_w));
    }
    let scale_y = h as f32 / out_h as f32;
    let scale_x = w as f32 / out_w as f32;

    Array2::from_shape_fn((out_h, out_w), |(oy, ox)| {
        let y = center_aligned(oy, scale_y, h);
        let x = center_aligned(ox, scale_x, w);
        bilinear_interpolate(&img, y, x)
    })
}

/// 用最近邻采样将图像缩放为 `(out_h, out_w)`.
///
/// 输出中的每个值都直接取自输入, 因此用于标签时不会产生新的类别.
/// 空图像缩放结果为全零.
pub fn resize_nearest<T: Copy + Zero>(img: ArrayView2<T>, (out_h, out_w): Idx2d) -> Array2<T> {
    let (h, w) = img.dim();
    if h == 0 || w == 0 {
        return Array2::zeros((out_h, out_w));
    }
    let scale_y = h as f64 / out_h as f64;
    let scale_x = w as f64 / out_w as f64;

    Array2::from_shape_fn((out_h, out_w), |(oy, ox)| {
        let y = ((oy as f64 * scale_y).floor() as usize).min(h - 1);
        let x = ((ox as f64 * scale_x).floor() as usize).min(w - 1);
        img[[y, x]]
    })
}

/// 单个切片对的规范化器: 先补零, 再缩放到 `target × target`.
#[derive(Debug, Clone, Copy)]
pub struct SliceResizer {
    target: NonZeroUsize,
    pad: usize,
}

impl SliceResizer {
    /// 以规范尺寸 `target` 和补零规则 `policy` 构建.
    #[inline]
    pub fn new(target: NonZeroUsize, policy: PadPolicy) -> Self {
        Self {
            target,
            pad: policy.pad_size(target.get()),
        }
    }

    /// 规范尺寸.
    #[inline]
    pub fn target(&self) -> usize {
        self.target.get()
    }

    /// 补零目标边长.
    #[inline]
    pub fn pad_size(&self) -> usize {
        self.pad
    }

    /// 变换扫描切片 (双线性).
    pub fn resize_scan(&self, img: ArrayView2<f32>) -> Array2<f32> {
        let padded = pad_symmetric(img, self.pad);
        resize_bilinear(padded.view(), (self.target(), self.target()))
    }

    /// 变换标签切片 (最近邻).
    pub fn resize_label(&self, img: ArrayView2<u8>) -> Array2<u8> {
        let padded = pad_symmetric(img, self.pad);
        resize_nearest(padded.view(), (self.target(), self.target()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use std::collections::HashSet;

    fn f32_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_pad_policy() {
        let p = PadPolicy::default();
        assert_eq!(p.pad_size(128), 224);
        assert_eq!(p.pad_size(256), 224);
        assert_eq!(p.pad_size(257), 256);
    }

    #[test]
    fn test_pad_symmetric() {
        let img = array![[1u8, 2], [3, 4]];
        let out = pad_symmetric(img.view(), 5);
        assert_eq!(out.dim(), (5, 5));
        // 前 1 后 2.
        assert_eq!(out[[1, 1]], 1);
        assert_eq!(out[[2, 2]], 4);
        assert_eq!(out.iter().filter(|v| **v != 0).count(), 4);

        // 已经足够大时不补.
        let big = Array2::<f32>::ones((6, 3));
        let out = pad_symmetric(big.view(), 4);
        assert_eq!(out.dim(), (6, 4));
        // 只差一列时补在右侧.
        assert_eq!(out.column(0).sum(), 6.0);
        assert_eq!(out.column(3).sum(), 0.0);
    }

    #[test]
    fn test_resize_identity() {
        let img = Array2::from_shape_fn((7, 7), |(h, w)| (h * 7 + w) as f32);
        assert_eq!(resize_bilinear(img.view(), (7, 7)), img);

        let lbl = img.mapv(|v| v as u8);
        assert_eq!(resize_nearest(lbl.view(), (7, 7)), lbl);
    }

    #[test]
    fn test_resize_bilinear_upscale() {
        let img = array![[0.0f32, 2.0], [2.0, 4.0]];
        let out = resize_bilinear(img.view(), (4, 4));
        // 角点被截断到源图像边缘.
        assert!(f32_eq(out[[0, 0]], 0.0));
        assert!(f32_eq(out[[3, 3]], 4.0));
        // (0.5*0.5 - 0.5 = -0.25 -> 0), (1.5*0.5 - 0.5 = 0.25).
        assert!(f32_eq(out[[0, 1]], 0.5));
        assert!(f32_eq(out[[1, 1]], 1.0));
    }

    #[test]
    fn test_resize_nearest_no_new_labels() {
        let img = Array2::from_shape_fn((240, 240), |(h, w)| match (h / 40 + w / 60) % 4 {
            0 => 0u8,
            1 => 1,
            2 => 2,
            _ => 4,
        });
        let src: HashSet<u8> = img.iter().copied().collect();
        for n in [1, 7, 64, 128, 300] {
            let out = resize_nearest(img.view(), (n, n));
            assert_eq!(out.dim(), (n, n));
            assert!(out.iter().all(|v| src.contains(v)));
        }
    }

    #[test]
    fn test_slice_resizer_shapes() {
        let r = SliceResizer::new(NonZeroUsize::new(128).unwrap(), PadPolicy::default());
        assert_eq!(r.pad_size(), 224);

        let scan = Array2::<f32>::ones((240, 200));
        let out = r.resize_scan(scan.view());
        assert_eq!(out.dim(), (128, 128));
        // 宽度方向补了 24 列零, 左右各 12.
        assert!(f32_eq(out[[64, 0]], 0.0));
        assert!(f32_eq(out[[64, 64]], 1.0));

        let lbl = Array2::<u8>::from_elem((100, 100), 2);
        let out = r.resize_label(lbl.view());
        assert_eq!(out.dim(), (128, 128));
        assert!(out.iter().all(|v| *v == 0 || *v == 2));
        assert_eq!(out[[64, 64]], 2);
        assert_eq!(out[[0, 0]], 0);
    }
}
