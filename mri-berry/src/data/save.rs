//! 切片的 PNG 预览存储.

use crate::{LabelSlice, ScanSlice};
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 对于 `LabelSlice` 这类只有少数几个类别值的图像, 在保存时会映射到肉眼较易区分的灰度;
/// 对于 `ScanSlice` 这类任意强度的扫描, 在保存时会按切片最大值线性拉伸到 `0..=255`.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 使像素更有利于单通道可视化.
#[inline]
pub(crate) fn pretty(label: u8) -> u8 {
    use crate::consts::gray::*;
    use crate::consts::label::*;
    match label {
        // 背景为黑色
        BRATS_BACKGROUND => BLACK,

        // 坏死核心最醒目
        BRATS_NECROTIC => WHITE,

        // 水肿范围大, 颜色暗一些
        BRATS_EDEMA => GRAY,

        BRATS_ENHANCING => LIGHT_GRAY,

        // 未知类别
        _ => DARK_GRAY,
    }
}

/// 将强度按 `max` 线性映射为灰度. 负值和 NaN 映射为黑色.
#[inline]
fn stretch(v: f32, max: f32) -> u8 {
    if v.is_nan() || v <= 0.0 || max <= 0.0 {
        0
    } else {
        // 255, not 256.
        ((v / max).min(1.0) * 255.0) as u8
    }
}

/// 会将背景/坏死/水肿/增强像素分别映射为黑色/白色/灰色/亮灰色, 其他类别为暗灰色.
impl ImgWriteVis for LabelSlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &pix) in self.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([pretty(pix)]));
        }
        buf.save(path)
    }
}

/// 按切片最大强度拉伸.
impl ImgWriteVis for ScanSlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let max = self.max().unwrap_or(0.0);
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &v) in self.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([stretch(v, max)]));
        }
        buf.save(path)
    }
}
