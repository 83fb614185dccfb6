//! 体数据加载器: 读取扫描与标签, 逐切片补零缩放到规范尺寸.

use crate::consts::label::FOREGROUND;
use crate::consts::DEFAULT_TARGET_SIZE;
use crate::dataset::brats::{BratsLayout, ScanType};
use crate::transform::{PadPolicy, SliceResizer};
use crate::{Idx3d, IntegrityError, LabelSlice, MriData3d, Result, ScanSlice};
use ndarray::{Array3, ArrayView3, Axis};
use std::num::NonZeroUsize;
use std::path::Path;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 规范化后的 3D 强度数据, 按 (深度, 高, 宽) 排布.
pub type Volume = Array3<f32>;

/// 规范化后的 3D 类别标签, 与 [`Volume`] 逐体素对齐.
pub type LabelVolume = Array3<u8>;

/// 缩放前的原始空间尺寸.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OriginalShape {
    /// 切片个数.
    pub depth: usize,

    /// 原始切片高.
    pub height: usize,

    /// 原始切片宽.
    pub width: usize,
}

impl From<Idx3d> for OriginalShape {
    #[inline]
    fn from((depth, height, width): Idx3d) -> Self {
        Self {
            depth,
            height,
            width,
        }
    }
}

impl OriginalShape {
    /// 坐标缩放因子 `resized_height / 原始高`.
    ///
    /// 把规范化后的坐标除以该值, 即可还原到原始扫描的比例.
    /// 原始高为 0 时返回 1.
    #[inline]
    pub fn offset(&self, resized_height: usize) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            resized_height as f32 / self.height as f32
        }
    }
}

/// 加载器的输出: 规范尺寸的扫描、标签, 以及缩放前的尺寸.
#[derive(Debug, Clone)]
pub struct CanonicalVolume {
    /// 扫描强度, 形状为 `(depth, target, target)`.
    pub scan: Volume,

    /// 分割标签, 形状与 `scan` 相同.
    pub label: LabelVolume,

    /// 缩放前的 (深度, 高, 宽).
    pub orig_shape: OriginalShape,
}

impl CanonicalVolume {
    /// 获取数据形状 (深度, 高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.scan.dim()
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.scan.dim().0
    }

    /// 依次获取扫描和标签 z 空间的第 `z_index` 层不可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> (ScanSlice<'_>, LabelSlice<'_>) {
        (
            ScanSlice::new(self.scan.index_axis(Axis(0), z_index)),
            LabelSlice::new(self.label.index_axis(Axis(0), z_index)),
        )
    }
}

/// 3D MRI 体数据加载器.
///
/// 只保存配置, 不缓存任何数据: 每次调用都会重新从存储读取.
#[derive(Debug, Clone, Copy)]
pub struct VolumeReader {
    target: NonZeroUsize,
    pad: PadPolicy,
    normalize: bool,
    single_class: bool,
}

impl Default for VolumeReader {
    fn default() -> Self {
        // 常量非零.
        let target = NonZeroUsize::new(DEFAULT_TARGET_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self::new(target)
    }
}

impl VolumeReader {
    /// 以规范尺寸 `target_size` 构建加载器. 默认不归一化, 保留全部类别.
    #[inline]
    pub fn new(target_size: NonZeroUsize) -> Self {
        Self {
            target: target_size,
            pad: PadPolicy::default(),
            normalize: false,
            single_class: false,
        }
    }

    /// 是否把强度归一化到 `[0, 1]`.
    #[inline]
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// 是否把所有非零标签合并为单一前景类.
    #[inline]
    pub fn single_class(mut self, single_class: bool) -> Self {
        self.single_class = single_class;
        self
    }

    /// 替换补零规则.
    #[inline]
    pub fn pad_policy(mut self, policy: PadPolicy) -> Self {
        self.pad = policy;
        self
    }

    /// 规范尺寸.
    #[inline]
    pub fn target_size(&self) -> usize {
        self.target.get()
    }

    #[inline]
    fn resizer(&self) -> SliceResizer {
        SliceResizer::new(self.target, self.pad)
    }

    /// 从两个配准好的 nii 文件加载并规范化.
    ///
    /// 读取失败时返回 `Error::StorageRead`, 两者形状不一致时返回
    /// `IntegrityError::ShapeMismatch`.
    pub fn load(
        &self,
        scan_path: impl AsRef<Path>,
        label_path: impl AsRef<Path>,
    ) -> Result<CanonicalVolume> {
        let MriData3d { scan, label } = MriData3d::open(scan_path, label_path)?;
        self.canonicalize(scan.data(), label.data())
    }

    /// 按照 BraTS 目录约定加载第 `idx` 号病人的 `scan_type` 扫描及其分割标签.
    pub fn load_patient_scan(
        &self,
        layout: &BratsLayout,
        idx: u32,
        scan_type: ScanType,
    ) -> Result<CanonicalVolume> {
        let scan_path = layout.scan_path(idx, scan_type);
        let label_path = layout.label_path(idx);
        log::debug!("加载病人 {idx} 的 {scan_type} 扫描");
        self.load(scan_path, label_path)
    }

    /// 对内存中的扫描与标签执行规范化: 逐切片补零缩放, 可选的单类别合并与归一化.
    ///
    /// 两者形状不一致时返回 `IntegrityError::ShapeMismatch`.
    pub fn canonicalize(
        &self,
        scan: ArrayView3<f32>,
        label: ArrayView3<u8>,
    ) -> Result<CanonicalVolume> {
        if scan.dim() != label.dim() {
            return Err(IntegrityError::ShapeMismatch {
                scan: scan.dim(),
                label: label.dim(),
            }
            .into());
        }
        let orig_shape = OriginalShape::from(scan.dim());
        let resizer = self.resizer();
        let n = resizer.target();
        let shape = (orig_shape.depth, n, n);

        let mut out_scan = Volume::zeros(shape);
        let mut out_label = LabelVolume::zeros(shape);
        resize_slices(&resizer, scan, &mut out_scan);
        resize_label_slices(&resizer, label, &mut out_label);

        if self.single_class {
            out_label.mapv_inplace(|v| if v != 0 { FOREGROUND } else { 0 });
        }

        if self.normalize {
            // `f32::max` 会忽略 NaN.
            let max = out_scan.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            if max > 0.0 {
                out_scan.mapv_inplace(|v| v / max);
            }
            log::trace!("归一化: 最大强度 {max}");
        }

        log::debug!(
            "规范化 {:?} -> {:?} (补零到 {})",
            scan.dim(),
            shape,
            resizer.pad_size()
        );

        Ok(CanonicalVolume {
            scan: out_scan,
            label: out_label,
            orig_shape,
        })
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        /// 并行地逐切片变换扫描. 每个切片写回各自的位置, 结果与串行版本一致.
        fn resize_slices(resizer: &SliceResizer, src: ArrayView3<f32>, dst: &mut Volume) {
            dst.axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(src.axis_iter(Axis(0)).into_par_iter())
                .for_each(|(mut d, s)| d.assign(&resizer.resize_scan(s)));
        }

        /// 并行地逐切片变换标签.
        fn resize_label_slices(resizer: &SliceResizer, src: ArrayView3<u8>, dst: &mut LabelVolume) {
            dst.axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(src.axis_iter(Axis(0)).into_par_iter())
                .for_each(|(mut d, s)| d.assign(&resizer.resize_label(s)));
        }
    } else {
        /// 逐切片变换扫描.
        fn resize_slices(resizer: &SliceResizer, src: ArrayView3<f32>, dst: &mut Volume) {
            for (mut d, s) in dst.axis_iter_mut(Axis(0)).zip(src.axis_iter(Axis(0))) {
                d.assign(&resizer.resize_scan(s));
            }
        }

        /// 逐切片变换标签.
        fn resize_label_slices(resizer: &SliceResizer, src: ArrayView3<u8>, dst: &mut LabelVolume) {
            for (mut d, s) in dst.axis_iter_mut(Axis(0)).zip(src.axis_iter(Axis(0))) {
                d.assign(&resizer.resize_label(s));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{write_label, write_label_i16, write_scan};
    use crate::Error;
    use std::collections::HashSet;

    fn reader(n: usize) -> VolumeReader {
        VolumeReader::new(NonZeroUsize::new(n).unwrap())
    }

    fn phantom(shape: Idx3d) -> (Array3<f32>, Array3<u8>) {
        let scan = Array3::from_shape_fn(shape, |(z, h, w)| ((z + h + w) % 17) as f32);
        let label = Array3::from_shape_fn(shape, |(z, h, w)| match (z + h / 8 + w / 8) % 5 {
            0 | 3 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        });
        (scan, label)
    }

    #[test]
    fn test_canonical_shape() {
        let (scan, label) = phantom((6, 240, 240));
        for n in [64, 128, 300] {
            let out = reader(n).canonicalize(scan.view(), label.view()).unwrap();
            assert_eq!(out.scan.dim(), (6, n, n));
            assert_eq!(out.label.dim(), (6, n, n));
            assert_eq!(out.orig_shape, OriginalShape::from((6, 240, 240)));
        }
    }

    #[test]
    fn test_labels_not_invented() {
        let (scan, label) = phantom((4, 155, 190));
        let src: HashSet<u8> = label.iter().copied().collect();
        let out = reader(128).canonicalize(scan.view(), label.view()).unwrap();
        assert!(out.label.iter().all(|v| src.contains(v)));
    }

    #[test]
    fn test_single_class() {
        let (scan, label) = phantom((4, 64, 64));
        let out = reader(32)
            .single_class(true)
            .canonicalize(scan.view(), label.view())
            .unwrap();
        assert!(out.label.iter().all(|v| *v == 0 || *v == 1));
        assert!(out.label.iter().any(|v| *v == 1));
    }

    #[test]
    fn test_normalize() {
        let (scan, label) = phantom((3, 32, 32));
        let out = reader(32)
            .normalize(true)
            .canonicalize(scan.view(), label.view())
            .unwrap();
        let max = out.scan.iter().copied().fold(f32::MIN, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(out.scan.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_normalize_all_zero() {
        let scan = Array3::<f32>::zeros((10, 128, 128));
        let label = Array3::<u8>::zeros((10, 128, 128));
        let out = reader(128)
            .normalize(true)
            .canonicalize(scan.view(), label.view())
            .unwrap();
        assert!(out.scan.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let scan = Array3::<f32>::zeros((2, 8, 8));
        let label = Array3::<u8>::zeros((2, 8, 9));
        let err = reader(8).canonicalize(scan.view(), label.view()).unwrap_err();
        assert!(matches!(
            err,
            Error::DataIntegrity(IntegrityError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_depth() {
        let scan = Array3::<f32>::zeros((0, 8, 8));
        let label = Array3::<u8>::zeros((0, 8, 8));
        let out = reader(16).canonicalize(scan.view(), label.view()).unwrap();
        assert_eq!(out.shape(), (0, 16, 16));
    }

    #[test]
    fn test_offset() {
        let s = OriginalShape::from((155, 240, 240));
        assert!((s.offset(128) - 128.0 / 240.0).abs() < 1e-7);
        assert_eq!(OriginalShape::from((0, 0, 0)).offset(128), 1.0);
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let scan_path = dir.path().join("p_t1.nii");
        let label_path = dir.path().join("p_seg.nii");
        let (scan, label) = phantom((5, 40, 30));
        write_scan(&scan_path, &scan);
        write_label(&label_path, &label);

        let out = reader(32).load(&scan_path, &label_path).unwrap();
        assert_eq!(out.shape(), (5, 32, 32));
        assert_eq!(out.orig_shape, OriginalShape::from((5, 40, 30)));
        let (s, l) = out.slice_at(4);
        assert_eq!(s.shape(), (32, 32));
        assert_eq!(l.shape(), (32, 32));
    }

    #[test]
    fn test_load_missing_label() {
        let dir = tempfile::tempdir().unwrap();
        let scan_path = dir.path().join("p_t1.nii");
        write_scan(&scan_path, &Array3::zeros((2, 4, 4)));

        let err = reader(8)
            .load(&scan_path, dir.path().join("p_seg.nii"))
            .unwrap_err();
        assert!(matches!(err, Error::StorageRead { .. }));
        assert!(err.to_string().contains("p_seg.nii"));
    }

    #[test]
    fn test_load_rejects_wrapping_labels() {
        let dir = tempfile::tempdir().unwrap();
        let scan_path = dir.path().join("p_flair.nii");
        let label_path = dir.path().join("p_seg.nii");
        write_scan(&scan_path, &Array3::from_elem((2, 8, 8), 1.0));
        // 260 与 -255 按 u8 截断后分别是 4 和 1.
        let mut label = Array3::<i16>::zeros((2, 8, 8));
        label[[0, 3, 3]] = 260;
        label[[1, 4, 4]] = -255;
        write_label_i16(&label_path, &label);

        let err = reader(8).load(&scan_path, &label_path).unwrap_err();
        assert!(matches!(
            err,
            Error::DataIntegrity(IntegrityError::LabelOutOfRange { value, .. }) if value == 260.0
        ));
    }
}
