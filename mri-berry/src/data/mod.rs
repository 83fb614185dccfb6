use std::path::Path;

use ndarray::{Array3, ArrayView, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::{Error, Idx3d, IntegrityError, Result};

mod save;
mod slice;

pub use save::ImgWriteVis;
pub use slice::{LabelSlice, ScanSlice};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 读取 nii 文件, 转换为 `[z, H, W]` 排布的三维数组.
///
/// 读取失败时返回 `Error::StorageRead`; 文件不是三维数据时返回
/// `IntegrityError::NotVolumetric`.
macro_rules! read_volume {
    ($path: expr, $elem: ty) => {{
        let path: &Path = $path;
        let storage_err = |source| Error::StorageRead {
            path: path.to_owned(),
            source,
        };
        let obj = ReaderOptions::new()
            .read_file(path)
            .map_err(storage_err)?;
        let header = Box::new(obj.header().clone());

        let data = obj
            .into_volume()
            .into_ndarray::<$elem>()
            .map_err(storage_err)?;
        let ndim = data.ndim();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| IntegrityError::NotVolumetric {
                path: path.to_owned(),
                ndim,
            })?;

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = data.permuted_axes([2, 1, 0]);

        // The nature of nifti data field layout, 通常不会触发拷贝.
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        debug_assert!(data.is_standard_layout());

        (header, data)
    }};
}

/// 3D MRI nii 文件 header 的共用属性.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取 header 记录的数据形状大小 (深度, 高, 宽).
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }
}

/// nii 格式 3D MRI 扫描, 包括 header 和强度数据. 强度以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct MriScan {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl NiftiHeaderAttr for MriScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl MriScan {
    /// 打开 nii (或 nii.gz) 文件格式的 3D MRI 扫描. `path` 为文件的本地路径.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (header, data) = read_volume!(path.as_ref(), f32);
        Ok(Self { header, data })
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }
}

/// 是否是合法的类别编号: `0..=255` 内的整数.
#[inline]
fn is_label_value(v: f64) -> bool {
    v.fract() == 0.0 && (0.0..=u8::MAX as f64).contains(&v)
}

/// nii 格式 3D MRI 分割标签, 包括 header 和逐体素类别. 类别以 `u8` 保存.
#[derive(Debug, Clone)]
pub struct MriLabel {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for MriLabel {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl MriLabel {
    /// 打开 nii (或 nii.gz) 文件格式的 3D 分割标签. `path` 为文件的本地路径.
    ///
    /// 标签文件可以用任意数值类型存储. 出现负数、小数或大于 255 的值时返回
    /// `IntegrityError::LabelOutOfRange`, 不做截断.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let (header, raw) = read_volume!(path, f64);
        if let Some(&value) = raw.iter().find(|v| !is_label_value(**v)) {
            return Err(IntegrityError::LabelOutOfRange {
                path: path.to_owned(),
                value,
            }
            .into());
        }
        let data = raw.mapv(|v| v as u8);
        Ok(Self { header, data })
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }
}

/// nii 格式的 3D MRI 扫描与对应的分割标签.
///
/// 该结构完全透明, 仅包含两个公开的 `scan` 和 `label` 子结构.
/// 通过 [`MriData3d::open`] 构造时保证两者形状一致.
#[derive(Debug, Clone)]
pub struct MriData3d {
    /// 3D MRI 扫描.
    pub scan: MriScan,

    /// 3D 分割标签.
    pub label: MriLabel,
}

impl MriData3d {
    /// 分别打开 3D 扫描和对应标签. 任一文件打开失败时返回 `Error::StorageRead`,
    /// 两者形状不一致时返回 `IntegrityError::ShapeMismatch`.
    pub fn open(scan_path: impl AsRef<Path>, label_path: impl AsRef<Path>) -> Result<Self> {
        let scan = MriScan::open(scan_path.as_ref())?;
        let label = MriLabel::open(label_path.as_ref())?;
        log::debug!(
            "读取 `{}` ({:?}) 与 `{}` ({:?})",
            scan_path.as_ref().display(),
            scan.shape(),
            label_path.as_ref().display(),
            label.shape(),
        );
        if scan.data.dim() != label.data.dim() {
            return Err(IntegrityError::ShapeMismatch {
                scan: scan.data.dim(),
                label: label.data.dim(),
            }
            .into());
        }
        Ok(Self { scan, label })
    }
}
