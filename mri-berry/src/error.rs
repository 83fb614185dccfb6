//! 运行时错误.

use crate::Idx3d;
use std::path::PathBuf;
use thiserror::Error;

/// 加载、采样或导出时的错误.
#[derive(Debug, Error)]
pub enum Error {
    /// 体数据文件不存在、无法读取或格式损坏.
    #[error("无法读取体数据文件 `{}`", path.display())]
    StorageRead {
        /// 出错的文件路径.
        path: PathBuf,

        /// 底层 nifti 错误.
        #[source]
        source: nifti::NiftiError,
    },

    /// 数据本身不一致.
    #[error(transparent)]
    DataIntegrity(#[from] IntegrityError),

    /// 写出 npz 归档失败.
    #[error("写出 npz 归档失败: {0}")]
    WriteNpz(#[from] ndarray_npy::WriteNpzError),

    /// 写出 PNG 预览失败.
    #[error("写出预览图片失败: {0}")]
    WriteImage(#[from] image::ImageError),

    /// 其他底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 数据一致性错误. 对当前请求是致命的, 不会重试.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrityError {
    /// 扫描与标签的形状不一致.
    #[error("扫描形状 {scan:?} 与标签形状 {label:?} 不一致")]
    ShapeMismatch {
        /// 扫描形状 (深度, 高, 宽).
        scan: Idx3d,

        /// 标签形状 (深度, 高, 宽).
        label: Idx3d,
    },

    /// 标签中出现了未配置的类别.
    #[error("标签中出现了未配置的类别 `{0}`")]
    UnexpectedClass(u8),

    /// 标签文件中出现了无法表示为类别编号的值 (负数、小数或大于 255).
    #[error("`{}` 中的标签值 {value} 不是 0..=255 内的整数", path.display())]
    LabelOutOfRange {
        /// 文件路径.
        path: PathBuf,

        /// 第一个非法值.
        value: f64,
    },

    /// nifti 文件不是三维数据.
    #[error("`{}` 不是三维数据 (实际维度 {ndim})", path.display())]
    NotVolumetric {
        /// 文件路径.
        path: PathBuf,

        /// 实际维度数.
        ndim: usize,
    },
}

/// 本 crate 通用的 `Result`.
pub type Result<T> = std::result::Result<T, Error>;
