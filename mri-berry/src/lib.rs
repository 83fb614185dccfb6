#![warn(missing_docs)]

//! 核心库. 读取 BraTS 格式的脑部 MRI 扫描及其肿瘤分割标签, 将其规范化到统一尺寸,
//! 并按类别分层降采样为可交互渲染的三维点云.
//!
//! 该 crate 只负责数据侧: 窗口、按钮、文件对话框、数据集下载以及具体的绘图后端都不在这里.
//! 分割网络的训练与推理同样不在这里, 本库只消费已经算好的逐体素整数类别标签.
//!
//! # 流水线
//!
//! ### 体数据加载 ✅
//!
//! 读取 3D 扫描和对齐的 3D 标签, 对每个水平切片先对称补零到方形, 再缩放到规范尺寸.
//! 扫描使用双线性插值, 标签使用最近邻 (标签值绝不插值).
//!
//! 实现位于 `mri-berry/src/loader.rs` 和 `mri-berry/src/transform.rs`.
//!
//! ### 点云采样 ✅
//!
//! 1. 背景 (组织) 层: 所有强度 `> 0` 的体素, 按扫描序每隔 `stride` 个取一个,
//!   颜色值为原始强度.
//! 2. 类别层: 每个已知类别单独取样, 各自使用自己的 stride, 颜色值为类别固定值.
//! 3. 高/宽坐标按 `规范尺寸 / 原始高度` 的比例还原, 深度坐标不变.
//!
//! 实现位于 `mri-berry/src/cloud`.
//!
//! ### 数据集目录约定 ✅
//!
//! `root/training/{前缀}{5 位编号}/{前缀}{5 位编号}_{扫描类型}.nii.gz`,
//! 标签文件把扫描类型替换为 `seg`.
//!
//! 实现位于 `mri-berry/src/dataset`.
//!
//! ### 导出 ✅
//!
//! 1. 点云可导出为 npz 归档, 或 (启用 `serde` 时) 直接序列化. ✅
//! 2. 规范化后的切片可以保存为 PNG 预览. ✅
//!
//! # 注意
//!
//! 1. 所有操作都是纯函数式的: 相同输入一定得到逐位相同的输出, 内部不做缓存.
//! 2. 库内部只通过 `log` 输出 debug/trace 级别的诊断信息, 是否打印由调用方决定.

/// 二维索引 (高, 宽).
pub type Idx2d = (usize, usize);

/// 三维索引 (深度, 高, 宽).
pub type Idx3d = (usize, usize, usize);

pub mod consts;

mod error;

pub use error::{Error, IntegrityError, Result};

/// 3D MRI nii 文件基础数据结构.
mod data;

pub use data::{ImgWriteVis, LabelSlice, MriData3d, MriLabel, MriScan, NiftiHeaderAttr, ScanSlice};

pub mod transform;

pub mod loader;

pub use loader::{CanonicalVolume, LabelVolume, OriginalShape, Volume, VolumeReader};

pub mod cloud;

pub use cloud::{ClassSchema, PointSet, Sampler, ScanVisualization};

pub mod dataset;

pub mod prelude;
