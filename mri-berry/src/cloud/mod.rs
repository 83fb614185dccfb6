//! 点云采样: 把规范化后的扫描和标签分层降采样为带样式的点集.
//!
//! 所有采样都是确定性的: 按 (深度, 高, 宽) 的扫描序取每第 `stride` 个满足条件的体素,
//! 不使用任何随机数.

mod point_set;
mod schema;

pub use point_set::{ColorSpec, Hover, PointSet, Style};
pub use schema::{ClassSchema, ClassSpec};

use crate::consts::DEFAULT_BACKGROUND_STRIDE;
use crate::{IntegrityError, LabelVolume, OriginalShape, Result, Volume};
use ndarray::{ArrayView1, ArrayView3};
use ndarray_npy::NpzWriter;
use std::collections::BTreeMap;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 背景 (组织) 层的图层名.
pub const BACKGROUND_NAME: &str = "Brain MRI";

/// 背景层默认色阶.
pub const BACKGROUND_SCALE: &str = "Ice";

/// 背景层默认不透明度.
pub const BACKGROUND_OPACITY: f32 = 0.4;

/// 图例标题.
pub const LEGEND_TITLE: &str = "Pixel class (click to enable/disable)";

/// 点云采样器. 只保存配置.
#[derive(Debug, Clone, PartialEq)]
pub struct Sampler {
    background_stride: NonZeroUsize,
    background_scale: String,
    schema: ClassSchema,
}

impl Default for Sampler {
    fn default() -> Self {
        // 常量非零.
        let stride = NonZeroUsize::new(DEFAULT_BACKGROUND_STRIDE).unwrap_or(NonZeroUsize::MIN);
        Self::new(stride, ClassSchema::brats())
    }
}

impl Sampler {
    /// 以背景步长 `background_stride` 和类别表 `schema` 构建.
    pub fn new(background_stride: NonZeroUsize, schema: ClassSchema) -> Self {
        Self {
            background_stride,
            background_scale: BACKGROUND_SCALE.to_owned(),
            schema,
        }
    }

    /// 设置背景层步长.
    #[inline]
    pub fn background_stride(mut self, stride: NonZeroUsize) -> Self {
        self.background_stride = stride;
        self
    }

    /// 设置背景层色阶名.
    #[inline]
    pub fn background_scale(mut self, scale: &str) -> Self {
        self.background_scale = scale.to_owned();
        self
    }

    /// 设置类别表.
    #[inline]
    pub fn schema(mut self, schema: ClassSchema) -> Self {
        self.schema = schema;
        self
    }

    /// 类别表.
    #[inline]
    pub fn class_schema(&self) -> &ClassSchema {
        &self.schema
    }

    /// 背景 (组织) 层: 强度 `> 0` 的体素, 每 `background_stride` 个取一个.
    ///
    /// 颜色值为体素的强度. 全零扫描得到空点集.
    pub fn sample_background(&self, volume: &Volume, orig: OriginalShape) -> PointSet {
        let offset = orig.offset(volume.dim().1);
        let style = Style::scaled(&self.background_scale, BACKGROUND_OPACITY, Hover::Skip);
        let points = volume
            .indexed_iter()
            .filter(|(_, v)| **v > 0.0)
            .step_by(self.background_stride.get())
            .map(|((d, h, w), v)| (h as f32 / offset, w as f32 / offset, d as f32, *v));
        PointSet::from_points(BACKGROUND_NAME, style, points)
    }

    /// 每个已配置类别一个点集, 按类别编号升序. 没有体素的类别得到空点集.
    pub fn sample_classes(&self, label: &LabelVolume, orig: OriginalShape) -> BTreeMap<u8, PointSet> {
        let offset = orig.offset(label.dim().1);
        sample_all_classes(&self.schema, label.view(), offset)
            .into_iter()
            .collect()
    }

    /// 生成整个扫描的可视化: 背景层在前, 之后按类别编号升序排列各类别层.
    ///
    /// 扫描与标签形状不一致时返回 `IntegrityError::ShapeMismatch`;
    /// 标签中出现类别表以外的非零编号时返回 `IntegrityError::UnexpectedClass`.
    pub fn build_scan_visualization(
        &self,
        volume: &Volume,
        label: &LabelVolume,
        orig: OriginalShape,
    ) -> Result<ScanVisualization> {
        if volume.dim() != label.dim() {
            return Err(IntegrityError::ShapeMismatch {
                scan: volume.dim(),
                label: label.dim(),
            }
            .into());
        }
        if let Some(&id) = label.iter().find(|&&v| !self.schema.accepts(v)) {
            return Err(IntegrityError::UnexpectedClass(id).into());
        }

        let mut layers = Vec::with_capacity(self.schema.len() + 1);
        layers.push(self.sample_background(volume, orig));
        layers.extend(self.sample_classes(label, orig).into_values());

        let vis = ScanVisualization::new(layers);
        log::debug!(
            "采样完成: {} 个图层, 共 {} 个点",
            vis.layers.len(),
            vis.total_points
        );
        Ok(vis)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        /// 各类别之间互不依赖, 并行采样. 输出顺序与类别表一致.
        fn sample_all_classes(
            schema: &ClassSchema,
            label: ArrayView3<u8>,
            offset: f32,
        ) -> Vec<(u8, PointSet)> {
            schema
                .as_slice()
                .par_iter()
                .map(|spec| (spec.id, sample_class(label, offset, spec)))
                .collect()
        }
    } else {
        /// 依次采样各类别.
        fn sample_all_classes(
            schema: &ClassSchema,
            label: ArrayView3<u8>,
            offset: f32,
        ) -> Vec<(u8, PointSet)> {
            schema
                .iter()
                .map(|spec| (spec.id, sample_class(label, offset, spec)))
                .collect()
        }
    }
}

/// 单个类别的采样.
fn sample_class(label: ArrayView3<u8>, offset: f32, spec: &ClassSpec) -> PointSet {
    let points = label
        .indexed_iter()
        .filter(|(_, v)| **v == spec.id)
        .step_by(spec.stride.get())
        .map(|((d, h, w), _)| {
            (
                h as f32 / offset,
                w as f32 / offset,
                d as f32,
                spec.color_value,
            )
        });
    PointSet::from_points(&spec.name, spec.style(), points)
}

/// 有序图层及总点数, 交给渲染器的全部内容.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScanVisualization {
    layers: Vec<PointSet>,
    total_points: usize,
}

impl ScanVisualization {
    /// 由有序图层构建, 总点数为各图层点数之和.
    pub fn new(layers: Vec<PointSet>) -> Self {
        let total_points = layers.iter().map(PointSet::len).sum();
        Self {
            layers,
            total_points,
        }
    }

    /// 按展示顺序排列的图层.
    #[inline]
    pub fn layers(&self) -> &[PointSet] {
        &self.layers
    }

    /// 所有图层的总点数.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.total_points
    }

    /// 按名字查找图层.
    pub fn layer(&self, name: &str) -> Option<&PointSet> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// 渲染标题, 包含病人编号和总点数.
    pub fn title<D: std::fmt::Display>(&self, patient_id: D) -> String {
        format!(
            "[Patient id:{patient_id}] brain MRI scan ({} points)",
            self.total_points
        )
    }

    /// 图例标题.
    #[inline]
    pub fn legend_title(&self) -> &'static str {
        LEGEND_TITLE
    }

    /// 写入 npz 归档.
    ///
    /// 第 `i` 个图层的四个序列分别存为 `{i}_{图层名}_x`, `_y`, `_z`, `_color`,
    /// 图层名中的空格替换为下划线.
    pub fn write_npz<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut npz = NpzWriter::new(File::create(path.as_ref())?);
        for (i, layer) in self.layers.iter().enumerate() {
            let stem = format!("{i}_{}", layer.name().replace(' ', "_"));
            let fields = [
                ("x", layer.x()),
                ("y", layer.y()),
                ("z", layer.z()),
                ("color", layer.colors()),
            ];
            for (field, data) in fields {
                npz.add_array(format!("{stem}_{field}"), &ArrayView1::from(data))?;
            }
        }
        npz.finish()?;
        log::debug!("写入点云归档 {}", path.as_ref().display());
        Ok(())
    }
}
