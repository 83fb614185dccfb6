//! 类别配置: 每个类别的编号、图层名、降采样步长与展示风格.

use super::point_set::{Hover, Style};
use crate::consts::label::{BRATS_EDEMA, BRATS_ENHANCING, BRATS_NECROTIC};
use std::num::NonZeroUsize;

/// 单个类别的配置.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSpec {
    /// 标签中的类别编号, 非零.
    pub id: u8,

    /// 图层名.
    pub name: String,

    /// 降采样步长. 越稀有越重要的类别步长越小.
    pub stride: NonZeroUsize,

    /// 该类别所有点共享的颜色值.
    pub color_value: f32,

    /// 不透明度.
    pub opacity: f32,

    /// 悬停策略.
    pub hover: Hover,
}

impl ClassSpec {
    /// 以编号、名字、步长构建. 颜色值默认为编号本身, 不透明度 0.4, 显示悬停信息.
    pub fn new(id: u8, name: &str, stride: NonZeroUsize) -> Self {
        Self {
            id,
            name: name.to_owned(),
            stride,
            color_value: id as f32,
            opacity: 0.4,
            hover: Hover::All,
        }
    }

    /// 设置颜色值.
    #[inline]
    pub fn color_value(mut self, value: f32) -> Self {
        self.color_value = value;
        self
    }

    /// 设置不透明度.
    #[inline]
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// 该类别图层的展示风格.
    #[inline]
    pub fn style(&self) -> Style {
        Style::fixed(self.color_value, self.opacity, self.hover)
    }
}

/// 类别表. 内部按编号升序存储, 编号唯一.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSchema {
    classes: Vec<ClassSpec>,
}

impl Default for ClassSchema {
    #[inline]
    fn default() -> Self {
        Self::brats()
    }
}

/// 步长字面量. 调用处保证非零.
const fn stride(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(s) => s,
        None => NonZeroUsize::MIN,
    }
}

impl ClassSchema {
    /// 由任意顺序的类别配置构建. 编号重复时保留先出现的那个,
    /// 编号为 0 (背景) 的配置会被忽略.
    pub fn new<I: IntoIterator<Item = ClassSpec>>(classes: I) -> Self {
        let mut classes: Vec<ClassSpec> = classes.into_iter().filter(|c| c.id != 0).collect();
        // 稳定排序, 保证 dedup 保留先出现的配置.
        classes.sort_by_key(|c| c.id);
        classes.dedup_by_key(|c| c.id);
        Self { classes }
    }

    /// BraTS 肿瘤类别: 坏死核心 (1, 步长 1), 瘤周水肿 (2, 步长 3), 增强肿瘤 (4, 步长 5).
    ///
    /// 颜色值为 `编号 / 4`.
    pub fn brats() -> Self {
        let max = BRATS_ENHANCING as f32;
        Self::new([
            ClassSpec::new(BRATS_NECROTIC, "Necrotic tumor core", stride(1))
                .color_value(BRATS_NECROTIC as f32 / max)
                .opacity(0.8),
            ClassSpec::new(BRATS_EDEMA, "Peritumoral invaded tissue", stride(3))
                .color_value(BRATS_EDEMA as f32 / max),
            ClassSpec::new(BRATS_ENHANCING, "GD-enhancing tumor", stride(5))
                .color_value(BRATS_ENHANCING as f32 / max),
        ])
    }

    /// 单类别模式下使用的类别表: 只有前景 1.
    pub fn single(name: &str, stride: NonZeroUsize) -> Self {
        Self::new([ClassSpec::new(1, name, stride).color_value(1.0)])
    }

    /// 按编号升序迭代类别配置.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ClassSpec> {
        self.classes.iter()
    }

    /// 以切片形式获取全部类别配置.
    #[inline]
    pub fn as_slice(&self) -> &[ClassSpec] {
        &self.classes
    }

    /// 类别个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// 是否没有任何类别.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// 查找编号为 `id` 的类别.
    #[inline]
    pub fn get(&self, id: u8) -> Option<&ClassSpec> {
        self.classes
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &self.classes[i])
    }

    /// `id` 是否是已配置的类别或背景.
    #[inline]
    pub fn accepts(&self, id: u8) -> bool {
        id == 0 || self.get(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::label::BRATS_TUMOR_CLASSES;

    #[test]
    fn test_brats_schema() {
        let s = ClassSchema::brats();
        let ids: Vec<u8> = s.iter().map(|c| c.id).collect();
        assert_eq!(ids, BRATS_TUMOR_CLASSES);
        let strides: Vec<usize> = s.iter().map(|c| c.stride.get()).collect();
        assert_eq!(strides, [1, 3, 5]);
        assert_eq!(s.get(4).unwrap().color_value, 1.0);
        assert_eq!(s.get(1).unwrap().opacity, 0.8);
        assert!(s.get(3).is_none());
        assert!(s.accepts(0));
        assert!(!s.accepts(3));
    }

    #[test]
    fn test_schema_sorted_and_unique() {
        let s = ClassSchema::new([
            ClassSpec::new(9, "nine", stride(2)),
            ClassSpec::new(0, "bg", stride(1)),
            ClassSpec::new(3, "three", stride(1)),
            ClassSpec::new(9, "nine again", stride(7)),
        ]);
        assert_eq!(s.len(), 2);
        let names: Vec<&str> = s.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["three", "nine"]);
    }
}
