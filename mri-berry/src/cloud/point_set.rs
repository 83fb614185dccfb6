//! 点集, 交给渲染器的基本单位.

use crate::consts::DEFAULT_MARKER_SIZE;
use itertools::izip;

/// 点的颜色规则.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorSpec {
    /// 按每个点的颜色值, 用具名连续色阶着色 (如 `"Ice"`, `"Teal"`).
    Scale(String),

    /// 所有点共享同一个颜色值.
    Fixed(f32),
}

/// 鼠标悬停时的提示信息策略.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hover {
    /// 不显示, 用于高密度图层.
    Skip,

    /// 显示全部信息.
    All,
}

/// 点集的展示风格.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    /// 不透明度, `0.0..=1.0`.
    pub opacity: f32,

    /// 点的大小.
    pub marker_size: u32,

    /// 颜色规则.
    pub color: ColorSpec,

    /// 悬停策略.
    pub hover: Hover,
}

impl Style {
    /// 连续色阶风格.
    #[inline]
    pub fn scaled(scale: &str, opacity: f32, hover: Hover) -> Self {
        Self {
            opacity,
            marker_size: DEFAULT_MARKER_SIZE,
            color: ColorSpec::Scale(scale.to_owned()),
            hover,
        }
    }

    /// 固定颜色风格.
    #[inline]
    pub fn fixed(value: f32, opacity: f32, hover: Hover) -> Self {
        Self {
            opacity,
            marker_size: DEFAULT_MARKER_SIZE,
            color: ColorSpec::Fixed(value),
            hover,
        }
    }
}

/// 带名字和风格的三维点集.
///
/// `x`, `y`, `z`, `colors` 四个序列长度始终相同, 可以为零.
/// 构造之后不可修改.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PointSet {
    name: String,
    style: Style,
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    colors: Vec<f32>,
}

impl PointSet {
    /// 空点集.
    #[inline]
    pub fn empty(name: &str, style: Style) -> Self {
        Self::from_points(name, style, std::iter::empty())
    }

    /// 从 `(x, y, z, color)` 迭代器构建.
    pub fn from_points<I>(name: &str, style: Style, points: I) -> Self
    where
        I: IntoIterator<Item = (f32, f32, f32, f32)>,
    {
        let points = points.into_iter();
        let cap = points.size_hint().0;
        let mut ans = Self {
            name: name.to_owned(),
            style,
            x: Vec::with_capacity(cap),
            y: Vec::with_capacity(cap),
            z: Vec::with_capacity(cap),
            colors: Vec::with_capacity(cap),
        };
        for (x, y, z, c) in points {
            ans.x.push(x);
            ans.y.push(y);
            ans.z.push(z);
            ans.colors.push(c);
        }
        ans
    }

    /// 图层名, 也是图例中的名字.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 展示风格.
    #[inline]
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// 点数.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// 是否为空点集.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// x 坐标 (高方向).
    #[inline]
    pub fn x(&self) -> &[f32] {
        &self.x
    }

    /// y 坐标 (宽方向).
    #[inline]
    pub fn y(&self) -> &[f32] {
        &self.y
    }

    /// z 坐标 (深度方向).
    #[inline]
    pub fn z(&self) -> &[f32] {
        &self.z
    }

    /// 每个点的颜色值.
    #[inline]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// 按 `(x, y, z, color)` 迭代所有点.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (f32, f32, f32, f32)> + '_ {
        izip!(&self.x, &self.y, &self.z, &self.colors).map(|(x, y, z, c)| (*x, *y, *z, *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_set_lengths() {
        let pts = [(1.0f32, 2.0, 3.0, 0.5), (4.0, 5.0, 6.0, 0.25)];
        let p = PointSet::from_points("a", Style::fixed(0.5, 0.4, Hover::All), pts);
        assert_eq!(p.len(), 2);
        assert_eq!(p.x(), &[1.0f32, 4.0]);
        assert_eq!(p.y(), &[2.0f32, 5.0]);
        assert_eq!(p.z(), &[3.0f32, 6.0]);
        assert_eq!(p.colors(), &[0.5f32, 0.25]);
        assert!(p.iter().eq(pts));
    }

    #[test]
    fn test_empty() {
        let p = PointSet::empty("none", Style::scaled("Ice", 0.4, Hover::Skip));
        assert!(p.is_empty());
        assert_eq!(p.iter().len(), 0);
        assert_eq!(p.style().color, ColorSpec::Scale("Ice".to_owned()));
    }
}
