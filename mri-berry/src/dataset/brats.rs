//! BraTS 训练集目录约定与按病人迭代的数据加载器.
//!
//! 目录结构:
//!
//! ```text
//! root/training/BraTS2021_00000/BraTS2021_00000_flair.nii.gz
//! root/training/BraTS2021_00000/BraTS2021_00000_seg.nii.gz
//! ...
//! ```

use crate::consts::SEGMENTATION_TOKEN;
use crate::{CanonicalVolume, Result, VolumeReader};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 默认的病人目录前缀.
pub const BRATS_2021_PREFIX: &str = "BraTS2021_";

/// 训练集子目录名.
pub const TRAINING_DIR: &str = "training";

/// 病人编号补零后的宽度.
pub const PATIENT_ID_WIDTH: usize = 5;

/// MRI 扫描序列类型.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum ScanType {
    /// T2-FLAIR.
    #[default]
    Flair,

    /// T1 加权.
    T1,

    /// T1 增强.
    T1ce,

    /// T2 加权.
    T2,
}

impl ScanType {
    /// 全部扫描序列类型.
    pub const ALL: [ScanType; 4] = [Self::Flair, Self::T1, Self::T1ce, Self::T2];

    /// 文件名中的记号.
    #[inline]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Flair => "flair",
            Self::T1 => "t1",
            Self::T1ce => "t1ce",
            Self::T2 => "t2",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// 无法识别的扫描序列记号.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("未知的扫描类型 `{0}`, 可选: flair, t1, t1ce, t2")]
pub struct ParseScanTypeError(String);

impl FromStr for ScanType {
    type Err = ParseScanTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.token().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseScanTypeError(s.to_owned()))
    }
}

/// BraTS 数据集目录布局.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BratsLayout {
    root: PathBuf,
    prefix: String,
}

impl BratsLayout {
    /// 以数据集根目录 `root` 和默认前缀 `BraTS2021_` 构建.
    #[inline]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self::with_prefix(root, BRATS_2021_PREFIX)
    }

    /// 以数据集根目录 `root` 和病人目录前缀 `prefix` 构建.
    #[inline]
    pub fn with_prefix<P: AsRef<Path>>(root: P, prefix: &str) -> Self {
        Self {
            root: root.as_ref().to_owned(),
            prefix: prefix.to_owned(),
        }
    }

    /// 数据集根目录.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 第 `idx` 号病人的目录名, 如 `BraTS2021_00042`.
    #[inline]
    pub fn patient_name(&self, idx: u32) -> String {
        format!("{}{idx:0width$}", self.prefix, width = PATIENT_ID_WIDTH)
    }

    /// 第 `idx` 号病人的目录.
    pub fn patient_dir(&self, idx: u32) -> PathBuf {
        let mut p = self.root.clone();
        p.push(TRAINING_DIR);
        p.push(self.patient_name(idx));
        p
    }

    /// 第 `idx` 号病人以 `token` 结尾的 nii.gz 文件.
    fn file_with_token(&self, idx: u32, token: &str) -> PathBuf {
        let mut p = self.patient_dir(idx);
        p.push(format!("{}_{token}.nii.gz", self.patient_name(idx)));
        p
    }

    /// 第 `idx` 号病人 `scan_type` 扫描文件路径.
    #[inline]
    pub fn scan_path(&self, idx: u32, scan_type: ScanType) -> PathBuf {
        self.file_with_token(idx, scan_type.token())
    }

    /// 第 `idx` 号病人分割标签文件路径. 即扫描路径中的扫描类型记号替换为 `seg`.
    #[inline]
    pub fn label_path(&self, idx: u32) -> PathBuf {
        self.file_with_token(idx, SEGMENTATION_TOKEN)
    }

    /// 按病人编号迭代加载的数据加载器.
    ///
    /// `data` 的所有值 `value` 都应在布局下有对应的扫描与标签文件,
    /// 否则加载器在迭代时会返回 `Err`, 但不会中止迭代.
    pub fn loader<I: IntoIterator<Item = u32>>(
        &self,
        data: I,
        scan_type: ScanType,
        reader: VolumeReader,
    ) -> PatientLoader {
        let mut data: Vec<u32> = data.into_iter().collect();
        data.reverse();

        PatientLoader {
            layout: self.clone(),
            scan_type,
            reader,
            data_rev: data,
        }
    }
}

/// 病人数据加载器, 每次迭代读取并规范化一个病人的扫描与标签.
#[derive(Debug)]
pub struct PatientLoader {
    layout: BratsLayout,
    scan_type: ScanType,
    reader: VolumeReader,
    data_rev: Vec<u32>,
}

impl Iterator for PatientLoader {
    type Item = (u32, Result<CanonicalVolume>);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.data_rev.pop()?;
        let data = self
            .reader
            .load_patient_scan(&self.layout, idx, self.scan_type);
        Some((idx, data))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.data_rev.len(), Some(self.data_rev.len()))
    }
}

impl ExactSizeIterator for PatientLoader {
    #[inline]
    fn len(&self) -> usize {
        self.data_rev.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{write_label, write_scan};
    use crate::Error;
    use ndarray::Array3;
    use std::num::NonZeroUsize;

    #[test]
    fn test_paths() {
        let layout = BratsLayout::new("/data/brats");
        assert_eq!(
            layout.scan_path(42, ScanType::T1ce),
            PathBuf::from("/data/brats/training/BraTS2021_00042/BraTS2021_00042_t1ce.nii.gz")
        );
        assert_eq!(
            layout.label_path(42),
            PathBuf::from("/data/brats/training/BraTS2021_00042/BraTS2021_00042_seg.nii.gz")
        );

        let layout = BratsLayout::with_prefix("d", "BraTS20_Training_");
        assert_eq!(layout.patient_name(7), "BraTS20_Training_00007");
    }

    #[test]
    fn test_scan_type_parse() {
        assert_eq!("flair".parse::<ScanType>(), Ok(ScanType::Flair));
        assert_eq!("T1CE".parse::<ScanType>(), Ok(ScanType::T1ce));
        assert!("seg".parse::<ScanType>().is_err());
        for t in ScanType::ALL {
            assert_eq!(t.to_string().parse::<ScanType>(), Ok(t));
        }
    }

    #[test]
    fn test_loader_iterates_in_order() {
        // 可能已被其他测试初始化.
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Debug)
            .init();

        let dir = tempfile::tempdir().unwrap();
        let layout = BratsLayout::new(dir.path());
        std::fs::create_dir_all(layout.patient_dir(1)).unwrap();
        // nifti 按扩展名决定是否 gzip.
        write_scan(
            &layout.scan_path(1, ScanType::T2),
            &Array3::from_elem((3, 20, 20), 1.0),
        );
        write_label(&layout.label_path(1), &Array3::zeros((3, 20, 20)));

        let reader = VolumeReader::new(NonZeroUsize::new(16).unwrap());
        let mut loader = layout.loader([1, 2], ScanType::T2, reader);
        assert_eq!(loader.len(), 2);

        let (idx, first) = loader.next().unwrap();
        assert_eq!(idx, 1);
        assert_eq!(first.unwrap().shape(), (3, 16, 16));

        let (idx, second) = loader.next().unwrap();
        assert_eq!(idx, 2);
        assert!(matches!(second, Err(Error::StorageRead { .. })));

        assert!(loader.next().is_none());
    }
}
