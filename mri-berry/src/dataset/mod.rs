//! 数据集操作.

use std::path::{Path, PathBuf};

pub mod brats;

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 可下载数据集的描述信息.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetInfo {
    /// 展示名.
    pub name: &'static str,

    /// 归档地址.
    pub url: &'static str,

    /// 归档大小, 单位为 GB.
    pub size_gb: f64,
}

/// BraTS 2020.
pub const BRATS_2020: DatasetInfo = DatasetInfo {
    name: "BraTS 2020",
    url: "BraTS 2020",
    size_gb: 8.0,
};

/// BraTS 2021.
pub const BRATS_2021: DatasetInfo = DatasetInfo {
    name: "BraTS 2021",
    url: "BraTS 2021",
    size_gb: 13.7,
};

/// 已知的可下载数据集.
pub const KNOWN_DATASETS: [DatasetInfo; 2] = [BRATS_2020, BRATS_2021];

/// 数据集下载器.
///
/// 网络传输不在本 crate 的范围内, 这里只定义接缝: 下载器把 `url`
/// 指向的归档放到本地 `path`, 之后由 [`brats::BratsLayout`] 按目录约定读取.
pub trait Downloader {
    /// 下载错误.
    type Error: std::error::Error;

    /// 把 `url` 下载到本地 `path`.
    fn download(&self, url: &str, path: &Path) -> Result<(), Self::Error>;

    /// 下载已知数据集 `info` 到 `root` 目录下.
    fn download_dataset(&self, info: &DatasetInfo, root: &Path) -> Result<(), Self::Error> {
        log::info!("下载 {} ({:.1} GB)", info.name, info.size_gb);
        self.download(info.url, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::convert::Infallible;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<(String, PathBuf)>>);

    impl Downloader for Recorder {
        type Error = Infallible;

        fn download(&self, url: &str, path: &Path) -> Result<(), Infallible> {
            self.0.borrow_mut().push((url.to_owned(), path.to_owned()));
            Ok(())
        }
    }

    #[test]
    fn test_known_datasets() {
        assert_eq!(KNOWN_DATASETS.len(), 2);
        assert!(KNOWN_DATASETS.iter().all(|d| d.size_gb > 0.0));
        assert_eq!(KNOWN_DATASETS[1].name, "BraTS 2021");
    }

    #[test]
    fn test_download_dataset_forwards_url() {
        let r = Recorder::default();
        r.download_dataset(&BRATS_2021, Path::new("/tmp/brats")).unwrap();
        assert_eq!(
            r.0.borrow().as_slice(),
            &[("BraTS 2021".to_owned(), PathBuf::from("/tmp/brats"))]
        );
    }
}
