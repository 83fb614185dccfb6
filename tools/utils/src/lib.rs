//! 命令行工具依赖的通用组件.

use mri_berry::dataset::brats::BratsLayout;
use std::env;
use std::path::PathBuf;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 获取 BraTS 数据集根目录.
///
/// 1. 若环境变量 `$BRATS_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/brats`;
/// 3. 无法确定用户主目录时返回 `None`.
#[inline]
pub fn brats_dir_from_env_or_home() -> Option<PathBuf> {
    brats_dir_or_home(env::var("BRATS_DIR").ok())
}

/// 以 `dir` (通常来自环境变量) 为准的数据集根目录, 为空或缺失时退回到 `$HOME/dataset/brats`.
pub fn brats_dir_or_home(dir: Option<String>) -> Option<PathBuf> {
    match dir {
        Some(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => mri_berry::dataset::home_dataset_dir_with(["brats"]),
    }
}

/// 从 `$BRATS_DIR` 或者 `$HOME/dataset/brats` 构建数据集目录布局.
#[inline]
pub fn layout_from_env_or_home() -> Option<BratsLayout> {
    brats_dir_from_env_or_home().map(BratsLayout::new)
}
