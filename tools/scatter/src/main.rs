//! 把一位病人的扫描与分割标签采样为分层点云.
//!
//! ```text
//! scatter --patient 42 --scan-type flair --out cloud.json --preview previews/
//! ```
//!
//! 输出 `.json` 时写出渲染器所需的全部图层、标题和图例标题; 输出 `.npz` 时只写出坐标与颜色值.

use clap::Parser;
use log::LevelFilter;
use mri_berry::cloud::{ClassSchema, LEGEND_TITLE};
use mri_berry::dataset::brats::{BratsLayout, ScanType, BRATS_2021_PREFIX};
use mri_berry::{CanonicalVolume, ImgWriteVis, PointSet, Sampler, ScanVisualization, VolumeReader};
use serde::Serialize;
use simple_logger::SimpleLogger;
use std::error::Error;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

type BoxResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 数据集根目录. 默认为 `$BRATS_DIR`, 其次为 `$HOME/dataset/brats`.
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// 病人目录前缀.
    #[arg(long, default_value = BRATS_2021_PREFIX)]
    prefix: String,

    /// 病人编号.
    #[arg(short, long)]
    patient: u32,

    /// 扫描序列: flair, t1, t1ce, t2.
    #[arg(short = 't', long, default_value = "flair")]
    scan_type: ScanType,

    /// 规范化后的切片边长.
    #[arg(short, long, default_value = "128")]
    size: NonZeroUsize,

    /// 把扫描强度归一化到 `[0, 1]`.
    #[arg(long)]
    normalize: bool,

    /// 把所有非零标签合并为前景 1.
    #[arg(long)]
    single_class: bool,

    /// 背景 (组织) 层的降采样步长.
    #[arg(long, default_value = "20")]
    mri_stride: NonZeroUsize,

    /// 输出文件, 按扩展名选择 `.json` 或 `.npz`.
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// 把中间切片的扫描与标签保存为 PNG 到该目录.
    #[arg(long, value_name = "DIR")]
    preview: Option<PathBuf>,
}

/// 渲染器读取的 JSON 文档.
#[derive(Serialize)]
struct RenderDoc<'a> {
    title: String,
    legend_title: &'static str,
    total_points: usize,
    layers: &'a [PointSet],
}

fn main() -> BoxResult<()> {
    let cli = Cli::parse();
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    if let Err(e) = run(&cli) {
        log::error!("{e}");
        return Err(e);
    }
    Ok(())
}

fn run(cli: &Cli) -> BoxResult<()> {
    let root = match &cli.root {
        Some(r) => r.clone(),
        None => utils::brats_dir_from_env_or_home()
            .ok_or("无法确定数据集目录, 请指定 --root 或设置 $BRATS_DIR")?,
    };
    let layout = BratsLayout::with_prefix(root, &cli.prefix);
    log::info!(
        "读取病人 {} ({})",
        layout.patient_name(cli.patient),
        cli.scan_type
    );

    let reader = VolumeReader::new(cli.size)
        .normalize(cli.normalize)
        .single_class(cli.single_class);
    let volume = reader.load_patient_scan(&layout, cli.patient, cli.scan_type)?;

    let schema = if cli.single_class {
        ClassSchema::single("Tumor", NonZeroUsize::MIN)
    } else {
        ClassSchema::brats()
    };
    let sampler = Sampler::new(cli.mri_stride, schema);
    let vis = sampler.build_scan_visualization(&volume.scan, &volume.label, volume.orig_shape)?;

    report(&vis, cli.patient);

    if let Some(out) = &cli.out {
        export(&vis, cli.patient, out)?;
        log::info!("已写出 {}", out.display());
    }
    if let Some(dir) = &cli.preview {
        let name = layout.patient_name(cli.patient);
        preview(&volume, dir, &format!("{name}_{}", cli.scan_type))?;
    }
    Ok(())
}

fn report(vis: &ScanVisualization, patient: u32) {
    utils::sep();
    println!("{}", vis.title(patient));
    println!("{}", vis.legend_title());
    for layer in vis.layers() {
        println!("  {:<28} {:>8}", layer.name(), layer.len());
    }
    utils::sep();
}

fn export(vis: &ScanVisualization, patient: u32, out: &Path) -> BoxResult<()> {
    match out.extension().and_then(|e| e.to_str()) {
        Some("npz") => vis.write_npz(out)?,
        Some("json") => {
            let doc = RenderDoc {
                title: vis.title(patient),
                legend_title: LEGEND_TITLE,
                total_points: vis.total_points(),
                layers: vis.layers(),
            };
            fs::write(out, serde_json::to_string_pretty(&doc)?)?;
        }
        _ => return Err(format!("不支持的输出格式: {}", out.display()).into()),
    }
    Ok(())
}

/// 保存中间切片的扫描与标签预览.
fn preview(volume: &CanonicalVolume, dir: &Path, stem: &str) -> BoxResult<()> {
    if volume.len_z() == 0 {
        log::warn!("扫描没有切片, 跳过预览");
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    let z = volume.len_z() / 2;
    let (scan, label) = volume.slice_at(z);

    let scan_path = dir.join(format!("{stem}_{z}.png"));
    scan.save(&scan_path)?;
    let label_path = dir.join(format!("{stem}_{z}_seg.png"));
    label.save(&label_path)?;
    log::info!("预览已保存到 {}", dir.display());
    Ok(())
}
