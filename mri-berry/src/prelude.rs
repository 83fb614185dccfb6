//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::{Error, IntegrityError, Result};

pub use crate::{ImgWriteVis, LabelSlice, MriData3d, MriLabel, MriScan, NiftiHeaderAttr, ScanSlice};

pub use crate::consts::label::{
    BRATS_BACKGROUND, BRATS_EDEMA, BRATS_ENHANCING, BRATS_NECROTIC, BRATS_TUMOR_CLASSES,
};
pub use crate::consts::{DEFAULT_BACKGROUND_STRIDE, DEFAULT_TARGET_SIZE};

pub use crate::loader::{CanonicalVolume, LabelVolume, OriginalShape, Volume, VolumeReader};
pub use crate::transform::{PadPolicy, SliceResizer};

pub use crate::cloud::{
    ClassSchema, ClassSpec, ColorSpec, Hover, PointSet, Sampler, ScanVisualization, Style,
};

pub use crate::dataset::brats::{BratsLayout, PatientLoader, ScanType};
pub use crate::dataset::{home_dataset_dir_with, DatasetInfo, Downloader};
