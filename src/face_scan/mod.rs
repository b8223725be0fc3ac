//! 深伪扫描管线 - 对视频采样帧做人脸定位与真伪评分
//!
//! 核心流程：
//! 1. 帧采样 - 按预算顺序读帧，短视频提前收尾
//! 2. 几何夹紧 - 人脸框夹到帧边界，退化框静默丢弃
//! 3. 归一化分类 - 裁剪缩放 + 通道归一化后交给分类器
//! 4. 评分聚合 - 均值过阈值产出 FAKE/REAL 判定，或"无证据"

pub mod aggregate;
pub mod classifier;
pub mod error;
pub mod localizer;
pub mod pipeline;
pub mod region;

pub use aggregate::{AggregateResult, ScoreAggregator, VerdictLabel};
pub use classifier::{
    FaceClassifier, InputSpec, MockFaceClassifier, NoiseArtifactClassifier, NormalizedCrop,
};
pub use error::{ClassifyError, DetectError};
pub use localizer::{FaceLocalizer, MockFaceLocalizer, SkinRegionLocalizer};
#[cfg(feature = "rustface")]
pub use localizer::RustfaceLocalizer;
pub use pipeline::{FaceScanPipeline, FrameOutcome, ScanConfig, ScanReport, ScanStats, SkipReason};
pub use region::{CropRegion, FaceBox, FaceCrop};
