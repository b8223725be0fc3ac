//! 深伪检测器 - 对外入口

use crate::api::models::report::PredictionReport;
use crate::core::model::ModelConfig;
use crate::core::video::error::VideoError;
use crate::core::video::source::{ImageSequenceSource, VideoSource};
use crate::face_scan::classifier::{FaceClassifier, NoiseArtifactClassifier};
use crate::face_scan::error::DetectError;
use crate::face_scan::localizer::FaceLocalizer;
use crate::face_scan::pipeline::{FaceScanPipeline, ScanConfig};
use log::info;
use std::path::Path;

/// 视频深伪检测器
///
/// 能力对象在进程启动时构建一次，之后 analyze 可重复调用；
/// 定位器/分类器构建后只读，并发调用是安全的，每次 analyze
/// 独占自己的解码句柄。
///
/// ```ignore
/// let verifier = DeepfakeVerifier::with_model(&ModelConfig::default())?;
/// let report = verifier.analyze(Path::new("uploads/clip"))?;
/// println!("{}", report.prediction_result);
/// ```
pub struct DeepfakeVerifier {
    source: Box<dyn VideoSource>,
    localizer: Box<dyn FaceLocalizer>,
    classifier: Box<dyn FaceClassifier>,
    pipeline: FaceScanPipeline,
}

impl DeepfakeVerifier {
    pub fn new(
        source: Box<dyn VideoSource>,
        localizer: Box<dyn FaceLocalizer>,
        classifier: Box<dyn FaceClassifier>,
    ) -> Self {
        Self::with_config(source, localizer, classifier, ScanConfig::default())
    }

    pub fn with_config(
        source: Box<dyn VideoSource>,
        localizer: Box<dyn FaceLocalizer>,
        classifier: Box<dyn FaceClassifier>,
        config: ScanConfig,
    ) -> Self {
        info!(
            "🎬 DeepfakeVerifier: created (max {} frames per video)",
            config.max_frames
        );
        Self {
            source,
            localizer,
            classifier,
            pipeline: FaceScanPipeline::with_config(config),
        }
    }

    /// 按模型配置组装检测器
    ///
    /// 启用 `rustface` 特性时用 SeetaFace 定位（权重取自解析好的
    /// [`WeightSource`](crate::core::model::WeightSource)），否则回退到
    /// 无模型基线能力。
    pub fn with_model(config: &ModelConfig) -> Result<Self, DetectError> {
        #[cfg(feature = "rustface")]
        let localizer: Box<dyn FaceLocalizer> =
            Box::new(crate::face_scan::localizer::RustfaceLocalizer::new(config)?);
        #[cfg(not(feature = "rustface"))]
        let localizer: Box<dyn FaceLocalizer> =
            Box::new(crate::face_scan::localizer::SkinRegionLocalizer::new());

        info!(
            "🔧 Capabilities ready on {} ({} threads)",
            config.device.as_str(),
            config.num_threads
        );
        Ok(Self::new(
            Box::new(ImageSequenceSource::new()),
            localizer,
            Box::new(NoiseArtifactClassifier::new()),
        ))
    }

    /// 分析视频并产出报告
    pub fn analyze(&self, path: &Path) -> Result<PredictionReport, VideoError> {
        let report = self.pipeline.analyze(
            self.source.as_ref(),
            path,
            self.localizer.as_ref(),
            self.classifier.as_ref(),
        )?;
        Ok(PredictionReport::from_scan(&report))
    }

    /// 用指定帧预算分析，覆盖构建时的配置值
    pub fn analyze_with_limit(
        &self,
        path: &Path,
        max_frames: u64,
    ) -> Result<PredictionReport, VideoError> {
        let pipeline = FaceScanPipeline::with_config(ScanConfig { max_frames });
        let report = pipeline.analyze(
            self.source.as_ref(),
            path,
            self.localizer.as_ref(),
            self.classifier.as_ref(),
        )?;
        Ok(PredictionReport::from_scan(&report))
    }
}

impl Drop for DeepfakeVerifier {
    fn drop(&mut self) {
        info!("🗑️ DeepfakeVerifier: released");
    }
}
