//! 采样扫描管线：顺序读帧 → 定位 → 夹紧裁剪 → 分类 → 聚合

use super::aggregate::{AggregateResult, ScoreAggregator};
use super::classifier::{normalize, FaceClassifier};
use super::error::DetectError;
use super::localizer::FaceLocalizer;
use super::region::FaceCrop;
use crate::core::video::error::VideoError;
use crate::core::video::frame::Frame;
use crate::core::video::source::VideoSource;
use log::{debug, info, warn};
use std::path::Path;

/// 扫描配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 帧预算；实际处理 min(max_frames, frame_count) 帧
    pub max_frames: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { max_frames: 50 }
    }
}

impl ScanConfig {
    /// 快速初筛
    pub fn quick() -> Self {
        Self { max_frames: 12 }
    }

    /// 长视频的取证复核
    pub fn thorough() -> Self {
        Self { max_frames: 200 }
    }
}

/// 单帧处理结果：产出评分，或整帧被跳过
#[derive(Debug)]
pub enum FrameOutcome {
    Scores(Vec<f32>),
    Skipped(SkipReason),
}

#[derive(Debug)]
pub enum SkipReason {
    Detection(DetectError),
}

/// 扫描统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub faces_scored: u64,
    pub crops_skipped: u64,
    pub boxes_discarded: u64,
}

/// 扫描产出：判定 + 统计
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub result: AggregateResult,
    pub stats: ScanStats,
}

pub struct FaceScanPipeline {
    config: ScanConfig,
}

impl FaceScanPipeline {
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// 分析一个视频，产出判定与统计
    ///
    /// 打开失败立即返回错误，此时没有处理过任何帧；
    /// 单帧/单裁剪的失败只影响自身，不会中止整个视频。
    /// 解码句柄在所有退出路径上随作用域释放。
    pub fn analyze(
        &self,
        source: &dyn VideoSource,
        path: &Path,
        localizer: &dyn FaceLocalizer,
        classifier: &dyn FaceClassifier,
    ) -> Result<ScanReport, VideoError> {
        info!("🎬 Analyzing video: {}", path.display());

        let mut handle = source.open(path)?;
        let frame_count = handle.frame_count();
        let budget = frame_count.min(self.config.max_frames);
        debug!("Processing up to {} of {} frames", budget, frame_count);

        let mut aggregator = ScoreAggregator::new();
        let mut stats = ScanStats::default();

        while stats.frames_processed < budget {
            // 流可能在预算内提前结束，短视频是合法输入
            let Some(frame) = handle.read_next() else {
                break;
            };
            stats.frames_processed += 1;

            match self.scan_frame(&frame, localizer, classifier, &mut stats) {
                FrameOutcome::Scores(scores) => {
                    stats.faces_scored += scores.len() as u64;
                    aggregator.extend(scores);
                }
                FrameOutcome::Skipped(SkipReason::Detection(e)) => {
                    warn!(
                        "⚠️ Face detection error on frame {}: {}",
                        frame.frame_number, e
                    );
                    stats.frames_skipped += 1;
                }
            }
        }

        let result = aggregator.finish();
        info!(
            "✅ Scan complete: {} frames processed, {} faces scored",
            stats.frames_processed, stats.faces_scored
        );
        Ok(ScanReport { result, stats })
    }

    fn scan_frame(
        &self,
        frame: &Frame,
        localizer: &dyn FaceLocalizer,
        classifier: &dyn FaceClassifier,
        stats: &mut ScanStats,
    ) -> FrameOutcome {
        let boxes = match localizer.detect(frame) {
            Ok(boxes) => boxes,
            Err(e) => return FrameOutcome::Skipped(SkipReason::Detection(e)),
        };

        let spec = classifier.input_spec();
        let mut scores = Vec::new();

        for face_box in boxes {
            // 退化框静默丢弃，不产生评分也不算错误
            let Some(region) = face_box.clamp_to(frame.width, frame.height) else {
                stats.boxes_discarded += 1;
                continue;
            };

            let crop = FaceCrop::extract(frame, &region);
            let input = normalize(&crop, &spec);
            match classifier.score(&input) {
                Ok(score) => scores.push(score),
                Err(e) => {
                    warn!(
                        "⚠️ Classification error on frame {}: {}",
                        frame.frame_number, e
                    );
                    stats.crops_skipped += 1;
                }
            }
        }

        FrameOutcome::Scores(scores)
    }
}

impl Default for FaceScanPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::source::MockVideoSource;
    use crate::face_scan::aggregate::VerdictLabel;
    use crate::face_scan::classifier::MockFaceClassifier;
    use crate::face_scan::localizer::MockFaceLocalizer;
    use crate::face_scan::region::FaceBox;

    fn test_frames(n: u64) -> Vec<Frame> {
        (1..=n)
            .map(|i| Frame::filled(32, 32, [128, 128, 128, 255], i))
            .collect()
    }

    fn full_box() -> FaceBox {
        FaceBox::new(0.0, 0.0, 32.0, 32.0)
    }

    #[test]
    fn test_frame_cap_respected() {
        let source = MockVideoSource::with_frames(test_frames(60));
        let pipeline = FaceScanPipeline::new();

        let report = pipeline
            .analyze(
                &source,
                Path::new("long"),
                &MockFaceLocalizer::none(),
                &MockFaceClassifier::constant(0.5),
            )
            .unwrap();

        assert_eq!(report.stats.frames_processed, 50);
    }

    #[test]
    fn test_short_video_processes_all_frames() {
        // 帧数少于预算：全部处理，提前收尾不算错误
        let source = MockVideoSource::with_frames(test_frames(10));
        let pipeline = FaceScanPipeline::new();

        let report = pipeline
            .analyze(
                &source,
                Path::new("short"),
                &MockFaceLocalizer::none(),
                &MockFaceClassifier::constant(0.5),
            )
            .unwrap();

        assert_eq!(report.stats.frames_processed, 10);
        assert_eq!(report.result, AggregateResult::NoEvidence);
    }

    #[test]
    fn test_stream_ending_before_reported_count() {
        // 元数据声称 40 帧，实际只能读出 5 帧
        let source = MockVideoSource::with_reported_count(test_frames(5), 40);
        let pipeline = FaceScanPipeline::new();

        let report = pipeline
            .analyze(
                &source,
                Path::new("truncated"),
                &MockFaceLocalizer::none(),
                &MockFaceClassifier::constant(0.5),
            )
            .unwrap();

        assert_eq!(report.stats.frames_processed, 5);
    }

    #[test]
    fn test_scores_aggregated_to_fake_verdict() {
        let source = MockVideoSource::with_frames(test_frames(3));
        let pipeline = FaceScanPipeline::new();

        let report = pipeline
            .analyze(
                &source,
                Path::new("fake"),
                &MockFaceLocalizer::with_fixed_box(full_box()),
                &MockFaceClassifier::with_scores(vec![0.9, 0.8, 0.95]),
            )
            .unwrap();

        assert_eq!(report.stats.faces_scored, 3);
        let AggregateResult::Verdict { label, confidence } = report.result else {
            panic!("expected verdict");
        };
        assert_eq!(label, VerdictLabel::Fake);
        assert!((confidence - 88.3333).abs() < 1e-3);
    }

    #[test]
    fn test_detection_error_skips_frame_only() {
        let source = MockVideoSource::with_frames(test_frames(3));
        let pipeline = FaceScanPipeline::new();

        let localizer = MockFaceLocalizer::with_fixed_box(full_box()).failing_on(vec![2]);
        let report = pipeline
            .analyze(
                &source,
                Path::new("flaky-detect"),
                &localizer,
                &MockFaceClassifier::constant(0.9),
            )
            .unwrap();

        // 第 2 帧被跳过，其余帧照常计分
        assert_eq!(report.stats.frames_processed, 3);
        assert_eq!(report.stats.frames_skipped, 1);
        assert_eq!(report.stats.faces_scored, 2);
        assert!(matches!(
            report.result,
            AggregateResult::Verdict {
                label: VerdictLabel::Fake,
                ..
            }
        ));
    }

    #[test]
    fn test_classification_error_skips_crop_only() {
        let source = MockVideoSource::with_frames(test_frames(3));
        let pipeline = FaceScanPipeline::new();

        let classifier = MockFaceClassifier::with_scores(vec![0.9]).failing_on_calls(vec![2]);
        let report = pipeline
            .analyze(
                &source,
                Path::new("flaky-classify"),
                &MockFaceLocalizer::with_fixed_box(full_box()),
                &classifier,
            )
            .unwrap();

        assert_eq!(report.stats.faces_scored, 2);
        assert_eq!(report.stats.crops_skipped, 1);
        assert_eq!(report.stats.frames_skipped, 0);
    }

    #[test]
    fn test_all_classifications_failing_yields_no_evidence() {
        let source = MockVideoSource::with_frames(test_frames(2));
        let pipeline = FaceScanPipeline::new();

        let report = pipeline
            .analyze(
                &source,
                Path::new("dead-classifier"),
                &MockFaceLocalizer::with_fixed_box(full_box()),
                &MockFaceClassifier::failing(),
            )
            .unwrap();

        assert_eq!(report.result, AggregateResult::NoEvidence);
        assert_eq!(report.stats.crops_skipped, 2);
    }

    #[test]
    fn test_degenerate_boxes_discarded_silently() {
        let source = MockVideoSource::with_frames(test_frames(2));
        let pipeline = FaceScanPipeline::new();

        // 一个完全出界的框 + 一个反转框
        let localizer = MockFaceLocalizer::with_pattern(|_| {
            vec![
                FaceBox::new(100.0, 100.0, 200.0, 200.0),
                FaceBox::new(20.0, 5.0, 10.0, 15.0),
            ]
        });
        let report = pipeline
            .analyze(
                &source,
                Path::new("degenerate"),
                &localizer,
                &MockFaceClassifier::constant(0.9),
            )
            .unwrap();

        assert_eq!(report.stats.boxes_discarded, 4);
        assert_eq!(report.stats.faces_scored, 0);
        assert_eq!(report.result, AggregateResult::NoEvidence);
    }

    #[test]
    fn test_cannot_open_propagates() {
        let source = MockVideoSource::failing();
        let pipeline = FaceScanPipeline::new();

        let result = pipeline.analyze(
            &source,
            Path::new("broken.mp4"),
            &MockFaceLocalizer::none(),
            &MockFaceClassifier::constant(0.5),
        );

        assert!(matches!(result, Err(VideoError::CannotOpen(_))));
    }

    #[test]
    fn test_custom_frame_budget() {
        let source = MockVideoSource::with_frames(test_frames(30));
        let pipeline = FaceScanPipeline::with_config(ScanConfig { max_frames: 7 });

        let report = pipeline
            .analyze(
                &source,
                Path::new("budget"),
                &MockFaceLocalizer::none(),
                &MockFaceClassifier::constant(0.5),
            )
            .unwrap();

        assert_eq!(report.stats.frames_processed, 7);
    }
}
