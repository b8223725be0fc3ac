//! 人脸定位能力

use super::error::DetectError;
use super::region::FaceBox;
use crate::core::video::frame::Frame;

#[cfg(feature = "rustface")]
use crate::core::model::ModelConfig;
#[cfg(feature = "rustface")]
use log::info;

/// SeetaFace 预训练基线模型的默认路径
#[cfg(feature = "rustface")]
const PRETRAINED_SEETA_MODEL: &str = "models/seeta_fd_frontal_v1.0.bin";

/// 人脸定位器接口
///
/// 空列表表示该帧没有人脸；Err 表示该帧定位失败（可恢复）。
/// 实现构建后只读，可并发使用。
pub trait FaceLocalizer: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceBox>, DetectError>;
}

pub struct MockFaceLocalizer {
    // 按帧编号产出人脸框
    box_pattern: Option<Box<dyn Fn(u64) -> Vec<FaceBox> + Send + Sync>>,
    fail_frames: Vec<u64>,
}

impl MockFaceLocalizer {
    /// 任何帧都检不出人脸
    pub fn none() -> Self {
        Self {
            box_pattern: None,
            fail_frames: Vec::new(),
        }
    }

    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64) -> Vec<FaceBox> + Send + Sync + 'static,
    {
        Self {
            box_pattern: Some(Box::new(pattern)),
            fail_frames: Vec::new(),
        }
    }

    /// 每帧都返回同一个人脸框
    pub fn with_fixed_box(face_box: FaceBox) -> Self {
        Self::with_pattern(move |_| vec![face_box])
    }

    /// 指定帧编号上返回定位失败
    pub fn failing_on(mut self, frames: Vec<u64>) -> Self {
        self.fail_frames = frames;
        self
    }
}

impl FaceLocalizer for MockFaceLocalizer {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceBox>, DetectError> {
        if self.fail_frames.contains(&frame.frame_number) {
            return Err(DetectError::Backend(format!(
                "mock failure on frame {}",
                frame.frame_number
            )));
        }
        Ok(self
            .box_pattern
            .as_ref()
            .map(|p| p(frame.frame_number))
            .unwrap_or_default())
    }
}

/// 肤色区域定位器 - 无模型降级方案
///
/// 统计肤色像素的包围盒，覆盖率达到阈值才认为有人脸。
/// 只做粗定位，精度远不如模型，但零依赖且确定性。
pub struct SkinRegionLocalizer {
    /// 肤色像素占比下限
    min_coverage: f32,
    /// 包围盒外扩比例，给分类器留出脸部边缘的过渡区域
    margin: f32,
}

impl SkinRegionLocalizer {
    pub fn new() -> Self {
        Self {
            min_coverage: 0.02,
            margin: 0.1,
        }
    }

    fn is_skin(r: u8, g: u8, b: u8) -> bool {
        let (r, g, b) = (r as i32, g as i32, b as i32);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        r > 95 && g > 40 && b > 20 && max - min > 15 && (r - g).abs() > 15 && r > g && r > b
    }
}

impl Default for SkinRegionLocalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceLocalizer for SkinRegionLocalizer {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceBox>, DetectError> {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut skin_count = 0usize;

        for (i, px) in frame.data.chunks_exact(4).enumerate() {
            if Self::is_skin(px[0], px[1], px[2]) {
                let x = i as u32 % frame.width;
                let y = i as u32 / frame.width;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                skin_count += 1;
            }
        }

        if frame.pixel_count() == 0 {
            return Ok(vec![]);
        }
        let coverage = skin_count as f32 / frame.pixel_count() as f32;
        if coverage < self.min_coverage {
            return Ok(vec![]);
        }

        let margin_x = (max_x - min_x + 1) as f32 * self.margin;
        let margin_y = (max_y - min_y + 1) as f32 * self.margin;
        // 外扩后可能越界，由下游夹紧处理
        Ok(vec![FaceBox::new(
            min_x as f32 - margin_x,
            min_y as f32 - margin_y,
            (max_x + 1) as f32 + margin_x,
            (max_y + 1) as f32 + margin_y,
        )])
    }
}

/// SeetaFace 定位器（`rustface` 特性）
///
/// 模型从解析好的 [`WeightSource`](crate::core::model::WeightSource) 加载，
/// 自定义权重缺失时落到预训练基线路径。
#[cfg(feature = "rustface")]
pub struct RustfaceLocalizer {
    model: rustface::Model,
}

#[cfg(feature = "rustface")]
impl RustfaceLocalizer {
    pub fn new(config: &ModelConfig) -> Result<Self, DetectError> {
        let path = config
            .weights
            .path()
            .unwrap_or_else(|| std::path::Path::new(PRETRAINED_SEETA_MODEL));

        let bytes = std::fs::read(path)
            .map_err(|e| DetectError::ModelLoadFailed(format!("{}: {}", path.display(), e)))?;
        let model = rustface::read_model(std::io::Cursor::new(bytes))
            .map_err(|e| DetectError::ModelLoadFailed(e.to_string()))?;

        info!("✅ SeetaFace model loaded from {}", path.display());
        Ok(Self { model })
    }
}

#[cfg(feature = "rustface")]
impl FaceLocalizer for RustfaceLocalizer {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceBox>, DetectError> {
        // 检测器内部有可变金字塔状态，按帧新建；模型本体共享只读
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let gray: Vec<u8> = frame
            .data
            .chunks_exact(4)
            .map(|px| {
                let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
                ((r * 299 + g * 587 + b * 114) / 1000) as u8
            })
            .collect();

        let faces = detector.detect(&rustface::ImageData::new(&gray, frame.width, frame.height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox::new(
                    bbox.x() as f32,
                    bbox.y() as f32,
                    (bbox.x() + bbox.width() as i32) as f32,
                    (bbox.y() + bbox.height() as i32) as f32,
                )
            })
            .collect())
    }
}
