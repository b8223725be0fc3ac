//! 人脸真伪分类能力与输入归一化

use super::error::ClassifyError;
use super::region::FaceCrop;
use std::sync::Mutex;

/// 分类器输入规格：目标尺寸 + 通道统计量
#[derive(Debug, Clone, Copy)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for InputSpec {
    fn default() -> Self {
        // 224x224 + ImageNet 统计量
        Self {
            width: 224,
            height: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

/// 归一化后的分类器输入，CHW 平面布局
#[derive(Debug, Clone)]
pub struct NormalizedCrop {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

/// 缩放到目标尺寸后做逐通道归一化
pub fn normalize(crop: &FaceCrop, spec: &InputSpec) -> NormalizedCrop {
    let img = image::RgbaImage::from_raw(crop.width, crop.height, crop.data.clone())
        .expect("Invalid crop data");
    let resized = image::imageops::resize(
        &img,
        spec.width,
        spec.height,
        image::imageops::FilterType::Triangle,
    );

    let pixels = (spec.width * spec.height) as usize;
    let mut data = vec![0.0f32; pixels * 3];
    for (i, px) in resized.pixels().enumerate() {
        for c in 0..3 {
            data[c * pixels + i] = (px[c] as f32 / 255.0 - spec.mean[c]) / spec.std[c];
        }
    }

    NormalizedCrop {
        width: spec.width,
        height: spec.height,
        data,
    }
}

/// 人脸真伪分类器接口
///
/// 评分在 [0,1]，越接近 1 越可能被操纵过。
/// 实现构建后只读，可并发使用。
pub trait FaceClassifier: Send + Sync {
    /// 期望的输入形状与统计量
    fn input_spec(&self) -> InputSpec {
        InputSpec::default()
    }

    fn score(&self, input: &NormalizedCrop) -> Result<f32, ClassifyError>;
}

pub struct MockFaceClassifier {
    scores: Vec<f32>,
    next: Mutex<usize>,
    fail_calls: Vec<usize>,
    fail_all: bool,
}

impl MockFaceClassifier {
    /// 依次返回给定评分，用完循环
    pub fn with_scores(scores: Vec<f32>) -> Self {
        Self {
            scores,
            next: Mutex::new(0),
            fail_calls: Vec::new(),
            fail_all: false,
        }
    }

    pub fn constant(score: f32) -> Self {
        Self::with_scores(vec![score])
    }

    pub fn failing() -> Self {
        Self {
            scores: Vec::new(),
            next: Mutex::new(0),
            fail_calls: Vec::new(),
            fail_all: true,
        }
    }

    /// 指定调用序号（从 1 起）上返回分类失败
    pub fn failing_on_calls(mut self, calls: Vec<usize>) -> Self {
        self.fail_calls = calls;
        self
    }
}

impl FaceClassifier for MockFaceClassifier {
    fn score(&self, _input: &NormalizedCrop) -> Result<f32, ClassifyError> {
        let mut next = self.next.lock().unwrap();
        *next += 1;
        let call = *next;

        if self.fail_all || self.fail_calls.contains(&call) {
            return Err(ClassifyError::Backend(format!(
                "mock failure on call {}",
                call
            )));
        }
        Ok(self.scores[(call - 1) % self.scores.len()])
    }
}

/// 高频残差分类器 - 无模型降级方案
///
/// 合成人脸在高频域的能量分布常与自然影像不同；这里用相邻像素
/// 残差的平均幅度过一个 logistic，得到粗略的操纵可能性估计。
pub struct NoiseArtifactClassifier {
    /// 自然人脸残差幅度的参考基线
    baseline: f32,
    /// logistic 斜率
    steepness: f32,
}

impl NoiseArtifactClassifier {
    pub fn new() -> Self {
        Self {
            baseline: 0.35,
            steepness: 4.0,
        }
    }
}

impl Default for NoiseArtifactClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceClassifier for NoiseArtifactClassifier {
    fn score(&self, input: &NormalizedCrop) -> Result<f32, ClassifyError> {
        let w = input.width as usize;
        let h = input.height as usize;
        let pixels = w * h;
        if pixels == 0 || input.data.len() < pixels * 3 {
            return Err(ClassifyError::Backend("empty classifier input".to_string()));
        }

        let mut sum = 0.0f64;
        let mut count = 0u64;
        for c in 0..3 {
            let plane = &input.data[c * pixels..(c + 1) * pixels];
            for y in 0..h {
                for x in 1..w {
                    sum += (plane[y * w + x] - plane[y * w + x - 1]).abs() as f64;
                    count += 1;
                }
            }
            for y in 1..h {
                for x in 0..w {
                    sum += (plane[y * w + x] - plane[(y - 1) * w + x]).abs() as f64;
                    count += 1;
                }
            }
        }

        let residual = (sum / count as f64) as f32;
        let score = 1.0 / (1.0 + (-self.steepness * (residual - self.baseline)).exp());
        Ok(score.clamp(0.0, 1.0))
    }
}
