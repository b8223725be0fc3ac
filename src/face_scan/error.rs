use thiserror::Error;

/// 人脸定位失败，可恢复：跳过该帧，继续处理后续帧
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Face detection failed: {0}")]
    Backend(String),
    #[error("Model load failed: {0}")]
    ModelLoadFailed(String),
}

/// 人脸分类失败，可恢复：跳过该裁剪，继续处理
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Classification failed: {0}")]
    Backend(String),
}
