//! 视频源抽象：打开视频 → 顺序读帧 → 随 Drop 释放

use super::error::VideoError;
use super::frame::Frame;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 帧序列目录里受支持的图片扩展名
static FRAME_EXTENSIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["jpg", "jpeg", "png", "bmp"].into_iter().collect());

/// 视频源接口
///
/// 实现负责容器解码；管线只消费帧序列，不关心编码细节。
pub trait VideoSource: Send + Sync {
    /// 打开视频，无法解码时返回 [`VideoError::CannotOpen`]
    fn open(&self, path: &Path) -> Result<Box<dyn VideoHandle>, VideoError>;
}

/// 单次分析独占的解码句柄
///
/// 句柄随 Drop 释放，成功、单帧错误、中途返回都会走到；
/// 释放不可能执行两次。
pub trait VideoHandle {
    fn frame_count(&self) -> u64;

    /// 按解码顺序读取下一帧；流结束返回 None，不可回退重放
    fn read_next(&mut self) -> Option<Frame>;
}

/// 图片序列视频源 - 把目录下按文件名排序的图片当作帧序列
pub struct ImageSequenceSource;

impl ImageSequenceSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageSequenceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSource for ImageSequenceSource {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoHandle>, VideoError> {
        let entries = std::fs::read_dir(path)
            .map_err(|e| VideoError::CannotOpen(format!("{}: {}", path.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(VideoError::CannotOpen(format!(
                "{}: no decodable frames",
                path.display()
            )));
        }

        info!(
            "🎬 Opened image sequence: {} ({} frames)",
            path.display(),
            files.len()
        );
        Ok(Box::new(ImageSequenceHandle { files, next: 0 }))
    }
}

struct ImageSequenceHandle {
    files: Vec<PathBuf>,
    next: usize,
}

impl VideoHandle for ImageSequenceHandle {
    fn frame_count(&self) -> u64 {
        self.files.len() as u64
    }

    fn read_next(&mut self) -> Option<Frame> {
        let path = self.files.get(self.next)?;
        let frame_number = self.next as u64 + 1;
        self.next += 1;

        match image::open(path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                Some(Frame::new(width, height, rgba.into_raw(), frame_number))
            }
            Err(e) => {
                // 中途解码失败视作流结束，和解码器读不出帧的表现一致
                warn!("⚠️ Frame {} failed to decode, ending stream: {}", frame_number, e);
                self.next = self.files.len();
                None
            }
        }
    }
}

impl Drop for ImageSequenceHandle {
    fn drop(&mut self) {
        debug!("🗑️ ImageSequenceHandle: released");
    }
}

/// 测试用视频源：回放预置帧，或模拟打开失败
pub struct MockVideoSource {
    frames: Vec<Frame>,
    reported_count: Option<u64>,
    fail_open: bool,
}

impl MockVideoSource {
    pub fn with_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            reported_count: None,
            fail_open: false,
        }
    }

    /// frameCount 报告值与真实可读帧数不一致的场景（元数据损坏的容器）
    pub fn with_reported_count(frames: Vec<Frame>, reported: u64) -> Self {
        Self {
            frames,
            reported_count: Some(reported),
            fail_open: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            frames: Vec::new(),
            reported_count: None,
            fail_open: true,
        }
    }
}

impl VideoSource for MockVideoSource {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoHandle>, VideoError> {
        if self.fail_open {
            return Err(VideoError::CannotOpen(path.display().to_string()));
        }
        let count = self.reported_count.unwrap_or(self.frames.len() as u64);
        Ok(Box::new(MockVideoHandle {
            frames: self.frames.clone().into_iter(),
            count,
        }))
    }
}

struct MockVideoHandle {
    frames: std::vec::IntoIter<Frame>,
    count: u64,
}

impl VideoHandle for MockVideoHandle {
    fn frame_count(&self) -> u64 {
        self.count
    }

    fn read_next(&mut self) -> Option<Frame> {
        self.frames.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frames(n: u64) -> Vec<Frame> {
        (1..=n).map(|i| Frame::filled(16, 16, [128, 128, 128, 255], i)).collect()
    }

    #[test]
    fn test_mock_source_reads_in_order() {
        let source = MockVideoSource::with_frames(test_frames(3));
        let mut handle = source.open(Path::new("mock")).unwrap();

        assert_eq!(handle.frame_count(), 3);
        assert_eq!(handle.read_next().unwrap().frame_number, 1);
        assert_eq!(handle.read_next().unwrap().frame_number, 2);
        assert_eq!(handle.read_next().unwrap().frame_number, 3);
        assert!(handle.read_next().is_none());
    }

    #[test]
    fn test_mock_source_failing_open() {
        let source = MockVideoSource::failing();
        let result = source.open(Path::new("broken.mp4"));

        assert!(matches!(result, Err(VideoError::CannotOpen(_))));
    }

    #[test]
    fn test_image_sequence_missing_dir() {
        let source = ImageSequenceSource::new();
        let result = source.open(Path::new("/nonexistent/frames"));

        assert!(matches!(result, Err(VideoError::CannotOpen(_))));
    }

    #[test]
    fn test_image_sequence_empty_dir() {
        let dir = std::env::temp_dir().join(format!("deepfake_lib_empty_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let source = ImageSequenceSource::new();
        let result = source.open(&dir);
        assert!(matches!(result, Err(VideoError::CannotOpen(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_image_sequence_reads_sorted_frames() {
        let dir = std::env::temp_dir().join(format!("deepfake_lib_seq_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        for (i, value) in [(1u8, 10u8), (2, 20), (3, 30)] {
            let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([value, 0, 0, 255]));
            img.save(dir.join(format!("frame_{:03}.png", i))).unwrap();
        }
        // 非图片文件应被忽略
        std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let source = ImageSequenceSource::new();
        let mut handle = source.open(&dir).unwrap();
        assert_eq!(handle.frame_count(), 3);

        let first = handle.read_next().unwrap();
        assert_eq!(first.frame_number, 1);
        assert_eq!(first.width, 4);
        assert_eq!(&first.data[0..4], &[10, 0, 0, 255]);

        assert_eq!(handle.read_next().unwrap().data[0], 20);
        assert_eq!(handle.read_next().unwrap().data[0], 30);
        assert!(handle.read_next().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
