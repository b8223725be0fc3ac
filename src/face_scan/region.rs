//! 人脸框几何：夹紧到帧边界，提取像素区域

use crate::core::video::frame::Frame;

/// 检测返回的人脸框，帧像素坐标
///
/// 坐标可能越界，也可能 x2<x1 / y2<y1（退化框）；
/// 夹紧之后才允许进入裁剪。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl FaceBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 把坐标夹到 [0,width]×[0,height] 内
    ///
    /// 夹紧后零面积（含反转框）返回 None，调用方静默丢弃，不算错误。
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<CropRegion> {
        let x1 = self.x1.max(0.0) as u32;
        let y1 = self.y1.max(0.0) as u32;
        let x2 = self.x2.min(frame_width as f32).max(0.0) as u32;
        let y2 = self.y2.min(frame_height as f32).max(0.0) as u32;

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(CropRegion {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        })
    }
}

/// 已夹紧的非退化像素区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// 从帧中提取出的人脸子图（RGBA）
#[derive(Debug, Clone)]
pub struct FaceCrop {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FaceCrop {
    /// 按行拷贝区域像素；region 必须来自同一帧的 clamp_to
    pub fn extract(frame: &Frame, region: &CropRegion) -> Self {
        let stride = (frame.width * 4) as usize;
        let mut data = Vec::with_capacity((region.width * region.height * 4) as usize);

        for row in region.y..region.y + region.height {
            let start = row as usize * stride + (region.x * 4) as usize;
            let end = start + (region.width * 4) as usize;
            data.extend_from_slice(&frame.data[start..end]);
        }

        Self {
            width: region.width,
            height: region.height,
            data,
        }
    }
}
