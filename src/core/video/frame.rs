/// 单帧图像数据
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
    /// 帧编号，从 1 开始，与解码顺序一致
    pub frame_number: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, frame_number: u64) -> Self {
        Self {
            width,
            height,
            data,
            frame_number,
        }
    }

    /// 生成单色帧（合成视频源与测试使用）
    pub fn filled(width: u32, height: u32, rgba: [u8; 4], frame_number: u64) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgba);
        }
        Self::new(width, height, data, frame_number)
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }
}
