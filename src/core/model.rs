//! 模型能力配置：设备选择 + 权重解析
//!
//! 能力对象在进程启动时按本配置构建一次，之后只读复用；
//! analyze 调用只拿引用，不触碰全局状态。

use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// 推理设备
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    /// 环境声明了 CUDA 设备时选 Cuda，否则 Cpu；调用期不再探测
    pub fn auto() -> Self {
        match std::env::var("CUDA_VISIBLE_DEVICES") {
            Ok(v) if !v.trim().is_empty() && v.trim() != "-1" => Device::Cuda,
            _ => Device::Cpu,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

/// 权重来源
///
/// 自定义权重文件存在就用它，否则回退到预训练基线。
/// 回退在构建能力对象之前解析一次，不做调用期的异常回退。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightSource {
    Custom(PathBuf),
    Pretrained,
}

impl WeightSource {
    pub fn resolve(custom: impl AsRef<Path>) -> Self {
        let custom = custom.as_ref();
        if custom.is_file() {
            info!("✅ Loading custom weights from {}", custom.display());
            WeightSource::Custom(custom.to_path_buf())
        } else {
            warn!(
                "⚠️ No custom weights found at {}. Using pretrained baseline instead.",
                custom.display()
            );
            WeightSource::Pretrained
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            WeightSource::Custom(path) => Some(path),
            WeightSource::Pretrained => None,
        }
    }
}

/// 模型配置，构建定位器/分类器时传入
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub device: Device,
    pub weights: WeightSource,
    pub num_threads: usize,
}

impl ModelConfig {
    pub fn new(device: Device, weights: WeightSource) -> Self {
        let num_threads = num_cpus::get().min(4);
        debug!("Using {} threads on {}", num_threads, device.as_str());
        Self {
            device,
            weights,
            num_threads,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(Device::auto(), WeightSource::Pretrained)
    }
}
