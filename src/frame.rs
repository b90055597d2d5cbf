/// 视频帧 (Frame)
///
/// 三通道 8 位像素网格,通道顺序由 `ChannelOrder` 标记。
/// 一帧只在一次流水线执行中存在: 采集 → 归一化 → 标注(原地修改) → 显示
use image::RgbImage;

use crate::error::{PipelineError, Result};

/// 通道顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// 无人机解码器输出的顺序
    Rgb,
    /// 检测器与标注器使用的顺序
    Bgr,
}

impl ChannelOrder {
    pub fn reversed(self) -> Self {
        match self {
            ChannelOrder::Rgb => ChannelOrder::Bgr,
            ChannelOrder::Bgr => ChannelOrder::Rgb,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: RgbImage,
    order: ChannelOrder,
}

impl Frame {
    /// 从紧凑排列的三通道字节创建帧
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>, order: ChannelOrder) -> Result<Self> {
        let pixels = RgbImage::from_raw(width, height, data)
            .ok_or(PipelineError::FrameShape { width, height })?;
        Ok(Self { pixels, order })
    }

    /// 纯黑帧
    pub fn black(width: u32, height: u32, order: ChannelOrder) -> Self {
        Self {
            pixels: RgbImage::new(width, height),
            order,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// 颜色空间归一化: 反转通道顺序 (RGB ↔ BGR)
    ///
    /// 纯函数,对任意尺寸都成立,连续调用两次得到原始缓冲区
    pub fn normalize(mut self) -> Self {
        swap_channels(&mut self.pixels);
        self.order = self.order.reversed();
        self
    }
}

/// 原地交换第一、第三通道
pub fn swap_channels(pixels: &mut RgbImage) {
    for px in pixels.pixels_mut() {
        px.0.swap(0, 2);
    }
}
