//! 集成测试共用的替身: 方块字体、固定帧来源、固定检测器
#![allow(dead_code)]

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use weedwatch::{ChannelOrder, Detect, Detection, Frame, FrameSource, LabelFont, Result};

/// 每个字符 8x16, 文字画成实心块
pub struct BlockFont;

impl LabelFont for BlockFont {
    fn text_size(&self, text: &str) -> (u32, u32) {
        (text.chars().count() as u32 * 8, 16)
    }

    fn draw_text(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, baseline: i32, text: &str) {
        let (w, h) = self.text_size(text);
        draw_filled_rect_mut(canvas, Rect::at(x, baseline - h as i32).of_size(w, h), color);
    }
}

/// 始终返回同一帧
pub struct StillSource(pub Frame);

impl FrameSource for StillSource {
    fn current_frame(&mut self) -> Result<Frame> {
        Ok(self.0.clone())
    }
}

/// 返回固定检测结果, 记录收到的帧
#[derive(Default)]
pub struct ScriptedDetector {
    pub detections: Vec<Detection>,
    pub seen: Vec<Frame>,
}

impl Detect for ScriptedDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        self.seen.push(frame.clone());
        Ok(self.detections.clone())
    }
}

/// 绿色 RGB 帧 (和 Tello 解码输出同序)
pub fn green_rgb_frame(width: u32, height: u32) -> Frame {
    let data = [0u8, 200, 0].repeat((width * height) as usize);
    Frame::from_raw(width, height, data, ChannelOrder::Rgb).unwrap()
}
