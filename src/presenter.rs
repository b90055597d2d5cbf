/// 显示层 (Presenter)
///
/// - `SurfaceImage`: 标注后的帧 → 上下翻转一次的 RGBA 像素
/// - `Ticker`:       固定帧率节拍, 落后时不补帧
/// - `Presenter`:    macroquad 纹理, 按窗口大小拉伸显示
use macroquad::prelude::*;
use std::time::{Duration, Instant};

use crate::frame::{ChannelOrder, Frame};

/// 显示表面的原生像素 (RGBA, 行序自下而上)
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SurfaceImage {
    pub fn from_frame(frame: &Frame) -> Self {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        let raw = frame.as_raw();
        let (r_idx, b_idx) = match frame.order() {
            ChannelOrder::Rgb => (0, 2),
            ChannelOrder::Bgr => (2, 0),
        };

        let mut rgba = Vec::with_capacity(w * h * 4);
        if frame.is_empty() {
            return Self {
                width: 0,
                height: 0,
                rgba,
            };
        }
        // 垂直翻转: 最后一行写在最前
        for row in raw.chunks_exact(w * 3).rev() {
            for px in row.chunks_exact(3) {
                rgba.extend_from_slice(&[px[r_idx], px[1], px[b_idx], 255]);
            }
        }

        Self {
            width: frame.width(),
            height: frame.height(),
            rgba,
        }
    }
}

/// 固定周期节拍
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(fps: u32) -> Self {
        Self::starting_at(fps, Instant::now())
    }

    pub fn starting_at(fps: u32, start: Instant) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            next: start,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// 到点返回 true; 错过多个周期也只触发一次
    pub fn ready(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.period;
        if self.next <= now {
            self.next = now + self.period;
        }
        true
    }
}

/// macroquad 显示窗口
#[derive(Default)]
pub struct Presenter {
    texture: Option<Texture2D>,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 替换当前显示的图像 (分辨率不变时只更新像素)
    pub fn show(&mut self, surface: &SurfaceImage) {
        let needs_rebuild = match &self.texture {
            Some(tex) => {
                tex.width() != surface.width as f32 || tex.height() != surface.height as f32
            }
            None => true,
        };

        if needs_rebuild {
            let texture =
                Texture2D::from_rgba8(surface.width as u16, surface.height as u16, &surface.rgba);
            texture.set_filter(FilterMode::Linear);
            self.texture = Some(texture);
        } else if let Some(tex) = &self.texture {
            // 直接上传像素, 不复制缓冲区
            tex.update_from_bytes(surface.width, surface.height, &surface.rgba);
        }
    }

    pub fn draw(&self) {
        clear_background(BLACK);
        if let Some(texture) = &self.texture {
            // 像素行自下而上存放, 纹理按 flip_y 显示
            draw_texture_ex(
                texture,
                0.0,
                0.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(screen_width(), screen_height())),
                    flip_y: true,
                    ..Default::default()
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_is_flipped_once_and_converted_to_rgba() {
        // 2x2 BGR: 上行蓝, 下行红
        let frame = Frame::from_raw(
            2,
            2,
            vec![255, 0, 0, 255, 0, 0, 0, 0, 255, 0, 0, 255],
            ChannelOrder::Bgr,
        )
        .unwrap();
        let surface = SurfaceImage::from_frame(&frame);
        assert_eq!((surface.width, surface.height), (2, 2));
        // 第一行是原来的下行 (红)
        assert_eq!(&surface.rgba[0..4], &[255, 0, 0, 255]);
        assert_eq!(&surface.rgba[8..12], &[0, 0, 255, 255]);
    }

    #[test]
    fn surface_buffer_holds_exactly_one_texture_upload() {
        let frame = Frame::black(960, 720, ChannelOrder::Bgr);
        let surface = SurfaceImage::from_frame(&frame);
        assert_eq!(surface.rgba.len(), 960 * 720 * 4);
        assert!(surface.rgba.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));

        let empty = SurfaceImage::from_frame(&Frame::black(0, 0, ChannelOrder::Bgr));
        assert!(empty.rgba.is_empty());
    }

    #[test]
    fn rgb_frames_keep_their_channels() {
        let frame = Frame::from_raw(1, 1, vec![10, 20, 30], ChannelOrder::Rgb).unwrap();
        assert_eq!(SurfaceImage::from_frame(&frame).rgba, vec![10, 20, 30, 255]);
    }

    #[test]
    fn ticker_fires_once_per_period() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(30, start);
        let period = ticker.period();
        assert!(ticker.ready(start));
        assert!(!ticker.ready(start + period / 2));
        assert!(ticker.ready(start + period));
    }

    #[test]
    fn ticker_does_not_burst_after_a_stall() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(30, start);
        let period = ticker.period();
        assert!(ticker.ready(start));
        let late = start + period * 10;
        assert!(ticker.ready(late));
        assert!(!ticker.ready(late));
        assert!(!ticker.ready(late + period / 2));
        assert!(ticker.ready(late + period));
    }
}
