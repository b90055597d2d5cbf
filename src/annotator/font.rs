//! 标签字体

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;

use crate::error::{PipelineError, Result};

/// 与 Hershey Simplex (fontScale=1) 字高相当的像素尺寸
pub const LABEL_SCALE: f32 = 30.0;

/// 标签文字的测量与绘制
pub trait LabelFont {
    /// 文本占用的 (宽, 高)
    fn text_size(&self, text: &str) -> (u32, u32);

    /// 以 `baseline` 为基线绘制, 超出画布的部分被裁掉
    fn draw_text(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, baseline: i32, text: &str);
}

/// TrueType/OpenType 字体
#[derive(Clone, Debug)]
pub struct GlyphFont {
    font: FontArc,
    scale: PxScale,
}

impl GlyphFont {
    pub fn new(font: FontArc, scale: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(scale),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| PipelineError::Font(format!("{}: {}", path.display(), e)))?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| PipelineError::Font(format!("{}: {}", path.display(), e)))?;
        log::info!("✅ 字体加载成功: {}", path.display());
        Ok(Self::new(font, LABEL_SCALE))
    }
}

impl LabelFont for GlyphFont {
    fn text_size(&self, text: &str) -> (u32, u32) {
        text_size(self.scale, &self.font, text)
    }

    fn draw_text(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, baseline: i32, text: &str) {
        // imageproc 以行顶为起点
        let ascent = self.font.as_scaled(self.scale).ascent().round() as i32;
        draw_text_mut(canvas, color, x, baseline - ascent, self.scale, &self.font, text);
    }
}

impl<F: LabelFont + ?Sized> LabelFont for Box<F> {
    fn text_size(&self, text: &str) -> (u32, u32) {
        (**self).text_size(text)
    }

    fn draw_text(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, baseline: i32, text: &str) {
        (**self).draw_text(canvas, color, x, baseline, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_file_is_a_font_error() {
        match GlyphFont::load("/nonexistent/font.ttf") {
            Err(PipelineError::Font(msg)) => assert!(msg.contains("font.ttf")),
            other => panic!("expected Font error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn garbage_font_data_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a font").unwrap();
        assert!(matches!(
            GlyphFont::load(file.path()),
            Err(PipelineError::Font(_))
        ));
    }
}
