/// 标注器 (Annotator)
///
/// 对每个检测结果依次:
/// 1. 按类别编号取类别名 (越界直接失败)
/// 2. 生成标签 `<类别名><两位小数置信度>`
/// 3. 按类别名取颜色 (缺省红色)
/// 4. 在帧上原地绘制: 外框 → 标签底色块 → 白色标签文字
///
/// 标签底色块紧贴框的上沿, 不做边界修正, 超出画面的部分直接裁掉
pub mod font;

pub use font::{GlyphFont, LabelFont, LABEL_SCALE};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::config::{Bgr, Catalog};
use crate::detection::{BBox, Detection};
use crate::error::{PipelineError, Result};
use crate::frame::Frame;

/// 外框线宽
pub const BOX_THICKNESS: i32 = 3;
/// 标签底色块比文字高出的像素
pub const LABEL_MARGIN: i32 = 3;
/// 文字基线相对框上沿的偏移
pub const TEXT_BASELINE_OFFSET: i32 = 2;
pub const TEXT_COLOR: Bgr = [255, 255, 255];

/// 一次绘制的记录
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub label: String,
    pub color: Bgr,
    pub bbox: BBox,
}

/// 标签格式: 类别名与置信度之间没有分隔符
pub fn label_for(class_name: &str, confidence: f32) -> String {
    format!("{class_name}{}", confidence_text(confidence))
}

/// 置信度保留两位小数, 去掉末尾的 0 但至少留一位小数 (0.5 → "0.5", 1 → "1.0")
fn confidence_text(confidence: f32) -> String {
    let rounded = (confidence as f64 * 100.0).round() / 100.0;
    let text = format!("{rounded:.2}");
    let trimmed = text.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

pub struct Annotator<F> {
    catalog: Catalog,
    font: F,
}

impl<F: LabelFont> Annotator<F> {
    pub fn new(catalog: Catalog, font: F) -> Self {
        Self { catalog, font }
    }

    /// 按顺序把检测结果画到帧上
    pub fn annotate(&self, frame: &mut Frame, detections: &[Detection]) -> Result<Vec<Annotation>> {
        if frame.is_empty() {
            return Err(PipelineError::EmptyFrame);
        }

        let mut annotations = Vec::with_capacity(detections.len());
        for det in detections {
            let class_name = self.catalog.class_name(det.class_id)?;
            let label = label_for(class_name, det.confidence);
            let color = self.catalog.color(class_name);
            let (tw, th) = self.font.text_size(&label);

            let canvas = frame.pixels_mut();
            let bbox = det.bbox;
            draw_box(canvas, bbox, Rgb(color), BOX_THICKNESS);

            // 底色块: (x1, y1 - th - 3) ~ (x1 + tw, y1)
            let top = bbox.y1 - th as i32 - LABEL_MARGIN;
            let background = Rect::at(bbox.x1, top).of_size(tw + 1, th + LABEL_MARGIN as u32 + 1);
            draw_filled_rect_mut(canvas, background, Rgb(color));

            self.font.draw_text(
                canvas,
                Rgb(TEXT_COLOR),
                bbox.x1,
                bbox.y1 - TEXT_BASELINE_OFFSET,
                &label,
            );

            annotations.push(Annotation { label, color, bbox });
        }
        Ok(annotations)
    }
}

/// 以框边为中心线画 `thickness` 像素宽的外框
fn draw_box(canvas: &mut RgbImage, bbox: BBox, color: Rgb<u8>, thickness: i32) {
    let half = thickness / 2;
    for t in -half..=(thickness - 1 - half) {
        let w = bbox.width() + 1 + 2 * t;
        let h = bbox.height() + 1 + 2 * t;
        if w <= 0 || h <= 0 {
            continue;
        }
        let rect = Rect::at(bbox.x1 - t, bbox.y1 - t).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
