// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 杂草检测模型
// 包含: 模型加载、预处理、推理、后处理

use anyhow::{Context, Result};
use fast_image_resize as fr;
use ndarray::{s, Array, Axis, IxDyn};

use crate::detection::{non_max_suppression, BBox, Candidate, Detect, Detection};
use crate::error::PipelineError;
use crate::frame::{ChannelOrder, Frame};
use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};

const CXYWH_OFFSET: usize = 4;
/// letterbox 填充灰度
const PAD_VALUE: f32 = 114.0 / 255.0;

/// 后处理参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YOLOv8Config {
    pub conf: f32,
    pub iou: f32,
    pub max_det: usize,
    pub imgsz: u32,
}

impl Default for YOLOv8Config {
    fn default() -> Self {
        Self {
            conf: 0.25,
            iou: 0.7,
            max_det: 300,
            imgsz: 640,
        }
    }
}

/// YOLOv8 完整模型结构
pub struct YOLOv8 {
    engine: OrtBackend,
    config: YOLOv8Config,
    profile: bool,
}

impl YOLOv8 {
    pub fn new(model: &str, ep: OrtEP, config: YOLOv8Config) -> Result<Self> {
        let engine = OrtBackend::build(OrtConfig {
            f: model.to_string(),
            ep,
        })?;
        Ok(Self {
            engine,
            config,
            profile: log::log_enabled!(log::Level::Debug),
        })
    }

    /// 帧 → NCHW 张量 (RGB, 0~1), 返回缩放比例
    pub fn preprocess(&self, frame: &Frame) -> Result<(Array<f32, IxDyn>, f32)> {
        preprocess(frame, self.config.imgsz)
    }

    pub fn run(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let t_pre = std::time::Instant::now();
        let (xs, ratio) = self.preprocess(frame)?;
        if self.profile {
            log::debug!("[Model Preprocess]: {:?}", t_pre.elapsed());
        }

        let ys = self.engine.run(xs, self.profile)?;
        let preds = ys.first().context("model produced no outputs")?;

        let t_post = std::time::Instant::now();
        let detections = postprocess(
            preds,
            ratio,
            (frame.width() as f32, frame.height() as f32),
            &self.config,
        )?;
        if self.profile {
            log::debug!("[Model Postprocess]: {:?}", t_post.elapsed());
        }
        Ok(detections)
    }
}

impl Detect for YOLOv8 {
    fn detect(&mut self, frame: &Frame) -> crate::error::Result<Vec<Detection>> {
        self.run(frame)
            .map_err(|e| PipelineError::Model(format!("{e:#}")))
    }
}

fn scale_wh(w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
    let r = (w1 / w0).min(h1 / h0);
    (r, (w0 * r).round(), (h0 * r).round())
}

/// 等比缩放到 imgsz 方框内 (左上对齐, 其余填充灰色)
pub fn preprocess(frame: &Frame, imgsz: u32) -> Result<(Array<f32, IxDyn>, f32)> {
    if frame.is_empty() {
        return Err(PipelineError::EmptyFrame.into());
    }
    let (w0, h0) = (frame.width() as f32, frame.height() as f32);
    let (ratio, w_new, h_new) = scale_wh(w0, h0, imgsz as f32, imgsz as f32);
    let (w_new, h_new) = ((w_new as u32).clamp(1, imgsz), (h_new as u32).clamp(1, imgsz));

    let src = fr::images::ImageRef::new(
        frame.width(),
        frame.height(),
        frame.as_raw(),
        fr::PixelType::U8x3,
    )
    .context("failed to create resize source")?;
    let mut dst = fr::images::Image::new(w_new, h_new, fr::PixelType::U8x3);
    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src,
            &mut dst,
            &fr::ResizeOptions::new()
                .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear)),
        )
        .context("resize failed")?;

    // 模型按 RGB 训练
    let (r_idx, b_idx) = match frame.order() {
        ChannelOrder::Rgb => (0, 2),
        ChannelOrder::Bgr => (2, 0),
    };

    let mut ys = Array::from_elem((1, 3, imgsz as usize, imgsz as usize), PAD_VALUE).into_dyn();
    let raw = dst.buffer();
    for y in 0..h_new as usize {
        for x in 0..w_new as usize {
            let i = (y * w_new as usize + x) * 3;
            ys[[0, 0, y, x]] = raw[i + r_idx] as f32 / 255.0;
            ys[[0, 1, y, x]] = raw[i + 1] as f32 / 255.0;
            ys[[0, 2, y, x]] = raw[i + b_idx] as f32 / 255.0;
        }
    }
    Ok((ys, ratio))
}

/// 解码模型输出 `[1, 4 + nc, N]` → 原图坐标下的检测结果
pub fn postprocess(
    preds: &Array<f32, IxDyn>,
    ratio: f32,
    (width_original, height_original): (f32, f32),
    config: &YOLOv8Config,
) -> Result<Vec<Detection>> {
    let shape = preds.shape();
    if shape.len() != 3 || shape[1] <= CXYWH_OFFSET {
        anyhow::bail!("unexpected output shape {:?}", shape);
    }
    let nc = shape[1] - CXYWH_OFFSET;

    let anchor = preds.index_axis(Axis(0), 0);
    let mut data: Vec<Candidate> = Vec::new();
    for pred in anchor.axis_iter(Axis(1)) {
        let bbox = pred.slice(s![0..CXYWH_OFFSET]);
        let clss = pred.slice(s![CXYWH_OFFSET..CXYWH_OFFSET + nc]);

        let Some((id, &confidence)) = clss
            .iter()
            .enumerate()
            .reduce(|max, x| if x.1 > max.1 { x } else { max })
        else {
            continue;
        };

        if confidence < config.conf {
            continue;
        }

        let cx = bbox[0] / ratio;
        let cy = bbox[1] / ratio;
        let w = bbox[2] / ratio;
        let h = bbox[3] / ratio;
        data.push(Candidate {
            xmin: (cx - w / 2.).clamp(0.0, width_original),
            ymin: (cy - h / 2.).clamp(0.0, height_original),
            xmax: (cx + w / 2.).clamp(0.0, width_original),
            ymax: (cy + h / 2.).clamp(0.0, height_original),
            class_id: id,
            confidence,
        });
    }

    non_max_suppression(&mut data, config.iou);
    data.truncate(config.max_det);

    Ok(data
        .into_iter()
        .map(|c| {
            Detection::new(
                BBox::from_xyxy([c.xmin, c.ymin, c.xmax, c.ymax]),
                c.class_id,
                c.confidence,
            )
        })
        .collect())
}
