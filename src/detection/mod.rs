/// 检测系统 (Detection System)
///
/// - Detect: 检测器统一接口 (帧 → 检测结果)
/// - types:  检测结果数据结构
/// - nms:    非极大值抑制
pub mod nms;
pub mod types;

pub use nms::{non_max_suppression, Candidate};
pub use types::{BBox, Detection};

use crate::error::Result;
use crate::frame::Frame;

/// 检测器接口
///
/// 输入归一化后的帧,返回检测结果 (可以为空,顺序无意义)。
/// 置信度阈值与NMS都由实现方负责,流水线不再做额外过滤
pub trait Detect {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

impl<D: Detect + ?Sized> Detect for Box<D> {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        (**self).detect(frame)
    }
}
