/// 检测模型实现
///
/// ## YOLOv8
/// 杂草检测模型 (ONNX 导出), 实现 `detection::Detect`
/// - 预处理: BGR 帧 → 等比缩放 → NCHW RGB 张量
/// - 推理:   `OrtBackend`
/// - 后处理: 最优类别 + 置信度阈值 + 按类别 NMS
pub mod yolov8;

pub use yolov8::{YOLOv8, YOLOv8Config};
