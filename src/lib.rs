#![allow(clippy::type_complexity)]
// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 无人机杂草实时检测
//!
//! Tello 视频帧 → 通道归一化 → YOLOv8 检测 → 标注 → macroquad 显示
pub mod annotator; // 检测框与标签绘制
pub mod config; // 命令行参数 + 类别/配色表
pub mod detection; // 检测接口与结果类型
pub mod drone; // Tello 控制与视频帧读取
pub mod error;
pub mod frame; // 帧与通道顺序
pub mod models; // 模型实现
pub mod ort_backend;
pub mod pipeline; // 每帧流水线
pub mod presenter; // 显示

pub use crate::annotator::{Annotation, Annotator, GlyphFont, LabelFont};
pub use crate::config::{Args, Catalog};
pub use crate::detection::{BBox, Detect, Detection};
pub use crate::drone::{FrameSource, Tello};
pub use crate::error::{PipelineError, Result};
pub use crate::frame::{ChannelOrder, Frame};
pub use crate::models::{YOLOv8, YOLOv8Config};
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};
pub use crate::pipeline::{spawn_worker, Pipeline, TickOutput, Worker};
pub use crate::presenter::{Presenter, SurfaceImage, Ticker};
