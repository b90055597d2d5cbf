/// 运行参数与静态配置
pub mod catalog;

pub use catalog::{Bgr, Catalog, FALLBACK_COLOR, WEED_CLASSES};

use clap::Parser;

use crate::ort_backend::OrtEP;

/// 无人机杂草检测参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "无人机杂草实时检测", long_about = None)]
pub struct Args {
    /// ONNX 检测模型路径
    #[arg(long, default_value = "models/weeddect.onnx")]
    pub model: String,

    /// 标签字体 (TTF/OTF)
    #[arg(long, default_value = "assets/font/DejaVuSans.ttf")]
    pub font: String,

    /// Tello 控制地址
    #[arg(long, default_value = "192.168.10.1")]
    pub drone_ip: String,

    /// 刷新频率 (每秒执行流水线的次数)
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// 模型输入尺寸
    #[arg(long, default_value_t = 640)]
    pub imgsz: u32,

    /// 置信度阈值 (模型内部)
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// NMS IOU阈值 (模型内部)
    #[arg(long, default_value_t = 0.7)]
    pub iou: f32,

    /// 每帧最多检测数
    #[arg(long, default_value_t = 300)]
    pub max_det: usize,

    /// 使用 CUDA
    #[arg(long)]
    pub cuda: bool,

    /// 使用 TensorRT
    #[arg(long)]
    pub trt: bool,

    /// GPU 编号
    #[arg(long, default_value_t = 0)]
    pub device_id: i32,

    /// 采集+推理放到独立工作线程
    #[arg(long)]
    pub worker: bool,
}

impl Args {
    pub fn execution_provider(&self) -> OrtEP {
        if self.trt {
            OrtEP::Trt(self.device_id)
        } else if self.cuda {
            OrtEP::Cuda(self.device_id)
        } else {
            OrtEP::Cpu
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_weed_model() {
        let args = Args::parse_from(["weedwatch"]);
        assert_eq!(args.model, "models/weeddect.onnx");
        assert_eq!(args.drone_ip, "192.168.10.1");
        assert_eq!(args.fps, 30);
        assert!(!args.worker);
        assert_eq!(args.execution_provider(), OrtEP::Cpu);
    }

    #[test]
    fn trt_wins_over_cuda() {
        let args = Args::parse_from(["weedwatch", "--cuda", "--trt", "--device-id", "1"]);
        assert_eq!(args.execution_provider(), OrtEP::Trt(1));
    }
}
