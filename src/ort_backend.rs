// ONNX Runtime 推理后端
use anyhow::{Context, Result};
use ndarray::{Array, IxDyn};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
    TensorRTExecutionProvider,
};
use ort::session::Session;
use ort::value::Tensor;

/// 执行设备
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    Cpu,
    Cuda(i32),
    Trt(i32),
}

impl OrtEP {
    /// 按优先级排列的执行设备 (GPU 不可用时由 ORT 回退到 CPU)
    fn providers(self) -> Vec<ExecutionProviderDispatch> {
        match self {
            OrtEP::Trt(device_id) => vec![
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CPUExecutionProvider::default().build(),
            ],
            OrtEP::Cuda(device_id) => vec![
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CPUExecutionProvider::default().build(),
            ],
            OrtEP::Cpu => vec![CPUExecutionProvider::default().build()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub f: String,
    pub ep: OrtEP,
}

pub struct OrtBackend {
    session: Session,
}

impl OrtBackend {
    pub fn build(args: OrtConfig) -> Result<Self> {
        let session = Session::builder()
            .context("failed to create ORT session builder")?
            .with_execution_providers(args.ep.providers())
            .context("failed to register execution providers")?
            .commit_from_file(&args.f)
            .with_context(|| format!("failed to load ONNX model {}", args.f))?;

        log::info!("✅ 模型加载成功: {} ({:?})", args.f, args.ep);
        Ok(Self { session })
    }

    /// 前向推理,返回全部输出 (按模型输出顺序)
    pub fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let t = std::time::Instant::now();
        let input = Tensor::from_array(xs).context("failed to create input tensor")?;
        let outputs = self
            .session
            .run(ort::inputs![input])
            .context("inference failed")?;

        let mut ys = Vec::new();
        for (_name, value) in outputs.iter() {
            let (shape, data) = value
                .try_extract_tensor::<f32>()
                .context("failed to extract output tensor")?;
            let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
            ys.push(Array::from_shape_vec(IxDyn(&dims), data.to_vec())?);
        }
        if profile {
            log::debug!("[ORT Inference]: {:?}", t.elapsed());
        }
        Ok(ys)
    }
}
