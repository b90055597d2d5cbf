//! 流水线错误类型

use thiserror::Error;

/// 流水线错误 (任何一步失败都会直接传播到主循环)
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 检测器给出的类别编号超出类别表范围
    #[error("unknown class id {class_id} (catalog has {catalog_len} classes)")]
    UnknownClass { class_id: usize, catalog_len: usize },

    #[error("frame is empty (0 pixels)")]
    EmptyFrame,

    #[error("frame buffer does not match {width}x{height}x3")]
    FrameShape { width: u32, height: u32 },

    #[error("drone error: {0}")]
    Drone(String),

    #[error("drone did not answer `{0}`")]
    DroneTimeout(String),

    #[error("video stream is not active")]
    StreamInactive,

    #[error("model error: {0}")]
    Model(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ONNX Runtime error: {0}")]
    Ort(String),
}

impl From<ort::Error> for PipelineError {
    fn from(err: ort::Error) -> Self {
        PipelineError::Ort(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_class_message_names_both_numbers() {
        let err = PipelineError::UnknownClass {
            class_id: 16,
            catalog_len: 16,
        };
        let msg = err.to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("catalog"));
    }

    #[test]
    fn io_errors_convert() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout");
        let err: PipelineError = io_err.into();
        match err {
            PipelineError::Io(_) => {}
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
