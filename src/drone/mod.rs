/// 无人机视频输入 (Drone Input)
///
/// - Tello:     SDK 控制通道 (UDP 文本指令: command / streamon / streamoff)
/// - FrameRead: 后台 H.264 解码线程 + 最新帧槽位
///
/// 只用到连接、开关视频流和读取当前帧, 不涉及飞行控制与遥测
pub mod tello;
pub mod video;

pub use tello::Tello;
pub use video::{spawn_decoder, yuv420p_to_rgb, FrameRead};

use crate::error::Result;
use crate::frame::Frame;

/// 帧来源
///
/// 每次调用返回当前最新的一帧; 没有新帧时返回上一帧
pub trait FrameSource {
    fn current_frame(&mut self) -> Result<Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn current_frame(&mut self) -> Result<Frame> {
        (**self).current_frame()
    }
}
