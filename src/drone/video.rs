/// 后台视频解码 + 最新帧读取
///
/// 解码线程把每一帧 RGB 图像放进单槽通道 (新帧顶掉旧帧),
/// 读取方每次取最新一帧, 没有新帧时重复上一帧
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::{PipelineError, Result};
use crate::frame::{ChannelOrder, Frame};

/// 首帧到达前返回的黑帧尺寸
pub const PLACEHOLDER_WIDTH: u32 = 400;
pub const PLACEHOLDER_HEIGHT: u32 = 300;

/// 新帧写入单槽通道, 槽位已满时丢弃旧帧
#[derive(Clone)]
pub struct LatestFrameSender {
    tx: Sender<Frame>,
    drain: Receiver<Frame>,
}

impl LatestFrameSender {
    /// 读取方已退出时返回 false
    pub fn publish(&self, frame: Frame) -> bool {
        let mut frame = frame;
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return true,
                Err(crossbeam_channel::TrySendError::Full(f)) => {
                    let _ = self.drain.try_recv();
                    frame = f;
                }
                Err(crossbeam_channel::TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// 最新帧读取器
pub struct FrameRead {
    rx: Receiver<Frame>,
    frame: Frame,
    stopped: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FrameRead {
    /// 创建通道两端; 发送端交给解码线程
    pub fn channel() -> (LatestFrameSender, Self) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let sender = LatestFrameSender {
            tx,
            drain: rx.clone(),
        };
        let reader = Self {
            rx,
            frame: Frame::black(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, ChannelOrder::Rgb),
            stopped: Arc::new(AtomicBool::new(false)),
            handle: None,
        };
        (sender, reader)
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }

    #[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
    fn attach(&mut self, handle: JoinHandle<()>) {
        self.handle = Some(handle);
    }

    /// 当前帧 (解码线程已退出且没有剩余帧时失败)
    pub fn frame(&mut self) -> Result<Frame> {
        match self.rx.try_recv() {
            Ok(frame) => self.frame = frame,
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => return Err(PipelineError::StreamInactive),
        }
        Ok(self.frame.clone())
    }

    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::Relaxed);
        // 解码线程在下一帧到达时退出, 不在这里阻塞等待
        self.handle.take();
    }
}

impl Drop for FrameRead {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

/// 启动后台解码线程
#[cfg(feature = "ffmpeg")]
pub fn spawn_decoder(url: &str) -> Result<FrameRead> {
    let (sender, mut reader) = FrameRead::channel();
    let stopped = reader.stop_flag();
    let url = url.to_string();
    let handle = std::thread::Builder::new()
        .name("tello-decoder".to_string())
        .spawn(move || ffmpeg::decode(&url, sender, stopped))?;
    reader.attach(handle);
    Ok(reader)
}

#[cfg(not(feature = "ffmpeg"))]
pub fn spawn_decoder(url: &str) -> Result<FrameRead> {
    log::error!("❌ 未启用 ffmpeg 特性, 无法解码 {}", url);
    Err(PipelineError::StreamInactive)
}

/// 平面步长能否容纳一行像素 (色度平面宽度向上取整)
#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
fn planes_fit(width: usize, height: usize, y_stride: usize, uv_stride: usize) -> bool {
    width > 0 && height > 0 && y_stride >= width && uv_stride >= (width + 1) / 2
}

/// YUV420P → 紧凑 RGB
pub fn yuv420p_to_rgb(
    y_plane: &[u8],
    u_plane: &[u8],
    v_plane: &[u8],
    y_stride: usize,
    uv_stride: usize,
    width: usize,
    height: usize,
) -> Vec<u8> {
    let mut buffer = vec![0u8; width * height * 3];
    let mut out_idx = 0;
    for y in 0..height {
        let y_row = y * y_stride;
        let uv_row = (y >> 1) * uv_stride;

        for x in 0..width {
            let y_val = y_plane[y_row + x] as i32;
            let u_val = u_plane[uv_row + (x >> 1)] as i32 - 128;
            let v_val = v_plane[uv_row + (x >> 1)] as i32 - 128;

            buffer[out_idx] = (y_val + ((v_val * 179) >> 7)).clamp(0, 255) as u8;
            buffer[out_idx + 1] =
                (y_val - ((u_val * 44) >> 7) - ((v_val * 91) >> 7)).clamp(0, 255) as u8;
            buffer[out_idx + 2] = (y_val + ((u_val * 227) >> 7)).clamp(0, 255) as u8;
            out_idx += 3;
        }
    }
    buffer
}

#[cfg(feature = "ffmpeg")]
mod ffmpeg {
    use super::{planes_fit, yuv420p_to_rgb, LatestFrameSender};
    use crate::frame::{ChannelOrder, Frame};
    use ez_ffmpeg::core::context::null_output::create_null_output;
    use ez_ffmpeg::filter::frame_filter::FrameFilter;
    use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
    use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
    use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    /// FFmpeg解码过滤器: H.264 → RGB帧
    #[derive(Clone)]
    struct DecodeFilter {
        sender: LatestFrameSender,
        stopped: Arc<AtomicBool>,
        count: usize,
        dropped_frames: usize,
        last: Instant,
    }

    impl FrameFilter for DecodeFilter {
        fn media_type(&self) -> AVMediaType {
            AVMediaType::AVMEDIA_TYPE_VIDEO
        }

        fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
            log::info!("✅ 解码线程启动");
            Ok(())
        }

        fn filter_frame(
            &mut self,
            frame: ez_ffmpeg::Frame,
            _ctx: &FrameFilterContext,
        ) -> Result<Option<ez_ffmpeg::Frame>, String> {
            if self.stopped.load(Ordering::Relaxed) {
                return Err("stream stopped".to_string());
            }

            unsafe {
                if frame.as_ptr().is_null() || frame.is_empty() || frame.is_corrupt() {
                    self.dropped_frames += 1;
                    return Ok(None);
                }

                let w = (*frame.as_ptr()).width as usize;
                let h = (*frame.as_ptr()).height as usize;
                let y_plane = (*frame.as_ptr()).data[0];
                let u_plane = (*frame.as_ptr()).data[1];
                let v_plane = (*frame.as_ptr()).data[2];
                let y_stride = (*frame.as_ptr()).linesize[0] as usize;
                let uv_stride = (*frame.as_ptr()).linesize[1] as usize;

                if y_plane.is_null()
                    || u_plane.is_null()
                    || v_plane.is_null()
                    || !planes_fit(w, h, y_stride, uv_stride)
                {
                    self.dropped_frames += 1;
                    return Ok(None);
                }

                let uv_rows = (h + 1) / 2;
                let rgb = yuv420p_to_rgb(
                    std::slice::from_raw_parts(y_plane, y_stride * h),
                    std::slice::from_raw_parts(u_plane, uv_stride * uv_rows),
                    std::slice::from_raw_parts(v_plane, uv_stride * uv_rows),
                    y_stride,
                    uv_stride,
                    w,
                    h,
                );

                let decoded = match Frame::from_raw(w as u32, h as u32, rgb, ChannelOrder::Rgb) {
                    Ok(f) => f,
                    Err(e) => return Err(e.to_string()),
                };
                if !self.sender.publish(decoded) {
                    return Err("frame reader closed".to_string());
                }
            }

            self.count += 1;
            if self.last.elapsed().as_secs_f64() >= 5.0 {
                let fps = self.count as f64 / self.last.elapsed().as_secs_f64();
                log::debug!("📺 解码统计: {:.1}fps | 丢弃{}", fps, self.dropped_frames);
                self.count = 0;
                self.last = Instant::now();
            }

            Ok(Some(frame))
        }

        fn uninit(&mut self, _ctx: &FrameFilterContext) {
            log::info!("✅ 解码线程退出");
        }
    }

    pub(super) fn decode(url: &str, sender: LatestFrameSender, stopped: Arc<AtomicBool>) {
        let filter = DecodeFilter {
            sender,
            stopped,
            count: 0,
            dropped_frames: 0,
            last: Instant::now(),
        };

        let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
        let pipe = pipe.filter("decode", Box::new(filter));
        let out = create_null_output().add_frame_pipeline(pipe);

        // 低延迟: 不缓冲
        let input = Input::new(url).set_input_opts(
            [("fflags", "nobuffer"), ("flags", "low_delay")].into(),
        );

        let ctx = match FfmpegContext::builder()
            .input(input)
            .filter_descs(["format=yuv420p"].into())
            .output(out)
            .build()
        {
            Ok(ctx) => ctx,
            Err(e) => {
                log::error!("❌ 解码器构建失败: {}", e);
                return;
            }
        };

        match ctx.start() {
            Ok(sch) => {
                let _ = sch.wait();
            }
            Err(e) => log::error!("❌ 解码器启动失败: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(value: u8) -> Frame {
        Frame::from_raw(2, 2, vec![value; 12], ChannelOrder::Rgb).unwrap()
    }

    #[test]
    fn placeholder_is_black_before_first_frame() {
        let (_sender, mut reader) = FrameRead::channel();
        let frame = reader.frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (400, 300));
        assert!(frame.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn newest_frame_wins_and_is_repeated() {
        let (sender, mut reader) = FrameRead::channel();
        assert!(sender.publish(solid(1)));
        assert!(sender.publish(solid(2)));
        assert_eq!(reader.frame().unwrap(), solid(2));
        // 没有新帧: 重复上一帧
        assert_eq!(reader.frame().unwrap(), solid(2));
    }

    #[test]
    fn closed_stream_is_inactive() {
        let (sender, mut reader) = FrameRead::channel();
        sender.publish(solid(7));
        drop(sender);
        // 剩余的帧仍可读
        assert_eq!(reader.frame().unwrap(), solid(7));
        assert!(matches!(reader.frame(), Err(PipelineError::StreamInactive)));
    }

    #[test]
    fn grey_yuv_maps_to_grey_rgb() {
        let (w, h) = (4, 2);
        let y = vec![128u8; w * h];
        let u = vec![128u8; (w / 2) * (h / 2)];
        let v = vec![128u8; (w / 2) * (h / 2)];
        let rgb = yuv420p_to_rgb(&y, &u, &v, w, w / 2, w, h);
        assert_eq!(rgb.len(), w * h * 3);
        assert!(rgb.iter().all(|&c| c == 128));
    }

    #[test]
    fn odd_widths_need_a_rounded_up_chroma_stride() {
        assert!(!planes_fit(5, 2, 5, 2));
        assert!(planes_fit(5, 2, 5, 3));
        assert!(planes_fit(960, 720, 960, 480));
        assert!(!planes_fit(0, 720, 960, 480));

        // 宽 5: 色度每行 3 个样本, 最后一列使用第 3 个
        let y = vec![100u8; 5 * 2];
        let u = vec![128, 128, 255];
        let v = vec![128, 128, 128];
        let rgb = yuv420p_to_rgb(&y, &u, &v, 5, 3, 5, 2);
        assert_eq!(rgb.len(), 5 * 2 * 3);
        assert_eq!(&rgb[0..3], &[100, 100, 100]);
        assert_eq!(rgb[4 * 3 + 2], 255);
    }

    #[test]
    fn strided_rows_skip_padding() {
        // 宽 2, 步长 4: 每行后两个字节是填充
        let y = vec![10, 20, 255, 255, 30, 40, 255, 255];
        let u = vec![128, 0];
        let v = vec![128, 0];
        let rgb = yuv420p_to_rgb(&y, &u, &v, 4, 2, 2, 2);
        assert_eq!(rgb, vec![10, 10, 10, 20, 20, 20, 30, 30, 30, 40, 40, 40]);
    }
}
