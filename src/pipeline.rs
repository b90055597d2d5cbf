/// 标注流水线 (Annotation Pipeline)
///
/// 每个节拍按顺序执行一次:
/// 取帧 → 通道归一化 (RGB → BGR) → 检测 → 标注
///
/// 默认在显示线程上同步执行; `spawn_worker` 把同样的流程搬到独立线程,
/// 通过单槽通道把完成的帧交给显示端
use crossbeam_channel::{Receiver, TryRecvError};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::annotator::{Annotation, Annotator, LabelFont};
use crate::detection::Detect;
use crate::drone::FrameSource;
use crate::error::{PipelineError, Result};
use crate::frame::Frame;

/// 一个节拍的结果
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub frame: Frame,
    pub annotations: Vec<Annotation>,
}

pub struct Pipeline<S, D, F> {
    source: S,
    detector: D,
    annotator: Annotator<F>,
    ticks: u64,
}

impl<S, D, F> Pipeline<S, D, F>
where
    S: FrameSource,
    D: Detect,
    F: LabelFont,
{
    pub fn new(source: S, detector: D, annotator: Annotator<F>) -> Self {
        Self {
            source,
            detector,
            annotator,
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// 完整执行一次流水线, 任何一步出错都直接返回
    pub fn tick(&mut self) -> Result<TickOutput> {
        let t0 = Instant::now();
        let mut frame = self.source.current_frame()?.normalize();

        let t1 = Instant::now();
        let detections = self.detector.detect(&frame)?;

        let t2 = Instant::now();
        let annotations = self.annotator.annotate(&mut frame, &detections)?;

        self.ticks += 1;
        log::trace!(
            "⏱️ 节拍#{} 取帧 {:?} | 检测 {:?} ({}个) | 标注 {:?}",
            self.ticks,
            t1 - t0,
            t2 - t1,
            detections.len(),
            t2.elapsed()
        );
        Ok(TickOutput { frame, annotations })
    }
}

/// 后台流水线线程的接收端
pub struct Worker {
    rx: Receiver<Result<TickOutput>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// 取最新完成的一帧; 还没有新结果时返回 None
    ///
    /// 线程已退出且没有留下结果时报告视频流失效
    pub fn latest(&self) -> Option<Result<TickOutput>> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(item) => {
                    let failed = item.is_err();
                    latest = Some(item);
                    // 错误之后不会再有结果
                    if failed {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if latest.is_none() {
                        latest = Some(Err(PipelineError::StreamInactive));
                    }
                    break;
                }
            }
        }
        latest
    }

    /// 阻塞等待下一个结果
    pub fn recv(&self) -> Result<TickOutput> {
        self.rx
            .recv()
            .unwrap_or(Err(PipelineError::StreamInactive))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // 断开通道后工作线程在下一次发送时退出
        let (_, closed) = crossbeam_channel::bounded(0);
        self.rx = closed;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// 在独立线程上循环执行流水线
///
/// 通道容量为 1: 显示端未取走时工作线程阻塞, 不丢帧;
/// 出错时把错误发给显示端后退出
pub fn spawn_worker<S, D, F>(mut pipeline: Pipeline<S, D, F>) -> Result<Worker>
where
    S: FrameSource + Send + 'static,
    D: Detect + Send + 'static,
    F: LabelFont + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    let handle = std::thread::Builder::new()
        .name("weed-pipeline".to_string())
        .spawn(move || {
            log::info!("🚀 流水线线程启动");
            loop {
                let result = pipeline.tick();
                let failed = result.is_err();
                if tx.send(result).is_err() {
                    break;
                }
                if failed {
                    break;
                }
            }
            log::info!("✅ 流水线线程退出 (共{}帧)", pipeline.ticks());
        })?;

    Ok(Worker {
        rx,
        handle: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Catalog;
    use crate::detection::{BBox, Detection};
    use crate::frame::ChannelOrder;
    use image::{Rgb, RgbImage};

    struct NoFont;

    impl LabelFont for NoFont {
        fn text_size(&self, text: &str) -> (u32, u32) {
            (text.len() as u32, 1)
        }

        fn draw_text(&self, _: &mut RgbImage, _: Rgb<u8>, _: i32, _: i32, _: &str) {}
    }

    struct Still(Frame);

    impl FrameSource for Still {
        fn current_frame(&mut self) -> Result<Frame> {
            Ok(self.0.clone())
        }
    }

    struct Fixed(Vec<Detection>);

    impl Detect for Fixed {
        fn detect(&mut self, _: &Frame) -> Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    fn rgb_frame() -> Frame {
        let data = (0..16 * 16 * 3).map(|i| (i % 251) as u8).collect();
        Frame::from_raw(16, 16, data, ChannelOrder::Rgb).unwrap()
    }

    #[test]
    fn tick_without_detections_returns_normalized_frame() {
        let input = rgb_frame();
        let mut pipeline = Pipeline::new(
            Still(input.clone()),
            Fixed(Vec::new()),
            Annotator::new(Catalog::weeds(), NoFont),
        );
        let out = pipeline.tick().unwrap();
        assert_eq!(out.frame, input.normalize());
        assert!(out.annotations.is_empty());
        assert_eq!(pipeline.ticks(), 1);
    }

    #[test]
    fn unknown_class_stops_the_tick() {
        let mut pipeline = Pipeline::new(
            Still(rgb_frame()),
            Fixed(vec![Detection::new(BBox::new(1, 1, 4, 4), 99, 0.5)]),
            Annotator::new(Catalog::weeds(), NoFont),
        );
        assert!(matches!(
            pipeline.tick(),
            Err(PipelineError::UnknownClass { class_id: 99, .. })
        ));
        assert_eq!(pipeline.ticks(), 0);
    }

    fn output(width: u32) -> Result<TickOutput> {
        Ok(TickOutput {
            frame: Frame::black(width, 1, ChannelOrder::Bgr),
            annotations: Vec::new(),
        })
    }

    /// 不启动线程, 直接持有通道接收端
    fn queued(
        items: Vec<Result<TickOutput>>,
    ) -> (crossbeam_channel::Sender<Result<TickOutput>>, Worker) {
        let (tx, rx) = crossbeam_channel::bounded(items.len().max(1));
        for item in items {
            tx.send(item).unwrap();
        }
        (tx, Worker { rx, handle: None })
    }

    #[test]
    fn latest_skips_to_the_newest_result() {
        let (_tx, worker) = queued(vec![output(1), output(2), output(3)]);
        let out = worker.latest().unwrap().unwrap();
        assert_eq!(out.frame.width(), 3);
        // 通道仍连着但已取空
        assert!(worker.latest().is_none());
    }

    #[test]
    fn latest_stops_at_an_error() {
        let (_tx, worker) = queued(vec![
            output(1),
            Err(PipelineError::Model("inference failed".to_string())),
            output(2),
        ]);
        assert!(matches!(worker.latest(), Some(Err(PipelineError::Model(_)))));
        // 错误之后排队的结果留到下一次
        assert_eq!(worker.latest().unwrap().unwrap().frame.width(), 2);
    }

    #[test]
    fn latest_reports_a_finished_worker_as_inactive() {
        let (tx, worker) = queued(Vec::new());
        assert!(worker.latest().is_none());
        drop(tx);
        assert!(matches!(
            worker.latest(),
            Some(Err(PipelineError::StreamInactive))
        ));
    }

    #[test]
    fn latest_keeps_results_queued_before_disconnect() {
        let (tx, worker) = queued(vec![output(4)]);
        drop(tx);
        assert_eq!(worker.latest().unwrap().unwrap().frame.width(), 4);
    }

    #[test]
    fn worker_forwards_frames_then_errors() {
        struct Countdown(u32);

        impl FrameSource for Countdown {
            fn current_frame(&mut self) -> Result<Frame> {
                if self.0 == 0 {
                    return Err(PipelineError::StreamInactive);
                }
                self.0 -= 1;
                Ok(Frame::black(4, 4, ChannelOrder::Rgb))
            }
        }

        let worker = spawn_worker(Pipeline::new(
            Countdown(2),
            Fixed(Vec::new()),
            Annotator::new(Catalog::weeds(), NoFont),
        ))
        .unwrap();

        assert!(worker.recv().is_ok());
        assert!(worker.recv().is_ok());
        assert!(matches!(worker.recv(), Err(PipelineError::StreamInactive)));
        // 线程退出后仍然报告失效
        assert!(matches!(worker.recv(), Err(PipelineError::StreamInactive)));
    }
}
