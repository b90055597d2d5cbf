/// 无人机杂草实时检测
///
/// 运行: cargo run --bin weedwatch --release --features ffmpeg -- --model models/weeddect.onnx
///
/// 显示线程按 `--fps` 节拍驱动流水线; `--worker` 时采集和推理在后台线程执行
use anyhow::{Context, Result};
use clap::Parser;
use macroquad::prelude::*;
use std::time::Instant;

use weedwatch::{
    spawn_worker, Annotator, Args, Catalog, GlyphFont, Pipeline, Presenter, SurfaceImage, Tello,
    TickOutput, Ticker, Worker, YOLOv8, YOLOv8Config,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn window_conf() -> Conf {
    Conf {
        window_title: "🌱 Weed Detection".to_string(),
        window_width: 960,
        window_height: 720,
        high_dpi: true,
        ..Default::default()
    }
}

/// 同步执行或后台线程执行
enum Driver {
    Inline(Pipeline<Tello, YOLOv8, GlyphFont>),
    Worker(Worker),
}

impl Driver {
    fn poll(&mut self) -> weedwatch::Result<Option<TickOutput>> {
        match self {
            Driver::Inline(pipeline) => pipeline.tick().map(Some),
            Driver::Worker(worker) => worker.latest().transpose(),
        }
    }
}

fn build(args: &Args) -> Result<Driver> {
    let mut drone = Tello::new(&args.drone_ip)?;
    drone.connect().context("无人机连接失败")?;
    drone.stream_on().context("视频流开启失败")?;

    let model = YOLOv8::new(
        &args.model,
        args.execution_provider(),
        YOLOv8Config {
            conf: args.conf,
            iou: args.iou,
            max_det: args.max_det,
            imgsz: args.imgsz,
        },
    )?;
    let font = GlyphFont::load(&args.font)?;
    let annotator = Annotator::new(Catalog::weeds(), font);

    let pipeline = Pipeline::new(drone, model, annotator);
    if args.worker {
        log::info!("🧵 工作线程模式");
        Ok(Driver::Worker(spawn_worker(pipeline)?))
    } else {
        Ok(Driver::Inline(pipeline))
    }
}

async fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("🚀 启动参数: {:?}", args);

    let mut driver = build(&args)?;
    let mut presenter = Presenter::new();
    let mut ticker = Ticker::new(args.fps);

    loop {
        if is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q) {
            log::info!("👋 退出");
            break;
        }

        if ticker.ready(Instant::now()) {
            if let Some(out) = driver.poll()? {
                presenter.show(&SurfaceImage::from_frame(&out.frame));
            }
        }

        presenter.draw();
        next_frame().await;
    }
    Ok(())
}

#[macroquad::main(window_conf)]
async fn main() {
    if let Err(e) = run().await {
        log::error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
