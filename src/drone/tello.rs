/// Tello SDK 控制通道
///
/// 指令以 ASCII 文本经 UDP 发往 `<ip>:8889`, 无人机回复 `ok` 或错误文本;
/// 视频流开启后以裸 H.264 推送到本机 11111 端口
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use super::video::{spawn_decoder, FrameRead};
use super::FrameSource;
use crate::error::{PipelineError, Result};
use crate::frame::Frame;

pub const CONTROL_PORT: u16 = 8889;
pub const VIDEO_PORT: u16 = 11111;
/// 单条指令等待回复的时间
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(7);
/// 单条指令最多发送次数
pub const RETRY_COUNT: usize = 3;

pub struct Tello {
    socket: UdpSocket,
    address: SocketAddr,
    response_timeout: Duration,
    video_url: String,
    frame_read: Option<FrameRead>,
}

impl Tello {
    /// 绑定本地控制端口, 准备与 `ip` 通信 (此时尚未发送任何指令)
    pub fn new(ip: &str) -> Result<Self> {
        let address: SocketAddr = format!("{ip}:{CONTROL_PORT}")
            .parse()
            .map_err(|e| PipelineError::Drone(format!("invalid drone address {ip}: {e}")))?;
        let socket = UdpSocket::bind(("0.0.0.0", CONTROL_PORT))?;
        Self::with_socket(socket, address)
    }

    /// 使用已绑定的套接字 (测试时指向本机模拟的无人机)
    pub fn with_socket(socket: UdpSocket, address: SocketAddr) -> Result<Self> {
        socket.set_read_timeout(Some(RESPONSE_TIMEOUT))?;
        Ok(Self {
            socket,
            address,
            response_timeout: RESPONSE_TIMEOUT,
            video_url: format!("udp://0.0.0.0:{VIDEO_PORT}"),
            frame_read: None,
        })
    }

    pub fn set_response_timeout(&mut self, timeout: Duration) {
        self.response_timeout = timeout;
    }

    /// 发送指令并返回回复文本 (超时会重发)
    pub fn send_command_with_return(&self, command: &str) -> Result<String> {
        let mut buf = [0u8; 1024];
        for attempt in 1..=RETRY_COUNT {
            log::debug!("📡 发送指令: {} (第{}次)", command, attempt);
            self.socket.send_to(command.as_bytes(), self.address)?;

            // 每次发送的等待时间固定, 其他来源的数据包不延长等待
            let deadline = Instant::now() + self.response_timeout;
            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    log::warn!("⚠️ 指令 `{}` 超时 ({}/{})", command, attempt, RETRY_COUNT);
                    break;
                }
                self.socket.set_read_timeout(Some(remaining))?;
                match self.socket.recv_from(&mut buf) {
                    // 只接受来自无人机的回复
                    Ok((n, from)) if from == self.address => {
                        let response = String::from_utf8_lossy(&buf[..n]).trim().to_string();
                        log::debug!("📨 回复 `{}`: {}", command, response);
                        return Ok(response);
                    }
                    Ok(_) => continue,
                    Err(e)
                        if matches!(
                            e.kind(),
                            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                        ) =>
                    {
                        log::warn!("⚠️ 指令 `{}` 超时 ({}/{})", command, attempt, RETRY_COUNT);
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Err(PipelineError::DroneTimeout(command.to_string()))
    }

    /// 发送指令, 回复必须是 `ok`
    pub fn send_control_command(&self, command: &str) -> Result<()> {
        let response = self.send_command_with_return(command)?;
        if response.eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(PipelineError::Drone(format!(
                "`{command}` rejected: {response}"
            )))
        }
    }

    /// 进入 SDK 模式
    pub fn connect(&mut self) -> Result<()> {
        log::info!("🚁 连接无人机: {}", self.address);
        self.send_control_command("command")?;
        log::info!("✅ 无人机已连接");
        Ok(())
    }

    /// 打开视频流并启动后台解码
    pub fn stream_on(&mut self) -> Result<()> {
        self.send_control_command("streamon")?;
        log::info!("📹 视频流已开启: {}", self.video_url);
        if self.frame_read.is_none() {
            self.frame_read = Some(spawn_decoder(&self.video_url)?);
        }
        Ok(())
    }

    pub fn stream_off(&mut self) -> Result<()> {
        if let Some(mut reader) = self.frame_read.take() {
            reader.stop();
        }
        self.send_control_command("streamoff")
    }

    /// 后台帧读取器 (视频流未开启时失败)
    pub fn frame_read(&mut self) -> Result<&mut FrameRead> {
        self.frame_read.as_mut().ok_or(PipelineError::StreamInactive)
    }
}

impl FrameSource for Tello {
    fn current_frame(&mut self) -> Result<Frame> {
        self.frame_read()?.frame()
    }
}

impl Drop for Tello {
    fn drop(&mut self) {
        if let Some(mut reader) = self.frame_read.take() {
            reader.stop();
            let _ = self
                .socket
                .send_to(b"streamoff", self.address);
        }
    }
}
