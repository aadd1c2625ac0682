//! 链路会话
//!
//! 三种设备共享同一个发送循环：
//!
//! ```text
//! for attempt in 1..=retries:
//!     丢弃残留输入 → 写整帧 → [稳定延时] → 等待设备响应
//!     → 累积字节直到终止符或无新数据 → 校验
//!     → 有效则返回；否则记录失败原因，进入下一次尝试
//! 全部失败 → RetriesExhausted（绝不返回过期或残缺的应答）
//! ```

use crate::clock::Clock;
use crate::config::LinkConfig;
use crate::error::LinkError;
use bytes::BytesMut;
use freezeray_protocol::{DeviceTag, FrameCodec, ReplyError};
use freezeray_serial::Transport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// 链路统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// 成功的交换次数
    pub exchanges: u64,
    /// 失败的单次尝试次数
    pub failed_attempts: u64,
    /// 重试耗尽次数
    pub exhausted: u64,
}

/// 单个设备的链路会话
///
/// 独占一个 `Transport`，生命周期等于一次运行。
pub struct LinkSession<C: FrameCodec> {
    codec: C,
    transport: Box<dyn Transport + Send>,
    config: LinkConfig,
    clock: Arc<dyn Clock>,
    /// 最近一次原始应答（仅用于诊断）
    last_raw: Vec<u8>,
    stats: LinkStats,
}

impl<C: FrameCodec> LinkSession<C> {
    pub fn new(
        codec: C,
        transport: Box<dyn Transport + Send>,
        config: LinkConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codec,
            transport,
            config,
            clock,
            last_raw: Vec::new(),
            stats: LinkStats::default(),
        }
    }

    pub fn device(&self) -> DeviceTag {
        C::DEVICE
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn last_raw(&self) -> &[u8] {
        &self.last_raw
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// 使用默认响应时间发送
    pub fn send(&mut self, command: &C::Command) -> Result<C::Reply, LinkError> {
        let delay = self.config.reply_delay();
        self.send_with_delay(command, delay)
    }

    /// 发送命令并等待有效应答
    ///
    /// 每次尝试写一整帧，读取前等待 `expected_delay`。
    ///
    /// # 错误
    /// - `LinkError::RetriesExhausted`: `retries` 次尝试均未得到有效应答
    /// - `LinkError::Transport`: 串口不可用（不重试）
    pub fn send_with_delay(
        &mut self,
        command: &C::Command,
        expected_delay: Duration,
    ) -> Result<C::Reply, LinkError> {
        let device = C::DEVICE;
        let frame = self.codec.encode(command);
        let retries = self.config.retries;
        let settle = self.config.settle_delay();
        let mut last = ReplyError::NoReply;

        for attempt in 1..=retries {
            let stale = self.transport.drain().map_err(|e| self.transport_error(e))?;
            if !stale.is_empty() {
                trace!("{}: discarded {} stale bytes: {}", device, stale.len(), hex::encode(&stale));
            }

            self.transport
                .write_all(frame.as_bytes())
                .map_err(|e| self.transport_error(e))?;
            trace!("{} tx [{}]: {}", device, command, hex::encode(frame.as_bytes()));

            if !settle.is_zero() {
                self.clock.sleep(settle);
            }
            self.clock.sleep(expected_delay);

            let raw = self.collect_reply()?;
            trace!("{} rx [{}]: {}", device, command, hex::encode(&raw));

            let decoded = self.codec.decode(&raw);
            self.last_raw = raw;
            match decoded {
                Ok(reply) => {
                    self.stats.exchanges += 1;
                    debug!("{} '{}' ok (attempt {}/{})", device, command, attempt, retries);
                    return Ok(reply);
                },
                Err(e) => {
                    self.stats.failed_attempts += 1;
                    warn!(
                        "{} '{}' attempt {}/{} failed: {} ({})",
                        device,
                        command,
                        attempt,
                        retries,
                        e.kind(),
                        e
                    );
                    last = e;
                },
            }
        }

        self.stats.exhausted += 1;
        error!(
            "{} '{}' retries exhausted after {} attempts, last failure: {}",
            device,
            command,
            retries,
            last.kind()
        );
        Err(LinkError::RetriesExhausted {
            device,
            command: command.to_string(),
            attempts: retries,
            last,
        })
    }

    /// 累积字节直到出现终止符或没有更多数据
    fn collect_reply(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut buf = BytesMut::with_capacity(64);
        loop {
            let chunk = match self.transport.read_available() {
                Ok(chunk) => chunk,
                // 读超时视为没有更多数据
                Err(e) if !e.is_fatal() => {
                    trace!("{} read interrupted: {}", C::DEVICE, e);
                    break;
                },
                Err(e) => return Err(self.transport_error(e)),
            };
            if chunk.is_empty() {
                break;
            }
            buf.extend_from_slice(&chunk);
            if self.codec.is_complete(&buf) {
                break;
            }
        }
        Ok(buf.to_vec())
    }

    /// 丢弃尚未读取的输入并返回（用于启动横幅）
    pub fn drain_input(&mut self) -> Result<Vec<u8>, LinkError> {
        self.transport.drain().map_err(|e| self.transport_error(e))
    }

    /// 关闭串口
    pub fn close(&mut self) {
        self.transport.close();
    }

    fn transport_error(&self, source: freezeray_serial::TransportError) -> LinkError {
        error!("{} transport error on '{}': {}", C::DEVICE, self.transport.name(), source);
        LinkError::Transport {
            device: C::DEVICE,
            source,
        }
    }
}
