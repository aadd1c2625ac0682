//! 恢复闸门
//!
//! 步骤设置了 `wait_for_resume` 时，执行器在驻留结束后阻塞，直到外部确认。
//! 这是运行中唯一可以取消的位置。

use crate::error::ControlError;
use crossbeam_channel::{Receiver, Sender};
use tracing::info;

/// 外部确认的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    Continue,
    Abort,
}

pub trait ResumeGate {
    /// 阻塞直到收到确认；`step` 从 1 开始
    fn wait(&mut self, step: usize) -> Result<Resume, ControlError>;
}

/// 总是立即继续（无人值守运行与测试）
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoResume;

impl ResumeGate for AutoResume {
    fn wait(&mut self, step: usize) -> Result<Resume, ControlError> {
        info!("Step {}: resume gate auto-continued", step);
        Ok(Resume::Continue)
    }
}

/// 由通道驱动的闸门
pub struct ChannelGate {
    rx: Receiver<Resume>,
}

/// `ChannelGate` 的发送端，可跨线程使用
#[derive(Clone)]
pub struct ResumeHandle {
    tx: Sender<Resume>,
}

impl ChannelGate {
    pub fn new() -> (Self, ResumeHandle) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { rx }, ResumeHandle { tx })
    }
}

impl ResumeGate for ChannelGate {
    fn wait(&mut self, step: usize) -> Result<Resume, ControlError> {
        info!("Step {}: waiting for resume signal", step);
        self.rx.recv().map_err(|_| ControlError::GateClosed(step))
    }
}

impl ResumeHandle {
    /// 返回 false 表示闸门已被丢弃
    pub fn resume(&self) -> bool {
        self.tx.send(Resume::Continue).is_ok()
    }

    pub fn abort(&self) -> bool {
        self.tx.send(Resume::Abort).is_ok()
    }
}
