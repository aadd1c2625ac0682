//! # FreezeRay Protocol
//!
//! 三种串口设备的帧编解码（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 帧界定字节常量
//! - `pump`: 注射泵 ASCII 行协议（CR 结尾，应答以 ETX 结束）
//! - `controller`: 温控器带校验和的十六进制协议（应答以 `^` 结束）
//! - `micro`: 微控制器 STX/NUL/ETX 协议（应答以 ACK 结束）
//!
//! ## 分层
//!
//! ```text
//! Driver Layer (freezeray-driver)
//!     ↓ FrameCodec::encode / decode
//! Frame (此 crate)
//!     ↓ 原始字节
//! Serial Layer (freezeray-serial)
//! ```
//!
//! 编码是纯函数：相同的 (command, data) 总是得到相同的字节。

pub mod constants;
pub mod controller;
pub mod micro;
pub mod pump;

pub use constants::*;
pub use controller::{
    AlarmBits, ControllerCode, ControllerCodec, ControllerCommand, ControllerReply,
    checksum, decode_temperature, encode_temperature,
};
pub use micro::{MicroCode, MicroCodec, MicroCommand, MicroReply, pct_to_pwm, pwm_to_pct};
pub use pump::{DispensedVolume, PumpCodec, PumpCommand, PumpDirection, PumpReply};

use std::fmt;
use thiserror::Error;

/// 设备标签，标识帧由哪种编解码器产生/消费
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceTag {
    /// 注射泵
    Pump,
    /// 温控器
    Controller,
    /// 微控制器（风扇 + 气泵）
    Micro,
}

impl DeviceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceTag::Pump => "pump",
            DeviceTag::Controller => "controller",
            DeviceTag::Micro => "micro",
        }
    }
}

impl fmt::Display for DeviceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一个完整的线上帧
///
/// 只在一次发送/接收交换期间存在。`bytes` 即写入串口的全部字节（含终止符）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub device: DeviceTag,
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn new(device: DeviceTag, bytes: Vec<u8>) -> Self {
        Self { device, bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 单次应答的失败原因
///
/// 链路层按此分类记录日志并重试；全部重试失败后以 `RetriesExhausted` 上报。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// 超时前没有收到任何字节
    #[error("no reply")]
    NoReply,

    /// 应答被截断，未见到终止符（ETX/ACK）
    #[error("reply terminator missing")]
    TerminatorMissing,

    /// 对端回显 `X`，表示我方发出的校验和被拒绝
    #[error("peer rejected our checksum")]
    ChecksumRejectedByPeer,

    /// 对端应答的校验和与本地重算不一致
    #[error("reply checksum mismatch: expected {expected:02x}, got {actual}")]
    ChecksumMismatch { expected: u8, actual: String },

    /// 结构完整但无法解析
    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

impl ReplyError {
    /// 用于日志的短标签
    pub fn kind(&self) -> &'static str {
        match self {
            ReplyError::NoReply => "no_reply",
            ReplyError::TerminatorMissing => "terminator_missing",
            ReplyError::ChecksumRejectedByPeer => "checksum_rejected_by_peer",
            ReplyError::ChecksumMismatch { .. } => "checksum_mismatch",
            ReplyError::MalformedReply(_) => "malformed_reply",
        }
    }
}

/// 命令构建错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Temperature {0} cannot be encoded as a 32-bit centi-degree value")]
    TemperatureOutOfRange(f64),

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// 设备帧编解码能力
///
/// 三种设备各实现一次；链路层的写-等待-读-校验-重试循环只写一遍，
/// 通过此 trait 对三种协议泛化。
pub trait FrameCodec {
    /// 命令类型（`Display` 用于日志）
    type Command: fmt::Display;
    /// 校验通过后的应答类型
    type Reply;

    /// 对应的设备
    const DEVICE: DeviceTag;

    /// 把命令编码为完整帧
    fn encode(&self, command: &Self::Command) -> Frame;

    /// 已累积的字节中是否出现了应答终止符
    fn is_complete(&self, buf: &[u8]) -> bool;

    /// 校验并解码一次应答
    fn decode(&self, raw: &[u8]) -> Result<Self::Reply, ReplyError>;
}
