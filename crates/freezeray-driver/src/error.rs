//! 驱动层错误类型定义

use freezeray_protocol::{DeviceTag, ProtocolError, ReplyError};
use freezeray_serial::TransportError;
use thiserror::Error;

/// 链路层错误类型
///
/// 单次应答失败在会话内部重试，不会直接上报；调用方只会看到
/// `RetriesExhausted`（连续失败）、`Transport`（端口不可用）或
/// `Reply`（应答结构有效但业务内容无法使用）。
#[derive(Error, Debug)]
pub enum LinkError {
    /// 串口错误（不重试）
    #[error("{device} transport error: {source}")]
    Transport {
        device: DeviceTag,
        #[source]
        source: TransportError,
    },

    /// 所有尝试均失败
    #[error("{device} command '{command}' failed after {attempts} attempts (last: {last})")]
    RetriesExhausted {
        device: DeviceTag,
        command: String,
        attempts: u32,
        last: ReplyError,
    },

    /// 应答通过校验，但内容无法按命令语义解析
    #[error("{device} command '{command}' returned an unusable reply: {source}")]
    Reply {
        device: DeviceTag,
        command: String,
        #[source]
        source: ReplyError,
    },

    /// 命令参数无法编码
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 未指定设备端口
    #[error("No port configured for {0}")]
    PortNotConfigured(DeviceTag),
}

impl LinkError {
    pub fn device(&self) -> Option<DeviceTag> {
        match self {
            LinkError::Transport { device, .. }
            | LinkError::RetriesExhausted { device, .. }
            | LinkError::Reply { device, .. }
            | LinkError::PortNotConfigured(device) => Some(*device),
            LinkError::Protocol(_) => None,
        }
    }

    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, LinkError::RetriesExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_error_display() {
        let err = LinkError::RetriesExhausted {
            device: DeviceTag::Controller,
            command: "01:00000000".into(),
            attempts: 10,
            last: ReplyError::NoReply,
        };
        assert_eq!(
            err.to_string(),
            "controller command '01:00000000' failed after 10 attempts (last: no reply)"
        );
        assert_eq!(err.device(), Some(DeviceTag::Controller));
        assert!(err.is_retries_exhausted());

        let err = LinkError::Transport {
            device: DeviceTag::Pump,
            source: TransportError::Closed("COM6".into()),
        };
        assert!(err.to_string().contains("pump transport error"));
        assert!(!err.is_retries_exhausted());
    }

    #[test]
    fn test_from_protocol_error() {
        let err: LinkError = ProtocolError::TemperatureOutOfRange(f64::INFINITY).into();
        assert!(matches!(err, LinkError::Protocol(_)));
        assert_eq!(err.device(), None);
    }
}
