//! # FreezeRay Serial Layer
//!
//! 串口传输抽象：打开、写字节、非阻塞地取走当前可读的全部字节。
//!
//! 每个 `Transport` 只属于一个链路会话（独占所有权），不做内部加锁。

use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "hardware")]
mod port;

#[cfg(feature = "hardware")]
pub use port::SerialTransport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockHandle, MockTransport};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open port '{port}': {message}")]
    Open { port: String, message: String },

    #[error("Port '{0}' is closed")]
    Closed(String),
}

impl TransportError {
    /// 端口已不可用（需要终止运行）
    pub fn is_fatal(&self) -> bool {
        match self {
            TransportError::Io(e) => !matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::Interrupted
            ),
            TransportError::Open { .. } | TransportError::Closed(_) => true,
        }
    }
}

/// 串口参数
///
/// 波特率固定 9600；打开后需等待设备稳定。
#[derive(Debug, Clone)]
pub struct SerialSettings {
    /// 端口名（如 "/dev/ttyUSB0" 或 "COM5"）
    pub port: String,
    pub baud_rate: u32,
    /// 读空闲超时
    pub read_timeout: Duration,
    /// 打开后的稳定延时
    pub open_settle: Duration,
}

impl SerialSettings {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: 9600,
            read_timeout: Duration::from_secs(1),
            open_settle: Duration::from_secs(1),
        }
    }
}

/// 双工字节通道
pub trait Transport {
    /// 端口名，用于日志
    fn name(&self) -> &str;

    /// 写入全部字节
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// 取走当前已到达的全部字节，没有数据时返回空 Vec（不阻塞等待）
    fn read_available(&mut self) -> Result<Vec<u8>, TransportError>;

    /// 丢弃尚未读取的输入（如设备启动横幅）
    fn drain(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut drained = Vec::new();
        loop {
            let chunk = self.read_available()?;
            if chunk.is_empty() {
                return Ok(drained);
            }
            drained.extend_from_slice(&chunk);
        }
    }

    /// 关闭端口；之后的读写返回 `Closed`
    fn close(&mut self) {}
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_all(bytes)
    }

    fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).read_available()
    }

    fn drain(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).drain()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SerialSettings::new("/dev/ttyUSB0");
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.read_timeout, Duration::from_secs(1));
        assert_eq!(settings.open_settle, Duration::from_secs(1));
    }

    #[test]
    fn test_error_fatality() {
        let timeout = TransportError::Io(std::io::Error::from(std::io::ErrorKind::TimedOut));
        assert!(!timeout.is_fatal());

        let broken = TransportError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(broken.is_fatal());

        assert!(TransportError::Closed("COM5".into()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = TransportError::Open {
            port: "COM5".into(),
            message: "Access denied".into(),
        };
        assert_eq!(err.to_string(), "Failed to open port 'COM5': Access denied");
    }
}
