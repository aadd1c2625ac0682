//! 基于 `serialport` crate 的真实串口实现

use crate::{SerialSettings, Transport, TransportError};
use serialport::SerialPort;
use std::io::{Read, Write};
use tracing::{debug, trace};

/// 真实串口传输
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// 打开串口并等待设备稳定
    ///
    /// # 错误
    /// - `TransportError::Open`: 端口不存在、被占用或无权限
    pub fn open(settings: &SerialSettings) -> Result<Self, TransportError> {
        let port = serialport::new(&settings.port, settings.baud_rate)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| TransportError::Open {
                port: settings.port.clone(),
                message: e.to_string(),
            })?;

        debug!(
            "Opened serial port '{}' at {} baud, settling for {:?}",
            settings.port, settings.baud_rate, settings.open_settle
        );
        std::thread::sleep(settings.open_settle);

        Ok(Self {
            name: settings.port.clone(),
            port: Some(port),
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port
            .as_mut()
            .ok_or_else(|| TransportError::Closed(self.name.clone()))
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port_mut()?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        let port = self.port_mut()?;
        let pending = port
            .bytes_to_read()
            .map_err(|e| TransportError::Io(e.into()))? as usize;
        if pending == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; pending];
        let n = port.read(&mut buf)?;
        buf.truncate(n);
        trace!("{}: read {} bytes", self.name, n);
        Ok(buf)
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed serial port '{}'", self.name);
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}
