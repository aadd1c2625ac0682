//! Builder 模式实现
//!
//! 提供链式构造 `Rig` 的便捷方式。

use crate::clock::{Clock, SystemClock};
use crate::config::LinkConfig;
use crate::controller::TempController;
use crate::error::LinkError;
use crate::link::LinkSession;
use crate::micro::Microcontroller;
use crate::pump::SyringePump;
use crate::rig::Rig;
use freezeray_protocol::{ControllerCodec, DeviceTag, MicroCodec, PumpCodec};
use freezeray_serial::Transport;
use std::sync::Arc;
use std::time::Duration;

/// Rig Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use freezeray_driver::{LinkConfig, RigBuilder};
///
/// let rig = RigBuilder::new()
///     .pump_port("/dev/ttyUSB0")
///     .controller_port("/dev/ttyUSB1")
///     .micro_port("/dev/ttyACM0")
///     .micro_config(LinkConfig::micro())
///     .build()
///     .unwrap();
/// ```
pub struct RigBuilder {
    pump_port: Option<String>,
    controller_port: Option<String>,
    micro_port: Option<String>,
    baud_rate: u32,
    read_timeout: Duration,
    open_settle: Duration,
    pump_config: LinkConfig,
    controller_config: LinkConfig,
    micro_config: LinkConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl RigBuilder {
    pub fn new() -> Self {
        Self {
            pump_port: None,
            controller_port: None,
            micro_port: None,
            baud_rate: 9600,
            read_timeout: Duration::from_secs(1),
            open_settle: Duration::from_secs(1),
            pump_config: LinkConfig::pump(),
            controller_config: LinkConfig::controller(),
            micro_config: LinkConfig::micro(),
            clock: None,
        }
    }

    pub fn pump_port(mut self, port: impl Into<String>) -> Self {
        self.pump_port = Some(port.into());
        self
    }

    pub fn controller_port(mut self, port: impl Into<String>) -> Self {
        self.controller_port = Some(port.into());
        self
    }

    pub fn micro_port(mut self, port: impl Into<String>) -> Self {
        self.micro_port = Some(port.into());
        self
    }

    /// 波特率（默认 9600，三台设备必须一致）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// 读空闲超时与打开后的稳定延时（默认均为 1s）
    pub fn serial_timing(mut self, read_timeout: Duration, open_settle: Duration) -> Self {
        self.read_timeout = read_timeout;
        self.open_settle = open_settle;
        self
    }

    pub fn pump_config(mut self, config: LinkConfig) -> Self {
        self.pump_config = config;
        self
    }

    pub fn controller_config(mut self, config: LinkConfig) -> Self {
        self.controller_config = config;
        self
    }

    pub fn micro_config(mut self, config: LinkConfig) -> Self {
        self.micro_config = config;
        self
    }

    /// 自定义时钟（测试中使用 `ManualClock`）
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 打开三个串口并构建 `Rig`
    ///
    /// # Errors
    /// - `LinkError::PortNotConfigured`: 缺少端口
    /// - `LinkError::Transport`: 串口打开失败
    #[cfg(feature = "hardware")]
    pub fn build(self) -> Result<Rig, LinkError> {
        use freezeray_serial::{SerialSettings, SerialTransport};

        let open = |device: DeviceTag, port: &Option<String>| -> Result<Box<dyn Transport + Send>, LinkError> {
            let port = port.clone().ok_or(LinkError::PortNotConfigured(device))?;
            let settings = SerialSettings {
                port,
                baud_rate: self.baud_rate,
                read_timeout: self.read_timeout,
                open_settle: self.open_settle,
            };
            let transport = SerialTransport::open(&settings)
                .map_err(|source| LinkError::Transport { device, source })?;
            Ok(Box::new(transport))
        };

        let pump = open(DeviceTag::Pump, &self.pump_port)?;
        let controller = open(DeviceTag::Controller, &self.controller_port)?;
        let micro = open(DeviceTag::Micro, &self.micro_port)?;
        self.build_with_transports(pump, controller, micro)
    }

    /// 使用已打开的传输构建（mock 或自定义串口）
    pub fn build_with_transports(
        self,
        pump: Box<dyn Transport + Send>,
        controller: Box<dyn Transport + Send>,
        micro: Box<dyn Transport + Send>,
    ) -> Result<Rig, LinkError> {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()) as Arc<dyn Clock>);

        let pump = SyringePump::new(LinkSession::new(
            PumpCodec,
            pump,
            self.pump_config,
            clock.clone(),
        ));
        let controller = TempController::new(LinkSession::new(
            ControllerCodec,
            controller,
            self.controller_config,
            clock.clone(),
        ));
        let mut micro = Microcontroller::new(LinkSession::new(
            MicroCodec,
            micro,
            self.micro_config,
            clock.clone(),
        ));
        micro.drain_banner()?;

        Ok(Rig::new(pump, controller, micro, clock))
    }
}

impl Default for RigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sim;

    #[test]
    fn test_build_with_transports_drains_banner() {
        let (pump, _) = sim::pump("pump");
        let (tc, _) = sim::controller("tc", 21.5);
        let (micro, micro_handle) = sim::micro("micro");
        micro_handle.push_input(b"Communication established\r\n");

        let mut rig = RigBuilder::new()
            .pump_config(LinkConfig::immediate(3))
            .controller_config(LinkConfig::immediate(3))
            .micro_config(LinkConfig::immediate(3))
            .clock(Arc::new(ManualClock::new()))
            .build_with_transports(Box::new(pump), Box::new(tc), Box::new(micro))
            .unwrap();

        assert_eq!(rig.controller().process_temperature().unwrap(), 21.5);
        let status = rig.micro().query().unwrap();
        assert_eq!((status.fan_pct, status.air_pump_pct), (0.0, 0.0));
        assert_eq!(micro_handle.write_count(), 1);
    }

    #[cfg(feature = "hardware")]
    #[test]
    fn test_missing_port_is_reported() {
        let result = RigBuilder::new().build();
        assert!(matches!(
            result,
            Err(LinkError::PortNotConfigured(DeviceTag::Pump))
        ));
    }
}
