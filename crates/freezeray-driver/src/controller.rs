//! 温控器驱动

use crate::error::LinkError;
use crate::link::LinkSession;
use freezeray_protocol::{
    AlarmBits, ControllerCode, ControllerCodec, ControllerCommand, ControllerReply,
};
use tracing::info;

/// 热电温控器
pub struct TempController {
    link: LinkSession<ControllerCodec>,
}

impl TempController {
    pub fn new(link: LinkSession<ControllerCodec>) -> Self {
        Self { link }
    }

    pub fn link(&self) -> &LinkSession<ControllerCodec> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkSession<ControllerCodec> {
        &mut self.link
    }

    pub fn set_setpoint(&mut self, celsius: f64) -> Result<(), LinkError> {
        let command = ControllerCommand::set_setpoint(celsius)?;
        self.link.send(&command)?;
        Ok(())
    }

    /// 开启/关闭温控输出
    pub fn set_output_enabled(&mut self, enabled: bool) -> Result<(), LinkError> {
        info!("Temperature controller output {}", if enabled { "on" } else { "off" });
        self.link.send(&ControllerCommand::set_output_enabled(enabled))?;
        Ok(())
    }

    /// 工艺温度（输入 1）
    pub fn process_temperature(&mut self) -> Result<f64, LinkError> {
        Ok(self.read(ControllerCode::InputTemperature)?.temperature())
    }

    pub fn setpoint(&mut self) -> Result<f64, LinkError> {
        Ok(self.read(ControllerCode::DesiredControlValue)?.temperature())
    }

    /// 散热器温度（输入 2）
    pub fn heatsink_temperature(&mut self) -> Result<f64, LinkError> {
        Ok(self.read(ControllerCode::SecondaryTemperature)?.temperature())
    }

    /// 输出功率百分比
    pub fn effort_pct(&mut self) -> Result<f64, LinkError> {
        Ok(self.read(ControllerCode::PowerOutput)?.power_pct())
    }

    pub fn alarm_bits(&mut self) -> Result<AlarmBits, LinkError> {
        Ok(self.read(ControllerCode::AlarmStatus)?.alarm_bits())
    }

    fn read(&mut self, code: ControllerCode) -> Result<ControllerReply, LinkError> {
        self.link.send(&ControllerCommand::read(code))
    }
}
