//! 注射泵驱动

use crate::error::LinkError;
use crate::link::LinkSession;
use freezeray_protocol::{
    DeviceTag, DispensedVolume, PumpCodec, PumpCommand, PumpDirection, PumpReply,
};
use std::time::Duration;
use tracing::{info, warn};

/// `*RESET` 后泵需要更长的响应时间
const RESET_REPLY_DELAY: Duration = Duration::from_secs(1);

/// 注射泵
pub struct SyringePump {
    link: LinkSession<PumpCodec>,
}

impl SyringePump {
    pub fn new(link: LinkSession<PumpCodec>) -> Self {
        Self { link }
    }

    pub fn link(&self) -> &LinkSession<PumpCodec> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkSession<PumpCodec> {
        &mut self.link
    }

    /// 复位并设置注射器内径、体积单位
    pub fn initialize(&mut self, syringe_diameter_mm: f64) -> Result<(), LinkError> {
        info!("Initializing syringe pump (diameter {} mm)", syringe_diameter_mm);
        self.command_with_delay(&PumpCommand::Reset, RESET_REPLY_DELAY)?;
        self.command(&PumpCommand::Diameter(syringe_diameter_mm))?;
        self.command(&PumpCommand::VolumeUnitsMicroliters)?;
        Ok(())
    }

    /// 按带符号体积分配：负数为抽吸
    ///
    /// 方向命令先于速率、体积和运行命令发出。
    pub fn dispense(&mut self, volume_ul: f64, rate_ul_min: f64) -> Result<(), LinkError> {
        let direction = PumpDirection::from_signed_volume(volume_ul);
        self.command(&PumpCommand::Direction(direction))?;
        self.command(&PumpCommand::Rate(rate_ul_min))?;
        self.command(&PumpCommand::Volume(volume_ul.abs()))?;
        self.command(&PumpCommand::Run)?;
        Ok(())
    }

    /// 冲洗管路，排出空气
    pub fn flush_line(&mut self, length_ul: f64, rate_ul_min: f64) -> Result<(), LinkError> {
        info!("Flushing line: {} uL at {} uL/min", length_ul, rate_ul_min);
        self.command(&PumpCommand::Rate(rate_ul_min))?;
        self.command(&PumpCommand::Volume(length_ul))?;
        self.command(&PumpCommand::Direction(PumpDirection::Infuse))?;
        self.command(&PumpCommand::Run)?;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), LinkError> {
        self.command(&PumpCommand::Stop).map(|_| ())
    }

    /// 查询已注射/已抽吸体积
    pub fn dispensed(&mut self) -> Result<DispensedVolume, LinkError> {
        let command = PumpCommand::QueryDispensed;
        let reply = self.command(&command)?;
        DispensedVolume::parse(&reply.text()).map_err(|source| LinkError::Reply {
            device: DeviceTag::Pump,
            command: command.to_string(),
            source,
        })
    }

    fn command(&mut self, command: &PumpCommand) -> Result<PumpReply, LinkError> {
        let delay = self.link.config().reply_delay();
        self.command_with_delay(command, delay)
    }

    fn command_with_delay(
        &mut self,
        command: &PumpCommand,
        delay: Duration,
    ) -> Result<PumpReply, LinkError> {
        let reply = self.link.send_with_delay(command, delay)?;
        if let Some(code) = reply.error_code() {
            warn!("pump reported {} for '{}'", code, command);
        }
        Ok(reply)
    }
}
