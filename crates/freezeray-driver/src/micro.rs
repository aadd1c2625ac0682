//! 微控制器驱动（风扇 + 气泵）

use crate::error::LinkError;
use crate::link::LinkSession;
use freezeray_protocol::{
    DeviceTag, MicroCodec, MicroCommand, MicroReply, ReplyError, pwm_to_pct,
};
use tracing::{info, warn};

/// `Q` 查询结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MicroStatus {
    pub fan_pct: f64,
    pub air_pump_pct: f64,
    /// 固件尚未实现测温，回传占位值
    pub temperature: Option<f64>,
}

/// 微控制器
pub struct Microcontroller {
    link: LinkSession<MicroCodec>,
}

impl Microcontroller {
    pub fn new(link: LinkSession<MicroCodec>) -> Self {
        Self { link }
    }

    pub fn link(&self) -> &LinkSession<MicroCodec> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkSession<MicroCodec> {
        &mut self.link
    }

    /// 丢弃固件启动时打印的横幅
    pub fn drain_banner(&mut self) -> Result<(), LinkError> {
        let banner = self.link.drain_input()?;
        if !banner.is_empty() {
            info!(
                "micro banner: {}",
                String::from_utf8_lossy(&banner).trim()
            );
        }
        Ok(())
    }

    pub fn set_fan_pct(&mut self, pct: u8) -> Result<(), LinkError> {
        self.actuate(MicroCommand::fan_pct(pct)?)
    }

    pub fn set_air_pump_pct(&mut self, pct: u8) -> Result<(), LinkError> {
        self.actuate(MicroCommand::air_pump_pct(pct)?)
    }

    pub fn query(&mut self) -> Result<MicroStatus, LinkError> {
        let command = MicroCommand::query();
        let delay = self.link.config().reply_delay();
        let reply = self.exchange(&command, delay)?;
        let unusable = |source: ReplyError| LinkError::Reply {
            device: DeviceTag::Micro,
            command: command.to_string(),
            source,
        };

        if reply.fields.len() != 3 {
            return Err(unusable(ReplyError::MalformedReply(format!(
                "query reply has {} fields, expected 3",
                reply.fields.len()
            ))));
        }
        let fan: u8 = reply.field(0).map_err(unusable)?;
        let pump: u8 = reply.field(1).map_err(unusable)?;

        let temperature = match reply.field(2) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("{} '{}' temperature field unusable: {}", DeviceTag::Micro, command, e);
                None
            },
        };

        Ok(MicroStatus {
            fan_pct: pwm_to_pct(fan),
            air_pump_pct: pwm_to_pct(pump),
            temperature,
        })
    }

    /// 电机爬升期间使用较长的响应时间
    fn actuate(&mut self, command: MicroCommand) -> Result<(), LinkError> {
        let delay = self.link.config().actuation_delay();
        self.exchange(&command, delay)?;
        Ok(())
    }

    /// 发送并确认回显的命令字符
    fn exchange(
        &mut self,
        command: &MicroCommand,
        delay: std::time::Duration,
    ) -> Result<MicroReply, LinkError> {
        let reply = self.link.send_with_delay(command, delay)?;
        if reply.code != command.code {
            return Err(LinkError::Reply {
                device: DeviceTag::Micro,
                command: command.to_string(),
                source: ReplyError::MalformedReply(format!(
                    "echoed '{}' for '{}'",
                    reply.code.as_char(),
                    command.code.as_char()
                )),
            });
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LinkConfig;
    use freezeray_serial::MockTransport;
    use std::sync::Arc;

    fn micro(reply: &'static [u8]) -> Microcontroller {
        let transport = MockTransport::new("micro").with_responder(move |_| reply.to_vec());
        Microcontroller::new(LinkSession::new(
            MicroCodec,
            Box::new(transport),
            LinkConfig::immediate(2),
            Arc::new(ManualClock::new()),
        ))
    }

    #[test]
    fn test_query_scales_pwm() {
        let status = micro(b"\x02Q255,128,21.5\x06").query().unwrap();
        assert_eq!(status.fan_pct, 100.0);
        assert_eq!(status.air_pump_pct, 50.2);
        assert_eq!(status.temperature, Some(21.5));
    }

    #[test]
    fn test_unparsable_temperature_is_missing() {
        let status = micro(b"\x02Q0,255,--\x06").query().unwrap();
        assert_eq!(status.air_pump_pct, 100.0);
        assert_eq!(status.temperature, None);
    }

    #[test]
    fn test_wrong_field_count_is_reply_error() {
        let err = micro(b"\x02Q0,0\x06").query().unwrap_err();
        assert!(matches!(err, LinkError::Reply { .. }));
    }
}
