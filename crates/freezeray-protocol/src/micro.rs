//! 微控制器协议（风扇 + 气泵）
//!
//! 命令：`<STX> <命令字符> <逗号分隔数据> <NUL> <ETX>`
//! 应答：`<STX> <回显命令字符> <DATA1,DATA2,...> <ACK>`，无校验和。
//!
//! 此通道可靠性较差，写入后需要固定的稳定延时（由链路配置决定）。

use crate::{
    ACK, DeviceTag, ETX, Frame, FrameCodec, MICRO_PWM_MAX, NUL, ProtocolError, ReplyError, STX,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// 微控制器命令字符
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MicroCode {
    /// 设置风扇 PWM
    Fan = b'F',
    /// 设置气泵 PWM
    AirPump = b'P',
    /// 查询当前 风扇,气泵,温度
    Query = b'Q',
}

impl MicroCode {
    pub fn as_char(self) -> char {
        char::from(u8::from(self))
    }
}

/// 微控制器命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroCommand {
    pub code: MicroCode,
    pub data: Vec<String>,
}

impl MicroCommand {
    pub fn query() -> Self {
        Self {
            code: MicroCode::Query,
            data: Vec::new(),
        }
    }

    pub fn fan_pct(pct: u8) -> Result<Self, ProtocolError> {
        Ok(Self {
            code: MicroCode::Fan,
            data: vec![pct_to_pwm(pct)?.to_string()],
        })
    }

    pub fn air_pump_pct(pct: u8) -> Result<Self, ProtocolError> {
        Ok(Self {
            code: MicroCode::AirPump,
            data: vec![pct_to_pwm(pct)?.to_string()],
        })
    }
}

impl fmt::Display for MicroCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.code.as_char(), self.data.join(","))
    }
}

/// 百分比 → 固件 PWM（0-255）
pub fn pct_to_pwm(pct: u8) -> Result<u8, ProtocolError> {
    if pct > 100 {
        return Err(ProtocolError::InvalidValue {
            field: "effort_pct",
            value: pct.to_string(),
        });
    }
    Ok((pct as f64 * MICRO_PWM_MAX as f64 / 100.0).round() as u8)
}

/// 固件 PWM → 百分比（两位小数）
pub fn pwm_to_pct(pwm: u8) -> f64 {
    (pwm as f64 * 100.0 / MICRO_PWM_MAX as f64 * 100.0).round() / 100.0
}

/// 微控制器应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroReply {
    pub code: MicroCode,
    pub fields: Vec<String>,
}

impl MicroReply {
    /// 按位置取数值字段
    pub fn field<T: std::str::FromStr>(&self, index: usize) -> Result<T, ReplyError> {
        let raw = self.fields.get(index).ok_or_else(|| {
            ReplyError::MalformedReply(format!(
                "reply '{}' has {} fields, wanted index {}",
                self.code.as_char(),
                self.fields.len(),
                index
            ))
        })?;
        raw.trim().parse().map_err(|_| {
            ReplyError::MalformedReply(format!(
                "reply '{}' field {} = {:?} is not numeric",
                self.code.as_char(),
                index,
                raw
            ))
        })
    }
}

/// 微控制器编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroCodec;

impl FrameCodec for MicroCodec {
    type Command = MicroCommand;
    type Reply = MicroReply;

    const DEVICE: DeviceTag = DeviceTag::Micro;

    fn encode(&self, command: &MicroCommand) -> Frame {
        let data = command.data.join(",");
        let mut bytes = Vec::with_capacity(data.len() + 4);
        bytes.push(STX);
        bytes.push(command.code.into());
        bytes.extend_from_slice(data.as_bytes());
        bytes.push(NUL);
        bytes.push(ETX);
        Frame::new(Self::DEVICE, bytes)
    }

    fn is_complete(&self, buf: &[u8]) -> bool {
        buf.contains(&ACK)
    }

    fn decode(&self, raw: &[u8]) -> Result<MicroReply, ReplyError> {
        let Some((&last, head)) = raw.split_last() else {
            return Err(ReplyError::NoReply);
        };
        if last != ACK {
            return Err(ReplyError::TerminatorMissing);
        }

        // 同步到最后一个 STX 之后（之前可能残留启动横幅等杂字节）
        let start = head
            .iter()
            .rposition(|&b| b == STX)
            .ok_or_else(|| ReplyError::MalformedReply("micro reply has no STX".into()))?;
        let body = &head[start + 1..];

        let (&code, data) = body
            .split_first()
            .ok_or_else(|| ReplyError::MalformedReply("micro reply is empty".into()))?;
        let code = MicroCode::try_from(code).map_err(|_| {
            ReplyError::MalformedReply(format!("unknown echoed command 0x{:02x}", code))
        })?;

        let data = std::str::from_utf8(data)
            .map_err(|_| ReplyError::MalformedReply("micro data is not ASCII".into()))?;
        let fields = if data.is_empty() {
            Vec::new()
        } else {
            data.split(',').map(str::to_string).collect()
        };

        Ok(MicroReply { code, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query() {
        let frame = MicroCodec.encode(&MicroCommand::query());
        assert_eq!(frame.as_bytes(), &[0x02, b'Q', 0x00, 0x03]);
    }

    #[test]
    fn test_encode_fan() {
        let frame = MicroCodec.encode(&MicroCommand::fan_pct(100).unwrap());
        assert_eq!(frame.as_bytes(), b"\x02F255\x00\x03");

        let multi = MicroCommand {
            code: MicroCode::AirPump,
            data: vec!["1".into(), "2".into()],
        };
        assert_eq!(MicroCodec.encode(&multi).as_bytes(), b"\x02P1,2\x00\x03");
    }

    #[test]
    fn test_pct_pwm_scale() {
        assert_eq!(pct_to_pwm(0).unwrap(), 0);
        assert_eq!(pct_to_pwm(50).unwrap(), 128);
        assert_eq!(pct_to_pwm(100).unwrap(), 255);
        assert!(pct_to_pwm(101).is_err());
        assert_eq!(pwm_to_pct(255), 100.0);
        assert_eq!(pwm_to_pct(0), 0.0);
        assert_eq!(pwm_to_pct(128), 50.2);
    }

    #[test]
    fn test_decode_query_reply() {
        let reply = MicroCodec.decode(b"\x02Q255,128,255\x06").unwrap();
        assert_eq!(reply.code, MicroCode::Query);
        assert_eq!(reply.fields, vec!["255", "128", "255"]);
        assert_eq!(reply.field::<u8>(1).unwrap(), 128);
        assert!(reply.field::<u8>(3).is_err());
    }

    #[test]
    fn test_decode_skips_leading_noise() {
        let reply = MicroCodec.decode(b"Arduino ready\r\n\x02F0\x06").unwrap();
        assert_eq!(reply.code, MicroCode::Fan);
        assert_eq!(reply.fields, vec!["0"]);
    }

    #[test]
    fn test_decode_failures() {
        assert_eq!(MicroCodec.decode(b""), Err(ReplyError::NoReply));
        assert_eq!(
            MicroCodec.decode(b"\x02Q1,2,3"),
            Err(ReplyError::TerminatorMissing)
        );
        assert!(matches!(
            MicroCodec.decode(b"Q1,2,3\x06"),
            Err(ReplyError::MalformedReply(_))
        ));
        assert!(matches!(
            MicroCodec.decode(b"\x02Z\x06"),
            Err(ReplyError::MalformedReply(_))
        ));
    }

    #[test]
    fn test_decode_empty_data() {
        let reply = MicroCodec.decode(b"\x02F\x06").unwrap();
        assert!(reply.fields.is_empty());
    }
}
