//! 温控器协议
//!
//! 命令帧：
//!
//! ```text
//! *  0 0  c c  d d d d d d d d  s[s]  CR
//! │  └┬┘  └┬┘  └──────┬──────┘  └─┬─┘
//! │ 地址  命令     数据(8 位 hex)  校验和
//! STX
//! ```
//!
//! 校验和为 地址+命令+数据 各字节之和对 256 取模，按小写十六进制输出，
//! **不补零**（与现有设备固件交互时的字节序列必须保持一致）。
//!
//! 应答帧：`* dddddddd ss ^`，校验和固定 2 位。设备若拒绝我方校验和，
//! 会回显以 `X` 填充的数据。

use crate::{
    DeviceTag, Frame, FrameCodec, ProtocolError, ReplyError, CR, TC_ACK, TC_ADDRESS,
    TC_NEGATIVE_THRESHOLD, TC_POWER_FULL_SCALE, TC_REJECT, TC_STX,
};
use std::fmt;

/// 温控器命令码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCode {
    /// 读取输入 1（工艺温度）
    InputTemperature,
    /// 读取设定温度
    DesiredControlValue,
    /// 读取输出功率
    PowerOutput,
    /// 读取报警状态
    AlarmStatus,
    /// 读取输入 2（散热器温度）
    SecondaryTemperature,
    /// 写入设定温度
    SetDesiredControlValue,
    /// 写入输出开关
    SetOutputEnable,
}

impl ControllerCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ControllerCode::InputTemperature => "01",
            ControllerCode::DesiredControlValue => "03",
            ControllerCode::PowerOutput => "04",
            ControllerCode::AlarmStatus => "05",
            ControllerCode::SecondaryTemperature => "06",
            ControllerCode::SetDesiredControlValue => "1c",
            ControllerCode::SetOutputEnable => "2d",
        }
    }
}

/// 温控器命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerCommand {
    pub code: ControllerCode,
    pub data: u32,
}

impl ControllerCommand {
    /// 读命令（数据域全 0）
    pub fn read(code: ControllerCode) -> Self {
        Self { code, data: 0 }
    }

    pub fn set_setpoint(celsius: f64) -> Result<Self, ProtocolError> {
        Ok(Self {
            code: ControllerCode::SetDesiredControlValue,
            data: encode_temperature(celsius)?,
        })
    }

    pub fn set_output_enabled(enabled: bool) -> Self {
        Self {
            code: ControllerCode::SetOutputEnable,
            data: u32::from(enabled),
        }
    }

    /// 地址 + 命令 + 数据（校验和计算范围）
    pub fn payload(&self) -> String {
        format!("{}{}{:08x}", TC_ADDRESS, self.code.as_str(), self.data)
    }
}

impl fmt::Display for ControllerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:08x}", self.code.as_str(), self.data)
    }
}

/// 各字节之和对 256 取模
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// 温度编码：×100 后截断为整数，按 32 位补码输出
///
/// `1.0 → 0x00000064`，`-1.0 → 0xffffff9c`
pub fn encode_temperature(celsius: f64) -> Result<u32, ProtocolError> {
    let scaled = (celsius * 100.0).trunc();
    if !scaled.is_finite() || scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
        return Err(ProtocolError::TemperatureOutOfRange(celsius));
    }
    Ok(scaled as i32 as u32)
}

/// 温度解码：按无符号解释 ÷100，超过阈值则按补码负数重新解释，保留两位小数
pub fn decode_temperature(raw: u32) -> f64 {
    let mut value = raw as f64 / 100.0;
    if value > TC_NEGATIVE_THRESHOLD {
        value = (raw as i32) as f64 / 100.0;
    }
    round2(value)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 报警状态位（8 位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmBits(pub u8);

/// 输出 8 位二进制字符串，左侧补零
impl fmt::Display for AlarmBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

/// 温控器应答（已通过校验）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerReply {
    raw: u32,
}

impl ControllerReply {
    pub fn raw(&self) -> u32 {
        self.raw
    }

    pub fn temperature(&self) -> f64 {
        decode_temperature(self.raw)
    }

    /// 输出功率百分比（满量程 511，带符号）
    pub fn power_pct(&self) -> f64 {
        round2((self.raw as i32) as f64 * 100.0 / TC_POWER_FULL_SCALE)
    }

    pub fn alarm_bits(&self) -> AlarmBits {
        AlarmBits((self.raw & 0xff) as u8)
    }
}

/// 温控器编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerCodec;

impl FrameCodec for ControllerCodec {
    type Command = ControllerCommand;
    type Reply = ControllerReply;

    const DEVICE: DeviceTag = DeviceTag::Controller;

    fn encode(&self, command: &ControllerCommand) -> Frame {
        let payload = command.payload();
        let sum = checksum(payload.as_bytes());

        let mut bytes = Vec::with_capacity(payload.len() + 4);
        bytes.push(TC_STX);
        bytes.extend_from_slice(payload.as_bytes());
        bytes.extend_from_slice(format!("{:x}", sum).as_bytes());
        bytes.push(CR);
        Frame::new(Self::DEVICE, bytes)
    }

    fn is_complete(&self, buf: &[u8]) -> bool {
        buf.last() == Some(&TC_ACK)
    }

    fn decode(&self, raw: &[u8]) -> Result<ControllerReply, ReplyError> {
        if raw.is_empty() {
            return Err(ReplyError::NoReply);
        }
        if raw.contains(&TC_REJECT) {
            return Err(ReplyError::ChecksumRejectedByPeer);
        }
        let Some((&TC_ACK, body)) = raw.split_last() else {
            return Err(ReplyError::TerminatorMissing);
        };
        let body = body.strip_prefix(&[TC_STX]).unwrap_or(body);
        if body.len() < 3 {
            return Err(ReplyError::MalformedReply(format!(
                "controller reply too short ({} bytes)",
                raw.len()
            )));
        }

        let (data, sum_chars) = body.split_at(body.len() - 2);
        let expected = checksum(data);
        // 设备固定输出 2 位小写十六进制，逐字节比较
        if sum_chars != format!("{:02x}", expected).as_bytes() {
            return Err(ReplyError::ChecksumMismatch {
                expected,
                actual: String::from_utf8_lossy(sum_chars).into_owned(),
            });
        }

        let data = std::str::from_utf8(data)
            .map_err(|_| ReplyError::MalformedReply("controller data is not ASCII".into()))?;
        if data.len() != 8 || !data.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ReplyError::MalformedReply(format!(
                "controller data {:?} is not 8 hex digits",
                data
            )));
        }
        let raw = u32::from_str_radix(data, 16)
            .map_err(|e| ReplyError::MalformedReply(format!("controller data: {}", e)))?;

        Ok(ControllerReply { raw })
    }
}
