//! 注射泵协议
//!
//! 命令：ASCII 字符串 + CR，无校验和。
//! 应答：`<STX> <地址2位> <状态字符> [数据] <ETX>`，以 ETX 结尾才算有效。
//!
//! 应答的业务解析（如已分配体积）由调用方完成，编解码器只保证结构完整。

use crate::{CR, DeviceTag, ETX, Frame, FrameCodec, ReplyError, STX};
use std::fmt;

/// 泵运行方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpDirection {
    /// 注射（推动活塞）
    Infuse,
    /// 抽吸
    Withdraw,
}

impl PumpDirection {
    /// 由带符号体积决定方向：负数为抽吸
    pub fn from_signed_volume(volume_ul: f64) -> Self {
        if volume_ul < 0.0 {
            PumpDirection::Withdraw
        } else {
            PumpDirection::Infuse
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PumpDirection::Infuse => "INF",
            PumpDirection::Withdraw => "WDR",
        }
    }
}

/// 注射泵命令
#[derive(Debug, Clone, PartialEq)]
pub enum PumpCommand {
    /// `*RESET`
    Reset,
    /// `DIA<mm>` 注射器内径
    Diameter(f64),
    /// `VOL UL` 体积单位设为微升
    VolumeUnitsMicroliters,
    /// `RAT <rate> UM`（µL/min）
    Rate(f64),
    /// `VOL <volume>`
    Volume(f64),
    /// `DIR INF` / `DIR WDR`
    Direction(PumpDirection),
    /// `RUN`
    Run,
    /// `STP`
    Stop,
    /// `DIS` 查询已注射/已抽吸体积
    QueryDispensed,
}

impl fmt::Display for PumpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PumpCommand::Reset => f.write_str("*RESET"),
            PumpCommand::Diameter(mm) => write!(f, "DIA{}", format_number(*mm)),
            PumpCommand::VolumeUnitsMicroliters => f.write_str("VOL UL"),
            PumpCommand::Rate(ul_min) => write!(f, "RAT {} UM", format_number(*ul_min)),
            PumpCommand::Volume(ul) => write!(f, "VOL {}", format_number(*ul)),
            PumpCommand::Direction(dir) => write!(f, "DIR {}", dir.as_str()),
            PumpCommand::Run => f.write_str("RUN"),
            PumpCommand::Stop => f.write_str("STP"),
            PumpCommand::QueryDispensed => f.write_str("DIS"),
        }
    }
}

/// 泵只接受有限位数，保留到千分位
fn format_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    format!("{}", rounded)
}

/// 注射泵应答（原始字节，已确认以 ETX 结尾）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpReply {
    raw: Vec<u8>,
}

impl PumpReply {
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// STX 与 ETX 之间的文本
    pub fn text(&self) -> String {
        let body = match self.raw.iter().position(|&b| b == STX) {
            Some(start) => &self.raw[start + 1..],
            None => &self.raw[..],
        };
        let body = body.strip_suffix(&[ETX]).unwrap_or(body);
        String::from_utf8_lossy(body).into_owned()
    }

    /// 地址之后的状态字符（I/W/S/P/T/U/X/A）
    pub fn status(&self) -> Option<char> {
        self.text().chars().nth(2)
    }

    /// 泵的错误应答（`?`、`?NA`、`?OOR`、`?COM`、`?IGN`）
    pub fn error_code(&self) -> Option<String> {
        let text = self.text();
        text.find('?').map(|idx| text[idx..].to_string())
    }
}

/// 已分配体积：`...I<注射量>W<抽吸量><单位>`
#[derive(Debug, Clone, PartialEq)]
pub struct DispensedVolume {
    pub infused: f64,
    pub withdrawn: f64,
    pub units: String,
}

impl DispensedVolume {
    /// 按标记字符解析 `DIS` 应答文本
    ///
    /// 状态字符本身也可能是 `I`/`W`，因此从 `W` 标记向前找最近的 `I`。
    pub fn parse(text: &str) -> Result<Self, ReplyError> {
        let malformed = || ReplyError::MalformedReply(format!("dispensed volume: {:?}", text));

        let w_idx = text.rfind('W').ok_or_else(malformed)?;
        let i_idx = text[..w_idx].rfind('I').ok_or_else(malformed)?;

        let infused: f64 = text[i_idx + 1..w_idx].trim().parse().map_err(|_| malformed())?;

        let rest = &text[w_idx + 1..];
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let withdrawn: f64 = rest[..split].parse().map_err(|_| malformed())?;
        let units = rest[split..].trim().to_string();
        if units.is_empty() || !units.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(malformed());
        }

        Ok(Self {
            infused,
            withdrawn,
            units,
        })
    }
}

/// 注射泵编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpCodec;

impl FrameCodec for PumpCodec {
    type Command = PumpCommand;
    type Reply = PumpReply;

    const DEVICE: DeviceTag = DeviceTag::Pump;

    fn encode(&self, command: &PumpCommand) -> Frame {
        let mut bytes = command.to_string().into_bytes();
        bytes.push(CR);
        Frame::new(Self::DEVICE, bytes)
    }

    fn is_complete(&self, buf: &[u8]) -> bool {
        buf.contains(&ETX)
    }

    fn decode(&self, raw: &[u8]) -> Result<PumpReply, ReplyError> {
        match raw.last() {
            None => Err(ReplyError::NoReply),
            Some(&ETX) => Ok(PumpReply { raw: raw.to_vec() }),
            Some(_) => Err(ReplyError::TerminatorMissing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_commands() {
        let codec = PumpCodec;
        let cases: [(PumpCommand, &[u8]); 9] = [
            (PumpCommand::Reset, b"*RESET\r"),
            (PumpCommand::Diameter(7.0), b"DIA7\r"),
            (PumpCommand::VolumeUnitsMicroliters, b"VOL UL\r"),
            (PumpCommand::Rate(1000.0), b"RAT 1000 UM\r"),
            (PumpCommand::Volume(12.5), b"VOL 12.5\r"),
            (PumpCommand::Direction(PumpDirection::Withdraw), b"DIR WDR\r"),
            (PumpCommand::Run, b"RUN\r"),
            (PumpCommand::Stop, b"STP\r"),
            (PumpCommand::QueryDispensed, b"DIS\r"),
        ];
        for (cmd, expected) in cases {
            assert_eq!(codec.encode(&cmd).as_bytes(), expected, "{}", cmd);
        }
    }

    #[test]
    fn test_direction_from_sign() {
        assert_eq!(PumpDirection::from_signed_volume(-500.0), PumpDirection::Withdraw);
        assert_eq!(PumpDirection::from_signed_volume(500.0), PumpDirection::Infuse);
    }

    #[test]
    fn test_decode_requires_trailing_etx() {
        let codec = PumpCodec;
        assert_eq!(codec.decode(b""), Err(ReplyError::NoReply));
        assert_eq!(codec.decode(b"\x0200S"), Err(ReplyError::TerminatorMissing));
        assert_eq!(codec.decode(b"\x0200S\x03junk"), Err(ReplyError::TerminatorMissing));

        let reply = codec.decode(b"\x0200S\x03").unwrap();
        assert_eq!(reply.text(), "00S");
        assert_eq!(reply.status(), Some('S'));
        assert_eq!(reply.error_code(), None);
    }

    #[test]
    fn test_is_complete() {
        let codec = PumpCodec;
        assert!(!codec.is_complete(b"\x0200"));
        assert!(codec.is_complete(b"\x0200S\x03"));
    }

    #[test]
    fn test_error_code() {
        let reply = PumpCodec.decode(b"\x0200S?OOR\x03").unwrap();
        assert_eq!(reply.error_code().as_deref(), Some("?OOR"));
    }

    #[test]
    fn test_parse_dispensed() {
        let v = DispensedVolume::parse("00SI12.50W0.000UL").unwrap();
        assert_eq!(v.infused, 12.5);
        assert_eq!(v.withdrawn, 0.0);
        assert_eq!(v.units, "UL");
    }

    #[test]
    fn test_parse_dispensed_with_infusing_status() {
        // 状态字符 I 不应被当作注射量标记
        let v = DispensedVolume::parse("00II0.500W1.250ML").unwrap();
        assert_eq!(v.infused, 0.5);
        assert_eq!(v.withdrawn, 1.25);
        assert_eq!(v.units, "ML");
    }

    #[test]
    fn test_parse_dispensed_malformed() {
        assert!(matches!(
            DispensedVolume::parse("00S"),
            Err(ReplyError::MalformedReply(_))
        ));
        assert!(DispensedVolume::parse("00SIabcW1.0UL").is_err());
        assert!(DispensedVolume::parse("00SI1.0W1.0").is_err());
    }
}
