//! 编解码性质测试

use freezeray_protocol::*;
use proptest::prelude::*;

fn controller_code() -> impl Strategy<Value = ControllerCode> {
    prop_oneof![
        Just(ControllerCode::InputTemperature),
        Just(ControllerCode::DesiredControlValue),
        Just(ControllerCode::PowerOutput),
        Just(ControllerCode::AlarmStatus),
        Just(ControllerCode::SecondaryTemperature),
        Just(ControllerCode::SetDesiredControlValue),
        Just(ControllerCode::SetOutputEnable),
    ]
}

/// 构造一个设备会发出的合法应答
fn controller_reply(data: u32) -> Vec<u8> {
    let data = format!("{:08x}", data);
    let sum = checksum(data.as_bytes());
    format!("*{}{:02x}^", data, sum).into_bytes()
}

proptest! {
    #[test]
    fn controller_encoding_is_deterministic(code in controller_code(), data in any::<u32>()) {
        let cmd = ControllerCommand { code, data };
        prop_assert_eq!(ControllerCodec.encode(&cmd), ControllerCodec.encode(&cmd));
    }

    #[test]
    fn controller_frame_layout(code in controller_code(), data in any::<u32>()) {
        let cmd = ControllerCommand { code, data };
        let frame = ControllerCodec.encode(&cmd);
        let bytes = frame.as_bytes();
        let payload = cmd.payload();

        prop_assert_eq!(bytes[0], TC_STX);
        prop_assert_eq!(*bytes.last().unwrap(), CR);
        prop_assert_eq!(&bytes[1..13], payload.as_bytes());
        let sum = std::str::from_utf8(&bytes[13..bytes.len() - 1]).unwrap();
        prop_assert_eq!(sum, format!("{:x}", checksum(payload.as_bytes())));
    }

    #[test]
    fn controller_accepts_matching_checksum(data in any::<u32>()) {
        let reply = ControllerCodec.decode(&controller_reply(data)).unwrap();
        prop_assert_eq!(reply.raw(), data);
    }

    #[test]
    fn controller_rejects_any_other_checksum(data in any::<u32>(), wrong in any::<u8>()) {
        let text = format!("{:08x}", data);
        let sum = checksum(text.as_bytes());
        prop_assume!(wrong != sum);
        let raw = format!("*{}{:02x}^", text, wrong);
        let is_mismatch = matches!(
            ControllerCodec.decode(raw.as_bytes()),
            Err(ReplyError::ChecksumMismatch { .. })
        );
        prop_assert!(is_mismatch);
    }

    #[test]
    fn controller_rejects_non_canonical_checksum_text(data in any::<u32>(), plus in any::<bool>()) {
        let text = format!("{:08x}", data);
        let sum = checksum(text.as_bytes());
        // 数值相同但写法不同：大写或带 '+' 前缀
        let spelled = if plus && sum < 0x10 {
            format!("+{:x}", sum)
        } else {
            format!("{:02X}", sum)
        };
        prop_assume!(spelled != format!("{:02x}", sum));
        let raw = format!("*{}{}^", text, spelled);
        let is_mismatch = matches!(
            ControllerCodec.decode(raw.as_bytes()),
            Err(ReplyError::ChecksumMismatch { .. })
        );
        prop_assert!(is_mismatch, "accepted {:?}", raw);
    }

    #[test]
    fn temperature_decode_matches_truncated_encoding(t in -300.0f64..900.0) {
        let decoded = decode_temperature(encode_temperature(t).unwrap());
        let expected = ((t * 100.0).trunc()) / 100.0;
        prop_assert!((decoded - expected).abs() < 1e-9, "t={} decoded={} expected={}", t, decoded, expected);
    }

    #[test]
    fn micro_encoding_is_deterministic(pct in 0u8..=100) {
        let fan = MicroCommand::fan_pct(pct).unwrap();
        prop_assert_eq!(MicroCodec.encode(&fan), MicroCodec.encode(&fan));
    }

    #[test]
    fn pump_volume_encoding_is_deterministic(volume in 0.0f64..10_000.0) {
        let cmd = PumpCommand::Volume(volume);
        let frame = PumpCodec.encode(&cmd);
        prop_assert_eq!(frame.clone(), PumpCodec.encode(&cmd));
        prop_assert_eq!(*frame.as_bytes().last().unwrap(), CR);
    }
}
