//! 模拟设备
//!
//! 基于 `MockTransport` 的应答函数，按各设备的线协议回复，
//! 供上层在没有硬件时测试完整的执行流程。

use freezeray_protocol::{
    ACK, ETX, STX, TC_ACK, TC_STX, checksum, encode_temperature,
};
use freezeray_serial::{MockHandle, MockTransport};
use parking_lot::Mutex;
use std::sync::Arc;

/// 模拟注射泵：所有命令应答 `00S`，`DIS` 返回累计体积
pub fn pump(name: &str) -> (MockTransport, MockHandle) {
    let state = Arc::new(Mutex::new(SimPump::default()));
    let transport = MockTransport::new(name).with_responder(move |frame| {
        let line = String::from_utf8_lossy(frame);
        state.lock().respond(line.trim_end_matches('\r'))
    });
    let handle = transport.handle();
    (transport, handle)
}

#[derive(Default)]
struct SimPump {
    withdraw: bool,
    volume: f64,
    infused: f64,
    withdrawn: f64,
}

impl SimPump {
    fn respond(&mut self, line: &str) -> Vec<u8> {
        match line {
            "DIS" => {
                return wrap_pump(&format!(
                    "00SI{:.3}W{:.3}UL",
                    self.infused, self.withdrawn
                ));
            },
            "DIR WDR" => self.withdraw = true,
            "DIR INF" => self.withdraw = false,
            "RUN" if self.withdraw => self.withdrawn += self.volume,
            "RUN" => self.infused += self.volume,
            _ => {
                if let Some(volume) = line.strip_prefix("VOL ").and_then(|v| v.parse().ok()) {
                    self.volume = volume;
                }
            },
        }
        wrap_pump("00S")
    }
}

fn wrap_pump(text: &str) -> Vec<u8> {
    let mut reply = vec![STX];
    reply.extend_from_slice(text.as_bytes());
    reply.push(ETX);
    reply
}

/// 模拟温控器：记住设定值与输出开关，读命令按命令码回复
pub fn controller(name: &str, process_temp: f64) -> (MockTransport, MockHandle) {
    let mut setpoint: u32 = 0;
    let transport = MockTransport::new(name).with_responder(move |frame| {
        // *00 cc dddddddd ss.. \r
        if frame.len() < 13 || frame[0] != TC_STX {
            return controller_reply(0);
        }
        let code = String::from_utf8_lossy(&frame[3..5]).into_owned();
        let data = std::str::from_utf8(&frame[5..13])
            .ok()
            .and_then(|d| u32::from_str_radix(d, 16).ok())
            .unwrap_or(0);
        let value = match code.as_str() {
            "01" => encode_temperature(process_temp).unwrap_or(0),
            "03" => setpoint,
            "06" => encode_temperature(25.0).unwrap_or(0),
            "1c" => {
                setpoint = data;
                data
            },
            "2d" => data,
            _ => 0,
        };
        controller_reply(value)
    });
    let handle = transport.handle();
    (transport, handle)
}

/// `* dddddddd ss ^`
pub fn controller_reply(value: u32) -> Vec<u8> {
    let data = format!("{:08x}", value);
    let mut reply = vec![TC_STX];
    reply.extend_from_slice(data.as_bytes());
    reply.extend_from_slice(format!("{:02x}", checksum(data.as_bytes())).as_bytes());
    reply.push(TC_ACK);
    reply
}

/// 模拟微控制器：记住风扇/气泵 PWM，`Q` 返回 `fan,pump,0`
pub fn micro(name: &str) -> (MockTransport, MockHandle) {
    let mut fan = String::from("0");
    let mut air = String::from("0");
    let transport = MockTransport::new(name).with_responder(move |frame| {
        // STX cmd data NUL ETX
        let Some(&code) = frame.get(1) else {
            return Vec::new();
        };
        let data_end = frame.len().saturating_sub(2).max(2);
        let data = String::from_utf8_lossy(&frame[2..data_end]).into_owned();
        let body = match code {
            b'F' => {
                fan = data.clone();
                data
            },
            b'P' => {
                air = data.clone();
                data
            },
            b'Q' => format!("{},{},0", fan, air),
            _ => String::new(),
        };
        let mut reply = vec![STX, code];
        reply.extend_from_slice(body.as_bytes());
        reply.push(ACK);
        reply
    });
    let handle = transport.handle();
    (transport, handle)
}
