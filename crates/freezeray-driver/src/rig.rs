//! 三台设备的聚合
//!
//! 一次运行独占全部三个链路会话；结束时尽力让设备进入空闲状态，再关闭串口。

use crate::clock::Clock;
use crate::controller::TempController;
use crate::micro::Microcontroller;
use crate::pump::SyringePump;
use freezeray_protocol::DeviceTag;
use std::sync::Arc;
use tracing::{error, info};

/// 关机过程中各设备的失败记录
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub failures: Vec<(DeviceTag, String)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Rig {
    pump: SyringePump,
    controller: TempController,
    micro: Microcontroller,
    clock: Arc<dyn Clock>,
    closed: bool,
}

impl Rig {
    pub fn new(
        pump: SyringePump,
        controller: TempController,
        micro: Microcontroller,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pump,
            controller,
            micro,
            clock,
            closed: false,
        }
    }

    pub fn pump(&mut self) -> &mut SyringePump {
        &mut self.pump
    }

    pub fn controller(&mut self) -> &mut TempController {
        &mut self.controller
    }

    pub fn micro(&mut self) -> &mut Microcontroller {
        &mut self.micro
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// 尽力关机：关闭温控输出、停泵、风扇和气泵归零
    ///
    /// 每一步失败只记录，不影响后续步骤。
    pub fn shutdown(&mut self) -> ShutdownReport {
        info!("Shutting down rig devices");
        let mut report = ShutdownReport::default();

        let mut record = |device: DeviceTag, result: Result<(), crate::LinkError>| {
            if let Err(e) = result {
                error!("Shutdown step for {} failed: {}", device, e);
                report.failures.push((device, e.to_string()));
            }
        };

        record(DeviceTag::Controller, self.controller.set_output_enabled(false));
        record(DeviceTag::Pump, self.pump.stop());
        record(DeviceTag::Micro, self.micro.set_fan_pct(0));
        record(DeviceTag::Micro, self.micro.set_air_pump_pct(0));

        if report.is_clean() {
            info!("Rig shutdown complete");
        }
        report
    }

    /// 关闭所有串口
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.pump.link_mut().close();
        self.controller.link_mut().close();
        self.micro.link_mut().close();
        self.closed = true;
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LinkConfig;
    use crate::link::LinkSession;
    use crate::sim;
    use freezeray_protocol::{ControllerCodec, MicroCodec, PumpCodec};
    use freezeray_serial::{MockHandle, MockTransport};

    fn rig_from(
        pump: MockTransport,
        controller: MockTransport,
        micro: MockTransport,
    ) -> Rig {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
        Rig::new(
            SyringePump::new(LinkSession::new(
                PumpCodec,
                Box::new(pump),
                LinkConfig::immediate(2),
                clock.clone(),
            )),
            TempController::new(LinkSession::new(
                ControllerCodec,
                Box::new(controller),
                LinkConfig::immediate(2),
                clock.clone(),
            )),
            Microcontroller::new(LinkSession::new(
                MicroCodec,
                Box::new(micro),
                LinkConfig::immediate(2),
                clock.clone(),
            )),
            clock,
        )
    }

    #[test]
    fn test_shutdown_order() {
        let (pump, pump_handle) = sim::pump("pump");
        let (tc, tc_handle) = sim::controller("tc", 20.0);
        let (micro, micro_handle) = sim::micro("micro");
        let mut rig = rig_from(pump, tc, micro);

        let report = rig.shutdown();
        assert!(report.is_clean());
        assert_eq!(tc_handle.writes(), vec![b"*002d0000000076\r".to_vec()]);
        assert_eq!(pump_handle.writes_lossy(), vec!["STP\r"]);
        assert_eq!(
            micro_handle.writes(),
            vec![b"\x02F0\x00\x03".to_vec(), b"\x02P0\x00\x03".to_vec()]
        );
    }

    #[test]
    fn test_shutdown_continues_after_failures() {
        let (pump, _) = sim::pump("pump");
        let silent_tc = MockTransport::new("tc");
        let (micro, micro_handle) = sim::micro("micro");
        let mut rig = rig_from(pump, silent_tc, micro);

        let report = rig.shutdown();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, DeviceTag::Controller);
        assert_eq!(micro_handle.write_count(), 2);
    }

    #[test]
    fn test_drop_closes_ports() {
        let (pump, pump_handle) = sim::pump("pump");
        let (tc, tc_handle) = sim::controller("tc", 20.0);
        let (micro, micro_handle): (MockTransport, MockHandle) = sim::micro("micro");
        drop(rig_from(pump, tc, micro));

        assert!(pump_handle.is_closed());
        assert!(tc_handle.is_closed());
        assert!(micro_handle.is_closed());
    }
}
