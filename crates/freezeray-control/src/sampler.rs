//! 驻留期间的周期采样
//!
//! 每个周期按固定顺序查询：工艺温度、设定温度、散热器温度、输出功率、报警位、
//! 微控制器状态、已分配体积。单个查询失败只让对应字段缺失，不影响本周期与后续周期。
//! 完成本周期后睡眠周期剩余时间；超时不补偿，也不对齐到墙钟。

use crate::error::SinkError;
use crate::sample::SampleRow;
use crate::sink::LogSink;
use freezeray_driver::{LinkError, Rig};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    tick_period: Duration,
}

impl Sampler {
    pub fn new(tick_period: Duration) -> Self {
        Self { tick_period }
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// `floor(dwell / period)`
    pub fn tick_count(&self, dwell: Duration) -> u64 {
        if self.tick_period.is_zero() {
            return 0;
        }
        (dwell.as_nanos() / self.tick_period.as_nanos()) as u64
    }

    /// 在 `dwell` 内采样并写入日志，返回写入的行数
    ///
    /// `run_start` 为运行开始时的时钟读数。
    pub fn run(
        &self,
        rig: &mut Rig,
        dwell: Duration,
        run_start: Duration,
        sink: &mut dyn LogSink,
    ) -> Result<u64, SinkError> {
        let ticks = self.tick_count(dwell);
        if ticks == 0 && !dwell.is_zero() {
            warn!(
                "Dwell {:?} is shorter than tick period {:?}, no samples taken",
                dwell, self.tick_period
            );
        }
        let clock = rig.clock().clone();

        for tick in 0..ticks {
            let tick_start = clock.now();
            let row = self.sample(rig, run_start);
            debug!("tick {}/{} t={}s ({} fields missing)", tick + 1, ticks, row.t, row.missing_fields());
            sink.write_row(&row)?;

            let work = clock.now().saturating_sub(tick_start);
            if work < self.tick_period {
                clock.sleep(self.tick_period - work);
            } else {
                warn!(
                    "Sampling tick took {:?}, longer than period {:?}",
                    work, self.tick_period
                );
            }
        }
        Ok(ticks)
    }

    /// 采集一行遥测
    pub fn sample(&self, rig: &mut Rig, run_start: Duration) -> SampleRow {
        let t = rig.clock().now().saturating_sub(run_start).as_secs();
        let mut row = SampleRow::new(t);

        let tc = rig.controller();
        row.sp_temp = field("sp_temp", tc.process_temperature());
        row.sp_setpoint = field("sp_setpoint", tc.setpoint());
        row.heatsink_temp = field("heatsink_temp", tc.heatsink_temperature());
        row.tc_effort_pct = field("tc_effort", tc.effort_pct());
        row.alarm_bits = field("alarm_bits", tc.alarm_bits());

        if let Some(status) = field("micro_status", rig.micro().query()) {
            row.fan_effort_pct = Some(status.fan_pct);
            row.pump_effort_pct = Some(status.air_pump_pct);
            row.ard_temp = status.temperature;
        }

        if let Some(volume) = field("dispensed_volume", rig.pump().dispensed()) {
            row.vol_infused = Some(volume.infused);
            row.vol_withdrawn = Some(volume.withdrawn);
            row.vol_units = Some(volume.units);
        }

        row
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

fn field<T>(name: &str, result: Result<T, LinkError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Sample field '{}' unavailable this tick: {}", name, e);
            None
        },
    }
}
