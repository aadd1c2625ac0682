//! 步骤执行器
//!
//! ```text
//! Idle → Actuating → Dwelling → [ResumeGate] → Idle
//! ```
//!
//! 执行命令顺序固定：气泵 → 风扇 → 设定温度 → 输出开关 → （体积非 0 时）注射泵。
//! 任何执行命令失败都会中止整个运行，中止前尽力让所有设备进入空闲状态。

use crate::error::ControlError;
use crate::gate::{Resume, ResumeGate};
use crate::recipe::{Recipe, StepRecord};
use crate::sampler::Sampler;
use crate::sink::LogSink;
use freezeray_driver::{LinkError, Rig, ShutdownReport};
use std::time::Duration;
use tracing::{error, info, warn};

/// 执行器状态（`step` 从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Actuating { step: usize },
    Dwelling { step: usize },
    ResumeGate { step: usize },
}

/// 运行结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps_completed: usize,
    pub rows_written: u64,
    pub elapsed: Duration,
    pub shutdown: ShutdownReport,
    /// 操作员在闸门处中止
    pub aborted: bool,
}

pub struct StepExecutor {
    sampler: Sampler,
    syringe_diameter_mm: Option<f64>,
    state: ExecutorState,
}

impl StepExecutor {
    pub fn new(sampler: Sampler) -> Self {
        Self {
            sampler,
            syringe_diameter_mm: None,
            state: ExecutorState::Idle,
        }
    }

    /// 运行开始前初始化注射泵（复位、内径、单位）
    pub fn with_pump_init(mut self, syringe_diameter_mm: f64) -> Self {
        self.syringe_diameter_mm = Some(syringe_diameter_mm);
        self
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// 依次执行全部步骤
    ///
    /// 正常结束或出错后都会执行尽力关机；串口由 `Rig` 在释放时关闭。
    pub fn run(
        &mut self,
        rig: &mut Rig,
        recipe: &Recipe,
        sink: &mut dyn LogSink,
        gate: &mut dyn ResumeGate,
    ) -> Result<RunSummary, ControlError> {
        let run_start = rig.clock().now();
        info!(
            "Starting run: {} steps, total dwell {:?}",
            recipe.len(),
            recipe.total_dwell()
        );

        let result = self.run_steps(rig, recipe, sink, gate, run_start);
        self.transition(ExecutorState::Idle);
        let shutdown = rig.shutdown();
        if let Err(e) = sink.flush() {
            warn!("Failed to flush data log: {}", e);
        }

        match result {
            Ok((steps_completed, rows_written, aborted)) => {
                let elapsed = rig.clock().now().saturating_sub(run_start);
                info!(
                    "Run finished: {} steps, {} samples in {:?}",
                    steps_completed, rows_written, elapsed
                );
                Ok(RunSummary {
                    steps_completed,
                    rows_written,
                    elapsed,
                    shutdown,
                    aborted,
                })
            },
            Err(e) => {
                error!("Run aborted: {}", e);
                Err(e)
            },
        }
    }

    fn run_steps(
        &mut self,
        rig: &mut Rig,
        recipe: &Recipe,
        sink: &mut dyn LogSink,
        gate: &mut dyn ResumeGate,
        run_start: Duration,
    ) -> Result<(usize, u64, bool), ControlError> {
        if let Some(diameter) = self.syringe_diameter_mm {
            rig.pump().initialize(diameter).map_err(ControlError::Init)?;
        }

        let mut rows = 0;
        for (index, record) in recipe.iter().enumerate() {
            let step = index + 1;
            info!(
                "Step {}/{}: dwell {:?}, setpoint {}°C ({}), fan {}%, air {}%, volume {} µL",
                step,
                recipe.len(),
                record.dwell,
                record.setpoint_c,
                if record.tc_enabled { "on" } else { "off" },
                record.fan_pct,
                record.pump_air_pct,
                record.syringe_volume_ul
            );

            self.transition(ExecutorState::Actuating { step });
            actuate(rig, record).map_err(|source| ControlError::Actuation { step, source })?;

            self.transition(ExecutorState::Dwelling { step });
            rows += self.sampler.run(rig, record.dwell, run_start, sink)?;

            if record.wait_for_resume {
                self.transition(ExecutorState::ResumeGate { step });
                if gate.wait(step)? == Resume::Abort {
                    warn!("Run aborted by operator after step {}", step);
                    return Ok((step, rows, true));
                }
            }
            self.transition(ExecutorState::Idle);
        }

        Ok((recipe.len(), rows, false))
    }

    fn transition(&mut self, next: ExecutorState) {
        if self.state != next {
            tracing::debug!("executor: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

/// 按固定顺序下发一步的执行命令
pub fn actuate(rig: &mut Rig, record: &StepRecord) -> Result<(), LinkError> {
    rig.micro().set_air_pump_pct(record.pump_air_pct)?;
    rig.micro().set_fan_pct(record.fan_pct)?;
    rig.controller().set_setpoint(record.setpoint_c)?;
    rig.controller().set_output_enabled(record.tc_enabled)?;
    if record.dispenses() {
        rig.pump()
            .dispense(record.syringe_volume_ul, record.syringe_rate_ul_min)?;
    }
    Ok(())
}
