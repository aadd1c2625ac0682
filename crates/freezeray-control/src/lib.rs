//! # FreezeRay 控制层
//!
//! 配方驱动的执行流程：
//!
//! - `recipe` - 配方解析（CSV + 时长语法）
//! - `executor` - 步骤状态机（执行 → 驻留 → 恢复闸门）
//! - `sampler` - 驻留期间的周期采样
//! - `sink` - 遥测日志（CSV / 内存）
//! - `gate` - 恢复闸门实现
//! - `config` - 运行配置（TOML）
//!
//! ## 使用示例
//!
//! ```no_run
//! use freezeray_control::{AutoResume, CsvLogSink, Recipe, RunConfig, Sampler, StepExecutor};
//! use freezeray_driver::RigBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::load("config.toml")?;
//! let recipe = Recipe::from_path("recipe.csv")?;
//! let mut rig = RigBuilder::new()
//!     .pump_port("/dev/ttyUSB0")
//!     .controller_port("/dev/ttyUSB1")
//!     .micro_port("/dev/ttyACM0")
//!     .build()?;
//! let mut sink = CsvLogSink::create("data.csv")?;
//!
//! let mut executor = StepExecutor::new(Sampler::new(config.sampler.tick_period()))
//!     .with_pump_init(config.pump.syringe_diameter_mm);
//! let summary = executor.run(&mut rig, &recipe, &mut sink, &mut AutoResume)?;
//! println!("{} samples", summary.rows_written);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod executor;
pub mod gate;
pub mod recipe;
pub mod sample;
pub mod sampler;
pub mod sink;

pub use config::{LinksConfig, PortsConfig, PumpConfig, RunConfig, SamplerConfig, SerialConfig};
pub use error::{ConfigError, ControlError, RecipeError, SinkError};
pub use executor::{ExecutorState, RunSummary, StepExecutor, actuate};
pub use gate::{AutoResume, ChannelGate, Resume, ResumeGate, ResumeHandle};
pub use recipe::{Recipe, StepRecord, format_duration, parse_duration};
pub use sample::{HEADER, MISSING, SampleRow};
pub use sampler::Sampler;
pub use sink::{CsvLogSink, LogSink, MemorySink};
