//! 运行配置（TOML）
//!
//! ```toml
//! [ports]
//! pump = "/dev/ttyUSB0"
//! controller = "/dev/ttyUSB1"
//! micro = "/dev/ttyACM0"
//!
//! [serial]
//! baud_rate = 9600
//!
//! [links.micro]
//! retries = 20
//! settle_delay_ms = 200
//!
//! [sampler]
//! tick_period_ms = 1000
//!
//! [pump]
//! syringe_diameter_mm = 7.0
//! ```
//!
//! 所有字段都有默认值，缺省的段落使用默认配置。

use crate::error::ConfigError;
use freezeray_driver::LinkConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ports: PortsConfig,
    pub serial: SerialConfig,
    pub links: LinksConfig,
    pub sampler: SamplerConfig,
    pub pump: PumpConfig,
}

/// 三台设备的端口名
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    pub pump: Option<String>,
    pub controller: Option<String>,
    pub micro: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    /// 打开串口后的稳定时间
    pub open_settle_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout_ms: 1000,
            open_settle_ms: 1000,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn open_settle(&self) -> Duration {
        Duration::from_millis(self.open_settle_ms)
    }
}

/// 各设备链路配置
///
/// 段内缺省的字段取该设备自己的参考值，而不是通用默认值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LinksOverride")]
pub struct LinksConfig {
    pub pump: LinkConfig,
    pub controller: LinkConfig,
    pub micro: LinkConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LinksOverride {
    pump: LinkOverride,
    controller: LinkOverride,
    micro: LinkOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LinkOverride {
    retries: Option<u32>,
    reply_delay_ms: Option<u64>,
    settle_delay_ms: Option<u64>,
    actuation_delay_ms: Option<u64>,
}

impl LinkOverride {
    fn apply(self, base: LinkConfig) -> LinkConfig {
        LinkConfig {
            retries: self.retries.unwrap_or(base.retries),
            reply_delay_ms: self.reply_delay_ms.unwrap_or(base.reply_delay_ms),
            settle_delay_ms: self.settle_delay_ms.unwrap_or(base.settle_delay_ms),
            actuation_delay_ms: self.actuation_delay_ms.unwrap_or(base.actuation_delay_ms),
        }
    }
}

impl From<LinksOverride> for LinksConfig {
    fn from(o: LinksOverride) -> Self {
        Self {
            pump: o.pump.apply(LinkConfig::pump()),
            controller: o.controller.apply(LinkConfig::controller()),
            micro: o.micro.apply(LinkConfig::micro()),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            pump: LinkConfig::pump(),
            controller: LinkConfig::controller(),
            micro: LinkConfig::micro(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub tick_period_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1000,
        }
    }
}

impl SamplerConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

/// 注射泵参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    pub syringe_diameter_mm: f64,
    /// 冲洗管路的体积（µL）
    pub flush_length_ul: f64,
    pub flush_rate_ul_min: f64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            syringe_diameter_mm: 7.0,
            flush_length_ul: 200.0,
            flush_rate_ul_min: 1000.0,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.to_toml_string()?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampler.tick_period_ms == 0 {
            return Err(ConfigError::Invalid("sampler.tick_period_ms must be > 0".into()));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid("serial.baud_rate must be > 0".into()));
        }
        if !(self.pump.syringe_diameter_mm > 0.0) {
            return Err(ConfigError::Invalid(
                "pump.syringe_diameter_mm must be > 0".into(),
            ));
        }
        Ok(())
    }
}
