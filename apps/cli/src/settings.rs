//! 配置解析与设备连接
//!
//! 优先级：内置默认值 → 配置文件 → 命令行端口参数

use anyhow::{Context, Result, anyhow};
use clap::Args;
use freezeray_control::RunConfig;
use freezeray_driver::{Rig, RigBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow!("Cannot determine config directory"))?;
    path.push("freezeray");
    path.push("config.toml");
    Ok(path)
}

/// `--config` 指定的文件，否则默认路径
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

/// 加载配置
///
/// 显式指定的文件必须存在；默认路径不存在时使用内置默认值。
pub fn load_config(explicit: Option<&Path>) -> Result<RunConfig> {
    if let Some(path) = explicit {
        return RunConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let path = default_config_path()?;
    if path.exists() {
        debug!("Using config {}", path.display());
        RunConfig::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
    } else {
        debug!("No config at {}, using defaults", path.display());
        Ok(RunConfig::default())
    }
}

/// 端口覆盖参数
#[derive(Args, Debug, Clone, Default)]
pub struct PortArgs {
    /// 注射泵串口
    #[arg(long)]
    pub pump_port: Option<String>,

    /// 温控器串口
    #[arg(long)]
    pub controller_port: Option<String>,

    /// 微控制器串口
    #[arg(long)]
    pub micro_port: Option<String>,
}

impl PortArgs {
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(port) = &self.pump_port {
            config.ports.pump = Some(port.clone());
        }
        if let Some(port) = &self.controller_port {
            config.ports.controller = Some(port.clone());
        }
        if let Some(port) = &self.micro_port {
            config.ports.micro = Some(port.clone());
        }
    }
}

/// 加载配置并应用端口参数
pub fn resolve(explicit: Option<&Path>, ports: &PortArgs) -> Result<RunConfig> {
    let mut config = load_config(explicit)?;
    ports.apply(&mut config);
    Ok(config)
}

/// 打开三个串口
pub fn open_rig(config: &RunConfig) -> Result<Rig> {
    let missing = |device: &str| {
        anyhow!(
            "No {} port configured: set [ports].{} in the config file or pass --{}-port",
            device,
            device,
            device
        )
    };
    let pump = config.ports.pump.as_deref().ok_or_else(|| missing("pump"))?;
    let controller = config
        .ports
        .controller
        .as_deref()
        .ok_or_else(|| missing("controller"))?;
    let micro = config.ports.micro.as_deref().ok_or_else(|| missing("micro"))?;

    info!(
        "Opening pump={} controller={} micro={} @ {} baud",
        pump, controller, micro, config.serial.baud_rate
    );
    RigBuilder::new()
        .pump_port(pump)
        .controller_port(controller)
        .micro_port(micro)
        .baud_rate(config.serial.baud_rate)
        .serial_timing(config.serial.read_timeout(), config.serial.open_settle())
        .pump_config(config.links.pump)
        .controller_config(config.links.controller)
        .micro_config(config.links.micro)
        .build()
        .context("Failed to open rig")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_args_override_config() {
        let mut config = RunConfig::default();
        config.ports.pump = Some("COM5".into());
        config.ports.micro = Some("COM6".into());

        let args = PortArgs {
            pump_port: Some("/dev/ttyUSB0".into()),
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.ports.pump.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.ports.micro.as_deref(), Some("COM6"));
        assert_eq!(config.ports.controller, None);
    }

    #[test]
    fn test_open_rig_requires_ports() {
        let err = open_rig(&RunConfig::default()).err().map(|e| e.to_string());
        assert!(err.unwrap().contains("--pump-port"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
