//! flush 命令
//!
//! 初始化注射泵后以注射方向推出一段体积，排出管路中的空气。
//! 命令返回时泵仍在运行，不发送停止命令。

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

use crate::settings::{self, PortArgs};

#[derive(Args, Debug)]
pub struct FlushCommand {
    /// 冲洗体积（µL，默认取配置）
    #[arg(long)]
    pub volume: Option<f64>,

    /// 冲洗速率（µL/min，默认取配置）
    #[arg(long)]
    pub rate: Option<f64>,

    #[command(flatten)]
    pub ports: PortArgs,
}

impl FlushCommand {
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let config = settings::resolve(config_path, &self.ports)?;
        let volume = self.volume.unwrap_or(config.pump.flush_length_ul);
        let rate = self.rate.unwrap_or(config.pump.flush_rate_ul_min);

        let mut rig = settings::open_rig(&config)?;
        let pump = rig.pump();
        pump.initialize(config.pump.syringe_diameter_mm)
            .context("Pump initialisation failed")?;
        pump.flush_line(volume, rate).context("Flush failed")?;

        println!("✅ Flushing {} µL at {} µL/min", volume, rate);
        Ok(())
    }
}
