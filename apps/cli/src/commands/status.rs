//! status 命令
//!
//! 读取一次全部遥测，不改变设备状态

use anyhow::Result;
use clap::Args;
use freezeray_control::{HEADER, Sampler};
use std::path::Path;

use crate::settings::{self, PortArgs};

#[derive(Args, Debug)]
pub struct StatusCommand {
    #[command(flatten)]
    pub ports: PortArgs,
}

impl StatusCommand {
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let config = settings::resolve(config_path, &self.ports)?;
        let mut rig = settings::open_rig(&config)?;

        let start = rig.clock().now();
        let row = Sampler::default().sample(&mut rig, start);

        // 时间戳列对单次读取没有意义
        for (name, value) in HEADER.iter().zip(row.to_record()).skip(1) {
            println!("{:<16} {}", name, value);
        }
        Ok(())
    }
}
