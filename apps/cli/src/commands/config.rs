//! 配置管理命令

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use freezeray_control::RunConfig;
use std::path::Path;

use crate::settings;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置
    Show,

    /// 写入默认配置文件
    Init {
        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 打印配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, config_path: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => Self::show(config_path),
            ConfigCommand::Init { force } => Self::init(config_path, force),
            ConfigCommand::Path => {
                println!("{}", settings::config_path(config_path)?.display());
                Ok(())
            },
        }
    }

    fn show(config_path: Option<&Path>) -> Result<()> {
        let config = settings::load_config(config_path)?;
        let path = settings::config_path(config_path)?;
        let source = if path.exists() {
            path.display().to_string()
        } else {
            "built-in defaults".to_string()
        };

        println!("# {}", source);
        print!("{}", config.to_toml_string()?);
        Ok(())
    }

    fn init(config_path: Option<&Path>, force: bool) -> Result<()> {
        let path = settings::config_path(config_path)?;
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }

        RunConfig::default()
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("✅ Wrote {}", path.display());
        Ok(())
    }
}
