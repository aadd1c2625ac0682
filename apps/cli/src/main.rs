//! # FreezeRay CLI
//!
//! 驱动注射泵、温控器与微控制器执行配方。
//!
//! ```bash
//! # 生成默认配置，填入三个串口
//! freezeray config init
//!
//! # 检查配方（不连接设备）
//! freezeray check-recipe recipe.csv
//!
//! # 执行配方，遥测写入 data.csv，收发帧写入调试日志
//! freezeray --debug-log debug.log run recipe.csv -o data.csv
//!
//! # 读取一次当前状态
//! freezeray status
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod gate;
mod logging;
mod settings;

use commands::{CheckRecipeCommand, ConfigCommand, FlushCommand, RunCommand, StatusCommand};

/// FreezeRay - 配方执行工具
#[derive(Parser, Debug)]
#[command(name = "freezeray")]
#[command(about = "Run temperature/dispensing recipes on the FreezeRay rig", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（默认 <config_dir>/freezeray/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 调试日志文件（记录每一帧收发）
    #[arg(long, global = true)]
    debug_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 执行配方
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 解析并打印配方，不连接设备
    CheckRecipe {
        #[command(flatten)]
        args: CheckRecipeCommand,
    },

    /// 读取一次全部遥测
    Status {
        #[command(flatten)]
        args: StatusCommand,
    },

    /// 冲洗注射泵管路
    Flush {
        #[command(flatten)]
        args: FlushCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // guard 存活期间文件日志持续写入
    let _guard = logging::init(cli.debug_log.as_deref())?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run { args } => args.execute(config_path),
        Commands::CheckRecipe { args } => args.execute(config_path),
        Commands::Status { args } => args.execute(config_path),
        Commands::Flush { args } => args.execute(config_path),
        Commands::Config(cmd) => cmd.execute(config_path),
    }
}
