//! run 命令
//!
//! 执行配方文件

use anyhow::{Context, Result, bail};
use clap::Args;
use freezeray_control::{
    AutoResume, CsvLogSink, Recipe, ResumeGate, Sampler, StepExecutor, format_duration,
};
use std::path::{Path, PathBuf};

use crate::gate::PromptGate;
use crate::settings::{self, PortArgs};

/// 配方执行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 配方文件路径
    pub recipe: PathBuf,

    /// 遥测数据输出（CSV）
    #[arg(short, long, default_value = "data_log.csv")]
    pub output: PathBuf,

    #[command(flatten)]
    pub ports: PortArgs,

    /// 忽略配方中的等待确认，自动继续
    #[arg(long)]
    pub no_wait: bool,

    /// 跳过注射泵初始化（复位、内径、单位）
    #[arg(long)]
    pub skip_pump_init: bool,
}

impl RunCommand {
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let config = settings::resolve(config_path, &self.ports)?;
        let recipe = Recipe::from_path(&self.recipe)
            .with_context(|| format!("Failed to load recipe {}", self.recipe.display()))?;
        if recipe.is_empty() {
            bail!("Recipe {} has no steps", self.recipe.display());
        }

        println!("📋 Recipe: {}", self.recipe.display());
        println!(
            "    {} steps, total dwell {}",
            recipe.len(),
            format_duration(recipe.total_dwell())
        );

        let mut rig = settings::open_rig(&config)?;
        let mut sink = CsvLogSink::create(&self.output)
            .with_context(|| format!("Failed to create data log {}", self.output.display()))?;

        let mut executor = StepExecutor::new(Sampler::new(config.sampler.tick_period()));
        if !self.skip_pump_init {
            executor = executor.with_pump_init(config.pump.syringe_diameter_mm);
        }

        let mut prompt = PromptGate;
        let mut auto = AutoResume;
        let gate: &mut dyn ResumeGate = if self.no_wait { &mut auto } else { &mut prompt };

        let summary = executor.run(&mut rig, &recipe, &mut sink, gate)?;

        println!();
        println!("📊 Run result:");
        println!("  Steps completed: {}/{}", summary.steps_completed, recipe.len());
        println!("  Samples: {} -> {}", summary.rows_written, self.output.display());
        println!("  Elapsed: {}", format_duration(summary.elapsed));
        if summary.aborted {
            println!("  ⚠️  Aborted by operator");
        }
        let links = [
            ("pump", rig.pump().link().stats()),
            ("controller", rig.controller().link().stats()),
            ("micro", rig.micro().link().stats()),
        ];
        for (device, stats) in links {
            println!(
                "  {:<10} {} exchanges, {} failed attempts, {} exhausted",
                device, stats.exchanges, stats.failed_attempts, stats.exhausted
            );
        }
        for (device, failure) in &summary.shutdown.failures {
            println!("  ❌ Shutdown {} failed: {}", device, failure);
        }

        Ok(())
    }
}
