//! check-recipe 命令

use anyhow::{Context, Result};
use clap::Args;
use freezeray_control::{Recipe, Sampler, format_duration};
use std::path::{Path, PathBuf};

use crate::settings;

#[derive(Args, Debug)]
pub struct CheckRecipeCommand {
    /// 配方文件路径
    pub recipe: PathBuf,
}

impl CheckRecipeCommand {
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let config = settings::load_config(config_path)?;
        let recipe = Recipe::from_path(&self.recipe)
            .with_context(|| format!("Invalid recipe {}", self.recipe.display()))?;
        let sampler = Sampler::new(config.sampler.tick_period());

        println!(
            "{:>4}  {:>12}  {:>3}  {:>8}  {:>4}  {:>4}  {:>10}  {:>10}  {:>4}",
            "step", "dwell", "tc", "sp (°C)", "fan", "air", "vol (µL)", "rate", "wait"
        );
        for (i, step) in recipe.iter().enumerate() {
            println!(
                "{:>4}  {:>12}  {:>3}  {:>8}  {:>4}  {:>4}  {:>10}  {:>10}  {:>4}",
                i + 1,
                format_duration(step.dwell),
                yes_no(step.tc_enabled),
                step.setpoint_c,
                step.fan_pct,
                step.pump_air_pct,
                step.syringe_volume_ul,
                step.syringe_rate_ul_min,
                yes_no(step.wait_for_resume)
            );
        }

        let samples: u64 = recipe.iter().map(|s| sampler.tick_count(s.dwell)).sum();
        println!();
        println!(
            "✅ {} steps, total dwell {}, {} samples",
            recipe.len(),
            format_duration(recipe.total_dwell()),
            samples
        );
        Ok(())
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Y" } else { "N" }
}
