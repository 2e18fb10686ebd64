use cozeats_core::config::{self, CozeatsConfig};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use std::path::Path;

use crate::output::Output;

/// Show the effective configuration
pub async fn show(config: &CozeatsConfig) -> Result<()> {
    let output = Output::new();
    output.section("Current Configuration");
    println!();

    let toml_str = toml::to_string_pretty(config).into_diagnostic()?;
    println!("{}", toml_str);
    output.kv("Storage file", &config.storage.resolved_path().display().to_string());
    Ok(())
}

pub async fn save(config: &CozeatsConfig, path: &Path) -> Result<()> {
    let output = Output::new();
    output.info("Saving configuration to", &path.display().to_string());

    config::save_config(config, path).await?;

    output.success("Configuration saved");
    println!();
    println!("To use this configuration, run:");
    println!("  {} --config {}", "cozeats".bright_green(), path.display());
    Ok(())
}
