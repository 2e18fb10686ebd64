use cozeats_core::{AppContext, Theme, ThemeOption};
use miette::Result;
use owo_colors::OwoColorize;

use crate::output::Output;

/// The terminal has no way to report a system theme; assume light.
const SYSTEM_THEME: Theme = Theme::Light;

pub async fn show(ctx: &AppContext) -> Result<()> {
    let output = Output::new();
    let option = ctx.theme().option();
    output.kv("Theme", option.as_str());
    if option == ThemeOption::System {
        output.kv("Resolved", &ctx.theme().resolve(SYSTEM_THEME).to_string());
    }
    Ok(())
}

pub async fn set(ctx: &AppContext, option: ThemeOption) -> Result<()> {
    let output = Output::new();
    ctx.account().set_theme(option).await?;
    output.success(&format!("Theme set to {}", option.as_str().bright_cyan()));
    Ok(())
}
