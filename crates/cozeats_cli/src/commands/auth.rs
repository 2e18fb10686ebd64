use cozeats_core::AppContext;
use miette::Result;
use owo_colors::OwoColorize;

use crate::commands::password;
use crate::output::Output;

pub async fn signup(
    ctx: &AppContext,
    name: &str,
    email: &str,
    given_password: Option<String>,
) -> Result<()> {
    let output = Output::new();
    let password = password(given_password, "Password")?;

    let mut account = ctx.account();
    let user = account.signup(name, email, &password).await?;

    output.success(&format!("Welcome to CozEats, {}!", user.display_name().bright_cyan()));
    show_selection(ctx, &output);
    Ok(())
}

pub async fn login(ctx: &AppContext, email: &str, given_password: Option<String>) -> Result<()> {
    let output = Output::new();
    let password = password(given_password, "Password")?;

    let mut account = ctx.account();
    let user = account.login(email, &password).await?;

    output.success(&format!("Signed in as {}", user.display_name().bright_cyan()));
    show_selection(ctx, &output);
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    let output = Output::new();
    if !ctx.session().is_signed_in() {
        output.status("Not signed in");
        return Ok(());
    }
    ctx.account().logout().await?;
    output.success("Signed out");
    Ok(())
}

/// Show the signed-in user and selected group
pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let output = Output::new();
    let Some(user) = ctx.session().current() else {
        output.status("Not signed in");
        output.info("Hint:", "cozeats login <email>");
        return Ok(());
    };

    output.section("Account");
    output.kv("Name", user.name.as_deref().unwrap_or("(not set)"));
    output.kv("Email", &user.email);
    output.kv("Initials", &user.initials());
    output.kv("User ID", user.id.as_str());
    output.kv("Member since", &user.created_at.format("%B %-d, %Y").to_string());
    show_selection(ctx, &output);
    Ok(())
}

pub async fn rename(ctx: &AppContext, name: &str) -> Result<()> {
    let output = Output::new();
    let user = ctx.account().rename(name).await?;
    output.success(&format!(
        "Profile updated; you are now {}",
        user.display_name().bright_cyan()
    ));
    Ok(())
}

pub async fn change_password(ctx: &AppContext) -> Result<()> {
    let output = Output::new();
    let current = password(None, "Current password")?;
    let new = password(None, "New password")?;
    let confirm = password(None, "Confirm new password")?;

    ctx.account().change_password(&current, &new, &confirm).await?;
    output.success("Password changed successfully");
    Ok(())
}

fn show_selection(ctx: &AppContext, output: &Output) {
    match ctx.selection().current() {
        Some(group) => output.kv("Selected group", group.as_str()),
        None => output.kv("Selected group", "(none)"),
    }
}
