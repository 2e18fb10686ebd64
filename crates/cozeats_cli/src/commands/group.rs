use cozeats_core::{AppContext, GroupId, prelude::GroupScreen};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

/// List the user's groups, marking the selected one
pub async fn list(ctx: &AppContext) -> Result<()> {
    let output = Output::new();
    let mut menu = ctx.menu();
    menu.open().await?;

    output.section("Groups");
    if menu.groups().is_empty() {
        output.info("No groups yet", "");
        output.info("Hint:", "cozeats group create <name>, or cozeats group join <code>");
    } else {
        for group in menu.groups() {
            let selected = menu.selected() == Some(&group.group_id);
            let marker = if selected { "▸".bright_green().to_string() } else { " ".to_string() };
            println!(
                "  {} {} {}",
                marker,
                group.name.bold(),
                format!("({})", group.group_id).dimmed()
            );
        }
    }
    menu.close();
    Ok(())
}

pub async fn switch(ctx: &AppContext, group: &str) -> Result<()> {
    let output = Output::new();
    let group: GroupId = group.parse().into_diagnostic()?;

    let mut menu = ctx.menu();
    menu.open().await?;
    let Some(name) = menu
        .groups()
        .iter()
        .find(|g| g.group_id == group)
        .map(|g| g.name.clone())
    else {
        output.error(&format!("You are not a member of group {}", group));
        output.info("Hint:", "cozeats group list");
        menu.close();
        return Ok(());
    };

    menu.select_group(group).await?;
    output.success(&format!("Switched to {}", name.bright_cyan()));
    Ok(())
}

pub async fn create(ctx: &AppContext, name: &str) -> Result<()> {
    let output = Output::new();
    let mut menu = ctx.menu();
    menu.open().await?;

    let created = menu.create_group(name).await?;
    output.success(&format!("Created group {}", created.name.bright_cyan()));
    output.kv("Group ID", created.id.as_str());
    output.info("Hint:", &format!("cozeats group switch {}", created.id));
    menu.close();
    Ok(())
}

pub async fn join(ctx: &AppContext, code: &str) -> Result<()> {
    let output = Output::new();
    let mut menu = ctx.menu();
    menu.open().await?;

    let joined = menu.join_group(code).await?;
    output.success(&format!(
        "You have successfully joined {}!",
        joined.group_name.bright_cyan()
    ));
    menu.close();
    Ok(())
}

/// Show members and counts of the selected group
pub async fn info(ctx: &AppContext) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.group_info();
    screen.on_focus().await?;

    let Some(detail) = screen.detail() else {
        output.load_error(screen.state().error());
        return Ok(());
    };

    output.section(&detail.group_name);
    output.kv("Meals planned", &detail.meal_count.to_string());
    output.kv("Grocery items", &detail.grocery_count.to_string());
    println!();
    output.info("Members", &format!("({})", detail.members.len()));
    for member in &detail.members {
        let name = member.user_name.as_deref().unwrap_or(&member.user_email);
        output.list_item(&format!(
            "{} {} {}",
            name,
            member.user_email.dimmed(),
            member.role.to_string().bright_yellow()
        ));
    }
    screen.on_blur();
    Ok(())
}

/// Create an invite code for the selected group
pub async fn invite(ctx: &AppContext) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.group_info();
    screen.on_focus().await?;

    if !screen.is_admin() {
        output.warning("Only group admins usually create invites; asking the server anyway");
    }

    let invite = screen.create_invite().await?;
    output.success("Invite code created");
    println!();
    println!("    {}", invite.code.bright_green().bold());
    println!();
    output.kv(
        "Expires",
        &invite
            .expires_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
    );
    output.status("Share this code; it can be used once.");
    screen.on_blur();
    Ok(())
}
