use cozeats_core::{AppContext, GroceryId, prelude::GroupScreen, screens::GroceryScreen};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

pub fn print_list(screen: &GroceryScreen, output: &Output) {
    output.section("Grocery List");
    output.load_error(screen.state().error());
    if screen.items().is_empty() {
        output.status("Your list is empty");
        return;
    }

    output.status(&format!(
        "{} to buy, {} done",
        screen.remaining_count(),
        screen.completed_count()
    ));
    for item in screen.items() {
        let note = match (&item.completed_by, item.completed) {
            (Some(by), true) => format!("({}) got it [{}]", by, item.id),
            _ => format!("[{}]", item.id),
        };
        output.check_item(item.completed, &item.item, &note);
    }
}

pub async fn list(ctx: &AppContext) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.groceries();
    screen.on_focus().await?;
    print_list(&screen, &output);
    Ok(())
}

pub async fn add(ctx: &AppContext, item: &str) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.groceries();
    screen.on_focus().await?;

    let created = screen.add_item(item).await?;
    output.success(&format!("Added {}", created.item.bright_cyan()));
    print_list(&screen, &output);
    Ok(())
}

pub async fn done(ctx: &AppContext, id: &str) -> Result<()> {
    let output = Output::new();
    let id: GroceryId = id.parse().into_diagnostic()?;

    let mut screen = ctx.groceries();
    screen.on_focus().await?;
    if screen.mark_complete(&id).await? {
        output.success("Checked off");
    } else {
        output.status("Already done, or not on this list");
    }
    print_list(&screen, &output);
    Ok(())
}

pub async fn remove(ctx: &AppContext, id: &str) -> Result<()> {
    let output = Output::new();
    let id: GroceryId = id.parse().into_diagnostic()?;

    let mut screen = ctx.groceries();
    screen.on_focus().await?;
    screen.delete_item(&id).await?;
    output.success("Item removed");
    print_list(&screen, &output);
    Ok(())
}

pub async fn clear(ctx: &AppContext) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.groceries();
    screen.on_focus().await?;

    let report = screen.clear_all().await?;
    output.success(&format!("Removed {} items", report.deleted_count));
    Ok(())
}
