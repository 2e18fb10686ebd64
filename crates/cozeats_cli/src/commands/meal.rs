use chrono::NaiveDate;
use cozeats_core::{
    AppContext, MealId, MealType, MealUpdate, prelude::GroupScreen, screens::MealsScreen,
};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

/// Print one day's meals grouped by type
pub fn print_day(screen: &MealsScreen, output: &Output) {
    output.section(&format!("Meals for {}", screen.date().format("%A, %B %-d")));
    output.load_error(screen.state().error());

    let grouped = screen.by_type();
    for meal_type in MealType::ALL {
        println!("  {}", meal_type.label().bright_yellow());
        match grouped.get(&meal_type) {
            Some(meals) => {
                for meal in meals {
                    let by = meal
                        .creator_name
                        .as_deref()
                        .map(|n| format!("added by {n}"))
                        .unwrap_or_default();
                    output.list_item(&format!(
                        "{} {} {}",
                        meal.name,
                        by.dimmed(),
                        format!("[{}]", meal.id).dimmed()
                    ));
                }
            }
            None => output.status("  nothing planned"),
        }
    }
}

pub async fn list(ctx: &AppContext, date: NaiveDate) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.meals(date);
    screen.on_focus().await?;
    print_day(&screen, &output);
    Ok(())
}

pub async fn add(ctx: &AppContext, name: &str, meal_type: MealType, date: NaiveDate) -> Result<()> {
    let output = Output::new();
    let mut screen = ctx.meals(date);
    screen.on_focus().await?;

    let meal = screen.add_meal(name, meal_type, date).await?;
    output.success(&format!(
        "Added {} for {} on {}",
        meal.name.bright_cyan(),
        meal.meal_type.label().to_lowercase(),
        meal.date
    ));
    print_day(&screen, &output);
    Ok(())
}

pub async fn edit(
    ctx: &AppContext,
    id: &str,
    date: NaiveDate,
    update: MealUpdate,
) -> Result<()> {
    let output = Output::new();
    if update.is_empty() {
        output.warning("Nothing to change; pass --name, --type or --date");
        return Ok(());
    }
    let id: MealId = id.parse().into_diagnostic()?;

    let mut screen = ctx.meals(update.date.unwrap_or(date));
    screen.on_focus().await?;
    let meal = screen.update_meal(&id, update).await?;
    output.success(&format!("Updated {}", meal.name.bright_cyan()));
    print_day(&screen, &output);
    Ok(())
}

pub async fn delete(ctx: &AppContext, id: &str, date: NaiveDate) -> Result<()> {
    let output = Output::new();
    let id: MealId = id.parse().into_diagnostic()?;

    let mut screen = ctx.meals(date);
    screen.on_focus().await?;
    screen.delete_meal(&id).await?;
    output.success("Meal deleted");
    print_day(&screen, &output);
    Ok(())
}
