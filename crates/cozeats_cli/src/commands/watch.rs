//! Follow the selected group live
//!
//! Keeps the meals and grocery screens focused and reprints whichever one
//! changes. Switching groups from another terminal (`cozeats group switch`)
//! is picked up through the storage file poller.

use chrono::NaiveDate;
use cozeats_core::{
    AppContext,
    prelude::GroupScreen,
    screens::{GroceryScreen, MealsScreen},
};
use miette::Result;
use std::time::Duration;
use tokio::time::Interval;
use tracing::{debug, warn};

use crate::commands::{grocery::print_list, meal::print_day};
use crate::output::Output;

/// What one pass of the watch loop did
#[derive(Debug)]
enum WatchEvent {
    /// The meals screen followed a group switch
    Meals(cozeats_core::Result<()>),
    Groceries(cozeats_core::Result<()>),
    /// Both screens refetched on the refresh interval
    Refreshed(cozeats_core::Result<()>, cozeats_core::Result<()>),
    /// A screen lost focus; nothing more will arrive
    Unfocused,
}

pub async fn run(ctx: &AppContext, date: NaiveDate, refresh: Option<Duration>) -> Result<()> {
    let output = Output::new();
    let mut meals = ctx.meals(date);
    let mut groceries = ctx.groceries();
    meals.on_focus().await?;
    groceries.on_focus().await?;

    print_day(&meals, &output);
    print_list(&groceries, &output);
    println!();
    output.status("Watching for group switches; press Ctrl-C to stop");

    let mut ticker = refresh.map(tokio::time::interval);
    if let Some(ticker) = ticker.as_mut() {
        // The first tick completes immediately; we just fetched.
        ticker.tick().await;
    }

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            event = step(&mut meals, &mut groceries, ticker.as_mut()) => event,
        };

        match event {
            WatchEvent::Meals(result) => {
                report(result, &output);
                output.status(&format!("Group switched to {}", group_label(ctx)));
                print_day(&meals, &output);
            }
            WatchEvent::Groceries(result) => {
                report(result, &output);
                print_list(&groceries, &output);
            }
            WatchEvent::Refreshed(meals_result, groceries_result) => {
                report(meals_result, &output);
                report(groceries_result, &output);
                print_day(&meals, &output);
                print_list(&groceries, &output);
            }
            WatchEvent::Unfocused => break,
        }
    }

    meals.on_blur();
    groceries.on_blur();
    println!();
    output.status("Stopped watching");
    Ok(())
}

/// Wait for the next selection change or refresh tick and apply it
///
/// Only the waits are raced; the refetch runs after a winner is picked, so a
/// switch seen by both screens is applied to each on successive steps.
async fn step(
    meals: &mut MealsScreen,
    groceries: &mut GroceryScreen,
    ticker: Option<&mut Interval>,
) -> WatchEvent {
    tokio::select! {
        change = meals.next_change() => match change {
            Some(change) => WatchEvent::Meals(meals.apply_change(change).await),
            None => WatchEvent::Unfocused,
        },
        change = groceries.next_change() => match change {
            Some(change) => WatchEvent::Groceries(groceries.apply_change(change).await),
            None => WatchEvent::Unfocused,
        },
        _ = tick(ticker) => {
            WatchEvent::Refreshed(meals.refresh().await, groceries.refresh().await)
        }
    }
}

async fn tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn report(result: cozeats_core::Result<()>, output: &Output) {
    if let Err(e) = result {
        warn!("refresh failed: {}", e);
        output.error(&e.user_message());
    }
}

fn group_label(ctx: &AppContext) -> String {
    ctx.selection()
        .current()
        .map(|g| g.to_string())
        .unwrap_or_else(|| "(none)".to_string())
}
